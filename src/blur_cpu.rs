use crate::{
    error::{HoverfxError, HoverfxResult},
    surface::DrawingSurface,
};

/// Separable gaussian blur over a premultiplied-RGBA8 surface. Sigma
/// defaults to radius/2. Radius 0 is a copy.
pub fn blur_surface(src: &DrawingSurface, radius: u32) -> HoverfxResult<DrawingSurface> {
    if radius == 0 {
        return Ok(src.clone());
    }

    let kernel = gaussian_kernel(radius, (radius as f32) / 2.0)?;
    let width = src.width() as usize;
    let height = src.height() as usize;
    let pixels = src.rgba8_premul();

    let mut tmp = vec![0u8; pixels.len()];
    let mut out = vec![0u8; pixels.len()];
    blur_pass(pixels, &mut tmp, width, height, &kernel, Axis::X);
    blur_pass(&tmp, &mut out, width, height, &kernel, Axis::Y);

    DrawingSurface::from_rgba8_premul(src.size(), out)
}

fn gaussian_kernel(radius: u32, sigma: f32) -> HoverfxResult<Vec<f32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(HoverfxError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let mut weights: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return Err(HoverfxError::effect("gaussian kernel sum is zero"));
    }
    for w in &mut weights {
        *w /= sum;
    }
    Ok(weights.into_iter().map(|w| w as f32).collect())
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: usize, height: usize, k: &[f32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (width as i64, height as i64);

    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let offset = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + offset).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + offset).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += kw * f32::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
