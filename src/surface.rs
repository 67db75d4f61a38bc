use crate::{
    core::{PixelFormat, SurfaceSize},
    error::{HoverfxError, HoverfxResult},
};

/// CPU-backed pixel buffer standing in for a GPU-visible bitmap target.
/// Rendered into once through a scoped [`DrawingSession`], then treated
/// as read-only input to effect graphs.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawingSurface {
    size: SurfaceSize,
    format: PixelFormat,
    rgba8: Vec<u8>,
}

impl DrawingSurface {
    pub fn new(size: SurfaceSize, format: PixelFormat) -> HoverfxResult<Self> {
        if size.is_empty() {
            return Err(HoverfxError::validation(
                "drawing surface size must be non-empty",
            ));
        }
        let len = size
            .pixel_count()
            .checked_mul(format.bytes_per_pixel())
            .ok_or_else(|| HoverfxError::validation("drawing surface size overflow"))?;
        Ok(Self {
            size,
            format,
            rgba8: vec![0u8; len],
        })
    }

    pub fn from_rgba8_premul(size: SurfaceSize, rgba8: Vec<u8>) -> HoverfxResult<Self> {
        let mut surface = Self::new(size, PixelFormat::Rgba8Premul)?;
        if rgba8.len() != surface.rgba8.len() {
            return Err(HoverfxError::validation(
                "pixel buffer must match width*height*4",
            ));
        }
        surface.rgba8 = rgba8;
        Ok(surface)
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Premultiplied RGBA8, row-major, tightly packed.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8
    }

    /// Runs `f` inside a scoped drawing session. Draw commands are only
    /// available within the scope.
    pub fn draw<F>(&mut self, f: F) -> HoverfxResult<()>
    where
        F: FnOnce(&mut DrawingSession<'_>) -> HoverfxResult<()>,
    {
        let mut session = DrawingSession { surface: self };
        f(&mut session)
    }
}

pub struct DrawingSession<'a> {
    surface: &'a mut DrawingSurface,
}

impl DrawingSession<'_> {
    /// Draws `src` scaled (bilinear) to cover the whole surface,
    /// source-over the existing contents.
    pub fn draw_image(&mut self, src: &DrawingSurface) -> HoverfxResult<()> {
        if src.size.is_empty() {
            return Err(HoverfxError::validation("draw_image source is empty"));
        }

        let dw = self.surface.size.width;
        let dh = self.surface.size.height;
        let sx_ratio = f64::from(src.size.width) / f64::from(dw);
        let sy_ratio = f64::from(src.size.height) / f64::from(dh);

        for y in 0..dh {
            for x in 0..dw {
                let sx = (f64::from(x) + 0.5) * sx_ratio - 0.5;
                let sy = (f64::from(y) + 0.5) * sy_ratio - 0.5;
                let px = sample_bilinear(src, sx, sy);
                let idx = ((y * dw + x) as usize) * 4;
                let dst = &mut self.surface.rgba8[idx..idx + 4];
                let blended = over([dst[0], dst[1], dst[2], dst[3]], px);
                dst.copy_from_slice(&blended);
            }
        }
        Ok(())
    }

    /// Composites a straight-alpha color over the whole surface.
    pub fn fill(&mut self, rgba: [u8; 4]) -> HoverfxResult<()> {
        let a = rgba[3];
        let src = [
            mul_div255(u16::from(rgba[0]), u16::from(a)),
            mul_div255(u16::from(rgba[1]), u16::from(a)),
            mul_div255(u16::from(rgba[2]), u16::from(a)),
            a,
        ];
        for px in self.surface.rgba8.chunks_exact_mut(4) {
            let blended = over([px[0], px[1], px[2], px[3]], src);
            px.copy_from_slice(&blended);
        }
        Ok(())
    }
}

/// Premultiplied source-over.
fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    if src[3] == 255 {
        return src;
    }
    if src[3] == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for c in 0..4 {
        let d = mul_div255(u16::from(dst[c]), inv);
        out[c] = u8::from(src[c]).saturating_add(d);
    }
    out
}

fn mul_div255(a: u16, b: u16) -> u8 {
    (((a * b) + 127) / 255) as u8
}

fn sample_bilinear(src: &DrawingSurface, x: f64, y: f64) -> [u8; 4] {
    let w = src.size.width as i64;
    let h = src.size.height as i64;

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let fetch = |px: i64, py: i64| -> [f64; 4] {
        let cx = px.clamp(0, w - 1) as usize;
        let cy = py.clamp(0, h - 1) as usize;
        let idx = (cy * w as usize + cx) * 4;
        let p = &src.rgba8[idx..idx + 4];
        [f64::from(p[0]), f64::from(p[1]), f64::from(p[2]), f64::from(p[3])]
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bot = p01[c] + (p11[c] - p01[c]) * fx;
        let v = top + (bot - top) * fy;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}
