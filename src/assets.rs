use std::path::PathBuf;

use anyhow::Context;

use crate::{
    core::SurfaceSize,
    error::HoverfxResult,
    surface::DrawingSurface,
};

/// One-shot bitmap asset loading. A failed load is terminal for the
/// technique instance that requested it; there is no retry.
pub trait AssetLoader {
    fn load_from_uri(&self, uri: &str) -> HoverfxResult<DrawingSurface>;
}

/// Loads assets from files under a root directory.
#[derive(Clone, Debug)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsAssetLoader {
    fn load_from_uri(&self, uri: &str) -> HoverfxResult<DrawingSurface> {
        let path = self.root.join(uri);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read asset '{}'", path.display()))?;
        decode_image(&bytes)
    }
}

/// Decodes an encoded image into a premultiplied-RGBA8 surface.
pub fn decode_image(bytes: &[u8]) -> HoverfxResult<DrawingSurface> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8 = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8);

    DrawingSurface::from_rgba8_premul(SurfaceSize::new(width, height)?, rgba8)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((u16::from(px[0]) * a + 127) / 255) as u8;
        px[1] = ((u16::from(px[1]) * a + 127) / 255) as u8;
        px[2] = ((u16::from(px[2]) * a + 127) / 255) as u8;
    }
}
