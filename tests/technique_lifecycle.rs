use std::rc::Rc;

use hoverfx::{
    AssetLoader, BlurTechnique, Compositor, DesaturationTechnique, DrawingSurface,
    EffectTechnique, ExposureTechnique, HoverfxError, HoverfxResult, ImageTarget, LoadParams,
    PixelFormat, Point, PointLightFollowTechnique, SpotLightTechnique, SurfaceSize,
};

struct TestLoader;

impl AssetLoader for TestLoader {
    fn load_from_uri(&self, _uri: &str) -> HoverfxResult<DrawingSurface> {
        DrawingSurface::new(
            SurfaceSize::new(256, 256).unwrap(),
            PixelFormat::Rgba8Premul,
        )
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn source_image() -> DrawingSurface {
    let data = [90u8, 120, 150, 255].repeat(64 * 64);
    DrawingSurface::from_rgba8_premul(SurfaceSize::new(64, 64).unwrap(), data).unwrap()
}

/// Every variant with the brush paths it declares.
fn all_variants(comp: &Rc<Compositor>) -> Vec<(Box<dyn EffectTechnique>, Vec<&'static str>)> {
    vec![
        (
            Box::new(DesaturationTechnique::new(Rc::clone(comp))),
            vec![DesaturationTechnique::SATURATION],
        ),
        (
            Box::new(ExposureTechnique::new(Rc::clone(comp))),
            vec![ExposureTechnique::EXPOSURE],
        ),
        (
            Box::new(BlurTechnique::new(Rc::clone(comp))),
            vec![BlurTechnique::SOURCE1_AMOUNT, BlurTechnique::SOURCE2_AMOUNT],
        ),
        (
            Box::new(SpotLightTechnique::new(Rc::clone(comp))),
            vec![SpotLightTechnique::TRANSFORM],
        ),
        (
            Box::new(PointLightFollowTechnique::new(Rc::clone(comp))),
            vec![PointLightFollowTechnique::TRANSFORM],
        ),
    ]
}

#[test]
fn release_before_load_is_safe_for_every_variant() {
    init_tracing();
    let comp = Compositor::new();
    for (mut tech, _) in all_variants(&comp) {
        tech.release_resources();
        tech.release_resources();
    }
}

#[test]
fn double_release_after_load_is_safe_for_every_variant() {
    init_tracing();
    let comp = Compositor::new();
    let source = source_image();
    let params = LoadParams {
        loader: &TestLoader,
        source: &source,
        target_size: SurfaceSize::new(128, 128).unwrap(),
    };
    for (mut tech, _) in all_variants(&comp) {
        tech.load_resources(&params).unwrap();
        tech.release_resources();
        tech.release_resources();
    }
}

#[test]
fn released_techniques_reject_every_other_operation() {
    let comp = Compositor::new();
    let source = source_image();
    let params = LoadParams {
        loader: &TestLoader,
        source: &source,
        target_size: SurfaceSize::EMPTY,
    };

    for (mut tech, _) in all_variants(&comp) {
        tech.load_resources(&params).unwrap();
        let mut target = ImageTarget::new(tech.create_brush().unwrap(), 64.0, 64.0);
        tech.release_resources();

        assert!(matches!(tech.create_brush(), Err(HoverfxError::State(_))));
        assert!(matches!(
            tech.on_pointer_enter(Point::ZERO, &mut target),
            Err(HoverfxError::State(_))
        ));
        assert!(matches!(
            tech.on_pointer_exit(Point::ZERO, &mut target),
            Err(HoverfxError::State(_))
        ));
        assert!(matches!(
            tech.load_resources(&params),
            Err(HoverfxError::State(_))
        ));
    }
}

#[test]
fn declared_paths_resolve_on_fresh_brushes() {
    let comp = Compositor::new();
    let source = source_image();
    let params = LoadParams {
        loader: &TestLoader,
        source: &source,
        target_size: SurfaceSize::EMPTY,
    };

    for (mut tech, paths) in all_variants(&comp) {
        tech.load_resources(&params).unwrap();
        // Brushes are independent instances over one shared factory.
        let first = tech.create_brush().unwrap();
        let second = tech.create_brush().unwrap();
        for path in paths {
            assert!(first.has_path(path), "missing path {path}");
            assert!(second.has_path(path), "missing path {path}");
            assert!(first.value(path, comp.now()).is_ok());
        }
    }
}

#[test]
fn exit_without_enter_is_a_contract_error() {
    let comp = Compositor::new();
    let source = source_image();
    let params = LoadParams {
        loader: &TestLoader,
        source: &source,
        target_size: SurfaceSize::EMPTY,
    };

    for (mut tech, _) in all_variants(&comp) {
        tech.load_resources(&params).unwrap();
        let mut target = ImageTarget::new(tech.create_brush().unwrap(), 64.0, 64.0);
        assert!(matches!(
            tech.on_pointer_exit(Point::ZERO, &mut target),
            Err(HoverfxError::State(_))
        ));
    }
}

#[test]
fn only_blur_returns_a_derived_surface() {
    let comp = Compositor::new();
    let source = source_image();
    let params = LoadParams {
        loader: &TestLoader,
        source: &source,
        target_size: SurfaceSize::new(200, 120).unwrap(),
    };

    for (mut tech, paths) in all_variants(&comp) {
        let derived = tech.load_resources(&params).unwrap();
        let is_blur = paths.contains(&BlurTechnique::SOURCE1_AMOUNT);
        assert_eq!(derived.is_some(), is_blur);
        if let Some(surface) = derived {
            assert_eq!(surface.width(), 60);
            assert_eq!(surface.height(), 36);
        }
    }
}
