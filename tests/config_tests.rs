use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use shader_slider::config::{Configuration, EffectConfig};
use shader_slider::easing::Easing;
use shader_slider::shading::ActiveEffect;

fn seeded_rng() -> impl rand::Rng {
    use rand::SeedableRng;
    rand::rngs::StdRng::seed_from_u64(7)
}

fn parse(yaml: &str) -> Configuration {
    serde_yaml::from_str(yaml).expect("fixture parses")
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
images: ["/slides/a.jpg", "/slides/b.jpg"]
"#;
    let cfg = parse(yaml);
    assert_eq!(cfg.images[0], PathBuf::from("/slides/a.jpg"));
    assert_eq!((cfg.width, cfg.height), (960, 540));
    assert_eq!(cfg.dwell_ms, 4000);
    assert_eq!(cfg.transition_ms, 1000);
    assert!(matches!(cfg.effect, EffectConfig::Crossfade));
}

#[test]
fn parse_with_custom_timing() {
    let yaml = r#"
images: ["/slides/a.jpg"]
dwell-ms: 3000
transition-ms: 500
width: 1280
height: 720
"#;
    let cfg = parse(yaml).validated().unwrap();
    assert_eq!(cfg.dwell(), Duration::from_millis(3000));
    assert_eq!(cfg.transition(), Duration::from_millis(500));
    assert!((cfg.container_aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
}

#[test]
fn parse_displacement_effect() {
    let yaml = r#"
images: ["/slides/a.jpg", "/slides/b.jpg"]
effect:
  type: displacement
  map: "/maps/clouds.png"
  intensity1: 0.4
  angle1-deg: 30.0
  easing: cubic-in-out
"#;
    let cfg = parse(yaml).validated().unwrap();
    assert_eq!(cfg.displacement_map(), Some(PathBuf::from("/maps/clouds.png")));
    match cfg.effect.select_active(&mut seeded_rng()) {
        ActiveEffect::Displacement {
            intensity1,
            intensity2,
            angle1,
            angle2,
            easing,
        } => {
            assert!((intensity1 - 0.4).abs() < f32::EPSILON);
            assert!((intensity2 - 1.0).abs() < f32::EPSILON);
            assert!((angle1 - 30.0_f32.to_radians()).abs() < 1e-6);
            // angle2 defaults to -3 * angle1.
            assert!((angle2 + 90.0_f32.to_radians()).abs() < 1e-6);
            assert_eq!(easing, Easing::CubicInOut);
        }
        other => panic!("expected displacement effect, got {other:?}"),
    }
}

#[test]
fn displacement_map_defaults_to_first_slide() {
    let yaml = r#"
images: ["/slides/a.jpg", "/slides/b.jpg"]
effect:
  type: displacement
"#;
    let cfg = parse(yaml).validated().unwrap();
    assert_eq!(cfg.displacement_map(), Some(PathBuf::from("/slides/a.jpg")));
}

#[test]
fn displacement_speed_overrides_bound_transition() {
    let yaml = r#"
images: ["/slides/a.jpg"]
transition-ms: 800
effect:
  type: displacement
  speed-in-ms: 1200
  speed-out-ms: 900
"#;
    let cfg = parse(yaml).validated().unwrap();
    assert_eq!(cfg.transition(), Duration::from_millis(1200));
}

#[test]
fn parse_noise_warp_defaults() {
    let yaml = r#"
images: ["/slides/a.jpg"]
effect:
  type: noise-warp
"#;
    let cfg = parse(yaml).validated().unwrap();
    assert_eq!(cfg.displacement_map(), None);
    match cfg.effect.select_active(&mut seeded_rng()) {
        ActiveEffect::NoiseWarp {
            noise_scale,
            noise_intensity,
            max_strength,
            easing,
        } => {
            assert!((noise_scale - 3.0).abs() < f32::EPSILON);
            assert!((noise_intensity - 0.1).abs() < f32::EPSILON);
            assert!((max_strength - 1.0).abs() < f32::EPSILON);
            assert_eq!(easing, Easing::SineInOut);
        }
        other => panic!("expected noise warp effect, got {other:?}"),
    }
}

#[test]
fn random_effect_always_resolves() {
    let yaml = r#"
images: ["/slides/a.jpg"]
effect:
  type: random
"#;
    let cfg = parse(yaml).validated().unwrap();
    // Random needs the displacement map resident in case it lands there.
    assert_eq!(cfg.displacement_map(), Some(PathBuf::from("/slides/a.jpg")));
    let mut rng = seeded_rng();
    for _ in 0..32 {
        // Every draw resolves to a concrete variant without panicking.
        let _ = cfg.effect.select_active(&mut rng);
    }
}

#[test]
fn empty_image_list_is_rejected() {
    let cfg: Configuration = serde_yaml::from_str("width: 640").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn transition_longer_than_dwell_is_rejected() {
    let yaml = r#"
images: ["/slides/a.jpg"]
dwell-ms: 1000
transition-ms: 2000
"#;
    let cfg = parse(yaml);
    assert!(cfg.validated().is_err());
}

#[test]
fn nonpositive_noise_options_are_rejected() {
    let yaml = r#"
images: ["/slides/a.jpg"]
effect:
  type: noise-warp
  noise-scale: 0.0
"#;
    let cfg = parse(yaml);
    assert!(cfg.validated().is_err());
}

#[test]
fn load_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "images: [\"/slides/a.jpg\"]").unwrap();
    writeln!(file, "dwell-ms: 2500").unwrap();
    let cfg = Configuration::from_yaml_file(file.path()).unwrap();
    assert_eq!(cfg.dwell_ms, 2500);
}

#[test]
fn missing_file_reports_io_error() {
    let err = Configuration::from_yaml_file("/nonexistent/slider.yaml").unwrap_err();
    assert!(matches!(err, shader_slider::Error::Io(_)));
}
