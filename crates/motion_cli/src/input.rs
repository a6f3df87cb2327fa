//! Loading configuration and descriptor files
//!
//! Descriptors may be written as TOML or JSON; the format is picked from the
//! file extension.

use anyhow::{Context, Result};
use motion_animation::{EntranceType, MotionDescriptor};
use motion_core::MotionConfig;
use std::fs;
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG: &str = "motion.toml";

/// Load the engine config
///
/// An explicit path must exist. Without one, `motion.toml` is used when
/// present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<MotionConfig> {
    match path {
        Some(path) => MotionConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if default.exists() {
                MotionConfig::load(default).context("Failed to load motion.toml")
            } else {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG);
                Ok(MotionConfig::default())
            }
        }
    }
}

/// Load a descriptor file
pub fn load_descriptor(path: &Path) -> Result<MotionDescriptor> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse descriptor {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse descriptor {}", path.display()))
    }
}

/// Descriptor from a file, else from an entrance name
pub fn resolve_descriptor(file: Option<&Path>, entrance: &str) -> Result<MotionDescriptor> {
    match file {
        Some(path) => load_descriptor(path),
        None => {
            let entrance = EntranceType::parse(entrance).with_context(|| {
                let known: Vec<&str> = EntranceType::ALL.iter().map(|e| e.name()).collect();
                format!("Unknown entrance '{}'. Known entrances: {:?}", entrance, known)
            })?;
            Ok(MotionDescriptor::entrance(entrance))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("motion-cli-{}-{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_entrance_name_resolves() {
        let descriptor = resolve_descriptor(None, "slide-up").unwrap();
        assert_eq!(descriptor.entrance, Some(EntranceType::SlideUp));
        assert!(resolve_descriptor(None, "spin").is_err());
    }

    #[test]
    fn test_descriptor_formats() {
        let toml_path = write_temp("d.toml", "entrance = \"scaleIn\"\n[timing]\nduration = 250\n");
        let descriptor = load_descriptor(&toml_path).unwrap();
        assert_eq!(descriptor.entrance, Some(EntranceType::ScaleIn));
        assert_eq!(descriptor.timing.duration, Some(250));

        let json_path = write_temp("d.json", r#"{"entrance": "bounceIn", "loop": true}"#);
        let descriptor = load_descriptor(&json_path).unwrap();
        assert_eq!(descriptor.entrance, Some(EntranceType::BounceIn));
        assert!(descriptor.looping);

        let _ = fs::remove_file(toml_path);
        let _ = fs::remove_file(json_path);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let missing = std::env::temp_dir().join("motion-cli-does-not-exist.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}
