use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cv::{MatcherOptions, MultiScaleOptions};

/// Matching settings read from a TOML file, every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matcher: MatcherOptions,
    pub multi_scale: MultiScaleOptions,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.multi_scale.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use crate::cv::core::template_matching::MatchTemplateMethod;

    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            r#"
[matcher]
threshold = 0.99

[multi_scale]
step = 0.1
"#,
        )
        .unwrap();
        assert_eq!(config.matcher.method, MatchTemplateMethod::CrossCorrelationNormed);
        assert_eq!(config.matcher.threshold, 0.99);
        assert_eq!(config.multi_scale.min_scale, 0.8);
        assert_eq!(config.multi_scale.step, 0.1);
    }

    #[test]
    fn test_invalid_scale_range_is_rejected() {
        let err = Config::from_toml(
            r#"
[multi_scale]
min_scale = 2.0
max_scale = 1.0
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        println!("{toml}");
        assert_eq!(Config::from_toml(&toml).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("does/not/exist.toml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
