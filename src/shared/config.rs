use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::shared::constants;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config line {line}: expected `key = value`, got {text:?}")]
    Syntax { line: usize, text: String },

    #[error("config line {line}: unknown key {key:?}")]
    UnknownKey { line: usize, key: String },

    #[error("config line {line}: invalid value {value:?} for {key}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },

    #[error("split cutoffs must satisfy 0 <= train ({train}) <= validation ({validation}) <= 1")]
    Cutoffs { train: f64, validation: f64 },
}

/// What the session locator does when a folder holds several candidate files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AmbiguityPolicy {
    /// Refuse the folder with an error
    #[default]
    Strict,
    /// Take the lexicographically last candidate
    Last,
}

impl AmbiguityPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "strict" => Some(Self::Strict),
            "last" => Some(Self::Last),
            _ => None,
        }
    }
}

/// File name patterns identifying a session folder
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorConfig {
    pub annotation_prefix: String,
    pub annotation_extension: String,
    pub video_prefix: String,
    pub video_extension: String,
    pub on_ambiguous: AmbiguityPolicy,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: constants::ANNOTATION_PREFIX.to_string(),
            annotation_extension: constants::ANNOTATION_EXTENSION.to_string(),
            video_prefix: constants::VIDEO_PREFIX.to_string(),
            video_extension: constants::VIDEO_EXTENSION.to_string(),
            on_ambiguous: AmbiguityPolicy::default(),
        }
    }
}

/// Cumulative fractions of the shuffled pool: `[0, train)` goes to train,
/// `[train, validation)` to validation and the rest to test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub train_cutoff: f64,
    pub validation_cutoff: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_cutoff: constants::DEFAULT_TRAIN_CUTOFF,
            validation_cutoff: constants::DEFAULT_VALIDATION_CUTOFF,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = (0.0..=1.0).contains(&self.train_cutoff)
            && (0.0..=1.0).contains(&self.validation_cutoff)
            && self.train_cutoff <= self.validation_cutoff;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::Cutoffs {
                train: self.train_cutoff,
                validation: self.validation_cutoff,
            })
        }
    }

    /// Index cutoffs `(floor(train * n), floor(validation * n))`
    pub fn cutoffs(&self, n: usize) -> (usize, usize) {
        let train = ((self.train_cutoff * n as f64).floor() as usize).min(n);
        let validation = ((self.validation_cutoff * n as f64).floor() as usize).clamp(train, n);
        (train, validation)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepConfig {
    pub seed: Option<u64>,
    pub locator: LocatorConfig,
    pub split: SplitConfig,
}

impl PrepConfig {
    /// Defaults, overlaid with the `key = value` file at `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = path {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            config.apply_str(&content)?;
        }
        Ok(config)
    }

    pub fn apply_str(&mut self, content: &str) -> Result<(), ConfigError> {
        for (idx, raw) in content.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::Syntax {
                    line,
                    text: trimmed.to_string(),
                });
            };
            let (key, value) = (key.trim(), value.trim());
            let invalid = || ConfigError::InvalidValue {
                line,
                key: key.to_string(),
                value: value.to_string(),
            };

            match key {
                "seed" => self.seed = Some(value.parse().map_err(|_| invalid())?),
                "train-cutoff" => self.split.train_cutoff = value.parse().map_err(|_| invalid())?,
                "validation-cutoff" => {
                    self.split.validation_cutoff = value.parse().map_err(|_| invalid())?
                }
                "annotation-prefix" => self.locator.annotation_prefix = value.to_string(),
                "annotation-extension" => self.locator.annotation_extension = value.to_string(),
                "video-prefix" => self.locator.video_prefix = value.to_string(),
                "video-extension" => self.locator.video_extension = value.to_string(),
                "on-ambiguous" => {
                    self.locator.on_ambiguous = AmbiguityPolicy::parse(value).ok_or_else(invalid)?
                }
                _ => {
                    return Err(ConfigError::UnknownKey {
                        line,
                        key: key.to_string(),
                    })
                }
            }
        }

        self.split.validate()
    }

    /// Random source for the run: seeded when a seed is configured.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults_match_historical_layout() {
        let config = PrepConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.locator.annotation_prefix, "annotations");
        assert_eq!(config.locator.video_prefix, "cam");
        assert_eq!(config.locator.on_ambiguous, AmbiguityPolicy::Strict);
        assert_eq!(config.split.cutoffs(100), (70, 85));
    }

    #[test]
    fn test_apply_key_values() {
        let mut config = PrepConfig::default();
        config
            .apply_str(
                "# dataset prep\n\nseed = 7\ntrain-cutoff = 0.5\nvalidation-cutoff=0.75\non-ambiguous = last\nvideo-extension = avi\n",
            )
            .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.split.cutoffs(8), (4, 6));
        assert_eq!(config.locator.on_ambiguous, AmbiguityPolicy::Last);
        assert_eq!(config.locator.video_extension, "avi");
    }

    #[test]
    fn test_rejects_bad_lines() {
        let mut config = PrepConfig::default();
        assert!(matches!(
            config.apply_str("seed 7"),
            Err(ConfigError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            config.apply_str("\ncolor = blue"),
            Err(ConfigError::UnknownKey { line: 2, .. })
        ));
        assert!(matches!(
            config.apply_str("seed = many"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.apply_str("train-cutoff = 0.9\nvalidation-cutoff = 0.8"),
            Err(ConfigError::Cutoffs { .. })
        ));
    }

    #[test]
    fn test_cutoffs_small_pools() {
        let split = SplitConfig::default();
        assert_eq!(split.cutoffs(0), (0, 0));
        assert_eq!(split.cutoffs(1), (0, 0));
        assert_eq!(split.cutoffs(10), (7, 8));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = PrepConfig {
            seed: Some(42),
            ..PrepConfig::default()
        };
        let mut r1 = config.rng();
        let mut r2 = config.rng();
        assert_eq!(r1.gen::<u64>(), r2.gen::<u64>());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = PrepConfig::load(Some(Path::new("/nonexistent/handclip.config"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
