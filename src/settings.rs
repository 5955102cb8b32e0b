//! Persistent engine settings stored as a plain `key=value` file.
//!
//! ```text
//! # rasterlayers settings
//! gamma_blending=true
//! composer=default
//! interpolation=bilinear
//! log_file=/tmp/rasterlayers.log
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::composer::{Composer, DefaultComposer, TiledComposer};
use crate::error::{Error, Result};
use crate::ops::transform::Interpolation;

/// Which composer an image built from these settings uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComposerKind {
    #[default]
    Default,
    Tiled,
}

impl ComposerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ComposerKind::Default => "default",
            ComposerKind::Tiled => "tiled",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    pub gamma_blending: bool,
    pub composer: ComposerKind,
    /// Filter used when a composer or selection resamples.
    pub interpolation: Interpolation,
    /// Session log location; `None` uses the platform data directory.
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Parse a settings document. Blank lines and `#` comments are skipped;
    /// unknown keys and malformed values are rejected.
    pub fn parse(content: &str) -> Result<Self> {
        let mut s = Self::default();
        for (n, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                return Err(Error::invalid(format!("line {}: expected key=value, got '{}'", n + 1, line)));
            };
            let key = key.trim();
            let val = val.trim();
            match key {
                "gamma_blending" => {
                    s.gamma_blending = parse_bool(val)
                        .ok_or_else(|| Error::invalid(format!("line {}: gamma_blending must be true or false", n + 1)))?;
                }
                "composer" => {
                    s.composer = match val {
                        "default" => ComposerKind::Default,
                        "tiled" => ComposerKind::Tiled,
                        other => return Err(Error::invalid(format!("line {}: unknown composer '{}'", n + 1, other))),
                    };
                }
                "interpolation" => {
                    s.interpolation = Interpolation::from_name(val)
                        .ok_or_else(|| Error::invalid(format!("line {}: unknown interpolation '{}'", n + 1, val)))?;
                }
                "log_file" => {
                    s.log_file = (!val.is_empty()).then(|| PathBuf::from(val));
                }
                other => return Err(Error::invalid(format!("line {}: unknown setting '{}'", n + 1, other))),
            }
        }
        Ok(s)
    }

    /// Load from disk. A missing file is an error here; callers that want
    /// defaults should check for existence first.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn to_config_string(&self) -> String {
        let mut content = format!(
            "gamma_blending={}\n\
             composer={}\n\
             interpolation={}\n",
            self.gamma_blending,
            self.composer.name(),
            self.interpolation.name(),
        );
        if let Some(path) = &self.log_file {
            content.push_str(&format!("log_file={}\n", path.display()));
        }
        content
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_config_string())?;
        Ok(())
    }

    pub fn build_composer(&self) -> Box<dyn Composer> {
        match self.composer {
            ComposerKind::Default => Box::new(DefaultComposer::with_gamma_blending(self.gamma_blending)),
            ComposerKind::Tiled => Box::new(TiledComposer { interpolation: self.interpolation }),
        }
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_all_keys_with_comments() {
        let s = Settings::parse(
            "# engine\n\ngamma_blending = true\ncomposer=tiled\ninterpolation=Lanczos3\nlog_file=/tmp/x.log\n",
        )
        .unwrap();
        assert!(s.gamma_blending);
        assert_eq!(s.composer, ComposerKind::Tiled);
        assert_eq!(s.interpolation, Interpolation::Lanczos3);
        assert_eq!(s.log_file, Some(PathBuf::from("/tmp/x.log")));
    }

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(Settings::parse("").unwrap(), Settings::default());
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        for doc in ["colour=red", "gamma_blending=maybe", "composer=fancy", "interpolation=box", "no equals sign"] {
            let err = Settings::parse(doc).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{doc}");
        }
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("rasterlayers.cfg");
        let s = Settings {
            gamma_blending: true,
            composer: ComposerKind::Default,
            interpolation: Interpolation::Nearest,
            log_file: None,
        };
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn missing_file_is_runtime_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Settings::load(&dir.path().join("absent.cfg")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn builds_the_configured_composer() {
        let mut s = Settings::default();
        assert_eq!(s.build_composer().name(), "default");
        s.composer = ComposerKind::Tiled;
        assert_eq!(s.build_composer().name(), "tiled");
    }
}
