use std::path::PathBuf;

use crate::{Error, LoadMode};

pub const LIBRARY_ENV: &str = "FREEIMAGE_LIBRARY";
pub const LOAD_MODE_ENV: &str = "FREEIMAGE_LOAD_MODE";

#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY: &str = "FreeImage.dll";
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY: &str = "libfreeimage.3.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_LIBRARY: &str = "libfreeimage.so.3";

/// Where and how to load the native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path or bare file name handed to the platform loader.
    pub library_path: PathBuf,
    pub mode: LoadMode,
    /// Passed to `FreeImage_Initialise` by hosts that initialise explicitly.
    pub load_local_plugins_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            library_path: PathBuf::from(DEFAULT_LIBRARY),
            mode: LoadMode::Now,
            load_local_plugins_only: false,
        }
    }
}

impl Config {
    /// Defaults overridden by `FREEIMAGE_LIBRARY` and `FREEIMAGE_LOAD_MODE`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Config::default();
        if let Some(path) = lookup(LIBRARY_ENV).filter(|p| !p.is_empty()) {
            config.library_path = PathBuf::from(path);
        }
        if let Some(mode) = lookup(LOAD_MODE_ENV).filter(|m| !m.is_empty()) {
            config.mode = mode.parse()?;
        }
        Ok(config)
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }
}

impl std::str::FromStr for LoadMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lazy" => Ok(LoadMode::Lazy),
            "now" => Ok(LoadMode::Now),
            "global" => Ok(LoadMode::Global),
            other => Err(Error::InvalidConfig(format!(
                "{LOAD_MODE_ENV}={other} (expected lazy, now or global)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.library_path, PathBuf::from(DEFAULT_LIBRARY));
    }

    #[test]
    fn environment_overrides() {
        let config = Config::from_lookup(|key| match key {
            LIBRARY_ENV => Some("/opt/fi/libfreeimage.so".into()),
            LOAD_MODE_ENV => Some("LAZY".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.library_path, PathBuf::from("/opt/fi/libfreeimage.so"));
        assert_eq!(config.mode, LoadMode::Lazy);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result = Config::from_lookup(|key| (key == LOAD_MODE_ENV).then(|| "eager".into()));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
