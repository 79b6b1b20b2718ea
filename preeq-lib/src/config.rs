// Copyright 2026 The preeq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Configuration
//!
//! Defaults are compiled in and match the hardware this was first built for: 63 taps, 30 bits of
//! quantization and a consumer shift of 24.  A TOML file can override any of them, and the CLI can
//! override the file.
//!
//! ## Precedence Rules
//!
//! 1. An explicit path (the CLI `--config` flag).  It must exist.
//! 2. `PREEQ_CONFIG`, pointing at a file.  Also must exist.
//! 3. `preeq/config.toml` below the user's config directory, if present.
//! 4. Built-in defaults.
//!
//! ## Format
//!
//! ```toml
//! [design]
//! taps = 63
//! scale_shift = 30
//! fir_shift = 24
//! response_points = 512
//! output = "fir_coeff.h"
//!
//! [noise]
//! threads = 4
//! buffer_log2 = 17
//! buffers = 8
//! seed = 1
//! output = "noise.dat"
//! ```
//!
//! Every key is optional.  Unknown keys are reported and ignored.

use std::path::{Path, PathBuf};

use crate::{PreeqError, dsp::DesignArgs, emit, histogram, noise::NoiseArgs};

/// Environment override for the configuration file.
pub const CONFIG_ENV: &str = "PREEQ_CONFIG";

/// Fully merged settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PreeqConfig {
    pub design: DesignArgs,
    /// Where the header goes.
    pub header_path: PathBuf,
    pub noise: NoiseArgs,
    /// LFSR starting state.
    pub seed: u64,
    /// Where noise goes and where the histogram reads by default.
    pub noise_path: PathBuf,
}

impl Default for PreeqConfig {
    fn default() -> Self {
        PreeqConfig {
            design: DesignArgs::default(),
            header_path: PathBuf::from(emit::DEFAULT_HEADER),
            noise: NoiseArgs::default(),
            seed: 1,
            noise_path: PathBuf::from(histogram::DEFAULT_INPUT),
        }
    }
}

impl PreeqConfig {
    /// Load following the precedence rules.  `explicit` comes from the command line.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PreeqError> {
        let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit, env.as_deref(), Self::user_path().as_deref())
    }

    /// Precedence resolution with the environment and user directory passed in.  `user` is only
    /// read when it names an existing file.
    pub fn load_from(
        explicit: Option<&Path>,
        env: Option<&Path>,
        user: Option<&Path>,
    ) -> Result<Self, PreeqError> {
        if let Some(path) = explicit.or(env) {
            return Self::from_file(path);
        }

        match user.filter(|p| p.is_file()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// The user-level config file location, whether or not it exists.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("preeq").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, PreeqError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PreeqError::input(path.display().to_string(), e))?;
        log::debug!("reading config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Merge a TOML document over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, PreeqError> {
        let parsed: toml::Value =
            toml::from_str(text).map_err(|e| PreeqError::Config(e.to_string()))?;
        let root = parsed
            .as_table()
            .ok_or_else(|| PreeqError::Config("top level must be a table".to_owned()))?;

        let mut cfg = Self::default();
        for (key, value) in root {
            match key.as_str() {
                "design" => cfg.merge_design(section(key, value)?)?,
                "noise" => cfg.merge_noise(section(key, value)?)?,
                other => log::warn!("ignoring unknown config section [{other}]"),
            }
        }
        Ok(cfg)
    }

    fn merge_design(&mut self, table: &toml::Table) -> Result<(), PreeqError> {
        for (key, value) in table {
            let at = format!("design.{key}");
            match key.as_str() {
                "taps" => self.design.taps = integer(&at, value)?,
                "scale_shift" => self.design.scale_shift = integer(&at, value)?,
                "fir_shift" => self.design.fir_shift = integer(&at, value)?,
                "response_points" => self.design.response_points = integer(&at, value)?,
                "output" => self.header_path = path(&at, value)?,
                _ => log::warn!("ignoring unknown config key {at}"),
            }
        }
        Ok(())
    }

    fn merge_noise(&mut self, table: &toml::Table) -> Result<(), PreeqError> {
        for (key, value) in table {
            let at = format!("noise.{key}");
            match key.as_str() {
                "threads" => self.noise.threads = integer(&at, value)?,
                "buffer_log2" => self.noise.buffer_log2 = integer(&at, value)?,
                "buffers" => self.noise.buffers = integer(&at, value)?,
                "seed" => self.seed = integer(&at, value)?,
                "output" => self.noise_path = path(&at, value)?,
                _ => log::warn!("ignoring unknown config key {at}"),
            }
        }
        Ok(())
    }
}

fn section<'a>(key: &str, value: &'a toml::Value) -> Result<&'a toml::Table, PreeqError> {
    value
        .as_table()
        .ok_or_else(|| PreeqError::Config(format!("[{key}] must be a table")))
}

fn integer<T: TryFrom<i64>>(at: &str, value: &toml::Value) -> Result<T, PreeqError> {
    let raw = value
        .as_integer()
        .ok_or_else(|| PreeqError::Config(format!("{at} must be an integer")))?;
    T::try_from(raw).map_err(|_| PreeqError::Config(format!("{at} = {raw} is out of range")))
}

fn path(at: &str, value: &toml::Value) -> Result<PathBuf, PreeqError> {
    value
        .as_str()
        .map(PathBuf::from)
        .ok_or_else(|| PreeqError::Config(format!("{at} must be a string")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_empty_is_default() {
        assert_eq!(
            PreeqConfig::from_toml_str("").unwrap(),
            PreeqConfig::default()
        );
    }

    #[test]
    fn test_config_overrides() {
        let cfg = PreeqConfig::from_toml_str(
            r#"
            [design]
            taps = 31
            scale_shift = 28
            output = "out/coeffs.h"

            [noise]
            threads = 2
            seed = 12345
            "#,
        )
        .unwrap();

        assert_eq!(cfg.design.taps, 31);
        assert_eq!(cfg.design.scale_shift, 28);
        // untouched
        assert_eq!(cfg.design.fir_shift, 24);
        assert_eq!(cfg.design.response_points, 512);
        assert_eq!(cfg.header_path, PathBuf::from("out/coeffs.h"));
        assert_eq!(cfg.noise.threads, 2);
        assert_eq!(cfg.noise.buffer_log2, 17);
        assert_eq!(cfg.seed, 12345);
        assert_eq!(cfg.noise_path, PathBuf::from("noise.dat"));
    }

    #[test]
    fn test_config_unknown_keys_ignored() {
        let cfg = PreeqConfig::from_toml_str(
            r#"
            [plot]
            enabled = true

            [design]
            window = "hann"
            "#,
        )
        .unwrap();
        assert_eq!(cfg, PreeqConfig::default());
    }

    #[test]
    fn test_config_type_errors() {
        for text in [
            "design = 3",
            "[design]\ntaps = \"many\"",
            "[design]\ntaps = -3",
            "[noise]\nbuffer_log2 = 99999999999",
            "[noise]\noutput = 7",
            "this is not toml",
        ] {
            assert!(
                matches!(
                    PreeqConfig::from_toml_str(text),
                    Err(PreeqError::Config(_))
                ),
                "{text}"
            );
        }
    }

    /// Temp TOML file removed on drop.
    struct TempConfig(PathBuf);

    impl TempConfig {
        fn new(tag: &str, text: &str) -> Self {
            let path = std::env::temp_dir()
                .join(format!("preeq-config-{tag}-{}.toml", std::process::id()));
            std::fs::write(&path, text).unwrap();
            TempConfig(path)
        }
    }

    impl Drop for TempConfig {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_config_precedence() {
        let explicit = TempConfig::new("explicit", "[design]\ntaps = 11\n");
        let env = TempConfig::new("env", "[design]\ntaps = 21\n");
        let user = TempConfig::new("user", "[design]\ntaps = 31\n");
        let missing = Path::new("/nonexistent/preeq/config.toml");

        let taps = |e: Option<&Path>, v: Option<&Path>, u: Option<&Path>| {
            PreeqConfig::load_from(e, v, u).unwrap().design.taps
        };

        let (e, v, u) = (explicit.0.as_path(), env.0.as_path(), user.0.as_path());

        assert_eq!(taps(Some(e), Some(v), Some(u)), 11);
        assert_eq!(taps(None, Some(v), Some(u)), 21);
        assert_eq!(taps(None, None, Some(u)), 31);
        // An absent user file is not an error
        assert_eq!(taps(None, None, Some(missing)), 63);
        assert_eq!(taps(None, None, None), 63);

        // The environment must name a real file
        let err = PreeqConfig::load_from(None, Some(missing), Some(u)).unwrap_err();
        assert!(matches!(err, PreeqError::InputReadFailure { .. }));
    }

    #[test]
    fn test_config_env_var() {
        let env = TempConfig::new("env-var", "[noise]\nseed = 99\n");
        let explicit = TempConfig::new("env-var-explicit", "[noise]\nseed = 7\n");

        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var(CONFIG_ENV, &env.0) };
        let from_env = PreeqConfig::load(None);
        let from_explicit = PreeqConfig::load(Some(explicit.0.as_path()));
        unsafe { std::env::set_var(CONFIG_ENV, "/nonexistent/preeq/env.toml") };
        let from_missing = PreeqConfig::load(None);
        unsafe { std::env::remove_var(CONFIG_ENV) };

        assert_eq!(from_env.unwrap().seed, 99);
        assert_eq!(from_explicit.unwrap().seed, 7);
        assert!(matches!(
            from_missing,
            Err(PreeqError::InputReadFailure { .. })
        ));
    }

    #[test]
    fn test_config_explicit_missing() {
        let explicit = Path::new("/nonexistent/preeq.toml");
        let err = PreeqConfig::load_from(Some(explicit), None, None).unwrap_err();
        assert!(matches!(err, PreeqError::InputReadFailure { .. }));
    }
}
