// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Effective settings: built-in defaults, then the configuration file, then
// command-line flags.

use std::path::PathBuf;

use tracewerk_core::ConversionConfig;
use tracewerk_core::error::Result;
use tracing::debug;

use crate::cli::{ConversionArgs, ThresholdArg};

/// Configuration resolved for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config: ConversionConfig,
    pub auto_threshold: bool,
    pub preview: bool,
}

/// Per-user configuration directory.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("tracewerk");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("tracewerk");
    }
    PathBuf::from(".tracewerk")
}

/// `config.json` inside [`config_dir`], read when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load the configuration file (explicit or per-user, if present) and apply
/// the flags on top.
pub fn resolve(args: &ConversionArgs) -> Result<Settings> {
    let base = match &args.config {
        Some(path) => ConversionConfig::load(path)?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(path = %path.display(), "Loading user configuration");
                ConversionConfig::load(&path)?
            } else {
                ConversionConfig::default()
            }
        }
    };
    Ok(apply_overrides(base, args))
}

/// Flags win over file values; unset flags leave them alone.
pub fn apply_overrides(mut config: ConversionConfig, args: &ConversionArgs) -> Settings {
    let mut auto_threshold = false;
    match args.threshold {
        Some(ThresholdArg::Fixed(value)) => config.threshold = value,
        Some(ThresholdArg::Auto) => auto_threshold = true,
        None => {}
    }
    if let Some(blur) = args.blur {
        config.blur = blur;
    }
    if args.invert {
        config.invert = true;
    }
    if let Some(policy) = args.turn_policy {
        config.turn_policy = policy.into();
    }
    if let Some(area) = args.speckle_area {
        config.speckle_area = area;
    }
    if let Some(precision) = args.precision {
        config.precision = precision;
    }
    Settings {
        config,
        auto_threshold,
        preview: args.preview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TurnPolicyArg;
    use tracewerk_core::TurnPolicy;

    #[test]
    fn no_flags_keep_the_file_values() {
        let base = ConversionConfig {
            threshold: 140,
            ..ConversionConfig::default()
        };
        let settings = apply_overrides(base.clone(), &ConversionArgs::default());
        assert_eq!(settings.config, base);
        assert!(!settings.auto_threshold);
        assert!(!settings.preview);
    }

    #[test]
    fn flags_override_the_file() {
        let args = ConversionArgs {
            threshold: Some(ThresholdArg::Fixed(90)),
            blur: Some(3),
            invert: true,
            turn_policy: Some(TurnPolicyArg::Right),
            speckle_area: Some(2.0),
            precision: Some(1),
            preview: true,
            ..ConversionArgs::default()
        };
        let settings = apply_overrides(ConversionConfig::default(), &args);
        assert_eq!(settings.config.threshold, 90);
        assert_eq!(settings.config.blur, 3);
        assert!(settings.config.invert);
        assert_eq!(settings.config.turn_policy, TurnPolicy::Right);
        assert_eq!(settings.config.speckle_area, 2.0);
        assert_eq!(settings.config.precision, 1);
        assert!(settings.preview);
    }

    #[test]
    fn auto_threshold_keeps_the_configured_value() {
        let args = ConversionArgs {
            threshold: Some(ThresholdArg::Auto),
            ..ConversionArgs::default()
        };
        let settings = apply_overrides(ConversionConfig::default(), &args);
        assert!(settings.auto_threshold);
        assert_eq!(settings.config.threshold, 100);
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tracewerk.json");
        std::fs::write(&path, r#"{ "threshold": 180, "foreground": "navy" }"#).expect("write");

        let args = ConversionArgs {
            config: Some(path),
            blur: Some(1),
            ..ConversionArgs::default()
        };
        let settings = resolve(&args).expect("resolve");
        assert_eq!(settings.config.threshold, 180);
        assert_eq!(settings.config.foreground, "navy");
        assert_eq!(settings.config.blur, 1);
    }
}
