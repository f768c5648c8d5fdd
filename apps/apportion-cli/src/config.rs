//! CLI settings.
//!
//! Layered with the `config` crate, later sources winning:
//!
//! ```text
//! built-in defaults  ◄──  apportion.toml (or --config)  ◄──  APPORTION_* env
//! ```
//!
//! Nested keys use a double underscore in the environment, for example
//! `APPORTION_LIMITS__MAX_LINE_ITEMS=500` or `APPORTION_LIMITS__MAX_AMOUNT=1000000`.

use std::path::{Path, PathBuf};

use apportion_core::Currency;
use apportion_engine::EngineOptions;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "apportion.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Request limits enforced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_line_items: usize,
    pub max_quantity: u64,
    pub max_components: usize,
    /// Ceiling for any single amount, in major currency units.
    pub max_amount: u64,
}

impl Default for Limits {
    fn default() -> Self {
        let engine = EngineOptions::default();
        Limits {
            max_line_items: engine.max_line_items,
            max_quantity: apportion_core::MAX_ITEM_QUANTITY.unsigned_abs(),
            max_components: engine.max_components,
            max_amount: apportion_core::MAX_AMOUNT.unsigned_abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Currency for requests that name none.
    pub default_currency: String,

    /// Tax country for requests that name none.
    pub default_country: String,

    /// Catalog fixture; `--catalog` overrides it.
    pub catalog_path: Option<PathBuf>,

    pub limits: Limits,
}

impl Default for Settings {
    fn default() -> Self {
        let engine = EngineOptions::default();
        Settings {
            default_currency: engine.default_currency,
            default_country: engine.default_country,
            catalog_path: None,
            limits: Limits::default(),
        }
    }
}

impl Settings {
    /// Loads settings from the optional file and the environment.
    ///
    /// An explicit `config_path` must exist; the default file may be absent.
    pub fn load(config_path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match config_path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("APPORTION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if Currency::from_code(&self.default_currency).is_err() {
            return Err(SettingsError::InvalidValue {
                key: "default_currency".to_string(),
                reason: format!("unsupported currency code '{}'", self.default_currency),
            });
        }
        if self.default_country.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                key: "default_country".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let limits = [
            ("limits.max_line_items", self.limits.max_line_items as u64),
            ("limits.max_quantity", self.limits.max_quantity),
            ("limits.max_components", self.limits.max_components as u64),
            ("limits.max_amount", self.limits.max_amount),
        ];
        for (key, value) in limits {
            if value == 0 {
                return Err(SettingsError::InvalidValue {
                    key: key.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn to_engine_options(&self) -> EngineOptions {
        EngineOptions {
            default_currency: self.default_currency.to_ascii_uppercase(),
            default_country: self.default_country.to_ascii_uppercase(),
            max_line_items: self.limits.max_line_items,
            max_quantity: Decimal::from(self.limits.max_quantity),
            max_components: self.limits.max_components,
            max_amount: Decimal::from(self.limits.max_amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings, SettingsError> {
        Settings::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults_match_engine() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.to_engine_options(), EngineOptions::default());
    }

    #[test]
    fn test_file_overrides() {
        let settings = from_toml(
            r#"
            default_currency = "vnd"
            catalog_path = "fixtures/catalog.json"

            [limits]
            max_line_items = 500
            max_amount = 1000000
            "#,
        )
        .unwrap();

        let options = settings.to_engine_options();
        assert_eq!(options.default_currency, "VND");
        assert_eq!(options.max_line_items, 500);
        assert_eq!(options.max_components, apportion_core::MAX_COMPONENTS);
        assert_eq!(options.max_amount, Decimal::from(1_000_000));
        assert_eq!(settings.catalog_path, Some(PathBuf::from("fixtures/catalog.json")));
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = from_toml(r#"default_currency = "XYZ""#).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "default_currency"));

        let err = from_toml("[limits]\nmax_quantity = 0").unwrap_err();
        assert!(err.to_string().contains("limits.max_quantity"));

        assert!(matches!(from_toml("[limits]\nmax_line_items = \"many\""), Err(SettingsError::Load(_))));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let missing = Path::new("does/not/exist/apportion.toml");
        assert!(Settings::load(Some(missing)).is_err());
    }
}
