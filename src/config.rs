//! Tunable policies for number formatting, reading, and writing.
//!
//! Every section has defaults, so an empty TOML document is a valid config:
//!
//! ```toml
//! [number]
//! rounding_rule = 29
//!
//! [write]
//! max_line_length = 80
//! ```

use serde::Deserialize;

use crate::status::Result;
use crate::value::number::{self, Number};
use crate::value::Value;

/// Errors loading a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Precision policy for numbers built from doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    /// Largest integer the uncertainty digits may form (the "rule of 19").
    pub rounding_rule: u32,
    /// Zeros allowed after the decimal point before exponent notation.
    pub max_leading_zeroes: u32,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            rounding_rule: number::DEFAULT_ROUNDING_RULE,
            max_leading_zeroes: number::DEFAULT_MAX_LEADING_ZEROES,
        }
    }
}

impl NumberFormat {
    /// A number value with precision derived from `su` under this policy.
    pub fn number(&self, value: f64, su: f64) -> Result<Value> {
        Number::auto(value, su, self.rounding_rule, self.max_leading_zeroes).map(Value::Number)
    }

    /// A number value rendered at an explicit decimal `scale`.
    pub fn number_with_scale(&self, value: f64, su: f64, scale: i32) -> Result<Value> {
        Number::with_scale(value, su, scale, self.max_leading_zeroes).map(Value::Number)
    }
}

/// Reader behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Accept `save_` frames inside data blocks.
    pub allow_frames: bool,
    /// Turn unquoted numeric text into number values.
    pub numbers: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_frames: true,
            numbers: true,
        }
    }
}

/// Writer behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Emit the `#\#CIF_2.0` magic comment.
    pub header: bool,
    /// Loop rows wrap before exceeding this many characters.
    pub max_line_length: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            header: true,
            max_line_length: 2048,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub number: NumberFormat,
    pub parse: ParseOptions,
    pub write: WriteOptions,
}

impl Config {
    /// Load from TOML text; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.number.rounding_rule < 2 {
            return Err(ConfigError::Invalid(format!(
                "number.rounding_rule must be at least 2, got {}",
                self.number.rounding_rule
            )));
        }
        if self.write.max_line_length < 80 {
            return Err(ConfigError::Invalid(format!(
                "write.max_line_length must be at least 80, got {}",
                self.write.max_line_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [number]
            rounding_rule = 99

            [parse]
            numbers = false
            "#,
        )
        .unwrap();
        assert_eq!(config.number.rounding_rule, 99);
        assert_eq!(config.number.max_leading_zeroes, 5);
        assert!(!config.parse.numbers);
        assert!(config.parse.allow_frames);
        assert_eq!(config.write, WriteOptions::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_toml_str("[number]\nrounding_rule = 1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[write]\nmax_line_length = 10"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[number]\nrounding_rule = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn number_format_policy() {
        let wide = NumberFormat {
            rounding_rule: 99,
            ..Default::default()
        };
        let v = wide.number(6.022140857, 74e-9).unwrap();
        assert_eq!(v.to_text(), Some("6.022140857(74)"));
        let v = NumberFormat::default().number(6.022140857, 74e-9).unwrap();
        assert_eq!(v.to_text(), Some("6.02214086(7)"));
        let v = NumberFormat::default()
            .number_with_scale(1.5, 0.0, 3)
            .unwrap();
        assert_eq!(v.to_text(), Some("1.500"));
    }
}
