use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// A validated, normalised hex colour value.
///
/// Clients may submit colours with or without a leading `#` and in any case. The canonical form stored in the
/// database and compared against the price table is always `#rrggbb` in lowercase.
#[derive(Debug, Clone, Type, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct HexColor(String);

#[derive(Debug, Clone, Error)]
pub enum ColorError {
    #[error("Colour value is empty")]
    Empty,
    #[error("'{0}' is not a valid hex colour")]
    InvalidFormat(String),
}

impl HexColor {
    /// Parse and normalise a client-supplied colour string. Accepts `aabbcc`, `#AABBCC` and everything in between.
    pub fn parse(value: &str) -> Result<Self, ColorError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ColorError::Empty);
        }
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidFormat(value.to_string()));
        }
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for HexColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
