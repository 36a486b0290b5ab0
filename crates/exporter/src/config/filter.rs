//! Optional regex deciding which entities a metric category covers.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

/// An absent pattern disables the category; a present one is matched
/// (unanchored) against each entity's subject.
#[derive(Debug, Clone, Default)]
pub struct Filter(Option<Regex>);

impl Filter {
    pub fn off() -> Self {
        Self(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    pub fn matches(&self, subject: &str) -> bool {
        self.0
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(subject))
    }
}

impl FromStr for Filter {
    type Err = regex::Error;

    /// `""`, `off`, `none` and `false` (any case) disable the filter.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        if matches!(normalized.as_str(), "" | "off" | "none" | "false") {
            return Ok(Self::off());
        }
        Regex::new(value).map(|pattern| Self(Some(pattern)))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(pattern) => f.write_str(pattern.as_str()),
            None => f.write_str("off"),
        }
    }
}
