//! Content locator submitted by the user to start provisioning
//!
//! The backend accepts a magnet link, a bare 40-character BitTorrent info
//! hash, or any other opaque reference it knows how to resolve. The client
//! only trims the input, rejects blanks, and classifies it for logging.

use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::DomainError;

static INFO_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").expect("valid regex"));

/// What kind of reference a [`ContentLocator`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    Magnet,
    InfoHash,
    Reference,
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Magnet => "magnet",
            Self::InfoHash => "info_hash",
            Self::Reference => "reference",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentLocator {
    value: String,
    kind: LocatorKind,
}

impl ContentLocator {
    /// Parse user input into a locator.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the input is empty after trimming.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let value = input.trim();
        if value.is_empty() {
            return Err(DomainError::validation(
                "content locator cannot be empty (expected a magnet link or info hash)",
            ));
        }

        let kind = if value
            .get(..7)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("magnet:"))
        {
            LocatorKind::Magnet
        } else if INFO_HASH_RE.is_match(value) {
            LocatorKind::InfoHash
        } else {
            LocatorKind::Reference
        };

        Ok(Self {
            value: value.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> LocatorKind {
        self.kind
    }
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for ContentLocator {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentLocator> for String {
    fn from(value: ContentLocator) -> Self {
        value.value
    }
}
