//! Quality labels and the rendition ladder offered to the user

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DomainError, VariantTrack};

/// A quality choice: automatic adaptation or a fixed vertical resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QualityLabel {
    #[default]
    Auto,
    Height(u32),
}

impl QualityLabel {
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    pub fn height(&self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Height(h) => Some(*h),
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Height(h) => write!(f, "{h}p"),
        }
    }
}

impl FromStr for QualityLabel {
    type Err = DomainError;

    /// Accepts `"auto"` (any case), `"720p"` or a bare `"720"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let digits = s
            .strip_suffix('p')
            .or_else(|| s.strip_suffix('P'))
            .unwrap_or(s);
        match digits.parse::<u32>() {
            Ok(h) if h > 0 => Ok(Self::Height(h)),
            _ => Err(DomainError::parse(format!("Unknown quality label: {s}"))),
        }
    }
}

impl TryFrom<String> for QualityLabel {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualityLabel> for String {
    fn from(value: QualityLabel) -> Self {
        value.to_string()
    }
}

/// Ordered set of renditions available for the bound source.
///
/// Heights are unique and kept highest first; [`QualityLadder::labels`]
/// prepends `auto`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityLadder {
    heights: Vec<u32>,
}

impl QualityLadder {
    pub fn from_heights(heights: impl IntoIterator<Item = u32>) -> Self {
        let unique: BTreeSet<u32> = heights.into_iter().filter(|h| *h > 0).collect();
        Self {
            heights: unique.into_iter().rev().collect(),
        }
    }

    /// Tracks without a known height (audio-only variants) are skipped.
    pub fn from_tracks(tracks: &[VariantTrack]) -> Self {
        Self::from_heights(tracks.iter().filter_map(|t| t.height))
    }

    pub fn heights(&self) -> &[u32] {
        &self.heights
    }

    pub fn labels(&self) -> Vec<QualityLabel> {
        std::iter::once(QualityLabel::Auto)
            .chain(self.heights.iter().map(|h| QualityLabel::Height(*h)))
            .collect()
    }

    pub fn contains(&self, label: &QualityLabel) -> bool {
        match label {
            QualityLabel::Auto => true,
            QualityLabel::Height(h) => self.heights.contains(h),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: u64, height: Option<u32>, bandwidth: u64) -> VariantTrack {
        VariantTrack {
            id,
            height,
            width: None,
            bandwidth,
            active: false,
        }
    }

    #[test]
    fn parses_labels() {
        assert_eq!("auto".parse::<QualityLabel>(), Ok(QualityLabel::Auto));
        assert_eq!("AUTO".parse::<QualityLabel>(), Ok(QualityLabel::Auto));
        assert_eq!("720p".parse::<QualityLabel>(), Ok(QualityLabel::Height(720)));
        assert_eq!("1080".parse::<QualityLabel>(), Ok(QualityLabel::Height(1080)));
        assert!("0p".parse::<QualityLabel>().is_err());
        assert!("hd".parse::<QualityLabel>().is_err());
    }

    #[test]
    fn displays_labels() {
        assert_eq!(QualityLabel::Auto.to_string(), "auto");
        assert_eq!(QualityLabel::Height(480).to_string(), "480p");
    }

    #[test]
    fn ladder_is_unique_and_descending() {
        let tracks = vec![
            track(1, Some(480), 1_400_000),
            track(2, Some(1080), 5_000_000),
            track(3, Some(720), 2_800_000),
            track(4, Some(720), 3_000_000),
            track(5, None, 128_000),
        ];
        let ladder = QualityLadder::from_tracks(&tracks);
        assert_eq!(ladder.heights(), &[1080, 720, 480]);
        assert_eq!(
            ladder.labels(),
            vec![
                QualityLabel::Auto,
                QualityLabel::Height(1080),
                QualityLabel::Height(720),
                QualityLabel::Height(480),
            ]
        );
    }

    #[test]
    fn ladder_contains_auto_even_when_empty() {
        let ladder = QualityLadder::default();
        assert!(ladder.is_empty());
        assert!(ladder.contains(&QualityLabel::Auto));
        assert!(!ladder.contains(&QualityLabel::Height(720)));
    }
}
