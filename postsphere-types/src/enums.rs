use serde::{Deserialize, Serialize};
use std::fmt;

/// Feed ordering offered by the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortMode {
    /// Fetch order, untouched
    #[default]
    #[serde(rename = "recommended")]
    Recommended,
    #[serde(rename = "most liked")]
    MostLiked,
    #[serde(rename = "latest")]
    Latest,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Recommended, SortMode::MostLiked, SortMode::Latest];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Recommended => "recommended",
            SortMode::MostLiked => "most liked",
            SortMode::Latest => "latest",
        }
    }

    /// Accepts the display names plus hyphen/underscore spellings
    /// (`most-liked`, `most_liked`), case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "recommended" => Some(SortMode::Recommended),
            "most liked" => Some(SortMode::MostLiked),
            "latest" => Some(SortMode::Latest),
            _ => None,
        }
    }

    /// Label as shown on the filter buttons ("Most liked").
    pub fn label(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
