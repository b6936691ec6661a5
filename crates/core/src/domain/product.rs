use std::fmt;

use serde::{Deserialize, Serialize};

/// Metal finishes a catalog item is photographed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Yellow,
    Rose,
    White,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Yellow, Color::Rose, Color::White];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Rose => "rose",
            Self::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yellow" => Ok(Self::Yellow),
            "rose" => Ok(Self::Rose),
            "white" => Ok(Self::White),
            other => Err(format!("unsupported color `{other}` (expected yellow|rose|white)")),
        }
    }
}

/// Image reference per color. All three keys are required on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImages {
    pub yellow: String,
    pub rose: String,
    pub white: String,
}

impl ProductImages {
    pub fn get(&self, color: Color) -> &str {
        match color {
            Color::Yellow => &self.yellow,
            Color::Rose => &self.rose,
            Color::White => &self.white,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub name: String,
    pub popularity_score: f64,
    pub weight: f64,
    pub images: ProductImages,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordIssue {
    EmptyName,
    NonPositiveWeight,
    PopularityOutOfRange,
    MissingImage(Color),
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => f.write_str("name is empty"),
            Self::NonPositiveWeight => f.write_str("weight must be greater than zero"),
            Self::PopularityOutOfRange => f.write_str("popularityScore must be within [0, 1]"),
            Self::MissingImage(color) => write!(f, "image reference for `{color}` is empty"),
        }
    }
}

impl ProductRecord {
    /// Catalog hygiene checks used by operator tooling. The request path
    /// serves records regardless of what this reports.
    pub fn validate(&self) -> Vec<RecordIssue> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(RecordIssue::EmptyName);
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            issues.push(RecordIssue::NonPositiveWeight);
        }
        if !(0.0..=1.0).contains(&self.popularity_score) {
            issues.push(RecordIssue::PopularityOutOfRange);
        }
        for color in Color::ALL {
            if self.images.get(color).trim().is_empty() {
                issues.push(RecordIssue::MissingImage(color));
            }
        }

        issues
    }
}

/// A catalog record with the fields derived for one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedProduct {
    #[serde(flatten)]
    pub record: ProductRecord,
    pub price: f64,
    pub star_rating: f64,
    pub gold_price: f64,
}
