//! Domain types shared across the search pipeline
use crate::styles::Difficulty;
use serde::{Deserialize, Serialize};

/// One artist entry as presented to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub studio: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub hourly_rate: Option<u32>,
}

/// Count of results sharing one facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// Filterable dimensions tallied over the current result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    pub styles: Vec<FacetCount>,
    pub cities: Vec<FacetCount>,
    pub difficulty: Vec<FacetCount>,
}

/// A follow-up search offered to the user, typically on thin result sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// A style whose name or alias matched the free-text term.
    Style { style: String },
    /// Retry with fewer active filters.
    FewerFilters,
    /// Retry with a wider search radius.
    WidenRadius { radius_km: f64 },
    /// A style common in the current results but not yet selected.
    AlsoSearch { style: String },
}

/// Post-processed outcome of one executed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<Artist>,
    pub total_count: usize,
    pub facets: Facets,
    pub suggestions: Vec<Suggestion>,
}

impl Artist {
    /// Difficulty labels implied by this artist's styles.
    pub fn difficulties(&self) -> Vec<Difficulty> {
        let mut out: Vec<Difficulty> = self
            .styles
            .iter()
            .filter_map(|s| crate::styles::style_difficulty(s))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
