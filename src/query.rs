//! Immutable search query model with canonical cache keys and URL round-trip
use crate::error::{Result, SearchError};
use crate::styles::Difficulty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

/// Result ordering requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Rating,
    Distance,
    Newest,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Rating => "rating",
            SortBy::Distance => "distance",
            SortBy::Newest => "newest",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "relevance" => Some(SortBy::Relevance),
            "rating" => Some(SortBy::Rating),
            "distance" => Some(SortBy::Distance),
            "newest" => Some(SortBy::Newest),
            _ => None,
        }
    }
}

/// Artist availability window filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Now,
    ThisWeek,
    ThisMonth,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Now => "now",
            Availability::ThisWeek => "this_week",
            Availability::ThisMonth => "this_month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "now" => Some(Availability::Now),
            "this_week" => Some(Availability::ThisWeek),
            "this_month" => Some(Availability::ThisMonth),
            _ => None,
        }
    }
}

/// Structured location filter. Exactly one representation at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationFilter {
    Postcode(String),
    City(String),
    Coordinates { lat: f64, lng: f64 },
}

impl LocationFilter {
    /// Canonical token used inside cache keys: stable across restarts for
    /// logically identical locations.
    pub fn canonical_token(&self) -> String {
        match self {
            LocationFilter::Postcode(pc) => {
                format!("pc:{}", pc.trim().to_uppercase().replace(' ', ""))
            }
            LocationFilter::City(city) => format!("city:{}", city.trim().to_lowercase()),
            LocationFilter::Coordinates { lat, lng } => format!("geo:{lat:.5},{lng:.5}"),
        }
    }
}

/// Hourly price range filter in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    pub fn canonical_token(&self) -> String {
        format!("{}-{}", self.min, self.max)
    }
}

/// One parameterized search. Immutable: every `with_*` method returns a new
/// instance, so snapshots held by history and analytics never change under
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub styles: Vec<String>,
    pub location: Option<LocationFilter>,
    pub difficulty: Vec<Difficulty>,
    pub sort_by: SortBy,
    pub page: u32,
    pub limit: u32,
    pub radius_km: Option<f64>,
    pub price_range: Option<PriceRange>,
    pub availability: Option<Availability>,
    pub min_rating: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            styles: Vec::new(),
            location: None,
            difficulty: Vec::new(),
            sort_by: SortBy::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            radius_km: None,
            price_range: None,
            availability: None,
            min_rating: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into().trim().to_string();
        self
    }

    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = std::collections::HashSet::new();
        self.styles = styles
            .into_iter()
            .map(|s| s.into().trim().to_lowercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        self
    }

    pub fn with_location(mut self, location: LocationFilter) -> Self {
        self.location = Some(location);
        self
    }

    pub fn without_location(mut self) -> Self {
        self.location = None;
        self
    }

    pub fn with_difficulty<I>(mut self, difficulty: I) -> Self
    where
        I: IntoIterator<Item = Difficulty>,
    {
        let mut seen = std::collections::HashSet::new();
        self.difficulty = difficulty.into_iter().filter(|d| seen.insert(*d)).collect();
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, 100);
        self
    }

    pub fn with_radius_km(mut self, radius: f64) -> Self {
        self.radius_km = Some(radius);
        self
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = Some(range);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn with_min_rating(mut self, rating: f32) -> Self {
        self.min_rating = Some(rating.clamp(0.0, 5.0));
        self
    }

    /// True if anything beyond a default, empty query is set. Free text
    /// counts: a text-only search is still a search worth remembering.
    pub fn has_filters(&self) -> bool {
        !self.text.is_empty()
            || !self.styles.is_empty()
            || self.location.is_some()
            || !self.difficulty.is_empty()
            || self.radius_km.is_some()
            || self.price_range.is_some()
            || self.availability.is_some()
            || self.min_rating.is_some()
    }

    /// Drop all structured filters, keeping only free text.
    pub fn cleared_filters(&self) -> Self {
        SearchQuery::new(self.text.clone())
    }

    /// Canonical key for cache and deduplication lookups.
    ///
    /// Pure and order-independent over set-valued fields: two structurally
    /// equal queries built with different insertion orders yield the same key.
    /// `created_at` is deliberately excluded so the key is stable across
    /// restarts.
    pub fn cache_key(&self) -> String {
        let mut styles = self.styles.clone();
        styles.sort_unstable();

        let mut difficulty: Vec<&str> = self.difficulty.iter().map(|d| d.as_str()).collect();
        difficulty.sort_unstable();

        let location = self
            .location
            .as_ref()
            .map(|l| l.canonical_token())
            .unwrap_or_default();
        let price = self
            .price_range
            .as_ref()
            .map(|p| p.canonical_token())
            .unwrap_or_default();
        let radius = self.radius_km.map(|r| format!("{r:.1}")).unwrap_or_default();
        let availability = self
            .availability
            .map(|a| a.as_str().to_string())
            .unwrap_or_default();
        let rating = self
            .min_rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_default();

        [
            self.text.to_lowercase(),
            styles.join(","),
            location,
            difficulty.join(","),
            self.sort_by.as_str().to_string(),
            self.page.to_string(),
            self.limit.to_string(),
            radius,
            price,
            availability,
            rating,
        ]
        .join("|")
    }

    /// Serialize every explicitly-set field to URL query parameters.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if !self.text.is_empty() {
            params.push(("query".into(), self.text.clone()));
        }
        if !self.styles.is_empty() {
            params.push(("styles".into(), self.styles.join(",")));
        }
        match &self.location {
            Some(LocationFilter::Postcode(pc)) => params.push(("postcode".into(), pc.clone())),
            Some(LocationFilter::City(city)) => params.push(("city".into(), city.clone())),
            Some(LocationFilter::Coordinates { lat, lng }) => {
                params.push(("lat".into(), lat.to_string()));
                params.push(("lng".into(), lng.to_string()));
            }
            None => {}
        }
        if !self.difficulty.is_empty() {
            let joined: Vec<&str> = self.difficulty.iter().map(|d| d.as_str()).collect();
            params.push(("difficulty".into(), joined.join(",")));
        }
        if self.sort_by != SortBy::Relevance {
            params.push(("sort".into(), self.sort_by.as_str().into()));
        }
        if self.page != DEFAULT_PAGE {
            params.push(("page".into(), self.page.to_string()));
        }
        if self.limit != DEFAULT_LIMIT {
            params.push(("limit".into(), self.limit.to_string()));
        }
        if let Some(radius) = self.radius_km {
            params.push(("radius".into(), radius.to_string()));
        }
        if let Some(range) = &self.price_range {
            params.push(("price_min".into(), range.min.to_string()));
            params.push(("price_max".into(), range.max.to_string()));
        }
        if let Some(availability) = self.availability {
            params.push(("availability".into(), availability.as_str().into()));
        }
        if let Some(rating) = self.min_rating {
            params.push(("rating".into(), rating.to_string()));
        }

        params
    }

    /// Rebuild a query from URL parameters. Unknown keys are ignored;
    /// malformed values are a `Validation` error.
    pub fn from_query_params(params: &[(String, String)]) -> Result<Self> {
        let mut query = SearchQuery::new("");

        for (key, value) in params {
            match key.as_str() {
                "query" => query.text = value.trim().to_string(),
                "styles" => {
                    query = query.with_styles(value.split(',').map(|s| s.to_string()));
                }
                "postcode" => query.location = Some(LocationFilter::Postcode(value.clone())),
                "city" => query.location = Some(LocationFilter::City(value.clone())),
                "lat" => {
                    let lat = parse_num::<f64>(key, value)?;
                    query.location = match query.location {
                        Some(LocationFilter::Coordinates { lng, .. }) => {
                            Some(LocationFilter::Coordinates { lat, lng })
                        }
                        _ => Some(LocationFilter::Coordinates { lat, lng: 0.0 }),
                    };
                }
                "lng" => {
                    let lng = parse_num::<f64>(key, value)?;
                    query.location = match query.location {
                        Some(LocationFilter::Coordinates { lat, .. }) => {
                            Some(LocationFilter::Coordinates { lat, lng })
                        }
                        _ => Some(LocationFilter::Coordinates { lat: 0.0, lng }),
                    };
                }
                "difficulty" => {
                    let parsed: Vec<Difficulty> = value
                        .split(',')
                        .filter(|s| !s.is_empty())
                        .map(|s| {
                            Difficulty::parse(s).ok_or_else(|| {
                                SearchError::Validation(format!("unknown difficulty: {s}"))
                            })
                        })
                        .collect::<Result<_>>()?;
                    query.difficulty = parsed;
                }
                "sort" => {
                    query.sort_by = SortBy::parse(value)
                        .ok_or_else(|| SearchError::Validation(format!("unknown sort: {value}")))?;
                }
                "page" => query.page = parse_num::<u32>(key, value)?.max(1),
                "limit" => query.limit = parse_num::<u32>(key, value)?.clamp(1, 100),
                "radius" => query.radius_km = Some(parse_num::<f64>(key, value)?),
                "price_min" => {
                    let min = parse_num::<u32>(key, value)?;
                    query.price_range = Some(match query.price_range {
                        Some(range) => PriceRange { min, ..range },
                        None => PriceRange { min, max: u32::MAX },
                    });
                }
                "price_max" => {
                    let max = parse_num::<u32>(key, value)?;
                    query.price_range = Some(match query.price_range {
                        Some(range) => PriceRange { max, ..range },
                        None => PriceRange { min: 0, max },
                    });
                }
                "availability" => {
                    query.availability = Some(Availability::parse(value).ok_or_else(|| {
                        SearchError::Validation(format!("unknown availability: {value}"))
                    })?);
                }
                "rating" => query.min_rating = Some(parse_num::<f32>(key, value)?.clamp(0.0, 5.0)),
                _ => {}
            }
        }

        Ok(query)
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| SearchError::Validation(format!("invalid value for {key}: {value}")))
}
