//! List Query Module
//!
//! Normalizes raw list parameters into a [`ListQuery`]. Every `ListQuery` is
//! normalized by construction, so equal queries always map to the same cache
//! key.

use serde::{Deserialize, Serialize};

use super::Product;

// == Constants ==
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 50;

// == Sort Field ==
/// Columns a product list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    #[default]
    UpdatedAt,
    CreatedAt,
    Price,
    Name,
    Stock,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::UpdatedAt,
        SortField::CreatedAt,
        SortField::Price,
        SortField::Name,
        SortField::Stock,
    ];

    /// Parses the wire name. Matching is case-sensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == raw)
    }

    /// Wire name, as it appears in query strings and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::UpdatedAt => "updatedAt",
            SortField::CreatedAt => "createdAt",
            SortField::Price => "price",
            SortField::Name => "name",
            SortField::Stock => "stock",
        }
    }
}

// == Sort Direction ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc` in any letter case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

// == Raw Query ==
/// List parameters exactly as received from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    /// `field,direction`, e.g. `price,asc`
    pub sort: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl RawListQuery {
    /// Collects known parameters from decoded query pairs. The first
    /// occurrence of a repeated parameter wins; unknown names are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut raw = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_ref() {
                "page" => &mut raw.page,
                "size" => &mut raw.size,
                "sort" => &mut raw.sort,
                "minPrice" => &mut raw.min_price,
                "maxPrice" => &mut raw.max_price,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        raw
    }
}

// == List Query ==
/// A normalized list query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListQuery {
    page: u64,
    size: u64,
    sort: SortField,
    direction: SortDirection,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

impl ListQuery {
    /// Builds a query, clamping `page` to at least 1 and `size` into `[1, 50]`.
    ///
    /// Non-finite price bounds are dropped.
    pub fn new(
        page: u64,
        size: u64,
        sort: SortField,
        direction: SortDirection,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> Self {
        Self {
            page: page.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort,
            direction,
            min_price: min_price.and_then(normalize_bound),
            max_price: max_price.and_then(normalize_bound),
        }
    }

    /// Normalizes raw parameters. Unparseable values fall back to defaults and
    /// are never rejected.
    pub fn from_raw(raw: &RawListQuery) -> Self {
        let page = raw
            .page
            .as_deref()
            .and_then(parse_count)
            .unwrap_or(DEFAULT_PAGE);
        let size = raw
            .size
            .as_deref()
            .and_then(parse_count)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let (sort, direction) = raw.sort.as_deref().map(parse_sort).unwrap_or_default();

        Self::new(
            page,
            size,
            sort,
            direction,
            raw.min_price.as_deref().and_then(parse_number),
            raw.max_price.as_deref().and_then(parse_number),
        )
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort(&self) -> SortField {
        self.sort
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn min_price(&self) -> Option<f64> {
        self.min_price
    }

    pub fn max_price(&self) -> Option<f64> {
        self.max_price
    }

    /// Rows to skip before the requested page.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Number of pages needed to hold `total` rows.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.size)
    }

    /// Inclusive price bounds in cents, rounded inward so that only prices
    /// actually inside the requested range match.
    pub fn price_range_cents(&self) -> (Option<i64>, Option<i64>) {
        (
            self.min_price.map(|v| bound_cents(v, f64::ceil)),
            self.max_price.map(|v| bound_cents(v, f64::floor)),
        )
    }
}

impl From<&RawListQuery> for ListQuery {
    fn from(raw: &RawListQuery) -> Self {
        Self::from_raw(raw)
    }
}

// == Page Payload ==
/// The cached and returned shape of one list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub page: u64,
    pub size: u64,
    pub total: u64,
    pub total_pages: u64,
    pub items: Vec<Product>,
}

// == Parsing Helpers ==
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a page or size value. Fractions are truncated and anything below 1
/// clamps to 1 later on.
fn parse_count(raw: &str) -> Option<u64> {
    parse_number(raw).map(|v| if v < 1.0 { 1 } else { v.trunc() as u64 })
}

/// An unknown field resets the whole sort to the default; an unknown
/// direction only resets the direction.
fn parse_sort(raw: &str) -> (SortField, SortDirection) {
    let (field, direction) = raw.split_once(',').unwrap_or((raw, ""));
    match SortField::parse(field.trim()) {
        Some(field) => (
            field,
            SortDirection::parse(direction.trim()).unwrap_or_default(),
        ),
        None => Default::default(),
    }
}

fn normalize_bound(v: f64) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    // -0.0 and 0.0 are the same bound and must share a key
    Some(if v == 0.0 { 0.0 } else { v })
}

fn bound_cents(v: f64, round: fn(f64) -> f64) -> i64 {
    let scaled = v * 100.0;
    let nearest = scaled.round();
    if (scaled - nearest).abs() < 1e-6 {
        nearest as i64
    } else {
        round(scaled) as i64
    }
}
