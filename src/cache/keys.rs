//! Cache key construction.
//!
//! Keys are shared across deployments that use the same cache, so the format
//! below must stay bit-exact:
//!
//! - `products:byId:<id>`
//! - `products:list:page=<p>&size=<s>&sort=<field>,<dir>&min=<min>&max=<max>`
//!
//! An absent price bound renders as the empty string, so "no bound" never
//! collides with a bound of `0`.

use crate::catalog::ListQuery;

/// Prefix shared by every list-query key.
pub const LIST_PREFIX: &str = "products:list:";

/// Prefix shared by every single-item key.
pub const ITEM_PREFIX: &str = "products:byId:";

/// Builds the cache key for a normalized list query.
pub fn list_key(query: &ListQuery) -> String {
    format!(
        "{}page={}&size={}&sort={},{}&min={}&max={}",
        LIST_PREFIX,
        query.page(),
        query.size(),
        query.sort().as_str(),
        query.direction().as_str(),
        bound(query.min_price()),
        bound(query.max_price()),
    )
}

/// Builds the cache key for a single product.
pub fn item_key(id: &str) -> String {
    format!("{}{}", ITEM_PREFIX, id)
}

fn bound(value: Option<f64>) -> String {
    value.map(render_number).unwrap_or_default()
}

/// Renders a number the way a JavaScript `Number` prints: shortest
/// round-trip digits, switching to exponent form at magnitudes of `1e21` and
/// above or below `1e-6` (`1e+21`, `1.5e-7`).
fn render_number(v: f64) -> String {
    let magnitude = v.abs();
    if magnitude == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return v.to_string();
    }

    let exp = format!("{:e}", v);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => {
            format!("{}e+{}", mantissa, power)
        }
        _ => exp,
    }
}
