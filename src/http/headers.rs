//! Header translation from the client's native representation.

use crate::http::multimap::MultiMap;

/// Response headers: name → values, names as received.
pub type HeaderMap = MultiMap<String>;

/// Group native header lines by name, keeping arrival order.
pub fn translate_headers(native: &[(String, String)]) -> HeaderMap {
    native
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
