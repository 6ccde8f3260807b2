//! `Set-Cookie` parsing.
//!
//! A malformed header fails the whole accessor call with
//! [`ConnectorError::InvalidCookie`]; status, headers and body are unaffected.

use std::time::Duration;

use crate::error::{ConnectorError, ConnectorResult};
use crate::http::multimap::MultiMap;

/// `SameSite` attribute of a response cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// One parsed `Set-Cookie` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// `Max-Age`; negative values are clamped to zero.
    pub max_age: Option<Duration>,
    pub same_site: Option<SameSite>,
    pub secure: bool,
    pub http_only: bool,
}

impl ResponseCookie {
    /// A cookie with only a name and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: None,
            same_site: None,
            secure: false,
            http_only: false,
        }
    }

    /// Parse one raw `Set-Cookie` header value.
    pub fn parse(header: &str) -> ConnectorResult<Self> {
        let parsed = cookie::Cookie::parse(header).map_err(|source| {
            ConnectorError::InvalidCookie {
                header: header.to_string(),
                source,
            }
        })?;

        let max_age = parsed
            .max_age()
            .map(|age| Duration::from_secs(age.whole_seconds().max(0) as u64));
        let same_site = parsed.same_site().map(|s| match s {
            cookie::SameSite::Strict => SameSite::Strict,
            cookie::SameSite::Lax => SameSite::Lax,
            cookie::SameSite::None => SameSite::None,
        });

        Ok(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain: parsed.domain().map(str::to_string),
            path: parsed.path().map(str::to_string),
            max_age,
            same_site,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
        })
    }
}

/// Cookies grouped by name, arrival order kept within each name.
pub type CookieMap = MultiMap<ResponseCookie>;

/// Parse every raw header; the first malformed one fails the call.
pub fn parse_cookies(raw: &[String]) -> ConnectorResult<CookieMap> {
    let mut cookies = CookieMap::new();
    for header in raw {
        let cookie = ResponseCookie::parse(header)?;
        cookies.append(cookie.name.clone(), cookie);
    }
    Ok(cookies)
}
