//! Target validation for outgoing requests.

use url::Url;

use crate::error::{ConnectorError, ConnectorResult};

/// Parse `target` and require an absolute URL with a scheme and a host.
pub fn validate_target(target: &str) -> ConnectorResult<Url> {
    let invalid = || ConnectorError::InvalidTarget {
        target: target.to_string(),
    };

    let url = Url::parse(target).map_err(|_| invalid())?;
    match url.host_str() {
        Some(host) if !host.is_empty() && !url.scheme().is_empty() => Ok(url),
        _ => Err(invalid()),
    }
}
