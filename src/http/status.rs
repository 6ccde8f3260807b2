//! Status code classification.

use http::StatusCode;

use crate::error::{ConnectorError, ConnectorResult};

/// Coarse class of a status code, from its first digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn from_code(code: u16) -> Option<Self> {
        match code / 100 {
            1 => Some(Self::Informational),
            2 => Some(Self::Success),
            3 => Some(Self::Redirection),
            4 => Some(Self::ClientError),
            5 => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// Map a raw code to its named status.
///
/// Codes without a registered reason phrase are unrecognized.
pub fn named_status(code: u16) -> ConnectorResult<StatusCode> {
    StatusCode::from_u16(code)
        .ok()
        .filter(|status| status.canonical_reason().is_some())
        .ok_or(ConnectorError::UnrecognizedStatus(code))
}
