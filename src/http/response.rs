//! Pull-side view of one response.
//!
//! # Responsibilities
//! - Expose status, headers and cookies as synchronous accessors
//! - Hand out the body as a single-use demand-driven stream
//!
//! # Design Decisions
//! - Accessors read the handle on every call; they are pure and repeatable
//! - Status, headers and cookies stay valid after the body fails

use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use std::sync::Arc;

use crate::client::ResponseHandle;
use crate::error::{ConnectorError, ConnectorResult};
use crate::http::body::BodyStream;
use crate::http::cookie::{parse_cookies, CookieMap};
use crate::http::headers::{translate_headers, HeaderMap};
use crate::http::status::{named_status, StatusClass};

/// Response adapter wrapping one handle of the underlying client.
pub struct ClientResponse {
    handle: Arc<dyn ResponseHandle>,
    body_taken: bool,
}

impl ClientResponse {
    /// Wrap a handle. The adapter becomes its only user.
    pub fn new(handle: Arc<dyn ResponseHandle>) -> Self {
        Self {
            handle,
            body_taken: false,
        }
    }

    /// Raw status code, always available.
    pub fn status(&self) -> u16 {
        self.handle.status_code()
    }

    /// Named status; fails for codes without a registered reason phrase.
    pub fn status_code(&self) -> ConnectorResult<http::StatusCode> {
        named_status(self.status())
    }

    pub fn status_class(&self) -> Option<StatusClass> {
        StatusClass::from_code(self.status())
    }

    pub fn headers(&self) -> HeaderMap {
        translate_headers(self.handle.headers())
    }

    /// Cookies parsed from every `Set-Cookie` header.
    ///
    /// One malformed header fails the call with `InvalidCookie`.
    pub fn cookies(&self) -> ConnectorResult<CookieMap> {
        parse_cookies(self.handle.cookies())
    }

    /// Take the body stream. Returns `None` once taken.
    pub fn take_body(&mut self) -> Option<BodyStream> {
        if self.body_taken {
            return None;
        }
        self.body_taken = true;
        Some(BodyStream::new(Arc::clone(&self.handle)))
    }

    /// Collect the whole body.
    ///
    /// Fails with `BodyAlreadyTaken` if the body was taken before.
    pub async fn bytes(&mut self) -> ConnectorResult<Bytes> {
        let Some(body) = self.take_body() else {
            tracing::warn!("Response body read twice");
            return Err(ConnectorError::BodyAlreadyTaken);
        };
        let collected = body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        Ok(collected.freeze())
    }
}

impl std::fmt::Debug for ClientResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientResponse")
            .field("status", &self.status())
            .field("body_taken", &self.body_taken)
            .finish()
    }
}
