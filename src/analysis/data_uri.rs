//! Self-describing data references
//!
//! Every image or terrain model travels inline as a `data:<mimetype>;base64,<data>`
//! string. This module parses and checks that shape so malformed references are
//! rejected before a model call is attempted.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = "base64";

/// Reasons a string is not an acceptable data URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataUriError {
    #[error("must be a data URI starting with 'data:'")]
    MissingScheme,

    #[error("data URI has no ',' separating the header from the payload")]
    MissingSeparator,

    #[error("data URI does not declare a media type")]
    MissingMediaType,

    #[error("invalid media type '{0}'")]
    InvalidMediaType(String),

    #[error("data URI must declare base64 encoding (';base64')")]
    NotBase64,

    #[error("data URI payload is empty")]
    EmptyPayload,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A parsed `data:` URI.
///
/// Keeps the original string so it can be echoed back exactly, alongside the
/// media type and the still-encoded payload handed to the model as inline data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    raw: String,
    mime_type: String,
    data_offset: usize,
}

impl DataUri {
    /// Parse and check a data URI.
    pub fn parse(input: &str) -> Result<Self, DataUriError> {
        let rest = input
            .strip_prefix(SCHEME)
            .ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or(DataUriError::MissingSeparator)?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim();
        if mime_type.is_empty() {
            return Err(DataUriError::MissingMediaType);
        }
        if !is_media_type(mime_type) {
            return Err(DataUriError::InvalidMediaType(mime_type.to_string()));
        }

        // The encoding marker is the final header parameter: data:image/png;name=x;base64
        match params.last() {
            Some(marker) if marker.trim().eq_ignore_ascii_case(BASE64_MARKER) => {}
            _ => return Err(DataUriError::NotBase64),
        }

        if payload.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }
        BASE64
            .decode(payload)
            .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;

        Ok(Self {
            raw: input.to_string(),
            mime_type: mime_type.to_ascii_lowercase(),
            data_offset: input.len() - payload.len(),
        })
    }

    /// Declared media type, lowercased (e.g. `image/png`).
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 payload, still encoded.
    pub fn data(&self) -> &str {
        &self.raw[self.data_offset..]
    }

    /// Original string form.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DataUri {
    type Err = DataUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `type/subtype`, both halves non-empty and made of RFC 6838 token characters.
fn is_media_type(value: &str) -> bool {
    let is_token = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c))
    };
    match value.split_once('/') {
        Some((kind, subtype)) => is_token(kind) && is_token(subtype),
        None => false,
    }
}

/// `validator` rule for request fields that must carry a data URI.
pub fn validate_data_uri(value: &str) -> Result<(), validator::ValidationError> {
    DataUri::parse(value).map(|_| ()).map_err(|e| {
        let mut error = validator::ValidationError::new("data_uri");
        error.message = Some(Cow::Owned(e.to_string()));
        error
    })
}
