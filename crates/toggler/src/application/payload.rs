//! Decoding of client-supplied update payloads.
//!
//! An update request carries a JSON object shaped like a flag; only its
//! `Value` field matters.  `Key` and `Title` may be present and are ignored,
//! since the key comes from the request target and titles are not editable.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Malformed client input.  Distinct from store failures so callers can map
/// it to an input error rather than an internal one.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid update payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Body of an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct UpdatePayload {
    /// Requested flag value; `false` when the field is omitted or `null`.
    #[serde(rename = "Value", default, deserialize_with = "null_as_false")]
    pub value: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Parses an update payload.
///
/// # Errors
///
/// Returns [`PayloadError::Malformed`] if `text` is not a JSON object or
/// `Value` is neither a boolean nor `null`.
pub fn decode_update_payload(text: &str) -> Result<UpdatePayload, PayloadError> {
    Ok(serde_json::from_str(text)?)
}
