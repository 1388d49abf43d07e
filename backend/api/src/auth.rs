//! Reviewer authorization for the KYC review endpoint.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::errors::ApiError;

/// Accept `Authorization: Bearer <key>` or `X-API-Key: <key>`.  With no key
/// configured every caller is let through.
pub fn require_reviewer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let api_key = headers.get("x-api-key").and_then(|v| v.to_str().ok());

    match bearer.or(api_key) {
        Some(presented) if constant_time_eq(presented, expected) => Ok(()),
        Some(_) => {
            warn!("KYC review rejected: invalid reviewer key");
            Err(ApiError::Unauthorized)
        }
        None => {
            warn!("KYC review rejected: no reviewer key presented");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Compare without leaking how many leading bytes matched.  Lengths are
/// compared in constant time as well.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let max_len = a.len().max(b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}
