//! Request signer for MEXC spot v3 signed endpoints.
//!
//! The exchange verifies `signature = hex(HMAC-SHA256(secret, query))` where
//! `query` is the parameter string exactly as sent. Parameters are therefore
//! serialized in the order they were pushed; they are NEVER sorted.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use sniper_core::ApiSecret;

use crate::error::{RestError, RestResult};
use crate::params::QueryParams;

type HmacSha256 = Hmac<Sha256>;

/// Query string plus its signature, ready to append to a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    /// Canonical parameter string that was signed.
    pub query: String,
    /// Lower-case hex HMAC-SHA256 digest.
    pub signature: String,
}

impl SignedQuery {
    /// Full query string with `signature` as the last parameter.
    pub fn to_query_string(&self) -> String {
        format!("{}&signature={}", self.query, self.signature)
    }
}

/// Deterministic HMAC-SHA256 request signer.
///
/// The keyed MAC state is built once; each signature clones it, so the
/// key schedule is off the hot path.
#[derive(Clone)]
pub struct RequestSigner {
    keyed: HmacSha256,
}

impl RequestSigner {
    pub fn new(secret: &ApiSecret) -> RestResult<Self> {
        let keyed = HmacSha256::new_from_slice(secret.expose().as_bytes())
            .map_err(|_| RestError::InvalidKey)?;
        Ok(Self { keyed })
    }

    /// Hex HMAC-SHA256 of `payload`.
    pub fn sign(&self, payload: &str) -> String {
        let mut mac = self.keyed.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Sign parameters in their insertion order.
    pub fn sign_params(&self, params: &QueryParams) -> SignedQuery {
        let query = params.encode();
        let signature = self.sign(&query);
        SignedQuery { query, signature }
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RequestSigner([REDACTED])")
    }
}
