use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::user::User;

fn default_token_type() -> String {
    "bearer".to_string()
}

/// A provider-issued token bundle. The provider owns it; the client only
/// keeps a cached copy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds, relative to when the session was issued.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry as unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without checking its signature. The token was
/// handed to us by the provider over TLS; we only need its expiry.
fn unverified_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .and_then(|data| data.claims.exp)
}

impl Session {
    /// Fill in `expires_at` when the provider omitted it, first from
    /// `expires_in` relative to `now`, then from the access token's `exp`.
    pub fn normalized(mut self, now: i64) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self
                .expires_in
                .map(|secs| now + secs)
                .or_else(|| unverified_expiry(&self.access_token));
        }
        self
    }

    /// True when the session expires within `margin_secs` of `now`.
    /// Sessions without a known expiry never count as expiring.
    pub fn expires_within(&self, margin_secs: i64, now: i64) -> bool {
        match self.expires_at {
            Some(at) => at - now <= margin_secs,
            None => false,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_within(0, now)
    }
}
