//! Caller identity.
//!
//! API Gateway validates tokens before invoking the Lambda, so identity is read
//! from the authorizer claims, or decoded from the bearer token when the claims
//! are not attached (local invocations). Usernames are numeric user ids.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use lambda_http::{Request, RequestExt};
use serde_json::Value;

use crate::models::UserId;
use crate::{Error, Result};

/// The authenticated caller, passed explicitly into operations that act on their behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
}

impl AuthContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// Build from a claims object (`username`, then `cognito:username`).
    pub fn from_claims(claims: &Value) -> Result<Self> {
        let username = ["username", "cognito:username"]
            .iter()
            .find_map(|key| claims.get(*key))
            .ok_or_else(|| Error::Auth("Missing username claim".to_string()))?;

        let user_id = match username {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| Error::Auth(format!("Username is not a user id: {}", username)))?;

        Ok(Self::new(UserId(user_id)))
    }

    /// Extract the caller from a gateway request.
    pub fn from_request(event: &Request) -> Result<Self> {
        let claims = event
            .request_context_ref()
            .and_then(|ctx| ctx.authorizer())
            .and_then(|authorizer| authorizer.fields.get("claims"));

        if let Some(claims) = claims {
            return Self::from_claims(claims);
        }

        let header = event
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Auth("Missing credentials".to_string()))?;

        Self::from_claims(&decode_claims(header)?)
    }
}

/// Decode a bearer token's claims without verifying its signature.
fn decode_claims(token: &str) -> Result<Value> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(b"unused");

    decode::<Value>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| Error::Auth(format!("Failed to decode token: {}", e)))
}
