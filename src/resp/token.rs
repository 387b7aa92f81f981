use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::data::user::User;
use crate::error::TokenError;
use crate::util::base64_engine;

/// Claims embedded in the API's auth token.
///
/// The signature is never checked here. Claims are a display hint for
/// choosing views; the API decides what the token actually grants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserClaims {
    pub user: User,
    #[serde(default, with = "jwt_numeric_date")]
    pub iat: Option<DateTime<Utc>>,
    #[serde(default, with = "jwt_numeric_date")]
    pub exp: Option<DateTime<Utc>>,
}

impl UserClaims {
    /// Reads the payload segment of a JWT without verifying it.
    pub fn decode(token: &str) -> Result<UserClaims, TokenError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(TokenError::Segments),
        };

        let json = base64_engine().decode(payload)?;
        let claims: UserClaims = serde_json::from_slice(&json)?;
        tracing::debug!("decoded user claims for user: {}", claims.user.id);

        Ok(claims)
    }

    /// Whether the token's `exp` already passed. Tokens without `exp` never
    /// expire client side; the API rejects them when it wants to.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.exp, Some(exp) if exp <= now)
    }
}

mod jwt_numeric_date {
    //! Optional `DateTime<Utc>` as a JWT "Numeric Date" (RFC 7519 section 2).
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{self, Deserialize, Deserializer};

    /// Attempts to deserialize an i64 and use as a Unix timestamp
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<i64>::deserialize(deserializer)? {
            Some(ts) => Utc
                .timestamp_opt(ts, 0)
                .single() // If there are multiple or no valid DateTimes from timestamp, return None
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("Invalid Unix timestamp value.")),
            None => Ok(None),
        }
    }
}
