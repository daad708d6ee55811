use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>, // refresh tokens only
    #[serde(flatten)]
    extra: Claims,
}

/// HS256 compact JWT codec over a single shared secret.
pub struct JwtHs256Codec {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtHs256Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtHs256Codec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtHs256Codec {
    pub fn new(signing_key: &[u8]) -> Self {
        // Expiry is judged by the token service so that "expired" and
        // "tampered" stay distinguishable.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        JwtHs256Codec {
            header: Header::new(Algorithm::HS256),
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            validation,
        }
    }

    #[inline]
    fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
        DateTime::from_timestamp(secs, 0).ok_or(TokenError::InvalidToken)
    }
}

impl TokenCodec for JwtHs256Codec {
    fn mint(
        &self,
        subject: &str,
        claims: &Claims,
        ttl: Duration,
        token_id: Option<TokenId>,
    ) -> Result<String, TokenError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let iat_dt = Utc::now();
        let exp_dt = iat_dt
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encoding("token lifetime out of range".to_string()))?;

        let extra: Claims = claims
            .iter()
            .filter(|(name, _)| !RESERVED_CLAIMS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let wire = WireClaims {
            sub: subject.to_string(),
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
            jti: token_id.map(|id| id.to_string()),
            extra,
        };

        encode(&self.header, &wire, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidToken)?;
        let wire = data.claims;

        let token_id = wire
            .jti
            .map(|jti| jti.parse::<TokenId>())
            .transpose()
            .map_err(|_| TokenError::InvalidToken)?;

        Ok(TokenClaims {
            subject: wire.sub,
            claims: wire.extra,
            issued_at: Self::timestamp(wire.iat)?,
            expires_at: Self::timestamp(wire.exp)?,
            token_id,
        })
    }
}
