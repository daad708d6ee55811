use super::TokenId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub token_id: TokenId,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub blacklisted: bool,
}

impl RefreshTokenRecord {
    pub fn new(token_id: TokenId, subject: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        RefreshTokenRecord {
            token_id,
            subject: subject.into(),
            expires_at,
            blacklisted: false,
        }
    }

    /// The validity predicate every store backend must agree on.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.blacklisted && self.expires_at > now
    }
}

/// Where a refresh token id stands in the rotation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Absent,
    Active,
    Blacklisted,
    Expired,
}

impl RefreshTokenState {
    pub fn of(record: Option<&RefreshTokenRecord>, now: DateTime<Utc>) -> Self {
        match record {
            None => RefreshTokenState::Absent,
            Some(r) if r.blacklisted => RefreshTokenState::Blacklisted,
            Some(r) if r.expires_at <= now => RefreshTokenState::Expired,
            Some(_) => RefreshTokenState::Active,
        }
    }

    pub fn is_valid(self) -> bool {
        self == RefreshTokenState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn state_matches_validity_predicate() {
        let now = Utc::now();
        let mut record = RefreshTokenRecord::new(TokenId::new_v4(), "bob", now + Duration::minutes(5));

        assert_eq!(RefreshTokenState::of(None, now), RefreshTokenState::Absent);
        assert_eq!(RefreshTokenState::of(Some(&record), now), RefreshTokenState::Active);
        assert!(record.is_valid_at(now));

        record.blacklisted = true;
        assert_eq!(RefreshTokenState::of(Some(&record), now), RefreshTokenState::Blacklisted);
        assert!(!record.is_valid_at(now));

        record.blacklisted = false;
        record.expires_at = now;
        assert_eq!(RefreshTokenState::of(Some(&record), now), RefreshTokenState::Expired);
        assert!(!record.is_valid_at(now));
    }

    #[test]
    fn record_serializes_with_default_blacklist_flag() {
        let record = RefreshTokenRecord::new(TokenId::new_v4(), "bob", Utc::now());
        let mut json = serde_json::to_value(&record).unwrap();
        json.as_object_mut().unwrap().remove("blacklisted");
        let back: RefreshTokenRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
