use crate::application_port::*;
use crate::domain_model::*;

const NAME_CLAIMS: [&str; 2] = ["name", "preferred_username"];
const EMAIL_CLAIM: &str = "email";

/// Builds the caller's profile from the token alone, without a user directory.
#[derive(Debug, Default)]
pub struct ClaimsProfileResolver;

impl ClaimsProfileResolver {
    pub fn new() -> Self {
        ClaimsProfileResolver
    }
}

#[async_trait::async_trait]
impl UserResolver for ClaimsProfileResolver {
    type User = UserProfile;

    async fn resolve_user(&self, subject: &str, claims: &Claims) -> Option<UserProfile> {
        if subject.is_empty() {
            return None;
        }

        let text = |name: &str| claims.get(name).and_then(|v| v.as_str()).map(str::to_owned);
        let principal = Principal::from_claims(subject, claims.clone());

        Some(UserProfile {
            subject: principal.subject,
            display_name: NAME_CLAIMS.into_iter().find_map(|name| text(name)),
            email: text(EMAIL_CLAIM),
            authorities: principal.authorities,
        })
    }
}
