use crate::domain_model::*;

/// Maps an authenticated subject to an application user.
#[async_trait::async_trait]
pub trait UserResolver: Send + Sync {
    type User: Send;

    async fn resolve_user(&self, subject: &str, claims: &Claims) -> Option<Self::User>;
}

pub async fn resolve_current_user<R>(resolver: &R, principal: Option<&Principal>) -> Option<R::User>
where
    R: UserResolver + ?Sized,
{
    let principal = principal?;
    resolver
        .resolve_user(&principal.subject, &principal.claims)
        .await
}
