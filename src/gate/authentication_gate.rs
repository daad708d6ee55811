use super::PathExemptions;
use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;
use tracing::{debug, trace, warn};

const BEARER_SCHEME: &str = "bearer";

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Path matched an exemption; no credential was looked at.
    Exempt,
    /// No usable credential. Downstream authorization decides what that means.
    Anonymous,
    Authenticated(Principal),
}

impl GateOutcome {
    pub fn into_principal(self) -> Option<Principal> {
        match self {
            GateOutcome::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Per-request authentication step. It only ever adds a principal; it never
/// fails a request.
pub struct AuthenticationGate {
    token_service: Arc<dyn TokenService>,
    exemptions: PathExemptions,
}

impl AuthenticationGate {
    pub fn new(token_service: Arc<dyn TokenService>, exemptions: PathExemptions) -> Self {
        Self {
            token_service,
            exemptions,
        }
    }

    pub fn exemptions(&self) -> &PathExemptions {
        &self.exemptions
    }

    pub async fn authenticate(&self, path: &str, authorization: Option<&str>) -> GateOutcome {
        if let Some(pattern) = self.exemptions.matching(path) {
            trace!(path, %pattern, "path exempt from authentication");
            return GateOutcome::Exempt;
        }

        let Some(token) = authorization.and_then(bearer_token) else {
            return GateOutcome::Anonymous;
        };

        match self.principal_for(token).await {
            Ok(Some(principal)) => GateOutcome::Authenticated(principal),
            Ok(None) => GateOutcome::Anonymous,
            Err(e @ TokenError::StoreUnavailable(_)) => {
                warn!(path, error = %e, "could not validate bearer token");
                GateOutcome::Anonymous
            }
            Err(e) => {
                debug!(path, error = %e, "bearer token rejected");
                GateOutcome::Anonymous
            }
        }
    }

    async fn principal_for(&self, token: &str) -> Result<Option<Principal>, TokenError> {
        if !self.token_service.validate(token).await? {
            debug!("bearer token failed validation");
            return Ok(None);
        }
        let claims = self.token_service.parse(token)?;
        Ok(Some(Principal::from_claims(claims.subject, claims.claims)))
    }
}

/// Extract the credential from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{FakeTokenService, JwtHs256Codec, RealTokenService, TokenServiceConfig};
    use crate::infra_memory::InMemoryRefreshTokenStore;
    use serde_json::json;

    fn gate_with(service: Arc<dyn TokenService>, excluded: &[&str]) -> AuthenticationGate {
        let excluded: Vec<String> = excluded.iter().map(|p| p.to_string()).collect();
        AuthenticationGate::new(service, PathExemptions::from_config(&excluded, false).unwrap())
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[tokio::test]
    async fn exempt_path_never_validates() {
        let service = Arc::new(FakeTokenService::new());
        let gate = gate_with(service.clone(), &["/public/**"]);

        let outcome = gate
            .authenticate("/public/docs", Some("Bearer fake-access-token:alice"))
            .await;

        assert_eq!(outcome, GateOutcome::Exempt);
        assert_eq!(service.validation_count(), 0);
    }

    #[tokio::test]
    async fn missing_or_foreign_scheme_is_anonymous() {
        let service = Arc::new(FakeTokenService::new());
        let gate = gate_with(service.clone(), &[]);

        assert_eq!(gate.authenticate("/api", None).await, GateOutcome::Anonymous);
        assert_eq!(
            gate.authenticate("/api", Some("Basic fake-access-token:alice")).await,
            GateOutcome::Anonymous
        );
        assert_eq!(service.validation_count(), 0);
    }

    #[tokio::test]
    async fn garbage_and_outages_are_anonymous() {
        let service = Arc::new(FakeTokenService::new());
        let gate = gate_with(service.clone(), &[]);

        assert_eq!(gate.authenticate("/api", Some("Bearer garbage")).await, GateOutcome::Anonymous);
        assert_eq!(
            gate.authenticate("/api", Some("Bearer fake-store-outage")).await,
            GateOutcome::Anonymous
        );
        assert_eq!(service.validation_count(), 2);
    }

    #[tokio::test]
    async fn valid_token_yields_principal() {
        let service = Arc::new(FakeTokenService::new());
        let gate = gate_with(service, &[]);

        let principal = gate
            .authenticate("/api", Some("Bearer fake-access-token:alice"))
            .await
            .into_principal()
            .unwrap();

        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.authorities, vec!["ROLE_USER"]);
    }

    #[tokio::test]
    async fn works_with_real_jwt_tokens() {
        let service = Arc::new(RealTokenService::new(
            Arc::new(JwtHs256Codec::new(b"gate-test-secret-gate-test-secret")),
            Arc::new(InMemoryRefreshTokenStore::new()),
            TokenServiceConfig::default(),
        ));
        let claims = json!({ "roles": "ADMIN", "authorities": ["report:read"] })
            .as_object()
            .cloned()
            .unwrap();
        let token = service.issue_access_token("root", &claims).unwrap();
        let gate = gate_with(service, &[]);

        let principal = gate
            .authenticate("/api/v1/me", Some(&format!("Bearer {token}")))
            .await
            .into_principal()
            .unwrap();

        assert_eq!(principal.subject, "root");
        assert!(principal.has_role("ADMIN"));
        assert!(principal.has_authority("report:read"));
    }
}
