use super::AuthenticationGate;
use crate::domain_model::Principal;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::{HeaderMap, header};
use warp::path::FullPath;
use warp::Filter;

/// Runs the gate on every request and hands the principal, if any, to the
/// next filter. Never rejects.
pub fn with_principal(
    gate: Arc<AuthenticationGate>,
) -> impl Filter<Extract = (Option<Principal>,), Error = Infallible> + Clone {
    warp::path::full()
        .and(warp::header::headers_cloned())
        .then(move |path: FullPath, headers: HeaderMap| {
            let gate = gate.clone();
            async move {
                let authorization = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                gate.authenticate(path.as_str(), authorization)
                    .await
                    .into_principal()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::FakeTokenService;
    use crate::gate::PathExemptions;

    fn principal_route(
        service: Arc<FakeTokenService>,
    ) -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
        let exemptions = PathExemptions::from_config(&["/open/**".to_string()], false).unwrap();
        let gate = Arc::new(AuthenticationGate::new(service, exemptions));
        warp::any()
            .and(with_principal(gate))
            .map(|principal: Option<Principal>| match principal {
                Some(p) => p.subject,
                None => "anonymous".to_string(),
            })
    }

    #[tokio::test]
    async fn garbage_bearer_still_reaches_handler() {
        let route = principal_route(Arc::new(FakeTokenService::new()));

        let body = warp::test::request()
            .path("/private")
            .header("authorization", "Bearer not-a-token")
            .filter(&route)
            .await
            .unwrap();

        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn valid_bearer_is_attached() {
        let route = principal_route(Arc::new(FakeTokenService::new()));

        let body = warp::test::request()
            .path("/private")
            .header("authorization", "Bearer fake-access-token:alice")
            .filter(&route)
            .await
            .unwrap();

        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn exempt_path_skips_validation() {
        let service = Arc::new(FakeTokenService::new());
        let route = principal_route(service.clone());

        let body = warp::test::request()
            .path("/open/docs")
            .header("authorization", "Bearer fake-access-token:alice")
            .filter(&route)
            .await
            .unwrap();

        assert_eq!(body, "anonymous");
        assert_eq!(service.validation_count(), 0);
    }
}
