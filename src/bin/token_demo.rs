//! Walks through issue, refresh, rotation and replay against the in-memory store.
//!
//! $ cargo run --bin token_demo

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokengate::application_impl::*;
use tokengate::application_port::*;
use tokengate::domain_model::*;
use tokengate::domain_port::*;
use tokengate::gate::*;
use tokengate::infra_memory::*;
use tokengate::logger::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::new_bootstrap();

    let store = Arc::new(InMemoryRefreshTokenStore::new());
    let service: Arc<dyn TokenService> = Arc::new(RealTokenService::new(
        Arc::new(JwtHs256Codec::new(b"token-demo-secret")),
        store.clone(),
        TokenServiceConfig {
            access_ttl: Duration::from_secs(60),
            refresh_ttl: Duration::from_secs(600),
            rotation_enabled: true,
            refresh_mode: RefreshTokenMode::StoreAndValidate,
            reuse_handling: ReuseHandling::Blacklist,
            ..Default::default()
        },
    ));

    let claims = json!({ "roles": ["USER"], "email": "alice@example.com" })
        .as_object()
        .cloned()
        .unwrap_or_default();
    let pair = service.issue_token_pair("alice", &claims).await?;
    info!(access = %pair.access_token, "issued token pair");

    let gate = AuthenticationGate::new(
        service.clone(),
        PathExemptions::from_config(&["/api/v1/health".to_string()], true)?,
    );
    let bearer = format!("Bearer {}", pair.access_token);
    info!(outcome = ?gate.authenticate("/api/v1/me", Some(&bearer)).await, "protected path");
    info!(outcome = ?gate.authenticate("/api/v1/health", Some(&bearer)).await, "exempt path");

    let Some(old_refresh) = pair.refresh_token else {
        anyhow::bail!("refresh tokens are disabled");
    };
    let rotated = service.refresh(&old_refresh).await?;
    info!(rotated = rotated.is_some(), stored = store.len(), "first refresh");

    let replay = service.refresh(&old_refresh).await?;
    info!(replay_accepted = replay.is_some(), "replayed the rotated token");

    if let Some(token_id) = service.parse(&old_refresh)?.token_id {
        info!(state = ?store.state(&token_id).await?, "old refresh token");
    }

    let removed = store.cleanup().await?;
    info!(removed, stored = store.len(), "cleanup");

    Ok(())
}
