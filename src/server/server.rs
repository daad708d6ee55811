use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::gate::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub token_service: Arc<dyn TokenService>,
    pub gate: Arc<AuthenticationGate>,
    pub user_resolver: Arc<dyn UserResolver<User = UserProfile>>,
    cleanup_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        if settings.jwt.secret.is_empty() {
            return Err(anyhow!("jwt.secret must not be empty"));
        }

        let (store, pool) = Self::build_store(settings).await?;

        let codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(settings.jwt.secret.as_bytes()));
        let token_service: Arc<dyn TokenService> = Arc::new(RealTokenService::new(
            codec,
            store.clone(),
            TokenServiceConfig {
                access_ttl: Duration::from_secs(settings.jwt.access_ttl_secs),
                refresh_ttl: Duration::from_secs(settings.jwt.refresh_ttl_secs),
                refresh_enabled: settings.jwt.refresh_enabled,
                rotation_enabled: settings.jwt.rotation_enabled,
                refresh_mode: settings.jwt.refresh_mode,
                reuse_handling: settings.jwt.reuse_handling,
            },
        ));

        let exemptions = PathExemptions::from_config(
            &settings.filter.excluded_paths,
            settings.filter.auto_detect_open_paths,
        )?;
        debug!(patterns = ?exemptions.patterns(), "authentication exemptions");
        let gate = Arc::new(AuthenticationGate::new(token_service.clone(), exemptions));

        let cancel = CancellationToken::new();
        let cleanup_handle = if settings.cleanup.enabled {
            let scheduler = CleanupScheduler::new(
                store,
                Duration::from_secs(settings.cleanup.interval_secs.max(1)),
                cancel.clone(),
            );
            Some(tokio::spawn(async move { scheduler.run().await }))
        } else {
            info!("refresh token cleanup disabled");
            None
        };

        info!(backend = ?settings.store.backend, "server started");

        Ok(Self {
            token_service,
            gate,
            user_resolver: Arc::new(ClaimsProfileResolver::new()),
            cleanup_handle: Mutex::new(cleanup_handle),
            cancel,
            pool,
        })
    }

    async fn build_store(
        settings: &Settings,
    ) -> anyhow::Result<(Arc<dyn RefreshTokenStore>, Option<Pool<MySql>>)> {
        let store = &settings.store;
        match store.backend {
            StoreBackend::InMemory => {
                let memory_store: Arc<dyn RefreshTokenStore> = Arc::new(InMemoryRefreshTokenStore::new());
                Ok((memory_store, None))
            }
            StoreBackend::Relational => {
                let dsn = store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.mysql_dsn is required for the relational backend"))?;
                let pool = Pool::<MySql>::connect(dsn).await?;
                let mysql_store = MySqlRefreshTokenStore::new(pool.clone());
                mysql_store.ensure_schema().await?;
                let mysql_store: Arc<dyn RefreshTokenStore> = Arc::new(mysql_store);
                Ok((mysql_store, Some(pool)))
            }
            StoreBackend::Cache => {
                let dsn = store
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.redis_dsn is required for the cache backend"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let redis_store: Arc<dyn RefreshTokenStore> = Arc::new(RedisRefreshTokenStore::new(
                    redis_manager,
                    store.redis_prefix.clone(),
                ));
                Ok((redis_store, None))
            }
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self.cleanup_handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("cleanup handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
