use anyhow::Result;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::debug;

/// Shared connection pool for the provisioning record store.
///
/// Cloning is cheap: clones share the underlying pool, so one client is built
/// at startup and handed to every repository.
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    /// Build a pool against a single host. `max_pool_size` bounds the number
    /// of concurrent connections; repositories borrow one per call and return
    /// it on drop.
    pub fn new(
        host: &str,
        port: u16,
        database: &str,
        username: &str,
        password: &str,
        max_pool_size: usize,
    ) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.host = Some(host.to_string());
        cfg.port = Some(port);
        cfg.dbname = Some(database.to_string());
        cfg.user = Some(username.to_string());
        cfg.password = Some(password.to_string());
        // Fast recycling: reuse connections without a round-trip health check.
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        pool.resize(max_pool_size);

        Ok(Self { pool })
    }

    /// Round-trip a trivial query, failing fast at startup when the database
    /// is unreachable or the credentials are wrong.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.pool.get().await?;
        conn.execute("SELECT 1", &[]).await?;
        debug!("record store reachable");
        Ok(())
    }

    pub async fn get_connection(&self) -> Result<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }
}
