// src/clients/redis.rs
// Async Redis connector for the exact cache tier and session store

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};

use anyhow::{Context, Result};

/// Thin wrapper over a shared Redis connection manager.
///
/// Connection failure at startup is not fatal: `is_available` flips to
/// false and callers (the response cache) fall back to the in-process store.
#[derive(Clone)]
pub struct RedisConnector {
    manager: Option<ConnectionManager>,
}

impl RedisConnector {
    pub async fn connect(url: &str) -> Self {
        let manager = match redis::Client::open(url) {
            Ok(client) => match client.get_connection_manager().await {
                Ok(manager) => {
                    info!("Connected to Redis at {}", url);
                    Some(manager)
                }
                Err(e) => {
                    warn!("Redis unavailable ({}), using in-process fallback", e);
                    None
                }
            },
            Err(e) => {
                warn!("Invalid Redis URL ({}), using in-process fallback", e);
                None
            }
        };

        Self { manager }
    }

    /// Connector with no backing Redis, for tests and degraded startup.
    pub fn disconnected() -> Self {
        Self { manager: None }
    }

    pub fn is_available(&self) -> bool {
        self.manager.is_some()
    }

    fn conn(&self) -> Result<ConnectionManager> {
        self.manager.clone().context("Redis is not connected")
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn()?;
        Ok(conn.get(key).await?)
    }

    pub async fn setex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<()> {
        let mut conn = self.conn()?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn()?;
        Ok(conn.del(key).await?)
    }

    pub async fn expire(&self, key: &str, ttl_seconds: i64) -> Result<()> {
        let mut conn = self.conn()?;
        conn.expire::<_, ()>(key, ttl_seconds).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn()?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    /// Collect all keys matching `pattern` via cursored SCAN.
    pub async fn scan_match(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn()?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}
