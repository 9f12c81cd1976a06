//! L2 backend: a network client to a Redis/Valkey-protocol server.
//!
//! Operates purely on bytes; the two-level coordinator is responsible
//! for serialization, so a `SerializationError` never originates here. Key
//! prefixing, TTL defaulting, and connection-vs-protocol failure
//! classification live in this module; the circuit breaker wraps every
//! method that talks to the network.

use crate::circuit_breaker::{Admission, CircuitBreaker};
use crate::error::{CacheError, CacheResult};
use r2d2::Pool;
use redis::{Commands, ConnectionLike, RedisError};
use std::time::Duration;

/// Wire protocol variant. Redis and Valkey are RESP wire-compatible; this
/// only changes what gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L2Protocol {
    Redis,
    Valkey,
}

/// r2d2 connection manager that applies the configured connect and socket
/// timeouts itself, rather than relying on the `redis` crate's built-in
/// `ManageConnection` impl (which opens connections via the untimed
/// `Client::get_connection`).
struct RedisConnectionManager {
    client: redis::Client,
    connect_timeout: Duration,
    socket_timeout: Duration,
}

impl r2d2::ManageConnection for RedisConnectionManager {
    type Connection = redis::Connection;
    type Error = RedisError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut conn = self.client.get_connection_with_timeout(self.connect_timeout)?;
        conn.set_read_timeout(Some(self.socket_timeout))?;
        conn.set_write_timeout(Some(self.socket_timeout))?;
        Ok(conn)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        redis::cmd("PING").query(conn)
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        !conn.is_open()
    }
}

pub struct L2Backend {
    pool: Pool<RedisConnectionManager>,
    prefix: String,
    default_ttl: Option<Duration>,
    breaker: CircuitBreaker,
    protocol: L2Protocol,
}

/// Snapshot of L2 connectivity and breaker state, safe to hand to callers.
#[derive(Debug, Clone)]
pub struct L2Stats {
    pub enabled: bool,
    pub backend: &'static str,
    pub connected: bool,
    pub breaker_state: crate::circuit_breaker::BreakerState,
    pub consecutive_failures: u32,
}

pub struct L2Config {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
    pub protocol: L2Protocol,
    pub key_prefix: String,
    pub default_ttl: Option<Duration>,
    pub breaker_threshold: u32,
    pub breaker_reset_timeout: Duration,
    pub breaker_enabled: bool,
}

impl L2Backend {
    pub fn new(config: L2Config) -> CacheResult<Self> {
        let mut url = String::from("redis://");
        if let Some(password) = &config.password {
            url.push_str(&format!(":{password}@"));
        }
        url.push_str(&format!("{}:{}/{}", config.host, config.port, config.db));

        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Configuration(format!("invalid L2 address: {e}")))?;
        let manager = RedisConnectionManager {
            client,
            connect_timeout: config.connect_timeout,
            socket_timeout: config.socket_timeout,
        };
        // `build_unchecked` is lazy: it does not dial out or block on
        // construction, so building a `Cache` while L2 is down still
        // succeeds. Connection failures surface at call time through
        // `guarded`, which classifies them as `CacheError::Connection` and
        // feeds the breaker.
        let pool = Pool::builder()
            .connection_timeout(config.connect_timeout)
            .build_unchecked(manager);

        Ok(Self {
            pool,
            prefix: config.key_prefix,
            default_ttl: config.default_ttl,
            breaker: CircuitBreaker::new(
                config.breaker_threshold,
                config.breaker_reset_timeout,
                config.breaker_enabled,
            ),
            protocol: config.protocol,
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    fn strip_prefix<'a>(&self, namespaced: &'a str) -> &'a str {
        namespaced
            .strip_prefix(&self.prefix)
            .and_then(|s| s.strip_prefix(':'))
            .unwrap_or(namespaced)
    }

    /// Runs `op` under the breaker's gate, classifying any `RedisError` as a
    /// `ConnectionError` and reporting the outcome back to the breaker.
    fn guarded<T>(&self, op: impl FnOnce() -> Result<T, RedisError>) -> CacheResult<T> {
        match self.breaker.admit() {
            Admission::Denied => Err(CacheError::Connection(
                "circuit breaker open: L2 short-circuited".to_string(),
            )),
            Admission::Allowed | Admission::Probe => match op() {
                Ok(value) => {
                    self.breaker.report_success();
                    Ok(value)
                }
                Err(e) => {
                    self.breaker.report_failure();
                    tracing::warn!(error = %e, "l2 operation failed");
                    Err(CacheError::Connection(e.to_string()))
                }
            },
        }
    }

    fn connection(&self) -> Result<r2d2::PooledConnection<RedisConnectionManager>, RedisError> {
        let conn = self.pool.get().map_err(|e| {
            RedisError::from((redis::ErrorKind::IoError, "r2d2 pool error", e.to_string()))
        })?;
        Ok(conn)
    }

    pub fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let namespaced = self.namespaced(key);
        self.guarded(|| {
            let mut conn = self.connection()?;
            conn.get(&namespaced)
        })
    }

    pub fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()> {
        let namespaced = self.namespaced(key);
        let effective_ttl = ttl.or(self.default_ttl);
        self.guarded(|| {
            let mut conn = self.connection()?;
            let result: Result<(), RedisError> = match effective_ttl {
                Some(ttl) => conn.set_ex(&namespaced, value, ttl.as_secs().max(1)),
                None => conn.set(&namespaced, value),
            };
            result
        })
    }

    /// Atomic `SET key value NX [EX ttl]`. Returns `true` when the key was
    /// previously absent and this call wrote it.
    pub fn set_if_not_exist(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> CacheResult<bool> {
        let namespaced = self.namespaced(key);
        let effective_ttl = ttl.or(self.default_ttl);
        self.guarded(|| {
            let mut conn = self.connection()?;
            let mut cmd = redis::cmd("SET");
            cmd.arg(&namespaced).arg(&value).arg("NX");
            if let Some(ttl) = effective_ttl {
                cmd.arg("EX").arg(ttl.as_secs().max(1));
            }
            let reply: Option<String> = cmd.query(&mut *conn)?;
            Ok(reply.is_some())
        })
    }

    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        let namespaced = self.namespaced(key);
        self.guarded(|| {
            let mut conn = self.connection()?;
            let removed: i64 = conn.del(&namespaced)?;
            Ok(removed > 0)
        })
    }

    pub fn exists(&self, key: &str) -> CacheResult<bool> {
        let namespaced = self.namespaced(key);
        self.guarded(|| {
            let mut conn = self.connection()?;
            let present: bool = conn.exists(&namespaced)?;
            Ok(present)
        })
    }

    pub fn get_ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let namespaced = self.namespaced(key);
        self.guarded(|| {
            let mut conn = self.connection()?;
            let ttl_seconds: i64 = conn.ttl(&namespaced)?;
            Ok(if ttl_seconds > 0 {
                Some(Duration::from_secs(ttl_seconds as u64))
            } else {
                None
            })
        })
    }

    /// Incremental `SCAN cursor MATCH prefix:* COUNT n`, prefix stripped on
    /// return.
    pub fn list_keys(&self) -> CacheResult<Vec<String>> {
        let pattern = format!("{}:*", self.prefix);
        self.guarded(|| {
            let mut conn = self.connection()?;
            let mut cursor: u64 = 0;
            let mut out = Vec::new();
            loop {
                let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(200)
                    .query(&mut *conn)?;
                out.extend(batch);
                if next_cursor == 0 {
                    break;
                }
                cursor = next_cursor;
            }
            Ok(out.into_iter().map(|k| self.strip_prefix(&k).to_string()).collect())
        })
    }

    /// Removes every key under `self.prefix`, scanning incrementally so
    /// memory use stays bounded regardless of keyspace size.
    pub fn clear(&self) -> CacheResult<usize> {
        let pattern = format!("{}:*", self.prefix);
        self.guarded(|| {
            let mut conn = self.connection()?;
            let mut cursor: u64 = 0;
            let mut removed = 0usize;
            loop {
                let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(200)
                    .query(&mut *conn)?;
                if !batch.is_empty() {
                    removed += batch.len();
                    let _: () = conn.del(&batch)?;
                }
                if next_cursor == 0 {
                    break;
                }
                cursor = next_cursor;
            }
            Ok(removed)
        })
    }

    pub fn health_check(&self) -> bool {
        self.connection()
            .ok()
            .and_then(|mut conn| redis::cmd("PING").query::<String>(&mut *conn).ok())
            .is_some()
    }

    pub fn get_stats(&self) -> L2Stats {
        let snapshot = self.breaker.snapshot();
        L2Stats {
            enabled: true,
            backend: match self.protocol {
                L2Protocol::Redis => "redis",
                L2Protocol::Valkey => "valkey",
            },
            connected: self.health_check(),
            breaker_state: snapshot.state,
            consecutive_failures: snapshot.consecutive_failures,
        }
    }
}
