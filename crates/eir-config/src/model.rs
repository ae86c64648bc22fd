//! `EirConfig` struct tree, mirroring the key groups named in the
//! configuration surface: `server.*`, `database.*`, `diameter.*`,
//! `cache.*`, `logging.*`, `metrics.*`, `governance.*`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EirConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub diameter: DiameterConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub governance: GovernanceConfig,
}

impl Default for EirConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            diameter: DiameterConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            governance: GovernanceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8443,
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            idle_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseType {
    Postgres,
    InMemory,
}

impl Default for DatabaseType {
    fn default() -> Self {
        DatabaseType::Postgres
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub kind: DatabaseType,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub ssl_mode: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseType::default(),
            host: "localhost".to_string(),
            port: 5432,
            database: "eir".to_string(),
            username: "eir".to_string(),
            password: String::new(),
            ssl_mode: "disable".to_string(),
            max_open_conns: 10,
            max_idle_conns: 5,
            conn_max_lifetime_secs: 1800,
        }
    }
}

impl DatabaseConfig {
    /// Build a libpq-style connection string for `sqlx::postgres::PgPoolOptions::connect`.
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username, self.password, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiameterConfig {
    pub enabled: bool,
    pub listen_addr: String,
    pub origin_host: String,
    pub origin_realm: String,
    pub watchdog_interval_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DiameterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "0.0.0.0:3868".to_string(),
            origin_host: "eir.example.com".to_string(),
            origin_realm: "example.com".to_string(),
            watchdog_interval_secs: 30,
            idle_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheProvider {
    None,
    Redis,
    Memcached,
}

impl Default for CacheProvider {
    fn default() -> Self {
        CacheProvider::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub provider: CacheProvider,
    pub ttl_secs: u64,
    pub redis_addr: String,
    pub redis_password: String,
    pub redis_db: i64,
    pub memcached_servers: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: CacheProvider::default(),
            ttl_secs: 300,
            redis_addr: "redis://127.0.0.1:6379".to_string(),
            redis_password: String::new(),
            redis_db: 0,
            memcached_servers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub hash_imeis: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            hash_imeis: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub enabled: bool,
    pub manager_url: String,
    pub service_name: String,
    pub pod_name: String,
    pub notification_port: u16,
    pub pod_ip: String,
    pub subscriptions: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            manager_url: String::new(),
            service_name: "eir-core".to_string(),
            pod_name: String::new(),
            notification_port: 9595,
            pod_ip: String::new(),
            subscriptions: Vec::new(),
            timeout_secs: 5,
        }
    }
}
