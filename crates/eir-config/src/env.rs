//! Environment-variable overrides, applied last ("last write wins").
//!
//! Keys follow `EIR_<SECTION>_<FIELD>`, e.g. `EIR_DATABASE_HOST`,
//! `EIR_DIAMETER_LISTEN_ADDR`. Unset variables leave the file-loaded
//! value untouched; unparsable values are logged and skipped rather
//! than failing startup.

use crate::model::EirConfig;

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_or_warn<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring unparsable override {}={}", name, raw);
            None
        }
    }
}

macro_rules! override_str {
    ($field:expr, $name:expr) => {
        if let Some(v) = var($name) {
            $field = v;
        }
    };
}

macro_rules! override_parsed {
    ($field:expr, $name:expr) => {
        if let Some(v) = var($name) {
            if let Some(parsed) = parse_or_warn(stringify!($name), &v) {
                $field = parsed;
            }
        }
    };
}

pub fn apply_env_overrides(config: &mut EirConfig) {
    override_str!(config.server.host, "EIR_SERVER_HOST");
    override_parsed!(config.server.port, "EIR_SERVER_PORT");
    override_parsed!(config.server.read_timeout_secs, "EIR_SERVER_READ_TIMEOUT_SECS");
    override_parsed!(config.server.write_timeout_secs, "EIR_SERVER_WRITE_TIMEOUT_SECS");
    override_parsed!(config.server.idle_timeout_secs, "EIR_SERVER_IDLE_TIMEOUT_SECS");

    override_str!(config.database.host, "EIR_DATABASE_HOST");
    override_parsed!(config.database.port, "EIR_DATABASE_PORT");
    override_str!(config.database.database, "EIR_DATABASE_NAME");
    override_str!(config.database.username, "EIR_DATABASE_USERNAME");
    override_str!(config.database.password, "EIR_DATABASE_PASSWORD");
    override_str!(config.database.ssl_mode, "EIR_DATABASE_SSL_MODE");
    override_parsed!(config.database.max_open_conns, "EIR_DATABASE_MAX_OPEN_CONNS");
    override_parsed!(config.database.max_idle_conns, "EIR_DATABASE_MAX_IDLE_CONNS");
    override_parsed!(
        config.database.conn_max_lifetime_secs,
        "EIR_DATABASE_CONN_MAX_LIFETIME_SECS"
    );

    override_parsed!(config.diameter.enabled, "EIR_DIAMETER_ENABLED");
    override_str!(config.diameter.listen_addr, "EIR_DIAMETER_LISTEN_ADDR");
    override_str!(config.diameter.origin_host, "EIR_DIAMETER_ORIGIN_HOST");
    override_str!(config.diameter.origin_realm, "EIR_DIAMETER_ORIGIN_REALM");
    override_parsed!(
        config.diameter.watchdog_interval_secs,
        "EIR_DIAMETER_WATCHDOG_INTERVAL_SECS"
    );
    override_parsed!(config.diameter.idle_timeout_secs, "EIR_DIAMETER_IDLE_TIMEOUT_SECS");

    override_parsed!(config.cache.ttl_secs, "EIR_CACHE_TTL_SECS");
    override_str!(config.cache.redis_addr, "EIR_CACHE_REDIS_ADDR");
    override_str!(config.cache.redis_password, "EIR_CACHE_REDIS_PASSWORD");
    override_parsed!(config.cache.redis_db, "EIR_CACHE_REDIS_DB");

    override_str!(config.logging.level, "EIR_LOGGING_LEVEL");
    override_str!(config.logging.format, "EIR_LOGGING_FORMAT");
    override_parsed!(config.logging.hash_imeis, "EIR_LOGGING_HASH_IMEIS");

    override_parsed!(config.metrics.enabled, "EIR_METRICS_ENABLED");
    override_parsed!(config.metrics.port, "EIR_METRICS_PORT");
    override_str!(config.metrics.path, "EIR_METRICS_PATH");

    override_parsed!(config.governance.enabled, "EIR_GOVERNANCE_ENABLED");
    override_str!(config.governance.manager_url, "EIR_GOVERNANCE_MANAGER_URL");
    override_str!(config.governance.service_name, "EIR_GOVERNANCE_SERVICE_NAME");
    override_str!(config.governance.pod_name, "EIR_GOVERNANCE_POD_NAME");
    override_parsed!(
        config.governance.notification_port,
        "EIR_GOVERNANCE_NOTIFICATION_PORT"
    );
    override_str!(config.governance.pod_ip, "EIR_GOVERNANCE_POD_IP");
    override_parsed!(config.governance.timeout_secs, "EIR_GOVERNANCE_TIMEOUT_SECS");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_set_variables() {
        std::env::set_var("EIR_SERVER_PORT", "9999");
        std::env::remove_var("EIR_SERVER_HOST");

        let mut config = EirConfig::default();
        let original_host = config.server.host.clone();
        apply_env_overrides(&mut config);

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, original_host);

        std::env::remove_var("EIR_SERVER_PORT");
    }
}
