//! Layered configuration loader for the EIR core.
//!
//! Load order, last write wins: TOML file, then an optional
//! [`RemoteConfigSource`], then environment variable overrides.

pub mod env;
pub mod error;
pub mod model;
pub mod remote;

pub use error::{ConfigError, ConfigResult};
pub use model::*;
pub use remote::{NoopRemoteConfigSource, RemoteConfigSource};

const DEFAULT_CONFIG_PATH: &str = "./config/eir.toml";
const CONFIG_PATH_ENV: &str = "EIR_CONFIG_FILE";

/// Load configuration from file (if present), a remote source, and
/// environment overrides, in that order.
///
/// A missing config file is not an error: the defaults in
/// [`EirConfig::default`] apply and only the remote/env layers run.
pub async fn load(remote: &dyn RemoteConfigSource) -> ConfigResult<EirConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = match std::fs::read_to_string(&path) {
        Ok(contents) => toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            log::info!("no config file at {}, using defaults", path);
            EirConfig::default()
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    remote.apply(&mut config).await?;
    env::apply_env_overrides(&mut config);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_defaults_when_file_missing() {
        std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/eir.toml");
        let config = load(&NoopRemoteConfigSource).await.unwrap();
        assert_eq!(config.diameter.listen_addr, "0.0.0.0:3868");
        std::env::remove_var(CONFIG_PATH_ENV);
    }

    #[tokio::test]
    async fn env_override_wins_over_file_default() {
        std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/eir.toml");
        std::env::set_var("EIR_DIAMETER_ORIGIN_REALM", "override.example.com");

        let config = load(&NoopRemoteConfigSource).await.unwrap();
        assert_eq!(config.diameter.origin_realm, "override.example.com");

        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::remove_var("EIR_DIAMETER_ORIGIN_REALM");
    }
}
