use std::net::SocketAddr;

use serde::Deserialize;

use crate::cors::CorsConfig;

/// Default address when neither the config file nor the CLI sets one
pub const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    5000,
);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    /// Prefix every route is registered under (e.g. `/api`)
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cors: Option<CorsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            mount_path: default_mount_path(),
            health: HealthConfig::default(),
            cors: None,
        }
    }
}

impl ServerConfig {
    /// Join the mount path with a route path
    pub fn route(&self, path: &str) -> String {
        format!("{}{path}", self.mount_path)
    }
}

fn default_mount_path() -> String {
    "/api".to_string()
}

/// Liveness route, relative to the mount path
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "HealthConfig::enabled_by_default")]
    pub enabled: bool,
    #[serde(default = "HealthConfig::default_path")]
    pub path: String,
}

impl HealthConfig {
    #[allow(clippy::missing_const_for_fn)]
    fn enabled_by_default() -> bool {
        true
    }

    fn default_path() -> String {
        "/health".to_string()
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: Self::enabled_by_default(),
            path: Self::default_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mount_under_api() {
        let config = ServerConfig::default();
        assert_eq!(config.mount_path, "/api");
        assert_eq!(config.route("/generate"), "/api/generate");
        assert!(config.listen_address.is_none());
    }

    #[test]
    fn empty_mount_path_serves_from_root() {
        let config: ServerConfig = toml::from_str(r#"mount_path = """#).unwrap();
        assert_eq!(config.route("/test"), "/test");
    }

    #[test]
    fn health_path_is_relative_to_mount() {
        let config: ServerConfig = toml::from_str("[health]\npath = \"/status\"").unwrap();
        assert!(config.health.enabled);
        assert_eq!(config.route(&config.health.path), "/api/status");
    }

    #[test]
    fn listen_address_parses() {
        let config: ServerConfig = toml::from_str(r#"listen_address = "127.0.0.1:8080""#).unwrap();
        assert_eq!(config.listen_address, Some("127.0.0.1:8080".parse().unwrap()));
    }
}
