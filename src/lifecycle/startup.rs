//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate the configuration
//! - Register the admin mount from the `[admin]` section
//! - Build the host server and bind its listener last

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{validate_config, ConfigError, MountConfig, ServerConfig};
use crate::http::HostServer;
use crate::mount::AdminMount;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to start serving.
pub struct Started {
    pub admin: AdminMount,
    pub server: HostServer,
    pub listener: TcpListener,
}

pub async fn startup(config: ServerConfig) -> Result<Started, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let admin = AdminMount::register(MountConfig::from(&config.admin));

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = HostServer::new(config, &admin);
    Ok(Started {
        admin,
        server,
        listener,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Setting;

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let mut config = ServerConfig::default();
        config.timeouts.request_secs = 0;

        let result = startup(config).await;
        assert!(matches!(
            result,
            Err(StartupError::Config(ConfigError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_rejects_route_syntax_in_base_url() {
        for base_url in ["/a/{*rest}", "/{x}"] {
            let mut config = ServerConfig::default();
            config.listener.bind_address = "127.0.0.1:0".to_string();
            config.admin.base_url = Setting::Set(base_url.to_string());

            let result = startup(config).await;
            assert!(
                matches!(result, Err(StartupError::Config(ConfigError::Validation(_)))),
                "base_url {base_url}"
            );
        }
    }

    #[tokio::test]
    async fn test_binds_ephemeral_port() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();

        let started = startup(config).await.unwrap();
        assert_ne!(started.listener.local_addr().unwrap().port(), 0);
        assert_eq!(started.admin.mount_path(), "/admin");
    }
}
