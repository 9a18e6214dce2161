//! Process configuration from flags and environment variables.
//!
//! Every flag falls back to an environment variable so the server can be
//! configured entirely from a container spec.

use crate::interaction::services::ConnectionSettings;
use crate::sidecar::adapters::http::HttpSidecarSettings;
use crate::workspace::adapters::docker::DockerWorkspaceSettings;
use crate::workspace::services::WorkspaceSettings;
use clap::Parser;
use std::fmt;
use std::time::Duration;

/// Command-line and environment configuration of the server.
#[derive(Clone, Parser)]
#[command(name = "vibe-control", version, about = "Control plane for per-project coding agents")]
pub struct ServerSettings {
    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Deployment environment; `production` switches logs to JSON.
    #[arg(long, env = "ENVIRONMENT", default_value = "development")]
    pub environment: String,

    /// Default log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 10)]
    pub database_pool_size: u32,

    /// Orchestrator namespace workspaces are created in.
    #[arg(long, env = "WORKSPACE_NAMESPACE", default_value = "opencode")]
    pub workspace_namespace: String,

    /// Image bundling the agent server and its sidecars.
    #[arg(long, env = "WORKSPACE_IMAGE", default_value = "opencode/workspace:latest")]
    pub workspace_image: String,

    /// Volume size requested for each workspace.
    #[arg(long, env = "WORKSPACE_VOLUME_SIZE", default_value = "1Gi")]
    pub workspace_volume_size: String,

    /// Base64-encoded 32-byte key for credential encryption.
    #[arg(long, env = "CONFIG_ENCRYPTION_KEY")]
    pub config_encryption_key: String,

    /// Bearer secret for sidecar calls and internal callbacks.
    #[arg(long, env = "OPENCODE_SHARED_SECRET")]
    pub shared_secret: Option<String>,

    /// Port of the in-pod agent API.
    #[arg(long, env = "SIDECAR_AGENT_PORT", default_value_t = 3003)]
    pub agent_port: u16,

    /// Port of the in-pod file browser.
    #[arg(long, env = "SIDECAR_FILES_PORT", default_value_t = 3001)]
    pub files_port: u16,

    /// Bound, in seconds, on sidecar and orchestrator calls.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Interaction ping interval in seconds.
    #[arg(long, env = "WS_HEARTBEAT_SECS", default_value_t = 30)]
    pub heartbeat_secs: u64,

    /// Interaction read deadline in seconds.
    #[arg(long, env = "WS_READ_TIMEOUT_SECS", default_value_t = 300)]
    pub read_timeout_secs: u64,
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("log_level", &self.log_level)
            .field("database_url", &"<redacted>")
            .field("database_pool_size", &self.database_pool_size)
            .field("workspace_namespace", &self.workspace_namespace)
            .field("workspace_image", &self.workspace_image)
            .field("workspace_volume_size", &self.workspace_volume_size)
            .field("config_encryption_key", &"<redacted>")
            .field(
                "shared_secret",
                &self.shared_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("agent_port", &self.agent_port)
            .field("files_port", &self.files_port)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("heartbeat_secs", &self.heartbeat_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish()
    }
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl ServerSettings {
    /// Returns `true` when running in production.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    /// Log output derived from the environment and level.
    #[must_use]
    pub fn log(&self) -> LogSettings {
        LogSettings {
            default_filter: self.log_level.clone(),
            json: self.is_production(),
        }
    }

    /// Bound applied to upstream calls.
    #[must_use]
    pub const fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Workspace naming and polling.
    #[must_use]
    pub fn workspace(&self) -> WorkspaceSettings {
        WorkspaceSettings {
            namespace: self.workspace_namespace.clone(),
            ..WorkspaceSettings::default()
        }
    }

    /// Docker orchestrator configuration.
    #[must_use]
    pub fn docker(&self) -> DockerWorkspaceSettings {
        DockerWorkspaceSettings {
            image: self.workspace_image.clone(),
            volume_size: self.workspace_volume_size.clone(),
            agent_port: self.agent_port,
            files_port: self.files_port,
            timeout: self.upstream_timeout(),
        }
    }

    /// Sidecar client configuration.
    #[must_use]
    pub fn sidecar(&self) -> HttpSidecarSettings {
        HttpSidecarSettings {
            agent_port: self.agent_port,
            files_port: self.files_port,
            shared_secret: self.shared_secret.clone(),
            timeout: self.upstream_timeout(),
        }
    }

    /// Interaction socket timing.
    #[must_use]
    pub fn connection(&self) -> ConnectionSettings {
        ConnectionSettings {
            heartbeat: Duration::from_secs(self.heartbeat_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            ..ConnectionSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServerSettings;
    use clap::Parser;
    use rstest::rstest;
    use std::time::Duration;

    fn parse(extra: &[&str]) -> ServerSettings {
        let base = [
            "vibe-control",
            "--database-url",
            "postgres://localhost/vibe",
            "--config-encryption-key",
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
        ];
        ServerSettings::try_parse_from(base.iter().chain(extra)).expect("flags parse")
    }

    #[rstest]
    #[case("production", true)]
    #[case(" Production ", true)]
    #[case("development", false)]
    fn production_switches_logs_to_json(#[case] environment: &str, #[case] json: bool) {
        let settings = parse(&["--environment", environment, "--log-level", "debug"]);

        let log = settings.log();

        assert_eq!(log.json, json);
        assert_eq!(log.default_filter, "debug");
    }

    #[rstest]
    fn adapter_settings_share_ports_and_timeout() {
        let settings = parse(&[
            "--agent-port",
            "4000",
            "--files-port",
            "4001",
            "--upstream-timeout-secs",
            "5",
            "--shared-secret",
            "s3cret",
        ]);

        let docker = settings.docker();
        let sidecar = settings.sidecar();

        assert_eq!((docker.agent_port, docker.files_port), (4000, 4001));
        assert_eq!((sidecar.agent_port, sidecar.files_port), (4000, 4001));
        assert_eq!(docker.timeout, Duration::from_secs(5));
        assert_eq!(sidecar.shared_secret.as_deref(), Some("s3cret"));
    }

    #[rstest]
    fn connection_timing_comes_from_flags() {
        let settings = parse(&["--heartbeat-secs", "7", "--read-timeout-secs", "70"]);

        let connection = settings.connection();

        assert_eq!(connection.heartbeat, Duration::from_secs(7));
        assert_eq!(connection.read_timeout, Duration::from_secs(70));
    }

    #[rstest]
    fn debug_output_redacts_secrets() {
        let settings = parse(&["--shared-secret", "s3cret"]);

        let rendered = format!("{settings:?}");

        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("postgres://"));
    }
}
