use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://yanze-pulid-flux.hf.space/call/generate_image";
pub const DEFAULT_DOWNLOAD_URL: &str = "https://yanze-pulid-flux.hf.space/file=";

/// Endpoints and time bounds for the hosted PuLID space.
#[derive(Debug, Clone)]
pub struct PulidConfig {
    /// Job creation endpoint; the poll stream lives at `{api_url}/{event_id}`.
    pub api_url: String,
    /// Prefix the remote image path is appended to.
    pub download_url: String,
    pub output_dir: PathBuf,
    pub connect_timeout: Duration,
    pub poll_timeout: Option<Duration>,
    pub download_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub pulid: PulidConfig,
    pub server: ServerConfig,
    pub log: LogSettings,
}

impl Default for PulidConfig {
    fn default() -> Self {
        PulidConfig {
            api_url: DEFAULT_API_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            output_dir: PathBuf::from("."),
            connect_timeout: Duration::from_secs(30),
            poll_timeout: Some(Duration::from_secs(600)),
            download_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl PulidConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = env::var("PULID_API_URL").unwrap_or(defaults.api_url);
        let download_url = env::var("PULID_DOWNLOAD_URL").unwrap_or(defaults.download_url);
        let output_dir = env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let connect_timeout = secs_from_env("CONNECT_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);
        let poll_timeout = bound_from_env("POLL_TIMEOUT_SECS").unwrap_or(defaults.poll_timeout);
        let download_timeout =
            bound_from_env("DOWNLOAD_TIMEOUT_SECS").unwrap_or(defaults.download_timeout);

        PulidConfig {
            api_url,
            download_url,
            output_dir,
            connect_timeout,
            poll_timeout,
            download_timeout,
        }
    }

    pub fn with_endpoints(
        mut self,
        api_url: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        self.api_url = api_url.into();
        self.download_url = download_url.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.download_timeout = timeout;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.port);

        ServerConfig { host, port }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json = env::var("LOG_JSON").ok().map_or(false, |val| val == "true");
        let file = env::var("LOG_FILE").ok().filter(|path| !path.is_empty());

        LogSettings { level, json, file }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            pulid: PulidConfig::default(),
            server: ServerConfig::default(),
            log: LogSettings::default(),
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        RelayConfig {
            pulid: PulidConfig::from_env(),
            server: ServerConfig::from_env(),
            log: LogSettings::from_env(),
        }
    }

    pub fn with_pulid(mut self, config: PulidConfig) -> Self {
        self.pulid = config;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }
}

fn secs_from_env(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

/// `Some(None)` when the variable is `0`, which switches the bound off.
fn bound_from_env(key: &str) -> Option<Option<Duration>> {
    secs_from_env(key).map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_hosted_space() {
        let config = PulidConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.download_url, DEFAULT_DOWNLOAD_URL);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.poll_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn builders_override_fields() {
        let config = PulidConfig::new()
            .with_endpoints("http://localhost/call/x", "http://localhost/file=")
            .with_output_dir("/tmp/out")
            .with_poll_timeout(None);

        assert_eq!(config.api_url, "http://localhost/call/x");
        assert_eq!(config.download_url, "http://localhost/file=");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.poll_timeout.is_none());

        let relay = RelayConfig::new().with_pulid(config).with_port(9000);
        assert_eq!(relay.server.port, 9000);
        assert_eq!(relay.pulid.api_url, "http://localhost/call/x");
    }

    #[test]
    fn zero_bound_disables_timeout() {
        env::set_var("PULID_RELAY_TEST_BOUND_ZERO", "0");
        env::set_var("PULID_RELAY_TEST_BOUND_SET", "45");
        env::set_var("PULID_RELAY_TEST_BOUND_BAD", "soon");

        assert_eq!(bound_from_env("PULID_RELAY_TEST_BOUND_ZERO"), Some(None));
        assert_eq!(
            bound_from_env("PULID_RELAY_TEST_BOUND_SET"),
            Some(Some(Duration::from_secs(45)))
        );
        assert_eq!(bound_from_env("PULID_RELAY_TEST_BOUND_BAD"), None);
        assert_eq!(bound_from_env("PULID_RELAY_TEST_BOUND_UNSET"), None);
    }
}
