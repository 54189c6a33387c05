//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The initial credential comes from the API_TOKEN env var or token_file,
//! never from the TOML itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use api_auth::REFRESH_PATH;
use api_client::ClientConfig;
use common::Credential;
use serde::Deserialize;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// API endpoint settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is joined onto, e.g. `http://localhost:8080/api`
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// 0 waits for an in-flight refresh indefinitely
    #[serde(default)]
    pub refresh_wait_timeout_secs: u64,
}

/// Where the credential lives between runs
#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(skip)]
    pub token: Option<Credential>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_timeout() -> u64 {
    30
}

fn default_refresh_path() -> String {
    REFRESH_PATH.to_string()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Credential resolution order:
    /// 1. API_TOKEN env var
    /// 2. token_file path from config (a missing file means signed out)
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if !config.api.refresh_path.starts_with('/') {
            return Err(common::Error::Config(format!(
                "refresh_path must start with /, got: {}",
                config.api.refresh_path
            )));
        }

        if let Some(token) = std::env::var("API_TOKEN")
            .ok()
            .map(Credential::from)
            .filter(|c| !c.is_empty())
        {
            config.session.token = Some(token);
        } else if let Some(ref token_file) = config.session.token_file {
            config.session.token = crate::token_file::load(token_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read token_file {}: {e}",
                    token_file.display()
                ))
            })?;
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("api-cli.toml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            refresh_path: self.api.refresh_path.clone(),
            refresh_wait_timeout: match self.api.refresh_wait_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn valid_toml() -> &'static str {
        r#"
[api]
base_url = "http://localhost:8080/api"
"#
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("api-cli.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());
        unsafe { remove_env("API_TOKEN") };

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.refresh_path, "/auth/refresh");
        assert_eq!(config.api.refresh_wait_timeout_secs, 0);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert!(config.session.token_file.is_none());
        assert!(config.session.token.is_none());

        let client = config.client_config();
        assert_eq!(client.refresh_path, "/auth/refresh");
        assert_eq!(client.refresh_wait_timeout, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_full_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "https://books.example.com/api"
timeout_secs = 5
refresh_path = "/session/renew"
refresh_wait_timeout_secs = 10

[log]
format = "json"
"#,
        );
        unsafe { remove_env("API_TOKEN") };

        let config = Config::load(&path).unwrap();
        assert_eq!(config.log.format, LogFormat::Json);
        let client = config.client_config();
        assert_eq!(client.refresh_path, "/session/renew");
        assert_eq!(client.refresh_wait_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/api-cli.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(
            Config::load(&path),
            Err(common::Error::Toml(_))
        ));
    }

    #[test]
    fn test_missing_api_section_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[log]\nformat = \"json\"\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"localhost:8080/api\"\n");

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("base_url"), "got: {err}");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"http://localhost/api\"\ntimeout_secs = 0\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_relative_refresh_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"http://localhost/api\"\nrefresh_path = \"auth/refresh\"\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("refresh_path"), "got: {err}");
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"http://localhost/api\"\n[log]\nformat = \"xml\"\n",
        );
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_token_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { set_env("API_TOKEN", "tok-env") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("API_TOKEN") };

        assert_eq!(config.session.token, Some(Credential::new("tok-env")));
    }

    #[test]
    fn test_token_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "tok-file\n").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "[api]\nbase_url = \"http://localhost/api\"\n[session]\ntoken_file = \"{}\"\n",
                token_path.display()
            ),
        );

        unsafe { remove_env("API_TOKEN") };
        let config = Config::load(&path).unwrap();
        assert_eq!(config.session.token, Some(Credential::new("tok-file")));
    }

    #[test]
    fn test_token_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "tok-file").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "[api]\nbase_url = \"http://localhost/api\"\n[session]\ntoken_file = \"{}\"\n",
                token_path.display()
            ),
        );

        unsafe { set_env("API_TOKEN", "tok-env") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("API_TOKEN") };

        assert_eq!(config.session.token, Some(Credential::new("tok-env")));
    }

    #[test]
    fn test_blank_env_token_falls_back_to_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "tok-file").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "[api]\nbase_url = \"http://localhost/api\"\n[session]\ntoken_file = \"{}\"\n",
                token_path.display()
            ),
        );

        unsafe { set_env("API_TOKEN", "   ") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("API_TOKEN") };

        assert_eq!(config.session.token, Some(Credential::new("tok-file")));
    }

    #[test]
    fn test_missing_token_file_means_signed_out() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &format!(
                "[api]\nbase_url = \"http://localhost/api\"\n[session]\ntoken_file = \"{}\"\n",
                dir.path().join("not-yet").display()
            ),
        );

        unsafe { remove_env("API_TOKEN") };
        let config = Config::load(&path).unwrap();
        assert!(config.session.token.is_none());
        assert!(config.session.token_file.is_some());
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = Config::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, PathBuf::from("/custom/path.toml"));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("api-cli.toml"));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(
            path,
            PathBuf::from("/cli/wins.toml"),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );
        unsafe { remove_env("CONFIG_PATH") };
    }
}
