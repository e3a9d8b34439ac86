use crate::domain::lookback::LookbackWindow;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard";
const INFERENCE_HOST_ENV: &str = "INFERENCE_API_HOST";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub inference_api: InferenceApiSettings,
    pub ui: UiSettings,
    pub data: DataSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    /// Sessions untouched for this long are dropped when a new one is created
    pub session_idle_secs: u64,
}

impl ServerSettings {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceApiSettings {
    pub host: String,
    pub port: u16,
    pub endpoint: String,
    pub timeout_secs: Option<u64>,
}

impl InferenceApiSettings {
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.endpoint)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiSettings {
    pub default_lookback_hours: i64,
}

impl UiSettings {
    pub fn default_lookback(&self) -> anyhow::Result<LookbackWindow> {
        LookbackWindow::new(self.default_lookback_hours).ok_or_else(|| {
            anyhow::anyhow!(
                "ui.default_lookback_hours must be at least 1, got {}",
                self.default_lookback_hours
            )
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    pub production_path: PathBuf,
    pub prediction_path: PathBuf,
}

/// Load settings from `path` (any format the config crate recognises by
/// extension; the file is optional). The inference host can be overridden
/// from the environment for container deployments.
pub fn load_app_config(path: &str) -> anyhow::Result<AppConfig> {
    load_app_config_with_host(path, std::env::var(INFERENCE_HOST_ENV).ok())
}

fn load_app_config_with_host(path: &str, host_override: Option<String>) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8050")?
        .set_default("server.session_idle_secs", 3600)?
        .set_default("inference_api.host", "localhost")?
        .set_default("inference_api.port", 5001)?
        .set_default("inference_api.endpoint", "/run-inference")?
        .set_default("ui.default_lookback_hours", 24)?
        .set_default("data.production_path", "data/prod_data/production.csv")?
        .set_default("data.prediction_path", "data/prod_data/predictions.csv")?
        .add_source(config::File::with_name(path).required(false))
        .set_override_option("inference_api.host", host_override)?
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.ui.default_lookback()?;
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_app_config_with_host("does/not/exist", None).unwrap();

        assert_eq!(config.inference_api.url(), "http://localhost:5001/run-inference");
        assert_eq!(config.inference_api.timeout(), None);
        assert_eq!(config.ui.default_lookback_hours, 24);
        assert_eq!(config.server.bind, "0.0.0.0:8050".parse().unwrap());
        assert_eq!(config.server.session_idle_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_file_and_host_override() {
        let file = write_config(
            r#"
[inference_api]
host = "ml-box"
port = 6001
endpoint = "/predict-next"
timeout_secs = 30

[ui]
default_lookback_hours = 48
"#,
        );
        let path = file.path().to_str().unwrap();

        let config = load_app_config_with_host(path, None).unwrap();
        assert_eq!(config.inference_api.url(), "http://ml-box:6001/predict-next");
        assert_eq!(config.inference_api.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.ui.default_lookback().unwrap().hours(), 48);

        let config = load_app_config_with_host(path, Some("inference".to_string())).unwrap();
        assert_eq!(config.inference_api.url(), "http://inference:6001/predict-next");
    }

    #[test]
    fn test_rejects_zero_default_lookback() {
        let file = write_config("[ui]\ndefault_lookback_hours = 0\n");
        assert!(load_app_config_with_host(file.path().to_str().unwrap(), None).is_err());
    }
}
