use std::{fmt::Display, net::IpAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use histoury_data_management::DATA_DIR;
use tracing::{info, warn};

pub const DEFAULT_DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";

pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub secret_key: String,
    pub frontend_url: String,
    /// Base URL the OAuth provider redirects back to. Derived from the request when unset.
    pub public_url: Option<String>,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_discovery_url: String,
    pub google_vision_api_key: Option<String>,
    pub google_places_api_key: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub landmark_model_url: Option<String>,
    pub tls: Option<TlsPaths>,
}

impl Config {
    /// Reads the environment, after loading `.env` if present.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(err) = dotenv::dotenv() {
            info!("No .env file loaded: {err}");
        }

        let secret_key = var("SECRET_KEY").ok_or_else(|| anyhow!("SECRET_KEY must be set"))?;
        if secret_key.len() < 16 {
            warn!("SECRET_KEY is shorter than 16 bytes");
        }

        let tls = match (var("TLS_CERT"), var("TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsPaths { cert: cert.into(), key: key.into() }),
            (None, None) => None,
            _ => return Err(anyhow!("TLS_CERT and TLS_KEY must be set together")),
        };

        let data_dir = match var("DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => project_root::get_project_root()
                .context("Failed to locate project root for the default data directory")?
                .join(DATA_DIR),
        };

        Ok(Self {
            host: try_load("HOST", "0.0.0.0")?,
            port: try_load("PORT", "5000")?,
            data_dir,
            secret_key,
            frontend_url: try_load::<String>("FRONTEND_URL", "http://localhost:3000")?
                .trim_end_matches('/')
                .to_string(),
            public_url: var("PUBLIC_URL").map(|url| url.trim_end_matches('/').to_string()),
            google_client_id: secret("GOOGLE_CLIENT_ID"),
            google_client_secret: secret("GOOGLE_CLIENT_SECRET"),
            google_discovery_url: try_load("GOOGLE_DISCOVERY_URL", DEFAULT_DISCOVERY_URL)?,
            google_vision_api_key: var("GOOGLE_VISION_API_KEY"),
            google_places_api_key: secret("GOOGLE_PLACES_API_KEY"),
            openai_api_key: secret("OPENAI_API_KEY"),
            openai_model: try_load("OPENAI_MODEL", "gpt-3.5-turbo")?,
            landmark_model_url: var("LANDMARK_MODEL_URL"),
            tls,
        })
    }
}

/// Unset and empty are treated alike.
fn var(key: &str) -> Option<String> {
    dotenv::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

/// Credentials for third-party services. Missing ones only fail the features that need them.
fn secret(key: &str) -> String {
    var(key).unwrap_or_else(|| {
        warn!("{key} not set, dependent features will fail");
        String::new()
    })
}

#[cfg(test)]
impl Config {
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            data_dir,
            secret_key: "test-secret-key-0123456789".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            public_url: None,
            google_client_id: "client-id".to_string(),
            google_client_secret: "client-secret".to_string(),
            google_discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            google_vision_api_key: None,
            google_places_api_key: String::new(),
            openai_api_key: String::new(),
            openai_model: "gpt-3.5-turbo".to_string(),
            landmark_model_url: None,
            tls: None,
        }
    }
}
