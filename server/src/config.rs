use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};
use visit_tracker_data_management::DataManagerConfig;

const DEFAULT_ALLOWED_ORIGINS: &str = "https://air-therm.com,\
    http://air-therm.com,\
    https://www.air-therm.com,\
    http://www.air-therm.com,\
    http://localhost:3000,\
    https://localhost:3000";

/// Runtime configuration, loaded once at startup and handed to server
/// construction. Tests build it by hand with temporary paths and origin
/// lists instead of going through the environment.
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub visit_log_path: PathBuf,
    pub allowed_origins: Vec<String>,
    pub sheet_webhook_url: Option<String>,
    pub record_postal: bool,
    pub tls: Option<TlsConfig>,
}

#[derive(Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl ServerConfig {
    pub fn load() -> Self {
        let visit_log_path = env::var("VISIT_TRACKER_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| DataManagerConfig::default().visit_log_path);

        let allowed_origins = try_load::<String>("VISIT_TRACKER_ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            port: try_load("VISIT_TRACKER_PORT", "3000"),
            visit_log_path,
            allowed_origins,
            sheet_webhook_url: env::var("VISIT_TRACKER_SHEET_WEBHOOK").ok(),
            record_postal: try_load("VISIT_TRACKER_RECORD_POSTAL", "true"),
            tls: load_tls(),
        }
    }

    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    pub fn data_manager_config(&self) -> DataManagerConfig {
        DataManagerConfig {
            visit_log_path: self.visit_log_path.clone(),
            sheet_webhook_url: self.sheet_webhook_url.clone(),
            record_postal: self.record_postal,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_tls() -> Option<TlsConfig> {
    let cert_path = env::var("VISIT_TRACKER_TLS_CERT").ok()?;
    let key_path = env::var("VISIT_TRACKER_TLS_KEY").ok()?;

    Some(TlsConfig {
        cert_path: cert_path.into(),
        key_path: key_path.into(),
    })
}
