use std::{path::PathBuf, sync::Arc, time::Duration};

use serde_json::{Map, Value};
use visit_tracker_lib::visit_record::VisitRecord;

use crate::{
    geo::GeoResolver, sheet_webhook::SheetWebhook, visit_log::VisitLog, DataManagerError,
    VISIT_LOG_PATH,
};

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the data layer. The log path and the two optional
/// repository-variant features (postal capture, spreadsheet forwarding) are
/// explicit values so tests can point everything at temporary state.
#[derive(Clone)]
pub struct DataManagerConfig {
    pub visit_log_path: PathBuf,
    pub sheet_webhook_url: Option<String>,
    pub record_postal: bool,
}

impl Default for DataManagerConfig {
    fn default() -> Self {
        let root = project_root::get_project_root().unwrap_or_else(|_| PathBuf::from("."));

        Self {
            visit_log_path: root.join(VISIT_LOG_PATH),
            sheet_webhook_url: None,
            record_postal: true,
        }
    }
}

#[derive(Clone)]
pub struct DataManager {
    visit_log: VisitLog,
    geo_resolver: Arc<GeoResolver>,
    sheet_webhook: Option<SheetWebhook>,
    record_postal: bool,
}

/// The public interface for all visit data management.
impl DataManager {
    pub async fn start(config: DataManagerConfig) -> Result<Self, DataManagerError> {
        let client = reqwest::Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .build()
            .map_err(|_| DataManagerError::Geo("Failed to build outbound HTTP client".to_string()))?;

        let geo_resolver = GeoResolver::with_default_providers(client.clone());
        Self::start_with_resolver(config, geo_resolver, client).await
    }

    /// Same as `start`, with the provider chain supplied by the caller.
    pub async fn start_with_resolver(
        config: DataManagerConfig,
        geo_resolver: GeoResolver,
        client: reqwest::Client,
    ) -> Result<Self, DataManagerError> {
        // Create the data dir if it doesn't exist
        if let Some(dir) = config.visit_log_path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .map_err(|_| DataManagerError::Storage(format!("Failed to create data directory: {:?}", dir)))?;
            }
        }

        let sheet_webhook = config
            .sheet_webhook_url
            .map(|url| SheetWebhook::new(client, url));

        Ok(DataManager {
            visit_log: VisitLog::new(config.visit_log_path),
            geo_resolver: Arc::new(geo_resolver),
            sheet_webhook,
            record_postal: config.record_postal,
        })
    }

    /// Enriches the payload with geo data and a timestamp, fans a copy out
    /// to the spreadsheet webhook when one is configured, and appends the
    /// record to the log. The webhook task is detached and independent of
    /// the append outcome, its failures are only ever visible in the logs.
    pub async fn record_visit(
        &self,
        payload: Map<String, Value>,
        client_ip: String,
    ) -> Result<VisitRecord, DataManagerError> {
        let geo = self.geo_resolver.resolve(&client_ip).await;
        let record = VisitRecord::build(payload, geo, self.record_postal);

        if let Some(webhook) = &self.sheet_webhook {
            let webhook = webhook.clone();
            let record = record.clone();
            tokio::spawn(async move {
                if let Err(err) = webhook.forward(&record).await {
                    tracing::warn!("Failed to forward visit to spreadsheet webhook: {:?}", err);
                }
            });
        }

        self.visit_log.append(&record).await?;

        Ok(record)
    }

    /// Full-log replay, most recent visit first.
    pub async fn get_visits(&self) -> Result<Vec<VisitRecord>, DataManagerError> {
        self.visit_log.read_all().await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_config(dir: &tempfile::TempDir) -> DataManagerConfig {
        DataManagerConfig {
            visit_log_path: dir.path().join("visits.log"),
            sheet_webhook_url: None,
            record_postal: true,
        }
    }

    async fn offline_manager(config: DataManagerConfig) -> DataManager {
        DataManager::start_with_resolver(config, GeoResolver::new(Vec::new()), reqwest::Client::new())
            .await
            .unwrap()
    }

    fn payload(path: &str) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("path".to_string(), json!(path));
        payload.insert("language".to_string(), json!("en-US"));
        payload
    }

    #[test]
    fn default_provider_chain_is_primary_then_fallback() {
        let resolver = GeoResolver::with_default_providers(reqwest::Client::new());
        assert_eq!(resolver.provider_names(), vec!["ipwho.is", "ipapi.co"]);
    }

    #[tokio::test]
    async fn fresh_manager_has_no_visits() {
        let dir = tempfile::tempdir().unwrap();
        let manager = offline_manager(test_config(&dir)).await;

        assert!(manager.get_visits().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn visit_is_persisted_even_when_enrichment_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = offline_manager(test_config(&dir)).await;

        let record = manager
            .record_visit(payload("/pricing"), "203.0.113.7".to_string())
            .await
            .unwrap();
        assert_eq!(record.country, "Unknown");
        assert_eq!(record.city, "Unknown");
        assert_eq!(record.postal, Some("Unknown".to_string()));

        let visits = manager.get_visits().await.unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].ip, "203.0.113.7");
        assert_eq!(visits[0].extra.get("path"), Some(&json!("/pricing")));
    }

    #[tokio::test]
    async fn replay_returns_visits_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let manager = offline_manager(test_config(&dir)).await;

        for path in ["/a", "/b", "/c"] {
            manager.record_visit(payload(path), "203.0.113.7".to_string()).await.unwrap();
        }

        let visits = manager.get_visits().await.unwrap();
        let paths: Vec<&Value> = visits.iter().map(|visit| visit.extra.get("path").unwrap()).collect();
        assert_eq!(paths, vec![&json!("/c"), &json!("/b"), &json!("/a")]);

        // Replay is idempotent without an intervening visit.
        assert_eq!(manager.get_visits().await.unwrap(), visits);
    }

    #[tokio::test]
    async fn failing_webhook_does_not_affect_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.sheet_webhook_url = Some("http://127.0.0.1:1/unreachable".to_string());
        let manager = offline_manager(config).await;

        manager.record_visit(payload("/"), "203.0.113.7".to_string()).await.unwrap();

        assert_eq!(manager.get_visits().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn postal_is_dropped_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.record_postal = false;
        let manager = offline_manager(config).await;

        let record = manager.record_visit(Map::new(), "203.0.113.7".to_string()).await.unwrap();
        assert_eq!(record.postal, None);
    }
}
