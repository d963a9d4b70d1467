use visit_tracker_lib::visit_record::VisitRecord;

use crate::DataManagerError;

/// Forwards a copy of each recorded visit to a spreadsheet ingestion
/// webhook. Callers treat forwarding as log-and-forget: its outcome never
/// affects persistence or the request being served.
#[derive(Clone)]
pub struct SheetWebhook {
    client: reqwest::Client,
    url: String,
}

impl SheetWebhook {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    pub async fn forward(&self, record: &VisitRecord) -> Result<(), DataManagerError> {
        let response = self.client.post(&self.url).json(record).send().await
            .map_err(|err| DataManagerError::Webhook(format!("Webhook request failed: {err}")))?;

        response.error_for_status()
            .map_err(|err| DataManagerError::Webhook(format!("Webhook returned an error status: {err}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;
    use visit_tracker_lib::geo_info::GeoInfo;

    use super::*;

    #[tokio::test]
    async fn unreachable_webhook_reports_a_webhook_error() {
        let webhook = SheetWebhook::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/unreachable".to_string(),
        );
        let record = VisitRecord::build(Map::new(), GeoInfo::unknown("203.0.113.7".to_string()), true);

        let result = webhook.forward(&record).await;
        assert!(matches!(result, Err(DataManagerError::Webhook(_))));
    }
}
