use async_trait::async_trait;
use serde::Deserialize;
use visit_tracker_lib::{geo_info::GeoInfo, UNKNOWN};

use super::GeoProvider;
use crate::DataManagerError;

const IPWHOIS_BASE_URL: &str = "https://ipwho.is";
const IPAPICO_BASE_URL: &str = "https://ipapi.co";

/// Primary provider. The response carries a success flag and a false flag
/// counts as a failed lookup. The only provider that supplies a postal code.
pub struct IpWhoIs {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct IpWhoIsResponse {
    success: bool,
    country: Option<String>,
    city: Option<String>,
    postal: Option<String>,
}

impl IpWhoIs {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeoProvider for IpWhoIs {
    fn name(&self) -> &'static str {
        "ipwho.is"
    }

    async fn lookup(&self, ip: &str) -> Result<GeoInfo, DataManagerError> {
        let url = format!("{IPWHOIS_BASE_URL}/{ip}");

        let response = self.client.get(&url).send().await
            .map_err(|err| DataManagerError::Geo(format!("Request to ipwho.is failed: {err}")))?
            .error_for_status()
            .map_err(|err| DataManagerError::Geo(format!("ipwho.is returned an error status: {err}")))?;

        let body: IpWhoIsResponse = response.json().await
            .map_err(|err| DataManagerError::Geo(format!("Failed to decode ipwho.is response: {err}")))?;

        if !body.success {
            return Err(DataManagerError::Geo(format!("ipwho.is lookup for {ip} was unsuccessful")));
        }

        Ok(GeoInfo::new(
            ip.to_string(),
            body.country.unwrap_or_else(|| UNKNOWN.to_string()),
            body.city.unwrap_or_else(|| UNKNOWN.to_string()),
            body.postal,
        ))
    }
}

/// Fallback provider. Never supplies a postal code.
pub struct IpApiCo {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct IpApiCoResponse {
    country_name: Option<String>,
    city: Option<String>,
}

impl IpApiCo {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeoProvider for IpApiCo {
    fn name(&self) -> &'static str {
        "ipapi.co"
    }

    async fn lookup(&self, ip: &str) -> Result<GeoInfo, DataManagerError> {
        let url = format!("{IPAPICO_BASE_URL}/{ip}/json/");

        let response = self.client.get(&url).send().await
            .map_err(|err| DataManagerError::Geo(format!("Request to ipapi.co failed: {err}")))?
            .error_for_status()
            .map_err(|err| DataManagerError::Geo(format!("ipapi.co returned an error status: {err}")))?;

        let body: IpApiCoResponse = response.json().await
            .map_err(|err| DataManagerError::Geo(format!("Failed to decode ipapi.co response: {err}")))?;

        Ok(GeoInfo::new(
            ip.to_string(),
            body.country_name.unwrap_or_else(|| UNKNOWN.to_string()),
            body.city.unwrap_or_else(|| UNKNOWN.to_string()),
            None,
        ))
    }
}
