use async_trait::async_trait;
use visit_tracker_lib::geo_info::GeoInfo;

use crate::DataManagerError;

mod providers;

pub use providers::{IpApiCo, IpWhoIs};

/// A single geo-lookup strategy. The resolver tries its providers in order
/// and the first success wins, so implementations report every failure mode
/// (transport error, timeout, non-success response) as an `Err`.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, ip: &str) -> Result<GeoInfo, DataManagerError>;
}

/// Resolves a client IP to coarse location data through an ordered chain of
/// providers.
pub struct GeoResolver {
    providers: Vec<Box<dyn GeoProvider>>,
}

impl GeoResolver {
    pub fn new(providers: Vec<Box<dyn GeoProvider>>) -> Self {
        Self { providers }
    }

    /// The production chain: ipwho.is first, ipapi.co as the fallback.
    pub fn with_default_providers(client: reqwest::Client) -> Self {
        Self::new(vec![
            Box::new(IpWhoIs::new(client.clone())),
            Box::new(IpApiCo::new(client)),
        ])
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Best-effort lookup, never fails. One attempt per provider, no
    /// caching. If every provider errors the result carries the original
    /// IP with "Unknown" in every field.
    pub async fn resolve(&self, ip: &str) -> GeoInfo {
        for provider in &self.providers {
            match provider.lookup(ip).await {
                Ok(geo) => return geo,
                Err(err) => {
                    tracing::warn!("Geo provider {} failed for {}: {:?}", provider.name(), ip, err);
                }
            }
        }

        GeoInfo::unknown(ip.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    #[async_trait]
    impl GeoProvider for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }

        async fn lookup(&self, _ip: &str) -> Result<GeoInfo, DataManagerError> {
            Err(DataManagerError::Geo("provider unreachable".to_string()))
        }
    }

    struct AlwaysSucceeds {
        country: &'static str,
        postal: Option<&'static str>,
    }

    #[async_trait]
    impl GeoProvider for AlwaysSucceeds {
        fn name(&self) -> &'static str {
            "always-succeeds"
        }

        async fn lookup(&self, ip: &str) -> Result<GeoInfo, DataManagerError> {
            Ok(GeoInfo::new(
                ip.to_string(),
                self.country.to_string(),
                "Testville".to_string(),
                self.postal.map(str::to_string),
            ))
        }
    }

    #[tokio::test]
    async fn first_success_wins() {
        let resolver = GeoResolver::new(vec![
            Box::new(AlwaysSucceeds { country: "Denmark", postal: Some("2100") }),
            Box::new(AlwaysSucceeds { country: "Sweden", postal: None }),
        ]);

        let geo = resolver.resolve("203.0.113.7").await;
        assert_eq!(geo.country, "Denmark");
        assert_eq!(geo.postal, Some("2100".to_string()));
    }

    #[tokio::test]
    async fn falls_back_when_the_primary_fails() {
        let resolver = GeoResolver::new(vec![
            Box::new(AlwaysFails),
            Box::new(AlwaysSucceeds { country: "Sweden", postal: None }),
        ]);

        let geo = resolver.resolve("203.0.113.7").await;
        assert_eq!(geo.country, "Sweden");
        assert_eq!(geo.city, "Testville");
        assert_eq!(geo.postal, None);
    }

    #[tokio::test]
    async fn total_failure_degrades_to_sentinels() {
        let resolver = GeoResolver::new(vec![Box::new(AlwaysFails), Box::new(AlwaysFails)]);

        let geo = resolver.resolve("203.0.113.7").await;
        assert_eq!(geo, GeoInfo::unknown("203.0.113.7".to_string()));
    }

    #[tokio::test]
    async fn empty_chain_degrades_to_sentinels() {
        let resolver = GeoResolver::new(Vec::new());

        let geo = resolver.resolve("198.51.100.1").await;
        assert_eq!(geo.ip, "198.51.100.1");
        assert_eq!(geo.country, "Unknown");
    }
}
