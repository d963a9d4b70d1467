use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{geo_info::GeoInfo, UNKNOWN};

/// Keys owned by the server. Client-submitted values under these names are
/// dropped before the payload is merged into a record.
pub const RESERVED_KEYS: [&str; 5] = ["ip", "country", "city", "postal", "timestamp"];

/// One persisted page view: the client payload plus server-derived
/// enrichment. Immutable once appended to the log.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VisitRecord {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub ip: String,
    pub country: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl VisitRecord {
    /// Merges the client payload with geo enrichment and a fresh timestamp.
    /// Server-derived keys win over client keys of the same name. The
    /// payload itself is not validated, any JSON object is accepted.
    pub fn build(mut payload: Map<String, Value>, geo: GeoInfo, record_postal: bool) -> Self {
        for key in RESERVED_KEYS {
            payload.remove(key);
        }

        let postal = if record_postal {
            Some(geo.postal.unwrap_or_else(|| UNKNOWN.to_string()))
        } else {
            None
        };

        Self {
            extra: payload,
            ip: geo.ip,
            country: geo.country,
            city: geo.city,
            postal,
            timestamp: Utc::now(),
        }
    }
}
