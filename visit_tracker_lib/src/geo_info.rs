use serde::{Deserialize, Serialize};

use crate::UNKNOWN;

/// Best-effort location data for a client IP address. Only the primary
/// provider supplies a postal code, so callers must tolerate its absence.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeoInfo {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub postal: Option<String>,
}

impl GeoInfo {
    pub fn new(ip: String, country: String, city: String, postal: Option<String>) -> Self {
        Self {
            ip,
            country,
            city,
            postal,
        }
    }

    /// Result of a lookup where every provider failed.
    pub fn unknown(ip: String) -> Self {
        Self {
            ip,
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            postal: None,
        }
    }
}
