pub mod geo_info;
pub mod visit_record;

/// Sentinel used wherever a server-derived value could not be resolved.
pub const UNKNOWN: &str = "Unknown";
