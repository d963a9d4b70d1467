use const_format::concatcp;

pub mod geo;
pub mod sheet_webhook;
pub mod visit_log;
mod data_manager;

pub use data_manager::*;

pub const DATA_DIR: &str = "data/";
pub const VISIT_LOG_PATH: &str = concatcp!(DATA_DIR, "visits.log");

#[derive(Debug)]
pub enum DataManagerError {
    Storage(String),
    Parse(String),
    Geo(String),
    Webhook(String),
}
