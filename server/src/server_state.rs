use visit_tracker_data_management::DataManager;

use crate::config::ServerConfig;

pub struct ServerState {
    pub config: ServerConfig,
    pub data_manager: DataManager,
}
