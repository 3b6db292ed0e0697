pub mod config;
pub mod error;
pub mod fixtures;
pub mod subsystem;
pub mod utils;

pub use error::{result_code, Incompatibility, Result, SaveRestError, SrCode};
pub use subsystem::resources::player::{PlayerObject, PlayerScript, PlayerStateProvider};
pub use subsystem::resources::save_manager::{SaveManager, SaveSlotInfo};
pub use subsystem::save_state::{calc_checksum, SaveBuffer, SaveHeader};
pub use subsystem::world::GameData;
pub use utils::nls::Nls;

use config::app_config::AppConfig;
use utils::logger::Logger;

/// Set up logging from `config` and hand back the slot manager it describes.
pub fn boot(config: &AppConfig) -> SaveManager {
    Logger::init_logging(config.logger_config.clone());
    log::debug!(
        "{}: saves in {}",
        config.app_name,
        config.save_config.save_dir.display()
    );
    SaveManager::new(config.save_config.clone())
}
