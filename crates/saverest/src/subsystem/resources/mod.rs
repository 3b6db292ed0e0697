pub mod logic;
pub mod player;
pub mod resource_manager;
pub mod save_manager;
pub mod screen;
