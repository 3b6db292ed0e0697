pub mod resources;
pub mod save_state;
pub mod world;
