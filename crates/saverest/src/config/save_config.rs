use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::nls::Nls;

/// How a description is generated when the player leaves it empty.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DescriptionStyle {
    /// "Save 7"
    #[default]
    Slot,
    /// Local date and time of the save.
    DateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SaveConfig {
    /// Directory holding the `savegame.NNN` files.
    pub save_dir: PathBuf,
    /// Encoding of the description field.
    pub nls: Nls,
    /// Number of slots scanned when listing saves.
    pub max_slots: u16,
    /// Visible game area, used to decide whether a restored screen scrolls.
    pub viewport: (u32, u32),
    pub description_style: DescriptionStyle,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
            nls: Nls::default(),
            max_slots: 100,
            viewport: (640, 400),
            description_style: DescriptionStyle::default(),
        }
    }
}

/// `SaveConfigBuilder` is a convenience builder to create a `SaveConfig` from code.
pub struct SaveConfigBuilder {
    config: SaveConfig,
}

impl SaveConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_save_dir(mut self, save_dir: impl Into<PathBuf>) -> Self {
        self.config.save_dir = save_dir.into();
        self
    }

    pub fn with_nls(mut self, nls: Nls) -> Self {
        self.config.nls = nls;
        self
    }

    pub fn with_max_slots(mut self, max_slots: u16) -> Self {
        self.config.max_slots = max_slots;
        self
    }

    pub fn with_viewport(mut self, viewport: (u32, u32)) -> Self {
        self.config.viewport = viewport;
        self
    }

    pub fn with_description_style(mut self, style: DescriptionStyle) -> Self {
        self.config.description_style = style;
        self
    }

    pub fn get(self) -> SaveConfig {
        self.config
    }
}

impl Default for SaveConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
