use anyhow::Context;

use crate::error::Result;
use crate::subsystem::resources::logic::LogicManager;
use crate::subsystem::resources::player::{
    get_player_structures, put_player_structures, PlayerStateProvider,
};
use crate::subsystem::resources::resource_manager::{ResourceManager, CUR_PLAYER_ID, GLOBAL_VARS_ID};
use crate::subsystem::resources::save_manager::{validate_save_buffer, SaveManager};
use crate::subsystem::resources::screen::ScreenManager;
use crate::subsystem::save_state::{SaveBuffer, SaveHeader};

/// Everything a save captures and a restore rebuilds.
pub struct GameData {
    resources: ResourceManager,
    logic: LogicManager,
    screen: ScreenManager,
    /// Music to resume after a restore, 0 for silence.
    looping_music_id: u32,
    player: Box<dyn PlayerStateProvider>,
    save_manager: SaveManager,
}

impl GameData {
    pub fn new(
        resources: ResourceManager,
        logic: LogicManager,
        player: Box<dyn PlayerStateProvider>,
        save_manager: SaveManager,
    ) -> Self {
        let screen = ScreenManager::new(save_manager.config().viewport);
        GameData {
            resources,
            logic,
            screen,
            looping_music_id: 0,
            player,
            save_manager,
        }
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    pub fn logic(&self) -> &LogicManager {
        &self.logic
    }

    pub fn logic_mut(&mut self) -> &mut LogicManager {
        &mut self.logic
    }

    pub fn screen(&self) -> &ScreenManager {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut ScreenManager {
        &mut self.screen
    }

    pub fn looping_music_id(&self) -> u32 {
        self.looping_music_id
    }

    pub fn set_looping_music_id(&mut self, music_id: u32) {
        self.looping_music_id = music_id;
    }

    pub fn player_mut(&mut self) -> &mut dyn PlayerStateProvider {
        self.player.as_mut()
    }

    pub fn save_manager(&self) -> &SaveManager {
        &self.save_manager
    }

    /// Enter a new screen, fading into its palette.
    pub fn init_screen(&mut self, screen_id: u32) -> anyhow::Result<()> {
        self.screen.init_background(screen_id, true, &mut self.resources)
    }

    /// Length of the global variables resource in the running engine.
    pub fn current_var_length(&self) -> anyhow::Result<u32> {
        self.resources
            .fetch_len(GLOBAL_VARS_ID)
            .context("global variables resource")
    }

    pub fn find_buffer_size(&self) -> anyhow::Result<usize> {
        Ok(SaveHeader::SIZE + self.current_var_length()? as usize)
    }

    /// Snapshot the live game into a sealed save buffer.
    pub fn fill_save_buffer(&mut self, description: &str) -> Result<SaveBuffer> {
        let player_hub = self.resources.object_hub(CUR_PLAYER_ID)?;
        let player = get_player_structures(self.player.as_mut())?;

        let mut header = SaveHeader {
            var_length: self.current_var_length()?,
            screen_id: self.screen.background_layer_id,
            run_list_id: self.logic.return_run_list(),
            feet_x: self.screen.feet_x,
            feet_y: self.screen.feet_y,
            music_id: self.looping_music_id,
            player_hub,
            player,
            ..Default::default()
        };
        header.set_description(description, self.save_manager.nls());

        let globals = self.resources.open(GLOBAL_VARS_ID)?;
        let buffer = SaveBuffer::build(&mut header, globals);
        log::debug!(
            "fill_save_buffer: {} bytes, checksum 0x{:08X}",
            buffer.len(),
            header.checksum
        );
        Ok(buffer)
    }

    /// Save to `slot`. An empty description is replaced by the configured
    /// default.
    pub fn save_game(&mut self, slot: u16, description: &str) -> Result<()> {
        let description = if description.is_empty() {
            self.save_manager.default_description(slot)
        } else {
            description.to_string()
        };

        let buffer = self.fill_save_buffer(&description)?;
        self.save_manager.write_slot(slot, &buffer)?;
        log::info!("SAVED GAME \"{}\" to slot {}", description, slot);
        Ok(())
    }

    pub fn restore_game(&mut self, slot: u16) -> Result<()> {
        let expected = self.find_buffer_size()?;
        let buffer = self.save_manager.read_slot(slot, expected)?;
        self.restore_from_buffer(buffer).map_err(|e| {
            log::warn!("restore_game: slot {}: {}", slot, e);
            e
        })
    }

    /// Rebuild the world from a loaded buffer. Nothing is touched unless the
    /// buffer passes validation.
    pub fn restore_from_buffer(&mut self, buffer: SaveBuffer) -> Result<()> {
        let current_var_length = self.current_var_length()?;
        let header = validate_save_buffer(&buffer, current_var_length)?;

        self.resources.kill_all_res();
        self.logic.reset_kill_list();

        self.resources.set_object_hub(CUR_PLAYER_ID, &header.player_hub)?;
        let player = put_player_structures(self.player.as_mut(), &header.player)?;

        let globals = self.resources.open_mut(GLOBAL_VARS_ID)?;
        let len = globals.len();
        globals.copy_from_slice(&buffer.globals()[..len]);
        drop(buffer);

        // no fade from the old palette
        self.screen
            .init_background(header.screen_id, false, &mut self.resources)?;
        self.screen.force_palette_reload();

        // init_background reset these to the screen defaults
        self.screen.feet_x = header.feet_x;
        self.screen.feet_y = header.feet_y;

        self.logic.express_change_session(header.run_list_id);

        self.screen.player_feet_x = player.mega.feet_x;
        self.screen.player_feet_y = player.mega.feet_y;
        if self.screen.scroll_flag() {
            self.screen.set_scrolling();
        }

        self.looping_music_id = header.music_id;

        log::info!(
            "RESTORED GAME \"{}\"",
            header.description(self.save_manager.nls())
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::save_config::SaveConfig;
    use crate::error::{Incompatibility, SaveRestError, SrCode};
    use crate::fixtures;
    use crate::subsystem::resources::resource_manager::{make_resource, FileType, StandardHeader};
    use crate::subsystem::resources::screen::PaletteChange;

    fn world() -> GameData {
        fixtures::demo_world(SaveConfig::default()).unwrap()
    }

    #[test]
    fn test_find_buffer_size() {
        let game = world();
        assert_eq!(
            game.find_buffer_size().unwrap(),
            SaveHeader::SIZE + fixtures::DEMO_GLOBALS_LEN
        );
    }

    #[test]
    fn test_fill_save_buffer_captures_live_state() {
        let mut game = world();
        game.screen_mut().feet_x = 777;
        game.set_looping_music_id(31);

        let buffer = game.fill_save_buffer("Quay").unwrap();
        let header = buffer.header().unwrap();
        assert_eq!(header.description(game.save_manager().nls()), "Quay");
        assert_eq!(header.screen_id, fixtures::DEMO_SCREEN_WIDE);
        assert_eq!(header.run_list_id, fixtures::DEMO_RUN_LIST);
        assert_eq!(header.feet_x, 777);
        assert_eq!(header.music_id, 31);
        assert_eq!(header.var_length as usize, fixtures::DEMO_GLOBALS_LEN);
        assert_eq!(header.player.mega.megaset_res, 36);
        assert_eq!(buffer.stored_checksum(), buffer.computed_checksum());
        assert_eq!(
            buffer.globals(),
            game.resources_mut().open(GLOBAL_VARS_ID).unwrap()
        );
    }

    #[test]
    fn test_fill_save_buffer_needs_game_object_player() {
        let mut game = world();
        game.resources_mut()
            .insert(CUR_PLAYER_ID, make_resource(FileType::Text, "oops", &[0; 64]));
        let err = game.fill_save_buffer("x").unwrap_err();
        assert_eq!(err.code(), SrCode::EngineFault);
    }

    #[test]
    fn test_restore_from_buffer_rebuilds_world() {
        let mut game = world();
        game.set_looping_music_id(12);
        let buffer = game.fill_save_buffer("Back").unwrap();

        game.init_screen(fixtures::DEMO_SCREEN_SMALL).unwrap();
        game.logic_mut().express_change_session(0x999);
        game.logic_mut().take_restart_request();
        game.logic_mut().add_to_kill_list(40);
        game.set_looping_music_id(0);
        game.resources_mut().open_mut(GLOBAL_VARS_ID).unwrap()[StandardHeader::SIZE] ^= 0xFF;
        game.resources_mut().open(fixtures::DEMO_SCREEN_TALL).unwrap();

        game.restore_from_buffer(buffer).unwrap();

        assert_eq!(game.screen().background_layer_id, fixtures::DEMO_SCREEN_WIDE);
        assert_eq!(game.logic().return_run_list(), fixtures::DEMO_RUN_LIST);
        assert!(game.logic_mut().take_restart_request());
        assert!(game.logic().kill_list().is_empty());
        assert_eq!(game.looping_music_id(), 12);
        assert_eq!(game.screen().new_palette(), PaletteChange::ForceReload);
        assert!(!game.resources().is_resident(fixtures::DEMO_SCREEN_TALL));
        assert_eq!(
            game.resources_mut().open(GLOBAL_VARS_ID).unwrap(),
            fixtures::demo_globals().as_slice()
        );
    }

    #[test]
    fn test_restore_recentres_scrolling_screen() {
        let mut game = world();
        game.player_mut()
            .inject(&{
                let mut snap = fixtures::demo_player().snapshot();
                snap.mega.feet_x = 1100;
                snap
            })
            .unwrap();
        let buffer = game.fill_save_buffer("East end").unwrap();

        game.restore_from_buffer(buffer).unwrap();
        assert!(game.screen().scroll_flag());
        assert_eq!(game.screen().player_feet_x, 1100);
        assert_eq!(game.screen().scroll_offset_x, 640);
    }

    #[test]
    fn test_rejected_buffer_changes_nothing() {
        let mut game = world();
        let mut buffer = game.fill_save_buffer("Bad").unwrap();
        buffer.as_bytes_mut()[SaveHeader::SIZE + 10] ^= 0x01;

        game.logic_mut().add_to_kill_list(5);
        let err = game.restore_from_buffer(buffer).unwrap_err();
        assert!(matches!(
            err,
            SaveRestError::Incompatible(Incompatibility::ChecksumMismatch { .. })
        ));
        assert_eq!(game.logic().kill_list(), &[5]);
        assert_eq!(game.screen().new_palette(), PaletteChange::FadeIn);
    }
}
