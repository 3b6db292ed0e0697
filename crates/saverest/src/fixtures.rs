//! A small demo world: three screens, a 4096-byte globals resource and George
//! standing on the quay. Used by the tests and by `savetool demo`.

use anyhow::Result;

use crate::config::save_config::SaveConfig;
use crate::subsystem::resources::logic::LogicManager;
use crate::subsystem::resources::player::{PlayerObject, PlayerStateProvider};
use crate::subsystem::resources::resource_manager::{
    make_resource, FileType, ResourceManager, StandardHeader, CUR_PLAYER_ID, GLOBAL_VARS_ID,
};
use crate::subsystem::resources::save_manager::SaveManager;
use crate::subsystem::resources::screen::ScreenHeader;
use crate::subsystem::save_state::{ObjectGraphic, ObjectHub, ObjectLogic, ObjectMega};
use crate::subsystem::world::GameData;

/// 1280x400, scrolls horizontally.
pub const DEMO_SCREEN_WIDE: u32 = 100;
/// 640x400, fits the default viewport.
pub const DEMO_SCREEN_SMALL: u32 = 200;
/// 640x800, scrolls vertically.
pub const DEMO_SCREEN_TALL: u32 = 300;

pub const DEMO_RUN_LIST: u32 = 0x3f0;
/// Whole globals resource, standard header included.
pub const DEMO_GLOBALS_LEN: usize = 4096;

pub fn demo_globals() -> Vec<u8> {
    let payload: Vec<u8> = (0..DEMO_GLOBALS_LEN - StandardHeader::SIZE)
        .map(|i| (i * 7 % 251) as u8)
        .collect();
    make_resource(FileType::GlobalVar, "globals", &payload)
}

pub fn demo_player_hub() -> ObjectHub {
    ObjectHub {
        kind: 3,
        logic_level: 1,
        logic: [0x40, 0x41, 0],
        script_id: [CUR_PLAYER_ID, 0x122, 0],
        script_pc: [0, 0x1c, 0],
    }
}

pub fn demo_player() -> PlayerObject {
    PlayerObject::new(
        ObjectLogic { looping: 0, pause: 0 },
        ObjectGraphic { kind: 1, anim_resource: 36, anim_pc: 98 },
        ObjectMega {
            scale_a: 100,
            feet_x: 400,
            feet_y: 350,
            current_dir: 2,
            megaset_res: 36,
            ..Default::default()
        },
    )
}

pub fn demo_resources() -> Result<ResourceManager> {
    let mut res = ResourceManager::new();
    res.insert(GLOBAL_VARS_ID, demo_globals());

    let mut hub = Vec::with_capacity(ObjectHub::SIZE);
    demo_player_hub().write_to(&mut hub)?;
    res.insert(CUR_PLAYER_ID, make_resource(FileType::GameObject, "george", &hub));

    for (id, name, width, height) in [
        (DEMO_SCREEN_WIDE, "quay", 1280, 400),
        (DEMO_SCREEN_SMALL, "cafe", 640, 400),
        (DEMO_SCREEN_TALL, "tower", 640, 800),
    ] {
        let screen = ScreenHeader { width, height, no_layers: 1 };
        res.insert(id, make_resource(FileType::Screen, name, &screen.to_bytes()));
    }
    Ok(res)
}

/// Demo world on the wide screen with the given player.
pub fn demo_world_with_player(
    save_config: SaveConfig,
    player: Box<dyn PlayerStateProvider>,
) -> Result<GameData> {
    let mut game = GameData::new(
        demo_resources()?,
        LogicManager::new(DEMO_RUN_LIST),
        player,
        SaveManager::new(save_config),
    );
    game.init_screen(DEMO_SCREEN_WIDE)?;
    Ok(game)
}

pub fn demo_world(save_config: SaveConfig) -> Result<GameData> {
    demo_world_with_player(save_config, Box::new(demo_player()))
}
