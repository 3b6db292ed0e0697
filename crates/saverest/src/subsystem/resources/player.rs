use anyhow::Result;

use crate::subsystem::save_state::{ObjectGraphic, ObjectLogic, ObjectMega, PlayerSnapshot};

/// Entry points in the player object's script table that the save/restore
/// path cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PlayerScript {
    SavedataRequest = 7,
    SavedataReturn = 8,
    PlayerIsGeorge = 9,
    PlayerIsNicoC = 10,
    PlayerIsNicoA = 11,
    PlayerIsNicoB = 12,
    PlayerIsGeorgeB = 13,
    SetUpNicoAnimTables = 14,
}

impl PlayerScript {
    pub fn entry_point(self) -> u32 {
        self as u32
    }
}

/// Character variant, keyed by the megaset resource id the player was
/// using at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Megaset {
    George,
    GeorgeB,
    NicoA,
    NicoB,
    NicoC,
    Unknown(i32),
}

/// Extra work to do after the player structures are back in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRestore {
    RunScript(PlayerScript),
    /// Unrecognised megaset: nothing beyond the common scripts runs.
    NoAction,
}

impl From<i32> for Megaset {
    fn from(res: i32) -> Self {
        match res {
            36 => Megaset::George,
            2003 => Megaset::GeorgeB,
            1366 => Megaset::NicoA,
            1437 => Megaset::NicoB,
            1575 => Megaset::NicoC,
            other => Megaset::Unknown(other),
        }
    }
}

impl Megaset {
    pub fn post_restore(self) -> PostRestore {
        match self {
            Megaset::George => PostRestore::RunScript(PlayerScript::PlayerIsGeorge),
            Megaset::GeorgeB => PostRestore::RunScript(PlayerScript::PlayerIsGeorgeB),
            Megaset::NicoA => PostRestore::RunScript(PlayerScript::PlayerIsNicoA),
            Megaset::NicoB => PostRestore::RunScript(PlayerScript::PlayerIsNicoB),
            Megaset::NicoC => PostRestore::RunScript(PlayerScript::PlayerIsNicoC),
            Megaset::Unknown(_) => PostRestore::NoAction,
        }
    }
}

/// Access to the live player object's state.
///
/// The engine wires this to its script interpreter (the savedata
/// request/return scripts); tests and tools use [`PlayerObject`].
pub trait PlayerStateProvider {
    fn extract(&mut self) -> Result<PlayerSnapshot>;
    fn inject(&mut self, snapshot: &PlayerSnapshot) -> Result<()>;
    /// Switch the player to the standing pose facing `direction`.
    fn stand(&mut self, direction: i32) -> Result<()>;
    fn run_script(&mut self, script: PlayerScript) -> Result<()>;
}

/// Copy the player structures out for a save.
pub fn get_player_structures(player: &mut dyn PlayerStateProvider) -> Result<PlayerSnapshot> {
    player.extract()
}

/// Put saved player structures back and run the scripts that rebuild the
/// player's animation tables. Returns the snapshot as injected.
pub fn put_player_structures(
    player: &mut dyn PlayerStateProvider,
    saved: &PlayerSnapshot,
) -> Result<PlayerSnapshot> {
    let mut snapshot = *saved;
    let was_walking = snapshot.clear_walk();

    player.inject(&snapshot)?;
    if was_walking {
        log::debug!("player was walking when saved; setting to stand");
        player.stand(snapshot.mega.current_dir)?;
    }

    player.run_script(PlayerScript::SetUpNicoAnimTables)?;

    let megaset = Megaset::from(snapshot.mega.megaset_res);
    match megaset.post_restore() {
        PostRestore::RunScript(script) => player.run_script(script)?,
        PostRestore::NoAction => {
            log::warn!(
                "put_player_structures: unknown megaset {}, no player variant script run",
                snapshot.mega.megaset_res
            );
        }
    }

    Ok(snapshot)
}

/// Walk anims hold this many frames per direction before the standing frames.
pub const WALK_FRAMES_PER_DIR: i32 = 12;
pub const NO_DIRECTIONS: i32 = 8;

/// In-memory player object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerObject {
    pub logic: ObjectLogic,
    pub graphic: ObjectGraphic,
    pub mega: ObjectMega,
    /// Scripts run against this object, oldest first.
    pub scripts_run: Vec<PlayerScript>,
}

impl PlayerObject {
    pub fn new(logic: ObjectLogic, graphic: ObjectGraphic, mega: ObjectMega) -> Self {
        PlayerObject {
            logic,
            graphic,
            mega,
            scripts_run: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            logic: self.logic,
            graphic: self.graphic,
            mega: self.mega,
        }
    }
}

impl PlayerStateProvider for PlayerObject {
    fn extract(&mut self) -> Result<PlayerSnapshot> {
        self.scripts_run.push(PlayerScript::SavedataRequest);
        Ok(self.snapshot())
    }

    fn inject(&mut self, snapshot: &PlayerSnapshot) -> Result<()> {
        self.scripts_run.push(PlayerScript::SavedataReturn);
        self.logic = snapshot.logic;
        self.graphic = snapshot.graphic;
        self.mega = snapshot.mega;
        Ok(())
    }

    fn stand(&mut self, direction: i32) -> Result<()> {
        let direction = direction.rem_euclid(NO_DIRECTIONS);
        self.mega.current_dir = direction;
        self.graphic.anim_resource = self.mega.megaset_res;
        self.graphic.anim_pc = NO_DIRECTIONS * WALK_FRAMES_PER_DIR + direction;
        Ok(())
    }

    fn run_script(&mut self, script: PlayerScript) -> Result<()> {
        self.scripts_run.push(script);
        Ok(())
    }
}
