use std::io::{Cursor, Read, Write};

use anyhow::{bail, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::resource_manager::{FileType, ResourceManager, StandardHeader};

/// Feet position a freshly initialised screen starts from.
pub const DEFAULT_FEET_X: u32 = 320;
pub const DEFAULT_FEET_Y: u32 = 340;

/// Dimensions stored right after a screen resource's standard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenHeader {
    pub width: u16,
    pub height: u16,
    pub no_layers: u16,
}

impl ScreenHeader {
    pub const SIZE: usize = 6;

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        Ok(Self {
            width: reader.read_u16::<LittleEndian>()?,
            height: reader.read_u16::<LittleEndian>()?,
            no_layers: reader.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_u16::<LittleEndian>(self.width)?;
        writer.write_u16::<LittleEndian>(self.height)?;
        writer.write_u16::<LittleEndian>(self.no_layers)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        // writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }
}

/// What the display does with the palette on its next update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaletteChange {
    #[default]
    None,
    /// Fade up from black into the new screen's palette.
    FadeIn,
    /// Load the full palette at once, no fade from the previous one.
    ForceReload,
}

/// State of the current screen: background, scroll anchor and offsets.
#[derive(Debug)]
pub struct ScreenManager {
    pub background_layer_id: u32,
    pub feet_x: u32,
    pub feet_y: u32,
    pub player_feet_x: i32,
    pub player_feet_y: i32,
    pub screen_wide: u32,
    pub screen_deep: u32,
    pub scroll_offset_x: u32,
    pub scroll_offset_y: u32,
    pub max_scroll_offset_x: u32,
    pub max_scroll_offset_y: u32,
    scroll_flag: bool,
    new_palette: PaletteChange,
    viewport: (u32, u32),
}

impl ScreenManager {
    pub fn new(viewport: (u32, u32)) -> Self {
        ScreenManager {
            background_layer_id: 0,
            feet_x: DEFAULT_FEET_X,
            feet_y: DEFAULT_FEET_Y,
            player_feet_x: 0,
            player_feet_y: 0,
            screen_wide: viewport.0,
            screen_deep: viewport.1,
            scroll_offset_x: 0,
            scroll_offset_y: 0,
            max_scroll_offset_x: 0,
            max_scroll_offset_y: 0,
            scroll_flag: false,
            new_palette: PaletteChange::None,
            viewport,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// True when the screen is larger than the viewport and has to scroll.
    pub fn scroll_flag(&self) -> bool {
        self.scroll_flag
    }

    pub fn new_palette(&self) -> PaletteChange {
        self.new_palette
    }

    pub fn force_palette_reload(&mut self) {
        self.new_palette = PaletteChange::ForceReload;
    }

    /// Consumed by the display once it has applied the palette change.
    pub fn take_palette_change(&mut self) -> PaletteChange {
        std::mem::take(&mut self.new_palette)
    }

    pub fn init_background(
        &mut self,
        screen_id: u32,
        new_palette: bool,
        resources: &mut ResourceManager,
    ) -> Result<()> {
        let head = resources.standard_header(screen_id)?;
        if head.file_type().ok() != Some(FileType::Screen) {
            bail!(
                "init_background: resource {} is not a screen (file type {})",
                screen_id,
                head.file_type
            );
        }
        let data = resources.open(screen_id)?;
        let screen = ScreenHeader::read_from(Cursor::new(&data[StandardHeader::SIZE..]))
            .with_context(|| format!("screen {}: short screen header", screen_id))?;

        self.background_layer_id = screen_id;
        self.feet_x = DEFAULT_FEET_X;
        self.feet_y = DEFAULT_FEET_Y;
        self.screen_wide = screen.width as u32;
        self.screen_deep = screen.height as u32;
        self.scroll_offset_x = 0;
        self.scroll_offset_y = 0;
        self.max_scroll_offset_x = self.screen_wide.saturating_sub(self.viewport.0);
        self.max_scroll_offset_y = self.screen_deep.saturating_sub(self.viewport.1);
        self.scroll_flag = self.screen_wide > self.viewport.0 || self.screen_deep > self.viewport.1;
        if new_palette {
            self.new_palette = PaletteChange::FadeIn;
        }

        log::debug!(
            "init_background: screen {} {}x{} scroll={}",
            screen_id,
            self.screen_wide,
            self.screen_deep,
            self.scroll_flag
        );
        Ok(())
    }

    /// Jump straight to the scroll position that puts the player's feet at
    /// the `feet_x`/`feet_y` anchor, clamped to the screen edges. No
    /// catch-up scrolling from the previous offsets.
    pub fn set_scrolling(&mut self) {
        fn offset(player_feet: i32, anchor: u32, max: u32) -> u32 {
            let wanted = player_feet as i64 - anchor as i64;
            wanted.clamp(0, max as i64) as u32
        }

        self.scroll_offset_x = offset(self.player_feet_x, self.feet_x, self.max_scroll_offset_x);
        self.scroll_offset_y = offset(self.player_feet_y, self.feet_y, self.max_scroll_offset_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystem::resources::resource_manager::make_resource;

    fn resources() -> ResourceManager {
        let mut res = ResourceManager::new();
        let wide = ScreenHeader { width: 1280, height: 400, no_layers: 2 };
        let small = ScreenHeader { width: 640, height: 400, no_layers: 0 };
        res.insert(100, make_resource(FileType::Screen, "quay", &wide.to_bytes()));
        res.insert(200, make_resource(FileType::Screen, "cafe", &small.to_bytes()));
        res.insert(300, make_resource(FileType::Text, "text", &[0; 8]));
        res
    }

    #[test]
    fn test_init_background_resets_defaults() {
        let mut res = resources();
        let mut screen = ScreenManager::new((640, 400));
        screen.feet_x = 9;
        screen.scroll_offset_x = 33;

        screen.init_background(100, true, &mut res).unwrap();
        assert_eq!(screen.background_layer_id, 100);
        assert_eq!((screen.feet_x, screen.feet_y), (DEFAULT_FEET_X, DEFAULT_FEET_Y));
        assert_eq!(screen.scroll_offset_x, 0);
        assert_eq!(screen.max_scroll_offset_x, 640);
        assert_eq!(screen.max_scroll_offset_y, 0);
        assert!(screen.scroll_flag());
        assert_eq!(screen.new_palette(), PaletteChange::FadeIn);

        screen.init_background(200, false, &mut res).unwrap();
        assert!(!screen.scroll_flag());
    }

    #[test]
    fn test_init_background_rejects_other_types() {
        let mut res = resources();
        let mut screen = ScreenManager::new((640, 400));
        assert!(screen.init_background(300, true, &mut res).is_err());
        assert!(screen.init_background(404, true, &mut res).is_err());
        assert_eq!(screen.background_layer_id, 0);
    }

    #[test]
    fn test_set_scrolling_clamps() {
        let mut res = resources();
        let mut screen = ScreenManager::new((640, 400));
        screen.init_background(100, false, &mut res).unwrap();

        screen.player_feet_x = 900;
        screen.set_scrolling();
        assert_eq!(screen.scroll_offset_x, 580);

        screen.player_feet_x = 100;
        screen.set_scrolling();
        assert_eq!(screen.scroll_offset_x, 0);

        screen.player_feet_x = 1270;
        screen.set_scrolling();
        assert_eq!(screen.scroll_offset_x, 640);
        assert_eq!(screen.scroll_offset_y, 0);
    }

    #[test]
    fn test_set_scrolling_follows_anchor() {
        let mut res = resources();
        let mut screen = ScreenManager::new((640, 400));
        screen.init_background(100, false, &mut res).unwrap();
        screen.player_feet_x = 400;

        screen.feet_x = 100;
        screen.set_scrolling();
        assert_eq!(screen.scroll_offset_x, 300);

        screen.feet_x = 250;
        screen.set_scrolling();
        assert_eq!(screen.scroll_offset_x, 150);

        // anchor right of the player would scroll past the left edge
        screen.feet_x = 600;
        screen.set_scrolling();
        assert_eq!(screen.scroll_offset_x, 0);
    }

    #[test]
    fn test_palette_change_is_consumed() {
        let mut screen = ScreenManager::new((640, 400));
        screen.force_palette_reload();
        assert_eq!(screen.take_palette_change(), PaletteChange::ForceReload);
        assert_eq!(screen.new_palette(), PaletteChange::None);
    }
}
