use std::io::{Cursor, Read, Write};

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::utils::nls::Nls;

/// Length of the player's description field, NUL terminator included.
pub const SAVE_DESCRIPTION_LEN: usize = 64;

/// Sum of all bytes, wrapping. This is the on-disk integrity check, so it
/// cannot be swapped for a stronger hash without breaking old saves.
pub fn calc_checksum(buffer: &[u8]) -> u32 {
    buffer
        .iter()
        .fold(0u32, |total, &b| total.wrapping_add(b as u32))
}

/// Hub metadata embedded in a game object's resource, right after its
/// standard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHub {
    pub kind: i32,
    pub logic_level: u32,
    pub logic: [u32; 3],
    pub script_id: [u32; 3],
    pub script_pc: [u32; 3],
}

impl ObjectHub {
    pub const SIZE: usize = 44;

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let kind = reader.read_i32::<LittleEndian>()?;
        let logic_level = reader.read_u32::<LittleEndian>()?;
        let mut logic = [0u32; 3];
        reader.read_u32_into::<LittleEndian>(&mut logic)?;
        let mut script_id = [0u32; 3];
        reader.read_u32_into::<LittleEndian>(&mut script_id)?;
        let mut script_pc = [0u32; 3];
        reader.read_u32_into::<LittleEndian>(&mut script_pc)?;
        Ok(Self {
            kind,
            logic_level,
            logic,
            script_id,
            script_pc,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.kind)?;
        writer.write_u32::<LittleEndian>(self.logic_level)?;
        for v in self.logic.iter().chain(&self.script_id).chain(&self.script_pc) {
            writer.write_u32::<LittleEndian>(*v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLogic {
    pub looping: i32,
    pub pause: i32,
}

impl ObjectLogic {
    pub const SIZE: usize = 8;

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        Ok(Self {
            looping: reader.read_i32::<LittleEndian>()?,
            pause: reader.read_i32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.looping)?;
        writer.write_i32::<LittleEndian>(self.pause)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectGraphic {
    pub kind: i32,
    pub anim_resource: i32,
    pub anim_pc: i32,
}

impl ObjectGraphic {
    pub const SIZE: usize = 12;

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        Ok(Self {
            kind: reader.read_i32::<LittleEndian>()?,
            anim_resource: reader.read_i32::<LittleEndian>()?,
            anim_pc: reader.read_i32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.kind)?;
        writer.write_i32::<LittleEndian>(self.anim_resource)?;
        writer.write_i32::<LittleEndian>(self.anim_pc)?;
        Ok(())
    }
}

/// Movement state of a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMega {
    /// Words no longer read by the engine; carried through untouched.
    pub reserved_a: [i32; 4],
    /// Nonzero while the router is driving a walk.
    pub currently_walking: i32,
    pub walk_pc: i32,
    pub scale_a: i32,
    pub scale_b: i32,
    pub feet_x: i32,
    pub feet_y: i32,
    pub current_dir: i32,
    pub colliding: i32,
    pub megaset_res: i32,
    pub reserved_b: i32,
}

impl ObjectMega {
    pub const SIZE: usize = 56;

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut reserved_a = [0i32; 4];
        reader.read_i32_into::<LittleEndian>(&mut reserved_a)?;
        Ok(Self {
            reserved_a,
            currently_walking: reader.read_i32::<LittleEndian>()?,
            walk_pc: reader.read_i32::<LittleEndian>()?,
            scale_a: reader.read_i32::<LittleEndian>()?,
            scale_b: reader.read_i32::<LittleEndian>()?,
            feet_x: reader.read_i32::<LittleEndian>()?,
            feet_y: reader.read_i32::<LittleEndian>()?,
            current_dir: reader.read_i32::<LittleEndian>()?,
            colliding: reader.read_i32::<LittleEndian>()?,
            megaset_res: reader.read_i32::<LittleEndian>()?,
            reserved_b: reader.read_i32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for v in self.reserved_a {
            writer.write_i32::<LittleEndian>(v)?;
        }
        for v in [
            self.currently_walking,
            self.walk_pc,
            self.scale_a,
            self.scale_b,
            self.feet_x,
            self.feet_y,
            self.current_dir,
            self.colliding,
            self.megaset_res,
            self.reserved_b,
        ] {
            writer.write_i32::<LittleEndian>(v)?;
        }
        Ok(())
    }
}

/// The three player structures that have to survive a save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub logic: ObjectLogic,
    pub graphic: ObjectGraphic,
    pub mega: ObjectMega,
}

impl PlayerSnapshot {
    pub const SIZE: usize = ObjectLogic::SIZE + ObjectGraphic::SIZE + ObjectMega::SIZE;

    /// Drop any walk in progress so the player comes back standing.
    /// Returns whether a walk was cleared.
    pub fn clear_walk(&mut self) -> bool {
        if self.mega.currently_walking == 0 {
            return false;
        }
        self.mega.currently_walking = 0;
        self.mega.colliding = 0;
        // set while a walk anim loops
        self.logic.looping = 0;
        true
    }
}

/// Fixed-size record at the start of every save file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveHeader {
    /// Sum of every byte in the file after this field.
    pub checksum: u32,
    pub description: [u8; SAVE_DESCRIPTION_LEN],
    /// Length of the global variables blob following the header.
    pub var_length: u32,
    pub screen_id: u32,
    pub run_list_id: u32,
    pub feet_x: u32,
    pub feet_y: u32,
    /// Looping music track, 0 for none.
    pub music_id: u32,
    pub player_hub: ObjectHub,
    pub player: PlayerSnapshot,
}

impl Default for SaveHeader {
    fn default() -> Self {
        Self {
            checksum: 0,
            description: [0; SAVE_DESCRIPTION_LEN],
            var_length: 0,
            screen_id: 0,
            run_list_id: 0,
            feet_x: 0,
            feet_y: 0,
            music_id: 0,
            player_hub: ObjectHub::default(),
            player: PlayerSnapshot::default(),
        }
    }
}

impl SaveHeader {
    pub const CHECKSUM_LEN: usize = 4;
    pub const SIZE: usize =
        Self::CHECKSUM_LEN + SAVE_DESCRIPTION_LEN + 6 * 4 + ObjectHub::SIZE + PlayerSnapshot::SIZE;

    pub fn set_description(&mut self, desc: &str, nls: Nls) {
        let bytes = nls.encode_truncated(desc, SAVE_DESCRIPTION_LEN - 1);
        self.description = [0; SAVE_DESCRIPTION_LEN];
        self.description[..bytes.len()].copy_from_slice(&bytes);
    }

    pub fn description(&self, nls: Nls) -> String {
        nls.decode_cstr(&self.description)
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let checksum = reader.read_u32::<LittleEndian>()?;
        let mut description = [0u8; SAVE_DESCRIPTION_LEN];
        reader.read_exact(&mut description)?;
        Ok(Self {
            checksum,
            description,
            var_length: reader.read_u32::<LittleEndian>()?,
            screen_id: reader.read_u32::<LittleEndian>()?,
            run_list_id: reader.read_u32::<LittleEndian>()?,
            feet_x: reader.read_u32::<LittleEndian>()?,
            feet_y: reader.read_u32::<LittleEndian>()?,
            music_id: reader.read_u32::<LittleEndian>()?,
            player_hub: ObjectHub::read_from(&mut reader)?,
            player: PlayerSnapshot {
                logic: ObjectLogic::read_from(&mut reader)?,
                graphic: ObjectGraphic::read_from(&mut reader)?,
                mega: ObjectMega::read_from(&mut reader)?,
            },
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.checksum)?;
        writer.write_all(&self.description)?;
        for v in [
            self.var_length,
            self.screen_id,
            self.run_list_id,
            self.feet_x,
            self.feet_y,
            self.music_id,
        ] {
            writer.write_u32::<LittleEndian>(v)?;
        }
        self.player_hub.write_to(&mut writer)?;
        self.player.logic.write_to(&mut writer)?;
        self.player.graphic.write_to(&mut writer)?;
        self.player.mega.write_to(&mut writer)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        // writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }
}

/// A header followed by the global variables blob; the unit written to and
/// read from a slot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveBuffer {
    bytes: Vec<u8>,
}

impl SaveBuffer {
    /// Concatenate `header` and `globals` and seal the result with its checksum.
    /// `header.checksum` is updated to the stored value.
    pub fn build(header: &mut SaveHeader, globals: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(SaveHeader::SIZE + globals.len());
        header.checksum = 0;
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(globals);

        let mut buffer = SaveBuffer { bytes };
        header.checksum = buffer.seal();
        buffer
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        SaveBuffer { bytes }
    }

    /// Recompute the checksum and store it in the first four bytes.
    pub fn seal(&mut self) -> u32 {
        let checksum = self.computed_checksum();
        if self.bytes.len() >= SaveHeader::CHECKSUM_LEN {
            self.bytes[..SaveHeader::CHECKSUM_LEN].copy_from_slice(&checksum.to_le_bytes());
        }
        checksum
    }

    pub fn stored_checksum(&self) -> u32 {
        let mut raw = [0u8; SaveHeader::CHECKSUM_LEN];
        let n = self.bytes.len().min(SaveHeader::CHECKSUM_LEN);
        raw[..n].copy_from_slice(&self.bytes[..n]);
        u32::from_le_bytes(raw)
    }

    pub fn computed_checksum(&self) -> u32 {
        calc_checksum(self.bytes.get(SaveHeader::CHECKSUM_LEN..).unwrap_or(&[]))
    }

    pub fn header(&self) -> Result<SaveHeader> {
        SaveHeader::read_from(Cursor::new(&self.bytes)).context("decode save header")
    }

    /// Global variables payload following the header.
    pub fn globals(&self) -> &[u8] {
        self.bytes.get(SaveHeader::SIZE..).unwrap_or(&[])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_header() -> SaveHeader {
        let mut header = SaveHeader {
            var_length: 6,
            screen_id: 0x1a2,
            run_list_id: 0x3f0,
            feet_x: 1012,
            feet_y: 355,
            music_id: 270,
            player_hub: ObjectHub {
                kind: 1,
                logic_level: 2,
                logic: [10, 11, 12],
                script_id: [20, 21, 22],
                script_pc: [30, 31, 32],
            },
            player: PlayerSnapshot {
                logic: ObjectLogic { looping: 1, pause: 0 },
                graphic: ObjectGraphic { kind: 3, anim_resource: 36, anim_pc: 97 },
                mega: ObjectMega {
                    reserved_a: [-1, 2, -3, 4],
                    currently_walking: 1,
                    walk_pc: 5,
                    scale_a: 100,
                    scale_b: -20,
                    feet_x: 1012,
                    feet_y: 355,
                    current_dir: 3,
                    colliding: 1,
                    megaset_res: 36,
                    reserved_b: 7,
                },
            },
            ..Default::default()
        };
        header.set_description("On the quay", Nls::Latin1);
        header
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(ObjectHub::SIZE, 44);
        assert_eq!(PlayerSnapshot::SIZE, 76);
        assert_eq!(SaveHeader::SIZE, 212);
        assert_eq!(SaveHeader::default().to_bytes().len(), SaveHeader::SIZE);
        assert_eq!(sample_header().to_bytes().len(), SaveHeader::SIZE);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(calc_checksum(&[]), 0);
        assert_eq!(calc_checksum(&[1, 2, 3, 250]), 256);

        let big = vec![0xFFu8; 16_843_010];
        // 0xFF * 16843010 = 0x1_0000_00FE
        assert_eq!(calc_checksum(&big), 0xFE);
    }

    #[test]
    fn test_header_layout_offsets() {
        let header = sample_header();
        let bytes = header.to_bytes();
        assert_eq!(&bytes[4..15], b"On the quay");
        assert_eq!(bytes[15], 0);
        assert_eq!(&bytes[68..72], &6u32.to_le_bytes());
        assert_eq!(&bytes[72..76], &0x1a2u32.to_le_bytes());
        assert_eq!(&bytes[88..92], &270u32.to_le_bytes());
        // mega.megaset_res sits two words from the end
        assert_eq!(&bytes[204..208], &36i32.to_le_bytes());
    }

    #[test]
    fn test_header_decode_matches_encode() {
        let header = sample_header();
        let decoded = SaveHeader::read_from(Cursor::new(header.to_bytes())).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.description(Nls::Latin1), "On the quay");
    }

    #[test]
    fn test_description_is_truncated_and_terminated() {
        let mut header = SaveHeader::default();
        let long = "x".repeat(100);
        header.set_description(&long, Nls::Latin1);
        assert_eq!(header.description[SAVE_DESCRIPTION_LEN - 1], 0);
        assert_eq!(header.description(Nls::Latin1).len(), SAVE_DESCRIPTION_LEN - 1);

        header.set_description("short", Nls::Latin1);
        assert_eq!(header.description(Nls::Latin1), "short");
        assert!(header.description[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_build_seals_buffer() {
        let mut header = sample_header();
        let globals = [9u8, 8, 7, 6, 5, 4];
        let buffer = SaveBuffer::build(&mut header, &globals);

        assert_eq!(buffer.len(), SaveHeader::SIZE + globals.len());
        assert_eq!(buffer.stored_checksum(), header.checksum);
        assert_eq!(buffer.stored_checksum(), buffer.computed_checksum());
        assert_eq!(buffer.globals(), &globals);
        assert_eq!(buffer.header().unwrap(), header);
    }

    #[test]
    fn test_checksum_ignores_its_own_field() {
        let mut header = sample_header();
        let mut buffer = SaveBuffer::build(&mut header, &[1, 2, 3]);
        let before = buffer.computed_checksum();
        buffer.as_bytes_mut()[0] ^= 0xFF;
        assert_eq!(buffer.computed_checksum(), before);
        assert_ne!(buffer.stored_checksum(), before);
    }

    #[test]
    fn test_clear_walk() {
        let mut snap = sample_header().player;
        assert!(snap.clear_walk());
        assert_eq!(snap.mega.currently_walking, 0);
        assert_eq!(snap.mega.colliding, 0);
        assert_eq!(snap.logic.looping, 0);
        assert!(!snap.clear_walk());
    }
}
