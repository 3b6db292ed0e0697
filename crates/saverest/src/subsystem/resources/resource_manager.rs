use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use anyhow::{anyhow, bail, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;

use crate::subsystem::save_state::ObjectHub;

/// Resource id of the global variables.
pub const GLOBAL_VARS_ID: u32 = 1;
/// Resource id of the object currently controlled by the player.
pub const CUR_PLAYER_ID: u32 = 8;

pub const NAME_LEN: usize = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FileType {
    Animation = 1,
    Screen = 2,
    GameObject = 3,
    WalkGrid = 4,
    GlobalVar = 5,
    Parallax = 6,
    RunList = 7,
    Text = 8,
    ScreenManager = 9,
    Mouse = 10,
    Wav = 11,
    Icon = 12,
    Palette = 13,
}

impl TryFrom<u8> for FileType {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> anyhow::Result<Self> {
        match value {
            1 => Ok(FileType::Animation),
            2 => Ok(FileType::Screen),
            3 => Ok(FileType::GameObject),
            4 => Ok(FileType::WalkGrid),
            5 => Ok(FileType::GlobalVar),
            6 => Ok(FileType::Parallax),
            7 => Ok(FileType::RunList),
            8 => Ok(FileType::Text),
            9 => Ok(FileType::ScreenManager),
            10 => Ok(FileType::Mouse),
            11 => Ok(FileType::Wav),
            12 => Ok(FileType::Icon),
            13 => Ok(FileType::Palette),
            _ => bail!("invalid resource file type: {}", value),
        }
    }
}

/// Header opening every resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardHeader {
    pub file_type: u8,
    pub comp_type: u8,
    pub comp_size: u32,
    pub decomp_size: u32,
    pub name: [u8; NAME_LEN],
}

impl StandardHeader {
    pub const SIZE: usize = 1 + 1 + 4 + 4 + NAME_LEN;

    pub fn new(file_type: FileType, name: &str, payload_len: usize) -> Self {
        let mut raw_name = [0u8; NAME_LEN];
        let n = name.len().min(NAME_LEN - 1);
        raw_name[..n].copy_from_slice(&name.as_bytes()[..n]);
        let total = (Self::SIZE + payload_len) as u32;
        Self {
            file_type: file_type as u8,
            comp_type: 0,
            comp_size: total,
            decomp_size: total,
            name: raw_name,
        }
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let file_type = reader.read_u8()?;
        let comp_type = reader.read_u8()?;
        let comp_size = reader.read_u32::<LittleEndian>()?;
        let decomp_size = reader.read_u32::<LittleEndian>()?;
        let mut name = [0u8; NAME_LEN];
        reader.read_exact(&mut name)?;
        Ok(Self {
            file_type,
            comp_type,
            comp_size,
            decomp_size,
            name,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_u8(self.file_type)?;
        writer.write_u8(self.comp_type)?;
        writer.write_u32::<LittleEndian>(self.comp_size)?;
        writer.write_u32::<LittleEndian>(self.decomp_size)?;
        writer.write_all(&self.name)?;
        Ok(())
    }

    pub fn file_type(&self) -> Result<FileType> {
        FileType::try_from(self.file_type)
    }
}

/// Build a resource blob: standard header followed by `payload`.
pub fn make_resource(file_type: FileType, name: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(StandardHeader::SIZE + payload.len());
    // writing into a Vec cannot fail
    let _ = StandardHeader::new(file_type, name, payload.len()).write_to(&mut out);
    out.extend_from_slice(payload);
    out
}

/// Resources known to the engine and the subset currently held in memory.
///
/// The archive is immutable, like the cluster files on disk. Opening a
/// resource makes a resident copy that may be modified; the copy lives until
/// it is killed.
#[derive(Debug, Default)]
pub struct ResourceManager {
    archive: HashMap<u32, Bytes>,
    resident: HashMap<u32, Vec<u8>>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, data: impl Into<Bytes>) {
        self.archive.insert(id, data.into());
        self.resident.remove(&id);
    }

    pub fn exists(&self, id: u32) -> bool {
        self.resident.contains_key(&id) || self.archive.contains_key(&id)
    }

    pub fn is_resident(&self, id: u32) -> bool {
        self.resident.contains_key(&id)
    }

    pub fn resident_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.resident.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn fetch_len(&self, id: u32) -> Result<u32> {
        let len = match self.resident.get(&id) {
            Some(data) => data.len(),
            None => self
                .archive
                .get(&id)
                .map(|d| d.len())
                .ok_or_else(|| anyhow!("resource {} not found", id))?,
        };
        u32::try_from(len).context("resource length overflow")
    }

    fn ensure_resident(&mut self, id: u32) -> Result<&mut Vec<u8>> {
        if !self.resident.contains_key(&id) {
            let data = self
                .archive
                .get(&id)
                .ok_or_else(|| anyhow!("resource {} not found", id))?;
            log::trace!("resource {}: loading {} bytes", id, data.len());
            self.resident.insert(id, data.to_vec());
        }
        self.resident
            .get_mut(&id)
            .ok_or_else(|| anyhow!("resource {} not resident", id))
    }

    pub fn open(&mut self, id: u32) -> Result<&[u8]> {
        Ok(self.ensure_resident(id)?.as_slice())
    }

    pub fn open_mut(&mut self, id: u32) -> Result<&mut [u8]> {
        Ok(self.ensure_resident(id)?.as_mut_slice())
    }

    pub fn standard_header(&mut self, id: u32) -> Result<StandardHeader> {
        StandardHeader::read_from(Cursor::new(self.open(id)?))
            .with_context(|| format!("resource {}: short standard header", id))
    }

    /// Trash every resident resource except the player object and the
    /// global variables.
    pub fn kill_all_res(&mut self) {
        let before = self.resident.len();
        self.resident
            .retain(|id, _| *id == CUR_PLAYER_ID || *id == GLOBAL_VARS_ID);
        log::debug!(
            "kill_all_res: dropped {} resident resources",
            before - self.resident.len()
        );
    }

    fn object_body(&mut self, id: u32) -> Result<&mut [u8]> {
        let head = self.standard_header(id)?;
        if head.file_type().ok() != Some(FileType::GameObject) {
            bail!(
                "incorrect object id {}: file type {} is not a game object",
                id,
                head.file_type
            );
        }
        let data = self.open_mut(id)?;
        let body = &mut data[StandardHeader::SIZE..];
        if body.len() < ObjectHub::SIZE {
            bail!("object {}: hub truncated ({} bytes)", id, body.len());
        }
        Ok(body)
    }

    pub fn object_hub(&mut self, id: u32) -> Result<ObjectHub> {
        let body = self.object_body(id)?;
        ObjectHub::read_from(Cursor::new(&body[..ObjectHub::SIZE]))
    }

    pub fn set_object_hub(&mut self, id: u32, hub: &ObjectHub) -> Result<()> {
        let body = self.object_body(id)?;
        hub.write_to(&mut body[..ObjectHub::SIZE])
    }
}
