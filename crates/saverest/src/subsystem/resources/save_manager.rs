use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::save_config::{DescriptionStyle, SaveConfig};
use crate::error::{Incompatibility, Result, SaveRestError};
use crate::subsystem::save_state::{SaveBuffer, SaveHeader};
use crate::utils::nls::Nls;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlotInfo {
    pub slot: u16,
    pub description: String,
}

/// Check a loaded buffer before anything in the world is touched.
///
/// The checksum is tested first, then the global variables length against
/// the running engine's; either mismatch makes the save unusable.
pub fn validate_save_buffer(buffer: &SaveBuffer, current_var_length: u32) -> Result<SaveHeader> {
    let expected = SaveHeader::SIZE + current_var_length as usize;
    if buffer.len() < SaveHeader::SIZE {
        return Err(Incompatibility::Truncated {
            expected,
            found: buffer.len(),
        }
        .into());
    }
    let header = buffer.header()?;

    let computed = buffer.computed_checksum();
    if header.checksum != computed {
        return Err(Incompatibility::ChecksumMismatch {
            stored: header.checksum,
            computed,
        }
        .into());
    }

    if header.var_length != current_var_length {
        return Err(Incompatibility::VarLengthMismatch {
            saved: header.var_length,
            current: current_var_length,
        }
        .into());
    }

    if buffer.len() < expected {
        return Err(Incompatibility::Truncated {
            expected,
            found: buffer.len(),
        }
        .into());
    }

    Ok(header)
}

/// Slot files on disk: one `savegame.NNN` file per slot.
#[derive(Debug, Clone)]
pub struct SaveManager {
    config: SaveConfig,
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::new(SaveConfig::default())
    }
}

impl SaveManager {
    pub fn new(config: SaveConfig) -> Self {
        SaveManager { config }
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn save_dir(&self) -> &Path {
        &self.config.save_dir
    }

    pub fn nls(&self) -> Nls {
        self.config.nls
    }

    pub fn slot_file_name(slot: u16) -> String {
        format!("savegame.{:03}", slot)
    }

    pub fn get_save_path(&self, slot: u16) -> PathBuf {
        self.config.save_dir.join(Self::slot_file_name(slot))
    }

    pub fn save_exists(&self, slot: u16) -> bool {
        self.get_save_path(slot).is_file()
    }

    pub fn write_slot(&self, slot: u16, buffer: &SaveBuffer) -> Result<()> {
        let path = self.get_save_path(slot);

        // create saves directory just in case it is not there
        if let Err(e) = fs::create_dir_all(&self.config.save_dir) {
            return Err(SaveRestError::FileOpen { path, source: e });
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) => return Err(SaveRestError::FileOpen { path, source: e }),
        };

        // write_all turns a short write into WriteZero
        if let Err(e) = file.write_all(buffer.as_bytes()).and_then(|_| file.sync_data()) {
            log::warn!("write_slot: slot {} failed after open: {}", slot, e);
            return Err(SaveRestError::WriteFail { path, source: e });
        }

        log::debug!("write_slot: slot {} <- {} bytes", slot, buffer.len());
        Ok(())
    }

    /// Read exactly `expected` bytes of a slot file.
    ///
    /// Running out of file is reported as incompatible data (an older or
    /// foreign layout); any other I/O error is a read failure.
    pub fn read_slot(&self, slot: u16, expected: usize) -> Result<SaveBuffer> {
        let path = self.get_save_path(slot);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => return Err(SaveRestError::FileOpen { path, source: e }),
        };

        let mut bytes = vec![0u8; expected];
        let mut filled = 0;
        while filled < expected {
            match file.read(&mut bytes[filled..]) {
                Ok(0) => {
                    log::warn!(
                        "read_slot: slot {} ended after {} of {} bytes",
                        slot,
                        filled,
                        expected
                    );
                    return Err(Incompatibility::Truncated {
                        expected,
                        found: filled,
                    }
                    .into());
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SaveRestError::ReadFail { path, source: e }),
            }
        }

        log::debug!("read_slot: slot {} -> {} bytes", slot, expected);
        Ok(SaveBuffer::from_vec(bytes))
    }

    /// Decode a slot's header with no validation at all. A file shorter
    /// than a header is zero-padded.
    pub fn read_header(&self, slot: u16) -> Result<SaveHeader> {
        let path = self.get_save_path(slot);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => return Err(SaveRestError::FileOpen { path, source: e }),
        };

        let mut raw = Vec::with_capacity(SaveHeader::SIZE);
        if let Err(e) = file.take(SaveHeader::SIZE as u64).read_to_end(&mut raw) {
            return Err(SaveRestError::ReadFail { path, source: e });
        }
        raw.resize(SaveHeader::SIZE, 0);

        Ok(SaveHeader::read_from(raw.as_slice())?)
    }

    /// Description of a slot, read from the header alone. The checksum is
    /// not checked, so a damaged save may still list with a garbage
    /// description.
    pub fn get_save_description(&self, slot: u16) -> Result<String> {
        Ok(self.read_header(slot)?.description(self.config.nls))
    }

    /// Populated slots below `max_slots`, in slot order.
    pub fn list_saves(&self) -> Vec<SaveSlotInfo> {
        (0..self.config.max_slots)
            .filter(|&slot| self.save_exists(slot))
            .filter_map(|slot| match self.get_save_description(slot) {
                Ok(description) => Some(SaveSlotInfo { slot, description }),
                Err(e) => {
                    log::warn!("list_saves: slot {}: {}", slot, e);
                    None
                }
            })
            .collect()
    }

    pub fn delete_save(&self, slot: u16) -> Result<()> {
        let path = self.get_save_path(slot);
        if let Err(e) = fs::remove_file(&path) {
            return Err(SaveRestError::FileOpen { path, source: e });
        }
        log::debug!("delete_save: slot {} removed", slot);
        Ok(())
    }

    pub fn default_description(&self, slot: u16) -> String {
        match self.config.description_style {
            DescriptionStyle::Slot => format!("Save {}", slot),
            DescriptionStyle::DateTime => Local::now().format("%Y-%m-%d %H:%M").to_string(),
        }
    }

    /// Read and validate a slot without touching any world state.
    pub fn verify_slot(&self, slot: u16, current_var_length: u32) -> Result<SaveHeader> {
        let expected = SaveHeader::SIZE + current_var_length as usize;
        let buffer = self.read_slot(slot, expected)?;
        validate_save_buffer(&buffer, current_var_length)
    }
}
