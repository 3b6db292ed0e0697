use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result codes handed back to the caller of a save or restore.
///
/// The numeric values are the ones the engine's control panel has always
/// switched on, so they stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SrCode {
    Ok = 0,
    FileOpen = 1,
    Incompatible = 2,
    ReadFail = 3,
    WriteFail = 4,
    EngineFault = 5,
}

impl std::fmt::Display for SrCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SrCode::Ok => "OK",
            SrCode::FileOpen => "ERR_FILEOPEN",
            SrCode::Incompatible => "ERR_INCOMPATIBLE",
            SrCode::ReadFail => "ERR_READFAIL",
            SrCode::WriteFail => "ERR_WRITEFAIL",
            SrCode::EngineFault => "ERR_ENGINE",
        };
        f.write_str(name)
    }
}

/// Why a save file was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Incompatibility {
    #[error("file ended after {found} of {expected} bytes")]
    Truncated { expected: usize, found: usize },

    #[error("checksum mismatch: stored=0x{stored:08X}, computed=0x{computed:08X}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("global variables length mismatch: saved={saved}, current={current}")]
    VarLengthMismatch { saved: u32, current: u32 },
}

#[derive(Debug, Error)]
pub enum SaveRestError {
    #[error("couldn't open save file {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed writing save file {path:?}: {source}")]
    WriteFail {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading save file {path:?}: {source}")]
    ReadFail {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("incompatible save data: {0}")]
    Incompatible(Incompatibility),

    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

impl SaveRestError {
    pub fn code(&self) -> SrCode {
        match self {
            SaveRestError::FileOpen { .. } => SrCode::FileOpen,
            SaveRestError::WriteFail { .. } => SrCode::WriteFail,
            SaveRestError::ReadFail { .. } => SrCode::ReadFail,
            SaveRestError::Incompatible(_) => SrCode::Incompatible,
            SaveRestError::Engine(_) => SrCode::EngineFault,
        }
    }

    pub fn is_incompatible(&self) -> bool {
        matches!(self, SaveRestError::Incompatible(_))
    }
}

impl From<Incompatibility> for SaveRestError {
    fn from(reason: Incompatibility) -> Self {
        SaveRestError::Incompatible(reason)
    }
}

pub type Result<T> = std::result::Result<T, SaveRestError>;

/// Collapse an operation outcome into the engine's numeric result code.
pub fn result_code<T>(res: &Result<T>) -> SrCode {
    match res {
        Ok(_) => SrCode::Ok,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_keep_engine_values() {
        assert_eq!(SrCode::Ok as u32, 0);
        assert_eq!(SrCode::FileOpen as u32, 1);
        assert_eq!(SrCode::Incompatible as u32, 2);
        assert_eq!(SrCode::ReadFail as u32, 3);
        assert_eq!(SrCode::WriteFail as u32, 4);
    }

    #[test]
    fn test_error_maps_to_code() {
        let err: SaveRestError = Incompatibility::ChecksumMismatch { stored: 1, computed: 2 }.into();
        assert_eq!(err.code(), SrCode::Incompatible);
        assert!(err.is_incompatible());

        let err = SaveRestError::FileOpen {
            path: PathBuf::from("saves/savegame.099"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(result_code::<()>(&Err(err)), SrCode::FileOpen);
        assert_eq!(result_code(&Ok(())), SrCode::Ok);
    }

    #[test]
    fn test_engine_fault_from_anyhow() {
        let err: SaveRestError = anyhow::anyhow!("resource 8 missing").into();
        assert_eq!(err.code(), SrCode::EngineFault);
        assert_eq!(err.to_string(), "resource 8 missing");
    }
}
