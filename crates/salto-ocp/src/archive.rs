//! Persisted problem + solution artifact.
//!
//! A solved problem is written to disk so it can be inspected later
//! without re-solving. The file layout is:
//!
//! 1. **Magic bytes**: `SJO1` (4 bytes)
//! 2. **Version**: `u32` little-endian (4 bytes)
//! 3. **Payload**: bincode-encoded ([`JumpOcp`], [`Solution`]) pair
//!
//! Loading validates the header, then decodes the pair. Durations in a
//! reloaded solution are bit-identical to the saved ones.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::ocp::JumpOcp;
use crate::solver::Solution;

/// Magic bytes identifying a salto archive.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"SJO1";

/// Current archive format version.
pub const ARCHIVE_VERSION: u32 = 1;

/// Archive errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("not a salto archive (bad magic {0:?})")]
    InvalidMagic([u8; 4]),

    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u32),
}

/// Write the problem descriptor and its solution to `path`, creating
/// parent directories as needed.
pub fn save(ocp: &JumpOcp, solution: &Solution, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
    let path = path.as_ref();
    let io_err = |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&ARCHIVE_MAGIC).map_err(io_err)?;
    writer
        .write_all(&ARCHIVE_VERSION.to_le_bytes())
        .map_err(io_err)?;

    bincode::serialize_into(&mut writer, &(ocp, solution))
        .map_err(|e| ArchiveError::Encode(e.to_string()))?;
    writer.flush().map_err(io_err)?;

    info!(path = %path.display(), "saved problem and solution");
    Ok(())
}

/// Load a problem descriptor and its solution from `path`.
pub fn load(path: impl AsRef<Path>) -> Result<(JumpOcp, Solution), ArchiveError> {
    let path = path.as_ref();
    let io_err = |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(io_err)?;
    if magic != ARCHIVE_MAGIC {
        return Err(ArchiveError::InvalidMagic(magic));
    }

    let mut version_bytes = [0u8; 4];
    reader.read_exact(&mut version_bytes).map_err(io_err)?;
    let version = u32::from_le_bytes(version_bytes);
    if version != ARCHIVE_VERSION {
        return Err(ArchiveError::UnsupportedVersion(version));
    }

    let pair: (JumpOcp, Solution) = bincode::deserialize_from(&mut reader)
        .map_err(|e| ArchiveError::Decode(e.to_string()))?;

    info!(path = %path.display(), "loaded problem and solution");
    Ok(pair)
}
