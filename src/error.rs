//! Error type shared by the disk emulator and the file-system layer.

use std::fmt;
use std::io;

/// An error produced by the disk emulator or the file system.
#[derive(Debug)]
pub enum Error {
    /// A read or write against the backing file failed or was short.
    Io(io::Error),
    /// Block 0 did not carry a valid superblock, or the superblock's fields
    /// are inconsistent with the disk's geometry.
    InvalidSuperblock,
    /// An inode index is out of the valid range, or the inode is not valid.
    InvalidInode,
    /// The requested block index is out of range for the disk.
    OutOfRange,
    /// `format`/`mount` was attempted on a disk that is already mounted.
    AlreadyMounted,
    /// An operation requiring a mount was attempted before one was done.
    NotMounted,
    /// `create` found no free inode in the table.
    NoFreeInode,
    /// `write` could not allocate a single data block.
    NoFreeBlock,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(fmt, "I/O error: {e}"),
            Self::InvalidSuperblock => write!(fmt, "invalid superblock"),
            Self::InvalidInode => write!(fmt, "invalid inode"),
            Self::OutOfRange => write!(fmt, "block or inode index out of range"),
            Self::AlreadyMounted => write!(fmt, "disk is already mounted"),
            Self::NotMounted => write!(fmt, "file system is not mounted"),
            Self::NoFreeInode => write!(fmt, "no free inode"),
            Self::NoFreeBlock => write!(fmt, "no free block"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shorthand result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
