//! A block-granular disk emulator backed by a regular file.
//!
//! The file system never touches the backing file directly: every byte it
//! reads or writes goes through [`Disk::read`]/[`Disk::write`], which treat
//! the file as a flat array of fixed-size blocks.

use crate::error::{Error, Result};
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;

/// The size in bytes of a single block.
pub const BLOCK_SIZE: usize = 4096;

/// A raw block buffer.
pub type Block = [u8; BLOCK_SIZE];

/// A disk: a backing file presented as `blocks` fixed-size blocks.
///
/// `mounted` is owned by the disk but only ever set by the file-system
/// layer, which uses it to enforce that at most one `FileSystem` is bound
/// to a given disk at a time.
#[derive(Debug)]
pub struct Disk {
    file: File,
    blocks: u32,
    reads: u64,
    writes: u64,
    mounted: bool,
}

impl Disk {
    /// Opens (creating if necessary) the backing file at `path` and sizes
    /// it to exactly `blocks * BLOCK_SIZE` bytes.
    pub fn open<P: AsRef<Path>>(path: P, blocks: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        file.set_len(blocks as u64 * BLOCK_SIZE as u64)?;
        Ok(Self {
            file,
            blocks,
            reads: 0,
            writes: 0,
            mounted: false,
        })
    }

    /// Opens an existing backing file, deriving its block count from its
    /// current length.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        let blocks = (len / BLOCK_SIZE as u64) as u32;
        Ok(Self {
            file,
            blocks,
            reads: 0,
            writes: 0,
            mounted: false,
        })
    }

    /// The total number of blocks on this disk.
    pub fn blocks(&self) -> u32 {
        self.blocks
    }

    /// The number of blocks successfully read since the disk was opened.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// The number of blocks successfully written since the disk was opened.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Whether a `FileSystem` currently holds this disk mounted.
    pub fn mounted(&self) -> bool {
        self.mounted
    }

    /// Sets the mount flag. Only the file-system layer calls this.
    pub(crate) fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted;
    }

    /// Reads block `block` in full into `buf`. A short read is a hard
    /// error: the layer above assumes all-or-nothing block I/O.
    pub fn read(&mut self, block: u32, buf: &mut Block) -> Result<usize> {
        if block >= self.blocks {
            return Err(Error::OutOfRange);
        }
        self.file
            .seek(SeekFrom::Start(block as u64 * BLOCK_SIZE as u64))?;
        self.file.read_exact(buf)?;
        self.reads += 1;
        Ok(BLOCK_SIZE)
    }

    /// Writes `buf` in full to block `block`. A short write is a hard
    /// error, symmetric to `read`.
    pub fn write(&mut self, block: u32, buf: &Block) -> Result<usize> {
        if block >= self.blocks {
            return Err(Error::OutOfRange);
        }
        self.file
            .seek(SeekFrom::Start(block as u64 * BLOCK_SIZE as u64))?;
        self.file.write_all(buf)?;
        self.writes += 1;
        Ok(BLOCK_SIZE)
    }

    /// Closes the disk, reporting the accumulated read/write counters on
    /// the diagnostic stream.
    pub fn close(self) {
        eprintln!(
            "disk: {} reads, {} writes",
            self.reads, self.writes
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Returns a fresh scratch path under the system temp directory.
    fn scratch_path(name: &str) -> std::path::PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("simplefs-test-{}-{}-{}", std::process::id(), n, name))
    }

    #[test]
    fn open_sizes_the_backing_file() {
        let path = scratch_path("open");
        let disk = Disk::open(&path, 10).unwrap();
        assert_eq!(disk.blocks(), 10);
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            10 * BLOCK_SIZE as u64
        );
        disk.close();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn read_write_round_trip() {
        let path = scratch_path("rw");
        let mut disk = Disk::open(&path, 4).unwrap();

        let mut out = [0xAB; BLOCK_SIZE];
        assert_eq!(disk.write(2, &out).unwrap(), BLOCK_SIZE);
        assert_eq!(disk.writes(), 1);

        out = [0; BLOCK_SIZE];
        assert_eq!(disk.read(2, &mut out).unwrap(), BLOCK_SIZE);
        assert_eq!(disk.reads(), 1);
        assert!(out.iter().all(|&b| b == 0xAB));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn out_of_range_block_fails() {
        let path = scratch_path("oob");
        let mut disk = Disk::open(&path, 2).unwrap();
        let mut buf = [0; BLOCK_SIZE];
        assert!(matches!(disk.read(2, &mut buf), Err(Error::OutOfRange)));
        assert!(matches!(disk.write(5, &buf), Err(Error::OutOfRange)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn mount_flag_roundtrips() {
        let path = scratch_path("mountflag");
        let mut disk = Disk::open(&path, 2).unwrap();
        assert!(!disk.mounted());
        disk.set_mounted(true);
        assert!(disk.mounted());
        disk.set_mounted(false);
        assert!(!disk.mounted());
        let _ = std::fs::remove_file(&path);
    }
}
