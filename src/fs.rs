//! The SimpleFS file-system layer: superblock, inode table, free bitmaps,
//! and the byte-offset read/write path through direct and indirect
//! pointers.

use crate::disk::{Block, Disk, BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::util::{ceil_division, reinterpret, reinterpret_mut};
use std::collections::HashSet;
use std::mem::size_of;

/// Superblock magic number identifying a SimpleFS image.
pub const MAGIC_NUMBER: u32 = 0xf0f0_3410;
/// Direct block pointers carried in each inode.
pub const POINTERS_PER_INODE: usize = 5;
/// 32-bit block pointers packed into an indirect block.
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// On-disk superblock, occupying the first `size_of::<SuperBlock>()` bytes
/// of block 0 (the rest of the block is zero padding).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
struct SuperBlock {
    magic: u32,
    blocks: u32,
    inode_blocks: u32,
    inodes: u32,
}

impl SuperBlock {
    fn to_block(self) -> Block {
        let mut block = [0u8; BLOCK_SIZE];
        let bytes = reinterpret(&self);
        block[..bytes.len()].copy_from_slice(bytes);
        block
    }

    fn from_block(block: &Block) -> Self {
        let mut sb = Self::default();
        let len = size_of::<Self>();
        reinterpret_mut(&mut sb).copy_from_slice(&block[..len]);
        sb
    }

    /// Checks the invariants of §3 against the disk's actual block count.
    fn is_valid(&self, disk_blocks: u32) -> bool {
        self.magic == MAGIC_NUMBER
            && self.blocks == disk_blocks
            && self.inode_blocks == ceil_division(disk_blocks, 10)
            && 1 + self.inode_blocks <= disk_blocks
            && self.inodes == self.inode_blocks * INODES_PER_BLOCK as u32
    }
}

/// On-disk inode record. `INODES_PER_BLOCK` of these are packed per
/// inode-table block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Inode {
    valid: u32,
    size: u32,
    direct: [u32; POINTERS_PER_INODE],
    indirect: u32,
}

/// Inode records packed into a single block.
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / size_of::<Inode>();

/// The maximum byte size addressable by an inode's direct and indirect
/// pointers.
pub const MAX_FILE_SIZE: usize = (POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE;

/// Reads the 32-bit pointer at slot `idx` of an indirect block.
fn read_ptr(block: &Block, idx: usize) -> u32 {
    let off = idx * 4;
    u32::from_ne_bytes(block[off..off + 4].try_into().unwrap())
}

/// Writes the 32-bit pointer at slot `idx` of an indirect block.
fn write_ptr(block: &mut Block, idx: usize, val: u32) {
    let off = idx * 4;
    block[off..off + 4].copy_from_slice(&val.to_ne_bytes());
}

/// The inode-table block number that holds inode `i`.
fn inode_block(i: u32) -> u32 {
    1 + i / INODES_PER_BLOCK as u32
}

/// The byte offset of inode `i` within its inode-table block.
fn inode_offset(i: u32) -> usize {
    (i % INODES_PER_BLOCK as u32) as usize * size_of::<Inode>()
}

/// A mounted SimpleFS file system, exclusively bound to the `Disk` it was
/// mounted on.
///
/// The free-inode and free-block bitmaps are rebuilt from the disk at
/// mount time (see [`FileSystem::mount`]) and are never persisted.
pub struct FileSystem {
    disk: Disk,
    meta: SuperBlock,
    free_inodes: Vec<bool>,
    free_blocks: Vec<bool>,
}

impl FileSystem {
    /// Formats `disk`: writes a fresh superblock and zeroes every other
    /// block. Fails if `disk` is currently mounted.
    pub fn format(disk: &mut Disk) -> Result<()> {
        if disk.mounted() {
            return Err(Error::AlreadyMounted);
        }
        let inode_blocks = ceil_division(disk.blocks(), 10);
        let inodes = inode_blocks * INODES_PER_BLOCK as u32;
        let meta = SuperBlock {
            magic: MAGIC_NUMBER,
            blocks: disk.blocks(),
            inode_blocks,
            inodes,
        };
        disk.write(0, &meta.to_block())?;
        let zero = [0u8; BLOCK_SIZE];
        for b in 1..disk.blocks() {
            disk.write(b, &zero)?;
        }
        Ok(())
    }

    /// Mounts `disk`, rebuilding the in-memory free-inode and free-block
    /// bitmaps by walking the inode table. Fails if `disk` is already
    /// mounted or does not carry a valid superblock. On failure, the disk
    /// is handed back to the caller unchanged (still unmounted) alongside
    /// the error, since mounting does not consume it.
    pub fn mount(mut disk: Disk) -> std::result::Result<Self, (Disk, Error)> {
        if disk.mounted() {
            return Err((disk, Error::AlreadyMounted));
        }
        let mut block = [0u8; BLOCK_SIZE];
        if let Err(e) = disk.read(0, &mut block) {
            return Err((disk, e));
        }
        let meta = SuperBlock::from_block(&block);
        if !meta.is_valid(disk.blocks()) {
            return Err((disk, Error::InvalidSuperblock));
        }
        disk.set_mounted(true);
        match Self::rebuild_bitmaps(disk, meta) {
            Ok(fs) => Ok(fs),
            Err((mut disk, e)) => {
                disk.set_mounted(false);
                Err((disk, e))
            }
        }
    }

    /// Walks the inode table to derive `free_inodes` and `free_blocks` from
    /// scratch. The free-block bitmap must come from reachability through
    /// live inodes, not from "is this block all zeros" — a legitimately
    /// allocated block may be all zeros.
    fn rebuild_bitmaps(mut disk: Disk, meta: SuperBlock) -> std::result::Result<Self, (Disk, Error)> {
        let mut free_inodes = vec![false; meta.inodes as usize];
        let mut occupied: HashSet<u32> = HashSet::new();
        for b in 1..=meta.inode_blocks {
            occupied.insert(b);
        }
        occupied.insert(0);

        let mut block = [0u8; BLOCK_SIZE];
        for table_block in 1..=meta.inode_blocks {
            if let Err(e) = disk.read(table_block, &mut block) {
                return Err((disk, e));
            }
            for slot in 0..INODES_PER_BLOCK {
                let i = (table_block - 1) * INODES_PER_BLOCK as u32 + slot as u32;
                if i >= meta.inodes {
                    break;
                }
                let mut inode = Inode::default();
                let off = slot * size_of::<Inode>();
                reinterpret_mut(&mut inode).copy_from_slice(&block[off..off + size_of::<Inode>()]);

                free_inodes[i as usize] = inode.valid == 0;
                if inode.valid == 0 {
                    continue;
                }
                for &p in inode.direct.iter() {
                    if p != 0 {
                        occupied.insert(p);
                    }
                }
                if inode.indirect != 0 {
                    occupied.insert(inode.indirect);
                    let mut ind_block = [0u8; BLOCK_SIZE];
                    if let Err(e) = disk.read(inode.indirect, &mut ind_block) {
                        return Err((disk, e));
                    }
                    for idx in 0..POINTERS_PER_BLOCK {
                        let p = read_ptr(&ind_block, idx);
                        if p != 0 {
                            occupied.insert(p);
                        }
                    }
                }
            }
        }

        let mut free_blocks = vec![false; meta.blocks as usize];
        for b in (1 + meta.inode_blocks)..meta.blocks {
            free_blocks[b as usize] = !occupied.contains(&b);
        }

        Ok(Self {
            disk,
            meta,
            free_inodes,
            free_blocks,
        })
    }

    /// Unmounts the file system, releasing the bitmaps and clearing the
    /// disk's mount flag, and hands the disk back to the caller.
    pub fn unmount(mut self) -> Disk {
        self.disk.set_mounted(false);
        self.disk
    }

    /// Borrows the underlying disk, e.g. to run [`FileSystem::debug`]
    /// without unmounting.
    pub fn disk_mut(&mut self) -> &mut Disk {
        &mut self.disk
    }

    /// The total number of blocks on the mounted disk.
    pub fn blocks(&self) -> u32 {
        self.meta.blocks
    }

    /// The number of inode-table blocks.
    pub fn inode_blocks(&self) -> u32 {
        self.meta.inode_blocks
    }

    /// The total number of inodes the table can hold.
    pub fn inodes(&self) -> u32 {
        self.meta.inodes
    }

    /// The number of currently free data blocks.
    pub fn free_block_count(&self) -> usize {
        self.free_blocks.iter().filter(|&&f| f).count()
    }

    fn read_inode(&mut self, i: u32) -> Result<Inode> {
        if i >= self.meta.inodes {
            return Err(Error::OutOfRange);
        }
        let mut block = [0u8; BLOCK_SIZE];
        self.disk.read(inode_block(i), &mut block)?;
        let mut inode = Inode::default();
        let off = inode_offset(i);
        reinterpret_mut(&mut inode).copy_from_slice(&block[off..off + size_of::<Inode>()]);
        Ok(inode)
    }

    fn write_inode(&mut self, i: u32, inode: &Inode) -> Result<()> {
        let mut block = [0u8; BLOCK_SIZE];
        self.disk.read(inode_block(i), &mut block)?;
        let off = inode_offset(i);
        block[off..off + size_of::<Inode>()].copy_from_slice(reinterpret(inode));
        self.disk.write(inode_block(i), &block)?;
        Ok(())
    }

    /// Allocates the lowest-index free data block, marking it used.
    /// Returns `0` (never a valid data block, since it is the superblock)
    /// when none is available.
    fn allocate_block(&mut self) -> u32 {
        let start = 1 + self.meta.inode_blocks;
        for b in start..self.meta.blocks {
            if self.free_blocks[b as usize] {
                self.free_blocks[b as usize] = false;
                return b;
            }
        }
        0
    }

    fn free_block(&mut self, b: u32) {
        if b != 0 {
            self.free_blocks[b as usize] = true;
        }
    }

    /// Creates a new, empty inode. Returns its index, or an error if the
    /// inode table is full.
    pub fn create(&mut self) -> Result<u32> {
        for i in 0..self.meta.inodes {
            if self.free_inodes[i as usize] {
                let inode = Inode {
                    valid: 1,
                    size: 0,
                    direct: [0; POINTERS_PER_INODE],
                    indirect: 0,
                };
                self.write_inode(i, &inode)?;
                self.free_inodes[i as usize] = false;
                return Ok(i);
            }
        }
        Err(Error::NoFreeInode)
    }

    /// Frees every data block owned by `inode_number` and returns it to the
    /// free-inode pool.
    pub fn remove(&mut self, inode_number: u32) -> Result<()> {
        let mut inode = self.read_inode(inode_number)?;
        if inode.valid == 0 {
            return Err(Error::InvalidInode);
        }

        for p in inode.direct.iter_mut() {
            self.free_block(*p);
            *p = 0;
        }
        if inode.indirect != 0 {
            let mut ind_block = [0u8; BLOCK_SIZE];
            self.disk.read(inode.indirect, &mut ind_block)?;
            for idx in 0..POINTERS_PER_BLOCK {
                self.free_block(read_ptr(&ind_block, idx));
            }
            self.free_block(inode.indirect);
            inode.indirect = 0;
        }
        inode.size = 0;
        inode.valid = 0;
        self.write_inode(inode_number, &inode)?;
        self.free_inodes[inode_number as usize] = true;
        Ok(())
    }

    /// Returns the size in bytes of `inode_number`, or an error if it is
    /// not a valid inode.
    pub fn stat(&mut self, inode_number: u32) -> Result<u32> {
        let inode = self.read_inode(inode_number)?;
        if inode.valid == 0 {
            return Err(Error::InvalidInode);
        }
        Ok(inode.size)
    }

    /// Resolves logical block `logical` of `inode` to a physical block
    /// number, without allocating. Returns `0` if the logical block has
    /// never been written.
    fn resolve_block(&mut self, inode: &Inode, logical: usize) -> Result<u32> {
        if logical < POINTERS_PER_INODE {
            return Ok(inode.direct[logical]);
        }
        if inode.indirect == 0 {
            return Ok(0);
        }
        let mut ind_block = [0u8; BLOCK_SIZE];
        self.disk.read(inode.indirect, &mut ind_block)?;
        Ok(read_ptr(&ind_block, logical - POINTERS_PER_INODE))
    }

    /// Resolves logical block `logical` of `inode`, allocating a data
    /// block (and, if needed, an indirect block) when the slot is empty.
    /// Returns `0` if allocation fails.
    fn resolve_or_allocate(&mut self, inode: &mut Inode, logical: usize) -> Result<u32> {
        if logical < POINTERS_PER_INODE {
            if inode.direct[logical] == 0 {
                let b = self.allocate_block();
                if b == 0 {
                    return Ok(0);
                }
                inode.direct[logical] = b;
            }
            return Ok(inode.direct[logical]);
        }

        if inode.indirect == 0 {
            let b = self.allocate_block();
            if b == 0 {
                return Ok(0);
            }
            self.disk.write(b, &[0u8; BLOCK_SIZE])?;
            inode.indirect = b;
        }

        let mut ind_block = [0u8; BLOCK_SIZE];
        self.disk.read(inode.indirect, &mut ind_block)?;
        let idx = logical - POINTERS_PER_INODE;
        let mut ptr = read_ptr(&ind_block, idx);
        if ptr == 0 {
            let b = self.allocate_block();
            if b == 0 {
                return Ok(0);
            }
            write_ptr(&mut ind_block, idx, b);
            self.disk.write(inode.indirect, &ind_block)?;
            ptr = b;
        }
        Ok(ptr)
    }

    /// Reads up to `buf.len()` bytes from `inode_number` starting at
    /// `offset`, returning the number of bytes copied.
    pub fn read(&mut self, inode_number: u32, buf: &mut [u8], offset: u32) -> Result<usize> {
        let inode = self.read_inode(inode_number)?;
        if inode.valid == 0 {
            return Err(Error::InvalidInode);
        }
        if offset > inode.size {
            return Err(Error::OutOfRange);
        }
        if offset == inode.size {
            return Ok(0);
        }

        let want = std::cmp::min(buf.len(), (inode.size - offset) as usize);
        let mut done = 0usize;
        let mut scratch = [0u8; BLOCK_SIZE];

        while done < want {
            let pos = offset as usize + done;
            let logical = pos / BLOCK_SIZE;
            let intra = pos % BLOCK_SIZE;

            let physical = match self.resolve_block(&inode, logical) {
                Ok(p) => p,
                Err(_) => break,
            };
            if physical == 0 {
                break;
            }
            if self.disk.read(physical, &mut scratch).is_err() {
                break;
            }

            let chunk = std::cmp::min(BLOCK_SIZE - intra, want - done);
            buf[done..done + chunk].copy_from_slice(&scratch[intra..intra + chunk]);
            done += chunk;
        }

        Ok(done)
    }

    /// Writes `buf` to `inode_number` starting at `offset`, allocating data
    /// and indirect blocks as needed. Returns the number of bytes written.
    pub fn write(&mut self, inode_number: u32, buf: &[u8], offset: u32) -> Result<usize> {
        let mut inode = self.read_inode(inode_number)?;
        if inode.valid == 0 {
            return Err(Error::InvalidInode);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if offset as usize > MAX_FILE_SIZE {
            return Err(Error::OutOfRange);
        }

        let mut done = 0usize;
        let mut scratch = [0u8; BLOCK_SIZE];

        while done < buf.len() {
            let pos = offset as usize + done;
            if pos >= MAX_FILE_SIZE {
                break;
            }
            let logical = pos / BLOCK_SIZE;
            let intra = pos % BLOCK_SIZE;

            let physical = self.resolve_or_allocate(&mut inode, logical)?;
            if physical == 0 {
                break;
            }

            let chunk = std::cmp::min(BLOCK_SIZE - intra, buf.len() - done);
            if intra == 0 && chunk == BLOCK_SIZE {
                scratch[..chunk].copy_from_slice(&buf[done..done + chunk]);
            } else {
                self.disk.read(physical, &mut scratch)?;
                scratch[intra..intra + chunk].copy_from_slice(&buf[done..done + chunk]);
            }
            self.disk.write(physical, &scratch)?;
            done += chunk;
        }

        if done == 0 {
            return Err(Error::NoFreeBlock);
        }

        inode.size = std::cmp::max(inode.size, offset + done as u32);
        self.write_inode(inode_number, &inode)?;
        Ok(done)
    }

    /// Prints the superblock and every valid inode's metadata to stdout.
    /// Does not require a mounted file system.
    pub fn debug(disk: &mut Disk) -> Result<()> {
        let mut block = [0u8; BLOCK_SIZE];
        disk.read(0, &mut block)?;
        let meta = SuperBlock::from_block(&block);

        println!("SuperBlock:");
        println!("    magic number is {}", if meta.magic == MAGIC_NUMBER { "valid" } else { "invalid" });
        println!("    {} blocks", meta.blocks);
        println!("    {} inode blocks", meta.inode_blocks);
        println!("    {} inodes", meta.inodes);

        for table_block in 1..=meta.inode_blocks {
            disk.read(table_block, &mut block)?;
            for slot in 0..INODES_PER_BLOCK {
                let i = (table_block - 1) * INODES_PER_BLOCK as u32 + slot as u32;
                if i >= meta.inodes {
                    break;
                }
                let mut inode = Inode::default();
                let off = slot * size_of::<Inode>();
                reinterpret_mut(&mut inode).copy_from_slice(&block[off..off + size_of::<Inode>()]);
                if inode.valid == 0 {
                    continue;
                }
                println!("Inode {i}:");
                println!("    size: {} bytes", inode.size);
                println!("    direct blocks: {:?}", inode.direct);
                if inode.indirect != 0 {
                    print!("    indirect block: {}", inode.indirect);
                    let mut ind_block = [0u8; BLOCK_SIZE];
                    disk.read(inode.indirect, &mut ind_block)?;
                    print!("\n    indirect data blocks:");
                    for idx in 0..POINTERS_PER_BLOCK {
                        let p = read_ptr(&ind_block, idx);
                        if p != 0 {
                            print!(" {p}");
                        }
                    }
                    println!();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::Disk;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn scratch_disk(blocks: u32) -> (std::path::PathBuf, Disk) {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "simplefs-fs-test-{}-{}",
            std::process::id(),
            n
        ));
        let disk = Disk::open(&path, blocks).unwrap();
        (path, disk)
    }

    fn cleanup(path: &std::path::Path) {
        let _ = std::fs::remove_file(path);
    }

    fn mount_fresh(disk: Disk) -> FileSystem {
        FileSystem::mount(disk).unwrap_or_else(|(_, e)| panic!("mount failed: {e}"))
    }

    #[test]
    fn format_then_debug_geometry() {
        let (path, mut disk) = scratch_disk(200);
        FileSystem::format(&mut disk).unwrap();
        let fs = mount_fresh(disk);
        assert_eq!(fs.blocks(), 200);
        assert_eq!(fs.inode_blocks(), 20);
        assert_eq!(fs.inodes(), 20 * INODES_PER_BLOCK as u32);
        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn create_indices_are_dense_then_exhaust() {
        let (path, mut disk) = scratch_disk(20);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);
        for expect in 0..fs.inodes() {
            assert_eq!(fs.create().unwrap(), expect);
        }
        assert!(matches!(fs.create(), Err(Error::NoFreeInode)));
        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn round_trip_small_write() {
        let (path, mut disk) = scratch_disk(50);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);

        let i = fs.create().unwrap();
        let payload: Vec<u8> = (0..1234u32).map(|x| (x % 251) as u8).collect();
        let written = fs.write(i, &payload, 0).unwrap();
        assert_eq!(written, payload.len());
        assert_eq!(fs.stat(i).unwrap(), payload.len() as u32);

        let mut out = vec![0u8; payload.len()];
        let read = fs.read(i, &mut out, 0).unwrap();
        assert_eq!(read, payload.len());
        assert_eq!(out, payload);

        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn indirect_boundary_crossing() {
        let (path, mut disk) = scratch_disk(50);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);

        let i = fs.create().unwrap();
        let len = POINTERS_PER_INODE * BLOCK_SIZE + 17;
        let payload: Vec<u8> = (0..len).map(|x| (x % 253) as u8).collect();
        let written = fs.write(i, &payload, 0).unwrap();
        assert_eq!(written, len);
        assert_eq!(fs.stat(i).unwrap(), len as u32);

        let mut out = vec![0u8; len];
        assert_eq!(fs.read(i, &mut out, 0).unwrap(), len);
        assert_eq!(out, payload);

        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn removal_frees_direct_and_indirect_blocks() {
        let (path, mut disk) = scratch_disk(50);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);

        let before = fs.free_block_count();
        let i = fs.create().unwrap();
        let payload = vec![0x42u8; 6 * BLOCK_SIZE];
        fs.write(i, &payload, 0).unwrap();
        fs.remove(i).unwrap();
        let after = fs.free_block_count();

        assert_eq!(before, after);
        assert_eq!(fs.create().unwrap(), i);

        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn overwrite_does_not_grow_size() {
        let (path, mut disk) = scratch_disk(20);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);

        let i = fs.create().unwrap();
        fs.write(i, &[1u8; 100], 0).unwrap();
        fs.write(i, &[2u8; 10], 0).unwrap();
        assert_eq!(fs.stat(i).unwrap(), 100);

        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn all_zero_block_survives_remount() {
        let (path, mut disk) = scratch_disk(20);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);
        let i = fs.create().unwrap();
        fs.write(i, &[0u8; BLOCK_SIZE], 0).unwrap();
        let free_before = fs.free_block_count();
        let disk = fs.unmount();

        let mut fs = mount_fresh(disk);
        assert_eq!(fs.free_block_count(), free_before);
        assert_eq!(fs.stat(i).unwrap(), BLOCK_SIZE as u32);
        let disk = fs.unmount();

        disk.close();
        cleanup(&path);
    }

    #[test]
    fn invalid_magic_rejects_mount() {
        let (path, mut disk) = scratch_disk(20);
        FileSystem::format(&mut disk).unwrap();
        disk.write(0, &[0u8; BLOCK_SIZE]).unwrap();
        match FileSystem::mount(disk) {
            Err((disk, Error::InvalidSuperblock)) => assert!(!disk.mounted()),
            other => panic!("expected InvalidSuperblock, got {:?}", other.map(|_| ())),
        }
        cleanup(&path);
    }

    #[test]
    fn read_through_hole_returns_zero_without_error() {
        let (path, mut disk) = scratch_disk(50);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);

        let i = fs.create().unwrap();
        // Writing at a later block leaves direct[0] as a hole (pointer 0)
        // while growing `size` past it.
        fs.write(i, &[7u8; 16], 3 * BLOCK_SIZE as u32).unwrap();
        assert_eq!(fs.stat(i).unwrap(), 3 * BLOCK_SIZE as u32 + 16);

        let mut out = [0xFFu8; 16];
        assert_eq!(fs.read(i, &mut out, 0).unwrap(), 0);

        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn zero_length_read_on_nonempty_file_is_a_no_op() {
        let (path, mut disk) = scratch_disk(20);
        FileSystem::format(&mut disk).unwrap();
        let mut fs = mount_fresh(disk);

        let i = fs.create().unwrap();
        fs.write(i, &[1u8; 10], 0).unwrap();
        let mut out: [u8; 0] = [];
        assert_eq!(fs.read(i, &mut out, 0).unwrap(), 0);

        fs.unmount();
        cleanup(&path);
    }

    #[test]
    fn mount_unmount_mount_idempotent() {
        let (path, mut disk) = scratch_disk(20);
        FileSystem::format(&mut disk).unwrap();
        let fs1 = mount_fresh(disk);
        let free1 = fs1.free_blocks.clone();
        let disk = fs1.unmount();

        let fs2 = mount_fresh(disk);
        assert_eq!(fs2.free_blocks, free1);
        fs2.unmount();
        cleanup(&path);
    }
}
