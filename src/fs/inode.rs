use serde::Deserialize;

use crate::utils::{time_util::Timestamp, traits::DiskRecord};

use super::{filekind::FileKind, DIRECT_POINTERS};

/// number of block pointers in an inode: direct ones, then single, double and triple indirect
pub const BLOCK_POINTERS: usize = 15;
const SINGLE_INDIRECT: usize = 12;
const DOUBLE_INDIRECT: usize = 13;
const TRIPLE_INDIRECT: usize = 14;
/// `i_blocks` counts 512-byte sectors, whatever the block size
const SECTOR_SIZE: u32 = 512;

/// The first 128 bytes of an on-disk inode, which is all of it on revision 0
/// volumes and the part every revision agrees on otherwise.
///
/// See <https://www.nongnu.org/ext2-doc/ext2.html#inode-table>
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Inode {
    /// file type and permission bits
    pub mode: u16,
    uid_low: u16,
    pub size_low: u32,
    pub accessed_at: Timestamp,
    pub changed_at: Timestamp,
    pub modified_at: Timestamp,
    pub deleted_at: Timestamp,
    gid_low: u16,
    pub links_count: u16,
    /// 512-byte sectors allocated to this inode, indirect blocks included
    pub sectors: u32,
    pub flags: u32,
    pub osd1: u32,
    /// 12 direct pointers, then single, double and triple indirect
    pub block: [u32; BLOCK_POINTERS],
    pub generation: u32,
    /// extended attribute block
    pub file_acl: u32,
    /// upper 32 bits of the size for regular files, `i_dir_acl` otherwise
    pub size_high: u32,
    pub fragment_addr: u32,
    pub fragment_number: u8,
    pub fragment_size: u8,
    _pad: u16,
    uid_high: u16,
    gid_high: u16,
    _reserved: u32,
}

impl DiskRecord for Inode {
    const NAME: &'static str = "inode";
    const SIZE: usize = 128;
}

/// This block is about file metadata
impl Inode {
    pub fn kind(&self) -> FileKind {
        FileKind::from_mode(self.mode)
    }

    pub fn is_regular_file(&self) -> bool {
        self.kind() == FileKind::RegularFile
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == FileKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind() == FileKind::SymbolicLink
    }

    /// permission bits, setuid/setgid/sticky included
    pub fn permissions(&self) -> u16 {
        self.mode & 0o7777
    }

    /// owner, reassembled from the legacy 16-bit field and the high half
    pub fn uid(&self) -> u32 {
        (self.uid_high as u32) << 16 | self.uid_low as u32
    }

    /// group, reassembled from the legacy 16-bit field and the high half
    pub fn gid(&self) -> u32 {
        (self.gid_high as u32) << 16 | self.gid_low as u32
    }

    /// logical size in bytes
    ///
    /// `size_high` only extends regular files; on directories the same
    /// field holds the directory ACL.
    pub fn file_size(&self) -> u64 {
        if self.is_regular_file() {
            (self.size_high as u64) << 32 | self.size_low as u64
        } else {
            self.size_low as u64
        }
    }
}

/// This block is about block pointers
impl Inode {
    pub fn direct_blocks(&self) -> &[u32] {
        &self.block[..DIRECT_POINTERS as usize]
    }

    pub fn indirect_block(&self) -> u32 {
        self.block[SINGLE_INDIRECT]
    }

    pub fn double_indirect_block(&self) -> u32 {
        self.block[DOUBLE_INDIRECT]
    }

    pub fn triple_indirect_block(&self) -> u32 {
        self.block[TRIPLE_INDIRECT]
    }

    /// the block pointer array as the 60 raw bytes it occupies on disk
    pub fn block_bytes(&self) -> [u8; BLOCK_POINTERS * 4] {
        let mut bytes = [0u8; BLOCK_POINTERS * 4];
        for (chunk, pointer) in bytes.chunks_exact_mut(4).zip(self.block.iter()) {
            chunk.copy_from_slice(&pointer.to_le_bytes());
        }
        bytes
    }

    /// whether a symlink keeps its target inside [Inode::block]
    ///
    /// A fast symlink owns no data block; the only sectors it may be charged
    /// for belong to its extended attribute block.
    pub fn is_fast_symlink(&self, block_size: u32) -> bool {
        let ea_sectors = if self.file_acl != 0 {
            block_size / SECTOR_SIZE
        } else {
            0
        };
        self.is_symlink() && self.sectors.saturating_sub(ea_sectors) == 0
    }
}

#[cfg(test)]
impl Inode {
    /// an in-memory inode for tests that only need type, size and pointers
    pub(crate) fn synthetic(mode: u16, size: u64, block: [u32; BLOCK_POINTERS]) -> Self {
        Inode {
            mode,
            size_low: size as u32,
            size_high: (size >> 32) as u32,
            links_count: 1,
            block,
            ..Inode::default()
        }
    }
}
