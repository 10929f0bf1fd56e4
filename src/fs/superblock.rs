use serde::Deserialize;

use crate::utils::{fs_size_calculator, time_util::Timestamp, traits::DiskRecord};

use super::{Ext2Error, Result, EXT2_SUPER_MAGIC};

/// `s_inode_size` does not exist before the dynamic revision
const GOOD_OLD_INODE_SIZE: u16 = 128;
const GOOD_OLD_REV: u32 = 0;
/// 1024 << 6 = 64 KiB, the largest block size ext2 defines
const MAX_LOG_BLOCK_SIZE: u32 = 6;

/// directory entries carry a file type byte
pub const FEATURE_INCOMPAT_FILETYPE: u32 = 0x0002;
/// incompatible features a read-only ext2 reader can ignore safely
pub const SUPPORTED_INCOMPAT: u32 = FEATURE_INCOMPAT_FILETYPE;

/// The superblock of an ext2 volume, found 1024 bytes into the image.
///
/// Only the fields up to `s_volume_name` are decoded; everything after is
/// about journaling, preallocation and hashing, none of which a read-only
/// ext2 reader consults.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SuperBlock {
    pub inodes_count: u32,
    pub blocks_count: u32,
    pub reserved_blocks_count: u32,
    pub free_blocks_count: u32,
    pub free_inodes_count: u32,
    pub first_data_block: u32,
    pub log_block_size: u32,
    pub log_frag_size: u32,
    pub blocks_per_group: u32,
    pub frags_per_group: u32,
    pub inodes_per_group: u32,
    pub mounted_at: Timestamp,
    pub written_at: Timestamp,
    pub mount_count: u16,
    pub max_mount_count: u16,
    /// magic number
    pub magic: u16,
    pub state: u16,
    pub errors: u16,
    pub minor_rev_level: u16,
    pub last_checked_at: Timestamp,
    pub check_interval: u32,
    pub creator_os: u32,
    pub rev_level: u32,
    pub default_reserved_uid: u16,
    pub default_reserved_gid: u16,
    // dynamic revision fields
    pub first_inode: u32,
    inode_size: u16,
    pub block_group_nr: u16,
    pub feature_compat: u32,
    pub feature_incompat: u32,
    pub feature_ro_compat: u32,
    pub uuid: [u8; 16],
    pub volume_name: [u8; 16],
}

impl DiskRecord for SuperBlock {
    const NAME: &'static str = "superblock";
    const SIZE: usize = 136;
}

impl SuperBlock {
    /// reject anything this reader can't address correctly
    pub fn validate(&self) -> Result<()> {
        if self.magic != EXT2_SUPER_MAGIC {
            return Err(Ext2Error::InvalidVolume(format!(
                "bad magic number {:#06x}, expected {:#06x}",
                self.magic, EXT2_SUPER_MAGIC
            )));
        }
        if self.log_block_size > MAX_LOG_BLOCK_SIZE {
            return Err(Ext2Error::InvalidVolume(format!(
                "unsupported block size 1024 << {}",
                self.log_block_size
            )));
        }
        if self.blocks_per_group == 0 || self.inodes_per_group == 0 {
            return Err(Ext2Error::InvalidVolume(
                "blocks and inodes per group must not be 0".to_string(),
            ));
        }
        let inode_size = self.inode_size() as u32;
        if inode_size < GOOD_OLD_INODE_SIZE as u32 || inode_size > self.block_size() {
            return Err(Ext2Error::InvalidVolume(format!(
                "unsupported inode size {inode_size}"
            )));
        }
        let unsupported = self.feature_incompat & !SUPPORTED_INCOMPAT;
        if unsupported != 0 {
            return Err(Ext2Error::InvalidVolume(format!(
                "unsupported incompatible features {unsupported:#x}"
            )));
        }
        Ok(())
    }

    pub fn block_size(&self) -> u32 {
        fs_size_calculator::block_size(self.log_block_size)
    }

    /// size of one inode table slot, 128 for revision 0 volumes
    pub fn inode_size(&self) -> u16 {
        if self.rev_level == GOOD_OLD_REV {
            GOOD_OLD_INODE_SIZE
        } else {
            self.inode_size
        }
    }

    pub fn group_count(&self) -> u32 {
        fs_size_calculator::group_count(self.blocks_count, self.blocks_per_group)
    }

    /// bytes covered by `blocks_count` blocks
    pub fn volume_size(&self) -> u64 {
        self.blocks_count as u64 * self.block_size() as u64
    }

    /// whether directory entries carry a file type hint
    pub fn has_filetype(&self) -> bool {
        self.feature_incompat & FEATURE_INCOMPAT_FILETYPE != 0
    }

    /// the volume label, up to the first NUL
    pub fn volume_name(&self) -> String {
        let end = self
            .volume_name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.volume_name.len());
        String::from_utf8_lossy(&self.volume_name[..end]).into_owned()
    }
}
