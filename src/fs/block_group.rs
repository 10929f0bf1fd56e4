use serde::Deserialize;

use crate::utils::traits::DiskRecord;

/// One entry of the group descriptor table.
///
/// See <https://www.nongnu.org/ext2-doc/ext2.html#block-group-descriptor-structure>
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GroupDescriptor {
    /// block number of the block bitmap, unused by a reader
    pub block_bitmap: u32,
    /// block number of the inode bitmap, unused by a reader
    pub inode_bitmap: u32,
    /// first block of this group's inode table
    pub inode_table_block: u32,
    pub free_blocks_count: u16,
    pub free_inodes_count: u16,
    pub used_dirs_count: u16,
    _pad: u16,
    _reserved: [u8; 12],
}

impl DiskRecord for GroupDescriptor {
    const NAME: &'static str = "group descriptor";
    const SIZE: usize = 32;
}

impl GroupDescriptor {
    /// decode `count` contiguous descriptors from the table's bytes
    pub fn decode_table(buf: &[u8], count: u32) -> crate::fs::Result<Vec<GroupDescriptor>> {
        buf.chunks(Self::SIZE)
            .take(count as usize)
            .map(Self::decode)
            .collect()
    }
}
