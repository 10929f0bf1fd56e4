//! This module contains functions to calculate the geometry of an ext2 volume

use crate::fs::{DIRECT_POINTERS, SUPERBLOCK_OFFSET};

/// calculate the block size from the superblock's `log_block_size`
/// # Arguments
/// - `log_block_size`: the shift applied to 1024
/// # Return
/// the block size in bytes
/// # Example
/// ```
/// use ext2fs::utils::fs_size_calculator::block_size;
/// assert_eq!(block_size(0), 1024);
/// assert_eq!(block_size(2), 4096);
/// ```
pub const fn block_size(log_block_size: u32) -> u32 {
    (SUPERBLOCK_OFFSET as u32) << log_block_size
}

/// calculate how many block groups a volume has
/// # Arguments
/// - `blocks_count`: total blocks in the volume
/// - `blocks_per_group`: blocks described by one group descriptor
/// # Return
/// the number of block groups, the last one may be partial
/// # Example
/// ```
/// use ext2fs::utils::fs_size_calculator::group_count;
/// assert_eq!(group_count(8192, 8192), 1);
/// assert_eq!(group_count(8193, 8192), 2);
/// assert_eq!(group_count(20000, 8192), 3);
/// ```
pub const fn group_count(blocks_count: u32, blocks_per_group: u32) -> u32 {
    blocks_count.div_ceil(blocks_per_group)
}

/// calculate where the group descriptor table starts
///
/// The table lives in the block right after the superblock's block.
/// With 1024-byte blocks the superblock fills block 1, otherwise it sits
/// inside block 0.
/// # Example
/// ```
/// use ext2fs::utils::fs_size_calculator::group_descriptor_table_offset;
/// assert_eq!(group_descriptor_table_offset(1024), 2048);
/// assert_eq!(group_descriptor_table_offset(4096), 4096);
/// ```
pub const fn group_descriptor_table_offset(block_size: u32) -> u64 {
    if block_size as u64 == SUPERBLOCK_OFFSET {
        2 * block_size as u64
    } else {
        block_size as u64
    }
}

/// number of 32-bit block pointers stored in one indirect block
/// # Example
/// ```
/// use ext2fs::utils::fs_size_calculator::pointers_per_block;
/// assert_eq!(pointers_per_block(1024), 256);
/// ```
pub const fn pointers_per_block(block_size: u32) -> u64 {
    block_size as u64 / std::mem::size_of::<u32>() as u64
}

/// number of logical blocks reachable from the 15 block pointers of an inode:
/// 12 direct, then `P`, `P²` and `P³` through the indirect levels
/// # Example
/// ```
/// use ext2fs::utils::fs_size_calculator::addressable_blocks;
/// assert_eq!(addressable_blocks(1024), 12 + 256 + 256 * 256 + 256 * 256 * 256);
/// ```
pub const fn addressable_blocks(block_size: u32) -> u64 {
    let p = pointers_per_block(block_size);
    DIRECT_POINTERS + p + p * p + p * p * p
}

/// locate an inode inside the inode tables
/// # Arguments
/// - `inode_no`: inode number, start at 1
/// - `inodes_per_group`: inodes in each group's inode table
/// # Return
/// (group index, index inside that group's inode table)
/// # Example
/// ```
/// use ext2fs::utils::fs_size_calculator::inode_location;
/// assert_eq!(inode_location(1, 2048), (0, 0));
/// assert_eq!(inode_location(2048, 2048), (0, 2047));
/// assert_eq!(inode_location(2049, 2048), (1, 0));
/// ```
pub const fn inode_location(inode_no: u32, inodes_per_group: u32) -> (u32, u32) {
    (
        (inode_no - 1) / inodes_per_group,
        (inode_no - 1) % inodes_per_group,
    )
}
