//! a read-only ext2 filesystem
pub mod block_group;
pub mod directory;
pub mod error;
pub mod filekind;
pub mod fs_api;
pub mod fs_layout;
pub mod inode;
pub mod superblock;
mod file_content;
mod fs_api_impl;
mod inode_table;
mod path;
mod symlink;
pub use block_group::*;
pub use directory::*;
pub use error::*;
pub use filekind::*;
pub use fs_api::*;
pub use fs_layout::*;
pub use inode::*;
pub use superblock::*;

pub const EXT2_SUPER_MAGIC: u16 = 0xEF53;
pub const ROOT_INODE: u32 = 2;
/// the superblock always starts here, whatever the block size
pub const SUPERBLOCK_OFFSET: u64 = 1024;
pub const DIRECT_POINTERS: u64 = 12;
pub const EXT2_INVALID_BLOCK_NUMBER: u32 = u32::MAX;
pub const MAX_NAME_LEN: usize = 255;
