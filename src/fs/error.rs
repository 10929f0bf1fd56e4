//! Error type shared by every layer of the driver
use thiserror::Error;

/// Everything that can go wrong while reading an ext2 image.
///
/// The FUSE adapter turns each variant into exactly one errno through
/// [Ext2Error::to_errno]; the match there has no wildcard arm so a new
/// variant does not compile until it has one.
#[derive(Debug, Error)]
pub enum Ext2Error {
    /// The image is not a usable ext2 volume. Only produced while opening.
    #[error("invalid ext2 volume: {0}")]
    InvalidVolume(String),

    /// A path component or directory entry does not exist.
    #[error("no such file or directory")]
    NotFound,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error("not a symbolic link")]
    NotASymlink,

    /// The backing store failed, or returned fewer bytes than the volume promised.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A logical block index past the triply-indirect range, the invalid
    /// block sentinel, or a block pointer past the end of the volume.
    #[error("invalid block address {0}")]
    InvalidBlockAddress(u64),

    /// Inode numbers start at 1 and end at `inodes_count`.
    #[error("inode number {0} is out of range")]
    InvalidInode(u32),

    #[error("corrupt directory entry at offset {offset}: {detail}")]
    CorruptDirectory { offset: u64, detail: String },

    /// An on-disk record could not be decoded from the bytes read.
    #[error("can't decode {record}: {detail}")]
    Decode { record: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, Ext2Error>;

impl Ext2Error {
    /// errno reported to the kernel for this error
    pub fn to_errno(&self) -> libc::c_int {
        match self {
            Ext2Error::NotFound => libc::ENOENT,
            Ext2Error::NotADirectory => libc::ENOTDIR,
            Ext2Error::IsADirectory => libc::EISDIR,
            Ext2Error::NotASymlink => libc::EINVAL,
            Ext2Error::InvalidVolume(_) => libc::EINVAL,
            Ext2Error::InvalidInode(_) => libc::ENOENT,
            Ext2Error::Io(_) => libc::EIO,
            Ext2Error::InvalidBlockAddress(_) => libc::EIO,
            Ext2Error::CorruptDirectory { .. } => libc::EIO,
            Ext2Error::Decode { .. } => libc::EIO,
        }
    }
}
