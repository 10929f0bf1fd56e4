//! path-based entry points, for callers that don't track inode numbers
use std::ffi::OsString;
use std::io::{Read, Seek};
use std::os::unix::prelude::OsStrExt;
use std::path::Path;
use std::time::SystemTime;

use super::{Ext2Error, FileKind, Inode, Result, Volume};
use crate::utils::fs_size_calculator::addressable_blocks;

/// how much of a file [Volume::read_file] reads per step, in blocks
const READ_CHUNK_BLOCKS: u64 = 16;

/// what `stat` reports about a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    pub ino: u32,
    pub kind: FileKind,
    /// permission bits, without the file type
    pub perm: u16,
    pub nlink: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub block_size: u32,
    /// in 512-byte units
    pub blocks: u64,
    pub accessed_at: SystemTime,
    pub modified_at: SystemTime,
    pub changed_at: SystemTime,
}

impl FileAttributes {
    pub fn new(ino: u32, inode: &Inode, block_size: u32) -> Self {
        FileAttributes {
            ino,
            kind: inode.kind(),
            perm: inode.permissions(),
            nlink: inode.links_count,
            uid: inode.uid(),
            gid: inode.gid(),
            size: inode.file_size(),
            block_size,
            blocks: inode.sectors as u64,
            accessed_at: inode.accessed_at.into(),
            modified_at: inode.modified_at.into(),
            changed_at: inode.changed_at.into(),
        }
    }
}

impl<R: Read + Seek> Volume<R> {
    /// like [Volume::find_file_from_path], but a missing file is [Ext2Error::NotFound]
    pub fn resolve<P: AsRef<Path>>(&mut self, path: P) -> Result<(u32, Inode)> {
        self.find_file_from_path(path.as_ref().as_os_str().as_bytes())?
            .ok_or(Ext2Error::NotFound)
    }

    pub fn attributes_of_path<P: AsRef<Path>>(&mut self, path: P) -> Result<FileAttributes> {
        let (ino, inode) = self.resolve(path)?;
        Ok(FileAttributes::new(ino, &inode, self.block_size()))
    }

    /// names of every entry of a directory, in on-disk order
    pub fn list_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<OsString>> {
        let (_, inode) = self.resolve(path)?;
        if !inode.is_dir() {
            return Err(Ext2Error::NotADirectory);
        }
        self.directory_entries(inode)
            .map(|entry| entry.map(|e| e.into_name()))
            .collect()
    }

    /// up to `length` bytes of a file starting at `offset`
    ///
    /// Fewer bytes come back only when the file ends first.
    pub fn read_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>> {
        let (_, inode) = self.resolve(path)?;
        self.read_range(&inode, offset, length)
    }

    /// the bytes of `inode` in `offset..offset + length`, cut at the end of the file
    ///
    /// The buffer grows as blocks are read, so a corrupt size can't make
    /// it allocate more than the file's pointers reach.
    pub(super) fn read_range(
        &mut self,
        inode: &Inode,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>> {
        if inode.is_dir() {
            return Err(Ext2Error::IsADirectory);
        }
        let block_size = self.block_size() as u64;
        let size = inode.file_size();
        if size > addressable_blocks(self.block_size()) * block_size {
            return Err(Ext2Error::InvalidBlockAddress((size - 1) / block_size));
        }
        let end = offset.saturating_add(length).min(size);
        let chunk = block_size * READ_CHUNK_BLOCKS;
        let mut buf = Vec::new();
        let mut position = offset;
        while position < end {
            let filled = buf.len();
            buf.resize(filled + (end - position).min(chunk) as usize, 0);
            let read = self.read_file_content(inode, position, &mut buf[filled..])?;
            buf.truncate(filled + read);
            if read == 0 {
                break;
            }
            position += read as u64;
        }
        Ok(buf)
    }

    pub fn read_link<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<u8>> {
        let (_, inode) = self.resolve(path)?;
        self.symlink_target(&inode)
    }
}
