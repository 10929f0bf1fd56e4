//! symbolic link targets, inline or in data blocks
use std::io::{Read, Seek};

use super::{Ext2Error, Inode, Result, Volume};

impl<R: Read + Seek> Volume<R> {
    /// copy the target of a symlink into `buf` and NUL-terminate it
    ///
    /// A target that does not fit is cut to `buf.len() - 1` bytes.
    /// Returns the number of target bytes copied, 0 if `inode` is not a
    /// symlink or `buf` is empty.
    pub fn read_symlink_target(&mut self, inode: &Inode, buf: &mut [u8]) -> Result<usize> {
        if !inode.is_symlink() || buf.is_empty() {
            return Ok(0);
        }
        let len = (inode.file_size() as usize).min(buf.len() - 1);
        let copied = if inode.is_fast_symlink(self.block_size()) {
            let inline = inode.block_bytes();
            let len = len.min(inline.len());
            buf[..len].copy_from_slice(&inline[..len]);
            len
        } else {
            self.read_file_content(inode, 0, &mut buf[..len])?
        };
        buf[copied] = 0;
        Ok(copied)
    }

    /// the whole target of a symlink
    ///
    /// ext2 keeps a target in at most one block, anything longer is
    /// [Ext2Error::InvalidBlockAddress].
    pub fn symlink_target(&mut self, inode: &Inode) -> Result<Vec<u8>> {
        if !inode.is_symlink() {
            return Err(Ext2Error::NotASymlink);
        }
        let block_size = self.block_size() as u64;
        let len = inode.file_size();
        if len > block_size {
            return Err(Ext2Error::InvalidBlockAddress((len - 1) / block_size));
        }
        let mut buf = vec![0u8; len as usize + 1];
        let len = self.read_symlink_target(inode, &mut buf)?;
        buf.truncate(len);
        Ok(buf)
    }
}
