//! reading byte ranges of a file's data
use std::io::{Read, Seek};

use super::{Inode, Result, Volume};

impl<R: Read + Seek> Volume<R> {
    /// read from `byte_offset` up to the end of the block holding it
    ///
    /// Never reads past the file size; returns 0 at or past end of file.
    pub fn read_file_block(
        &mut self,
        inode: &Inode,
        byte_offset: u64,
        out: &mut [u8],
    ) -> Result<usize> {
        let block_size = self.block_size() as u64;
        let in_block = byte_offset % block_size;
        let max_size = (out.len() as u64)
            .min(inode.file_size().saturating_sub(byte_offset))
            .min(block_size - in_block) as usize;
        if max_size == 0 {
            return Ok(0);
        }
        let block_no = self.get_inode_block_no(inode, byte_offset / block_size)?;
        self.read_block(block_no, in_block, &mut out[..max_size])
    }

    /// read `out.len()` bytes from `byte_offset`, or fewer if the file ends first
    pub fn read_file_content(
        &mut self,
        inode: &Inode,
        byte_offset: u64,
        out: &mut [u8],
    ) -> Result<usize> {
        let wanted = (out.len() as u64).min(inode.file_size().saturating_sub(byte_offset)) as usize;
        let mut total = 0;
        while total < wanted {
            let read =
                self.read_file_block(inode, byte_offset + total as u64, &mut out[total..wanted])?;
            if read == 0 {
                return Ok(0);
            }
            total += read;
        }
        Ok(total)
    }
}
