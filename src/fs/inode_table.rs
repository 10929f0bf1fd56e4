//! inode lookup and logical-to-physical block mapping
use std::io::{ErrorKind, Read, Seek};

use super::{Ext2Error, Inode, Result, Volume, DIRECT_POINTERS};
use crate::utils::{
    fs_size_calculator::{addressable_blocks, inode_location, pointers_per_block},
    traits::DiskRecord,
};

impl<R: Read + Seek> Volume<R> {
    /// read inode `inode_no` (1-based) out of its group's inode table
    pub fn read_inode(&mut self, inode_no: u32) -> Result<Inode> {
        let superblock = self.superblock();
        if inode_no == 0 || inode_no > superblock.inodes_count {
            return Err(Ext2Error::InvalidInode(inode_no));
        }
        let inode_size = superblock.inode_size() as u64;
        let (group, index) = inode_location(inode_no, superblock.inodes_per_group);
        let inode_table = self
            .groups()
            .get(group as usize)
            .ok_or(Ext2Error::InvalidInode(inode_no))?
            .inode_table_block;

        let mut raw = vec![0u8; inode_size as usize];
        let read = self.read_block(inode_table, index as u64 * inode_size, &mut raw)?;
        Inode::decode(&raw[..read])
    }

    /// map the `logical_index`-th block of a file to a block number on the volume
    ///
    /// 0 means the block is a hole. Indices past what the triply-indirect
    /// block can address, and pointers past the end of the volume, are
    /// [Ext2Error::InvalidBlockAddress].
    pub fn get_inode_block_no(&mut self, inode: &Inode, logical_index: u64) -> Result<u32> {
        if logical_index >= addressable_blocks(self.block_size()) {
            return Err(Ext2Error::InvalidBlockAddress(logical_index));
        }
        let p = pointers_per_block(self.block_size());
        if logical_index < DIRECT_POINTERS {
            return self.follow_pointers(inode.block[logical_index as usize], &[]);
        }
        let mut index = logical_index - DIRECT_POINTERS;
        if index < p {
            return self.follow_pointers(inode.indirect_block(), &[index]);
        }
        index -= p;
        if index < p * p {
            return self.follow_pointers(inode.double_indirect_block(), &[index / p, index % p]);
        }
        index -= p * p;
        self.follow_pointers(
            inode.triple_indirect_block(),
            &[index / (p * p), (index / p) % p, index % p],
        )
    }

    /// walk down from `root`, taking pointer `slots[i]` at level `i`
    fn follow_pointers(&mut self, root: u32, slots: &[u64]) -> Result<u32> {
        let mut block_no = root;
        for slot in slots {
            if block_no == 0 {
                return Ok(0);
            }
            self.check_block_no(block_no)?;
            let mut raw = [0u8; 4];
            if self.read_block(block_no, slot * 4, &mut raw)? != raw.len() {
                return Err(std::io::Error::from(ErrorKind::UnexpectedEof).into());
            }
            block_no = u32::from_le_bytes(raw);
        }
        if block_no != 0 {
            self.check_block_no(block_no)?;
        }
        Ok(block_no)
    }

    fn check_block_no(&self, block_no: u32) -> Result<()> {
        if block_no >= self.superblock().blocks_count {
            return Err(Ext2Error::InvalidBlockAddress(block_no as u64));
        }
        Ok(())
    }
}
