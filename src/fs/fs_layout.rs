//! an opened ext2 volume and the block reads everything else is built on

use std::{
    fs::File,
    io::{Cursor, Read, Seek, SeekFrom},
    path::Path,
};

use log::{debug, info};
use memmap2::Mmap;

use super::{
    Ext2Error, GroupDescriptor, Result, SuperBlock, EXT2_INVALID_BLOCK_NUMBER, SUPERBLOCK_OFFSET,
};
use crate::utils::{fs_size_calculator::group_descriptor_table_offset, traits::DiskRecord};

/// a volume backed by a memory-mapped image file
pub type ImageVolume = Volume<Cursor<Mmap>>;

/// it has the following layout:
/// - boot area (first 1024 bytes)
/// - superblock
/// - group descriptor table
/// - block groups
///
/// Every read moves the cursor of `storage`, so all operations take `&mut self`.
#[derive(Debug)]
pub struct Volume<R> {
    storage: R,
    superblock: SuperBlock,
    /// index = group number
    groups: Vec<GroupDescriptor>,
    block_size: u32,
    num_groups: u32,
    volume_size: u64,
}

impl ImageVolume {
    /// open an image file read-only
    /// # Params
    /// - `image_path`: the path of the image file,\
    /// something like `Block Device`,like **/dev/sda1**
    pub fn open<P>(image_path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = File::open(image_path.as_ref())?;
        let image_len = file.metadata()?.len();
        if image_len < 2 * SUPERBLOCK_OFFSET {
            return Err(too_small(image_len));
        }
        // Safety
        // The mapping is read-only. Another process truncating the image
        // while it is mounted would fault this one, as with any mmap reader.
        let mapping = unsafe { Mmap::map(&file)? };
        Volume::from_reader(Cursor::new(mapping))
    }
}

impl<R: Read + Seek> Volume<R> {
    /// parse the superblock and the group descriptor table out of `storage`
    pub fn from_reader(mut storage: R) -> Result<Self> {
        let image_len = storage.seek(SeekFrom::End(0))?;
        if image_len < 2 * SUPERBLOCK_OFFSET {
            return Err(too_small(image_len));
        }

        storage.seek(SeekFrom::Start(SUPERBLOCK_OFFSET))?;
        let mut raw = [0u8; SuperBlock::SIZE];
        storage
            .read_exact(&mut raw)
            .map_err(|e| Ext2Error::InvalidVolume(format!("can't read superblock: {e}")))?;
        let superblock = SuperBlock::decode(&raw)?;
        superblock.validate()?;

        let block_size = superblock.block_size();
        let num_groups = superblock.group_count();
        let volume_size = superblock.volume_size();
        if image_len < volume_size {
            return Err(Ext2Error::InvalidVolume(format!(
                "image is {image_len} bytes but the superblock describes {volume_size}"
            )));
        }

        let table_offset = group_descriptor_table_offset(block_size);
        let mut table = vec![0u8; num_groups as usize * GroupDescriptor::SIZE];
        storage.seek(SeekFrom::Start(table_offset))?;
        storage.read_exact(&mut table).map_err(|e| {
            Ext2Error::InvalidVolume(format!("can't read group descriptor table: {e}"))
        })?;
        let groups = GroupDescriptor::decode_table(&table, num_groups)?;
        if let Some((group, _)) = groups
            .iter()
            .enumerate()
            .find(|(_, g)| g.inode_table_block >= superblock.blocks_count)
        {
            return Err(Ext2Error::InvalidVolume(format!(
                "inode table of group {group} lies past the end of the volume"
            )));
        }

        debug!(
            "block size: {block_size}, groups: {num_groups}, inode size: {}, inodes per group: {}",
            superblock.inode_size(),
            superblock.inodes_per_group
        );
        info!(
            "opened ext2 volume {:?}: {} blocks, {} inodes",
            superblock.volume_name(),
            superblock.blocks_count,
            superblock.inodes_count
        );
        Ok(Volume {
            storage,
            superblock,
            groups,
            block_size,
            num_groups,
            volume_size,
        })
    }

    /// read up to `out.len()` bytes starting `offset` bytes into block `block_no`
    ///
    /// `offset` may be larger than a block. Block 0 is a hole: `out` is
    /// zero-filled and the storage is not touched. Reads running past the
    /// end of the volume are cut short, and a read starting past it returns 0.
    pub fn read_block(&mut self, block_no: u32, offset: u64, out: &mut [u8]) -> Result<usize> {
        if block_no == EXT2_INVALID_BLOCK_NUMBER {
            return Err(Ext2Error::InvalidBlockAddress(block_no as u64));
        }
        if block_no == 0 {
            out.fill(0);
            return Ok(out.len());
        }
        let start = block_no as u64 * self.block_size as u64 + offset;
        if start >= self.volume_size {
            return Ok(0);
        }
        let len = (out.len() as u64).min(self.volume_size - start) as usize;
        self.storage.seek(SeekFrom::Start(start))?;
        self.storage.read_exact(&mut out[..len])?;
        Ok(len)
    }

    /// release the volume and hand back its storage
    pub fn close(self) -> R {
        info!("closing ext2 volume {:?}", self.superblock.volume_name());
        self.storage
    }
}

/// get the parsed metadata of this volume
impl<R> Volume<R> {
    #[inline]
    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    #[inline]
    pub fn groups(&self) -> &[GroupDescriptor] {
        &self.groups
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    #[inline]
    pub fn num_groups(&self) -> u32 {
        self.num_groups
    }

    #[inline]
    pub fn volume_size(&self) -> u64 {
        self.volume_size
    }
}

fn too_small(image_len: u64) -> Ext2Error {
    Ext2Error::InvalidVolume(format!(
        "image is {image_len} bytes, an ext2 volume needs at least {}",
        2 * SUPERBLOCK_OFFSET
    ))
}
