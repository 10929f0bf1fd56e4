//! build small ext2 images in memory for tests
//!
//! Everything here panics on misuse; it only ever runs under `cargo test`.
use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

use crate::fs::{Volume, EXT2_SUPER_MAGIC, ROOT_INODE, SUPERBLOCK_OFFSET};
use crate::utils::fs_size_calculator::{group_descriptor_table_offset, pointers_per_block};

pub(crate) const FIRST_USER_INODE: u32 = 11;
const DEFAULT_INODES_PER_GROUP: u32 = 64;
const DEFAULT_INODE_SIZE: u16 = 128;
/// fast symlink targets must fit in the 60-byte block array
const FAST_SYMLINK_MAX: usize = 59;

pub(crate) const S_IFREG: u16 = 0o100000;
pub(crate) const S_IFDIR: u16 = 0o040000;
pub(crate) const S_IFLNK: u16 = 0o120000;

const FT_REG_FILE: u8 = 1;
const FT_DIR: u8 = 2;
const FT_SYMLINK: u8 = 7;

/// what ends up in one inode table slot
#[derive(Debug, Clone, Default)]
pub(crate) struct InodeSpec {
    pub mode: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub links: u16,
    pub sectors: u32,
    pub block: [u32; 15],
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub file_acl: u32,
}

#[derive(Debug, Clone)]
struct EntrySpec {
    inode: u32,
    name: Vec<u8>,
    file_type: u8,
}

pub(crate) struct ImageBuilder {
    block_size: u32,
    blocks_count: u32,
    blocks_per_group: u32,
    inodes_per_group: u32,
    groups: u32,
    inode_size: u16,
    filetype: bool,
    image: Vec<u8>,
    inode_tables: Vec<u32>,
    next_block: u32,
    next_inode: u32,
    inodes: BTreeMap<u32, InodeSpec>,
    directories: BTreeMap<u32, Vec<EntrySpec>>,
}

impl ImageBuilder {
    /// a single-group image with a root directory holding "." and ".."
    pub fn new(block_size: u32, blocks_count: u32) -> Self {
        Self::with_groups(block_size, blocks_count, 1, DEFAULT_INODES_PER_GROUP)
    }

    pub fn with_groups(
        block_size: u32,
        blocks_count: u32,
        groups: u32,
        inodes_per_group: u32,
    ) -> Self {
        Self::with_layout(
            block_size,
            blocks_count,
            groups,
            inodes_per_group,
            DEFAULT_INODE_SIZE,
        )
    }

    pub fn with_layout(
        block_size: u32,
        blocks_count: u32,
        groups: u32,
        inodes_per_group: u32,
        inode_size: u16,
    ) -> Self {
        assert!(block_size.is_power_of_two() && block_size >= 1024);
        let blocks_per_group = blocks_count.div_ceil(groups);
        let first_data_block = if block_size == 1024 { 1 } else { 0 };
        let table_blocks = (groups * 32).div_ceil(block_size);
        let mut builder = ImageBuilder {
            block_size,
            blocks_count,
            blocks_per_group,
            inodes_per_group,
            groups,
            inode_size,
            filetype: true,
            image: vec![0u8; blocks_count as usize * block_size as usize],
            inode_tables: Vec::new(),
            next_block: first_data_block + 1 + table_blocks,
            next_inode: FIRST_USER_INODE,
            inodes: BTreeMap::new(),
            directories: BTreeMap::new(),
        };
        let blocks_per_table = (inodes_per_group * inode_size as u32).div_ceil(block_size);
        for _ in 0..groups {
            let table = builder.next_block;
            builder.next_block += blocks_per_table;
            builder.inode_tables.push(table);
        }
        builder.inodes.insert(
            ROOT_INODE,
            InodeSpec {
                mode: S_IFDIR | 0o755,
                links: 2,
                ..InodeSpec::default()
            },
        );
        builder.directories.insert(
            ROOT_INODE,
            vec![
                EntrySpec::new(ROOT_INODE, b".", FT_DIR),
                EntrySpec::new(ROOT_INODE, b"..", FT_DIR),
            ],
        );
        builder
    }

    /// directory entries without the file type byte, like revision 0 volumes
    pub fn without_filetype(mut self) -> Self {
        self.filetype = false;
        self
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn inode_mut(&mut self, inode: u32) -> &mut InodeSpec {
        self.inodes.get_mut(&inode).expect("no such inode")
    }

    pub fn alloc_block(&mut self) -> u32 {
        let block = self.next_block;
        assert!(block < self.blocks_count, "test image is out of blocks");
        self.next_block += 1;
        block
    }

    /// allocate a block and fill it with `data`
    pub fn alloc_data_block(&mut self, data: &[u8]) -> u32 {
        let block = self.alloc_block();
        self.write_at(block, 0, data);
        block
    }

    pub fn write_at(&mut self, block: u32, offset: usize, data: &[u8]) {
        let start = block as usize * self.block_size as usize + offset;
        self.image[start..start + data.len()].copy_from_slice(data);
    }

    pub fn write_pointer(&mut self, block: u32, slot: u64, pointer: u32) {
        self.write_at(block, slot as usize * 4, &pointer.to_le_bytes());
    }

    fn read_pointer(&self, block: u32, slot: u64) -> u32 {
        let start = block as usize * self.block_size as usize + slot as usize * 4;
        u32::from_le_bytes(self.image[start..start + 4].try_into().unwrap())
    }

    pub fn new_inode(&mut self, spec: InodeSpec) -> u32 {
        let inode = self.next_inode;
        assert!(
            inode <= self.inodes_per_group * self.groups,
            "test image is out of inodes"
        );
        self.next_inode += 1;
        self.inodes.insert(inode, spec);
        inode
    }

    /// use a specific inode number, e.g. one living in the second group
    pub fn put_inode(&mut self, inode: u32, spec: InodeSpec) {
        assert!(inode >= FIRST_USER_INODE && inode <= self.inodes_per_group * self.groups);
        self.inodes.insert(inode, spec);
    }

    pub fn add_entry(&mut self, dir: u32, inode: u32, name: &str) {
        let file_type = match self.inodes.get(&inode).map(|spec| spec.mode & 0xF000) {
            Some(S_IFDIR) => FT_DIR,
            Some(S_IFLNK) => FT_SYMLINK,
            _ => FT_REG_FILE,
        };
        self.directories
            .get_mut(&dir)
            .expect("not a directory")
            .push(EntrySpec::new(inode, name.as_bytes(), file_type));
    }

    /// a slot whose inode number is 0, as left behind by unlink
    pub fn add_deleted_entry(&mut self, dir: u32, name: &str) {
        self.directories
            .get_mut(&dir)
            .expect("not a directory")
            .push(EntrySpec::new(0, name.as_bytes(), 0));
    }

    pub fn add_dir(&mut self, parent: u32, name: &str) -> u32 {
        let inode = self.new_inode(InodeSpec {
            mode: S_IFDIR | 0o755,
            links: 2,
            ..InodeSpec::default()
        });
        self.directories.insert(
            inode,
            vec![
                EntrySpec::new(inode, b".", FT_DIR),
                EntrySpec::new(parent, b"..", FT_DIR),
            ],
        );
        self.inode_mut(parent).links += 1;
        self.add_entry(parent, inode, name);
        inode
    }

    pub fn add_file(&mut self, parent: u32, name: &str, data: &[u8]) -> u32 {
        let block_size = self.block_size as usize;
        let chunks: Vec<(u64, Vec<u8>)> = data
            .chunks(block_size)
            .enumerate()
            .map(|(i, chunk)| (i as u64, chunk.to_vec()))
            .collect();
        self.add_sparse_file(parent, name, data.len() as u64, &chunks)
    }

    /// a regular file of `size` bytes where only the listed logical blocks are allocated
    pub fn add_sparse_file(
        &mut self,
        parent: u32,
        name: &str,
        size: u64,
        chunks: &[(u64, Vec<u8>)],
    ) -> u32 {
        let mut spec = InodeSpec {
            mode: S_IFREG | 0o644,
            links: 1,
            size,
            ..InodeSpec::default()
        };
        for (logical, data) in chunks {
            let physical = self.alloc_data_block(data);
            self.map_block(&mut spec, *logical, physical);
        }
        let inode = self.new_inode(spec);
        self.add_entry(parent, inode, name);
        inode
    }

    pub fn add_symlink(&mut self, parent: u32, name: &str, target: &str) -> u32 {
        let mut spec = InodeSpec {
            mode: S_IFLNK | 0o777,
            links: 1,
            size: target.len() as u64,
            ..InodeSpec::default()
        };
        if target.len() <= FAST_SYMLINK_MAX {
            let mut inline = [0u8; 60];
            inline[..target.len()].copy_from_slice(target.as_bytes());
            for (slot, chunk) in spec.block.iter_mut().zip(inline.chunks_exact(4)) {
                *slot = u32::from_le_bytes(chunk.try_into().unwrap());
            }
        } else {
            let block_size = self.block_size as usize;
            for (i, chunk) in target.as_bytes().chunks(block_size).enumerate() {
                let physical = self.alloc_data_block(chunk);
                self.map_block(&mut spec, i as u64, physical);
            }
        }
        let inode = self.new_inode(spec);
        self.add_entry(parent, inode, name);
        inode
    }

    /// point logical block `logical` of `spec` at `physical`,
    /// allocating indirect blocks on the way
    pub fn map_block(&mut self, spec: &mut InodeSpec, logical: u64, physical: u32) {
        let p = pointers_per_block(self.block_size);
        spec.sectors += self.block_size / 512;
        if logical < 12 {
            spec.block[logical as usize] = physical;
            return;
        }
        let mut index = logical - 12;
        if index < p {
            let single = self.ensure_root(spec, 12);
            self.write_pointer(single, index, physical);
            return;
        }
        index -= p;
        if index < p * p {
            let double = self.ensure_root(spec, 13);
            let single = self.ensure_child(spec, double, index / p);
            self.write_pointer(single, index % p, physical);
            return;
        }
        index -= p * p;
        let triple = self.ensure_root(spec, 14);
        let double = self.ensure_child(spec, triple, index / (p * p));
        let single = self.ensure_child(spec, double, (index / p) % p);
        self.write_pointer(single, index % p, physical);
    }

    fn ensure_root(&mut self, spec: &mut InodeSpec, slot: usize) -> u32 {
        if spec.block[slot] == 0 {
            spec.block[slot] = self.alloc_block();
            spec.sectors += self.block_size / 512;
        }
        spec.block[slot]
    }

    fn ensure_child(&mut self, spec: &mut InodeSpec, parent: u32, slot: u64) -> u32 {
        let child = self.read_pointer(parent, slot);
        if child != 0 {
            return child;
        }
        let child = self.alloc_block();
        spec.sectors += self.block_size / 512;
        self.write_pointer(parent, slot, child);
        child
    }

    pub fn build(mut self) -> Vec<u8> {
        let directories = std::mem::take(&mut self.directories);
        for (dir, entries) in &directories {
            self.write_directory(*dir, entries);
        }
        self.write_superblock();
        self.write_group_descriptors();
        let inodes = std::mem::take(&mut self.inodes);
        for (inode, spec) in &inodes {
            self.write_inode(*inode, spec);
        }
        self.image
    }

    pub fn build_volume(self) -> Volume<Cursor<Vec<u8>>> {
        Volume::from_reader(Cursor::new(self.build())).expect("test image must open")
    }

    fn write_directory(&mut self, dir: u32, entries: &[EntrySpec]) {
        let block_size = self.block_size as usize;
        let mut blocks = Vec::new();
        let mut current = vec![0u8; block_size];
        let mut offset = 0usize;
        let mut last_start = 0usize;
        for entry in entries {
            let rec_len = (8 + entry.name.len()).next_multiple_of(4);
            if offset + rec_len > block_size {
                // stretch the last entry over the rest of the block
                let tail = (block_size - last_start) as u16;
                current[last_start + 4..last_start + 6].copy_from_slice(&tail.to_le_bytes());
                blocks.push(std::mem::replace(&mut current, vec![0u8; block_size]));
                offset = 0;
            }
            let file_type = if self.filetype { entry.file_type } else { 0 };
            let raw = &mut current[offset..offset + rec_len];
            raw[0..4].copy_from_slice(&entry.inode.to_le_bytes());
            raw[4..6].copy_from_slice(&(rec_len as u16).to_le_bytes());
            raw[6] = entry.name.len() as u8;
            raw[7] = file_type;
            raw[8..8 + entry.name.len()].copy_from_slice(&entry.name);
            last_start = offset;
            offset += rec_len;
        }
        let tail = (block_size - last_start) as u16;
        current[last_start + 4..last_start + 6].copy_from_slice(&tail.to_le_bytes());
        blocks.push(current);

        let mut spec = self.inodes[&dir].clone();
        spec.size = (blocks.len() * block_size) as u64;
        for (logical, data) in blocks.iter().enumerate() {
            let physical = self.alloc_data_block(data);
            self.map_block(&mut spec, logical as u64, physical);
        }
        self.inodes.insert(dir, spec);
    }

    fn write_superblock(&mut self) {
        let at = SUPERBLOCK_OFFSET as usize;
        let log_block_size = (self.block_size / 1024).trailing_zeros();
        let first_data_block = u32::from(self.block_size == 1024);
        let inodes_count = self.inodes_per_group * self.groups;
        let sb = &mut self.image[at..at + 1024];
        sb[0..4].copy_from_slice(&inodes_count.to_le_bytes());
        sb[4..8].copy_from_slice(&self.blocks_count.to_le_bytes());
        sb[12..16].copy_from_slice(&(self.blocks_count - self.next_block).to_le_bytes());
        sb[16..20].copy_from_slice(&(inodes_count - self.next_inode + 1).to_le_bytes());
        sb[20..24].copy_from_slice(&first_data_block.to_le_bytes());
        sb[24..28].copy_from_slice(&log_block_size.to_le_bytes());
        sb[28..32].copy_from_slice(&log_block_size.to_le_bytes());
        sb[32..36].copy_from_slice(&self.blocks_per_group.to_le_bytes());
        sb[36..40].copy_from_slice(&self.blocks_per_group.to_le_bytes());
        sb[40..44].copy_from_slice(&self.inodes_per_group.to_le_bytes());
        sb[56..58].copy_from_slice(&EXT2_SUPER_MAGIC.to_le_bytes());
        sb[58..60].copy_from_slice(&1u16.to_le_bytes());
        sb[76..80].copy_from_slice(&1u32.to_le_bytes());
        sb[84..88].copy_from_slice(&FIRST_USER_INODE.to_le_bytes());
        sb[88..90].copy_from_slice(&self.inode_size.to_le_bytes());
        let incompat: u32 = if self.filetype { 0x0002 } else { 0 };
        sb[96..100].copy_from_slice(&incompat.to_le_bytes());
        sb[120..126].copy_from_slice(b"testfs");
    }

    fn write_group_descriptors(&mut self) {
        let table = group_descriptor_table_offset(self.block_size) as usize;
        for (group, inode_table) in self.inode_tables.clone().iter().enumerate() {
            let at = table + group * 32;
            let raw = &mut self.image[at..at + 32];
            raw[8..12].copy_from_slice(&inode_table.to_le_bytes());
            raw[14..16].copy_from_slice(&(self.inodes_per_group as u16).to_le_bytes());
        }
    }

    fn write_inode(&mut self, inode: u32, spec: &InodeSpec) {
        let group = (inode - 1) / self.inodes_per_group;
        let index = (inode - 1) % self.inodes_per_group;
        let at = self.inode_tables[group as usize] as usize * self.block_size as usize
            + index as usize * self.inode_size as usize;
        let raw = &mut self.image[at..at + 128];
        raw[0..2].copy_from_slice(&spec.mode.to_le_bytes());
        raw[2..4].copy_from_slice(&(spec.uid as u16).to_le_bytes());
        raw[4..8].copy_from_slice(&(spec.size as u32).to_le_bytes());
        raw[8..12].copy_from_slice(&spec.atime.to_le_bytes());
        raw[12..16].copy_from_slice(&spec.ctime.to_le_bytes());
        raw[16..20].copy_from_slice(&spec.mtime.to_le_bytes());
        raw[24..26].copy_from_slice(&(spec.gid as u16).to_le_bytes());
        raw[26..28].copy_from_slice(&spec.links.to_le_bytes());
        raw[28..32].copy_from_slice(&spec.sectors.to_le_bytes());
        for (i, pointer) in spec.block.iter().enumerate() {
            raw[40 + i * 4..44 + i * 4].copy_from_slice(&pointer.to_le_bytes());
        }
        raw[104..108].copy_from_slice(&spec.file_acl.to_le_bytes());
        if spec.mode & 0xF000 == S_IFREG {
            raw[108..112].copy_from_slice(&((spec.size >> 32) as u32).to_le_bytes());
        }
        raw[120..122].copy_from_slice(&((spec.uid >> 16) as u16).to_le_bytes());
        raw[122..124].copy_from_slice(&((spec.gid >> 16) as u16).to_le_bytes());
    }
}

impl EntrySpec {
    fn new(inode: u32, name: &[u8], file_type: u8) -> Self {
        EntrySpec {
            inode,
            name: name.to_vec(),
            file_type,
        }
    }
}

/// a reader that counts how often the backing store is touched
pub(crate) struct CountingReader<R> {
    inner: R,
    accesses: Rc<Cell<usize>>,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R) -> (Self, Rc<Cell<usize>>) {
        let accesses = Rc::new(Cell::new(0));
        (
            CountingReader {
                inner,
                accesses: Rc::clone(&accesses),
            },
            accesses,
        )
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.accesses.set(self.accesses.get() + 1);
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for CountingReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.accesses.set(self.accesses.get() + 1);
        self.inner.seek(pos)
    }
}
