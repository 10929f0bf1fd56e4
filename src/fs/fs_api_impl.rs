use std::{
    ffi::OsStr,
    io::{Read, Seek},
    os::unix::prelude::OsStrExt,
    time::{Duration, UNIX_EPOCH},
};

use fuser::{FileAttr, FileType, Filesystem};
use log::{info, warn};

use super::{Ext2Error, FileAttributes, FileKind, Result, Volume, MAX_NAME_LEN, ROOT_INODE};

/// attributes never change under a read-only mount, but keep the kernel asking
const TTL: Duration = Duration::new(1, 0);

/// the kernel calls the root 1, ext2 calls it 2
fn fuse_to_ext2(ino: u64) -> Result<u32> {
    match ino {
        fuser::FUSE_ROOT_ID => Ok(ROOT_INODE),
        _ => u32::try_from(ino).map_err(|_| Ext2Error::InvalidInode(u32::MAX)),
    }
}

fn ext2_to_fuse(ino: u32) -> u64 {
    match ino {
        ROOT_INODE => fuser::FUSE_ROOT_ID,
        _ => ino as u64,
    }
}

impl From<FileAttributes> for FileAttr {
    fn from(attrs: FileAttributes) -> Self {
        FileAttr {
            ino: ext2_to_fuse(attrs.ino),
            size: attrs.size,
            blocks: attrs.blocks,
            atime: attrs.accessed_at,
            mtime: attrs.modified_at,
            ctime: attrs.changed_at,
            crtime: UNIX_EPOCH,
            kind: attrs.kind.into(),
            perm: attrs.perm,
            nlink: attrs.nlink as u32,
            uid: attrs.uid,
            gid: attrs.gid,
            rdev: 0,
            blksize: attrs.block_size,
            flags: 0,
        }
    }
}

/// the FUSE operations, with errors instead of replies
impl<R: Read + Seek> Volume<R> {
    fn attr_of(&mut self, ino: u32) -> Result<FileAttr> {
        let inode = self.read_inode(ino)?;
        Ok(FileAttributes::new(ino, &inode, self.block_size()).into())
    }

    fn lookup_child(&mut self, parent: u64, name: &OsStr) -> Result<FileAttr> {
        let dir = self.read_inode(fuse_to_ext2(parent)?)?;
        let entry = self
            .find_file_in_directory(&dir, name.as_bytes())?
            .ok_or(Ext2Error::NotFound)?;
        self.attr_of(entry.inode)
    }

    /// feed entries from byte `offset` of directory `ino` to `add` until it reports a full buffer
    ///
    /// `add` gets the FUSE inode number, the offset of the following entry,
    /// the type and the name.
    fn list_from<F>(&mut self, ino: u64, offset: u64, mut add: F) -> Result<()>
    where
        F: FnMut(u64, i64, FileType, &OsStr) -> bool,
    {
        let dir = self.read_inode(fuse_to_ext2(ino)?)?;
        let mut cursor = offset;
        while let Some(entry) = self.next_directory_entry(&dir, &mut cursor)? {
            let kind = match entry.file_type {
                FileKind::Unknown => match self.read_inode(entry.inode) {
                    Ok(inode) => inode.kind(),
                    Err(e) => {
                        warn!("skipping {:?} (inode {}): {e}", entry.name(), entry.inode);
                        continue;
                    }
                },
                kind => kind,
            };
            if add(ext2_to_fuse(entry.inode), cursor as i64, kind.into(), entry.name()) {
                break;
            }
        }
        Ok(())
    }

    fn read_at(&mut self, ino: u64, offset: u64, size: u32) -> Result<Vec<u8>> {
        let inode = self.read_inode(fuse_to_ext2(ino)?)?;
        self.read_range(&inode, offset, size as u64)
    }
}

impl<R: Read + Seek> Filesystem for Volume<R> {
    fn init(
        &mut self,
        _req: &fuser::Request<'_>,
        _config: &mut fuser::KernelConfig,
    ) -> std::result::Result<(), libc::c_int> {
        info!(
            "init() called, serving {:?} read-only",
            self.superblock().volume_name()
        );
        Ok(())
    }

    fn destroy(&mut self) {
        info!("destroy() called");
    }

    fn statfs(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: fuser::ReplyStatfs) {
        info!("statfs() called with inode number: {ino}");
        let superblock = self.superblock();
        reply.statfs(
            superblock.blocks_count as u64,
            superblock.free_blocks_count as u64,
            superblock.free_blocks_count as u64,
            superblock.inodes_count as u64,
            superblock.free_inodes_count as u64,
            self.block_size(),
            MAX_NAME_LEN as u32,
            self.block_size(),
        )
    }

    fn lookup(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: fuser::ReplyEntry,
    ) {
        info!("lookup() called with parent inode number: {parent} and name: {name:?}");
        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn getattr(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: fuser::ReplyAttr) {
        info!("getattr() called with inode number: {ino}");
        match fuse_to_ext2(ino).and_then(|ino| self.attr_of(ino)) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn readlink(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: fuser::ReplyData) {
        info!("readlink() called with inode number: {ino}");
        let target = fuse_to_ext2(ino)
            .and_then(|ino| self.read_inode(ino))
            .and_then(|inode| self.symlink_target(&inode));
        match target {
            Ok(target) => reply.data(&target),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn read(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: fuser::ReplyData,
    ) {
        info!(
            "read() called with inode number: {ino}, fh: {fh}, offset: {offset}, size: {size}"
        );
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self.read_at(ino, offset, size) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: fuser::ReplyDirectory,
    ) {
        info!("readdir() called with inode number: {ino}, offset: {offset}");
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };
        let listed = self.list_from(ino, offset, |ino, next, kind, name| {
            reply.add(ino, next, kind, name)
        });
        match listed {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }
}
