//! resolving absolute paths from the root directory
use std::io::{Read, Seek};

use log::debug;

use super::{DirectoryEntry, Ext2Error, Inode, Result, Volume, ROOT_INODE};

impl<R: Read + Seek> Volume<R> {
    /// the first entry of `dir` named exactly `name`
    pub fn find_file_in_directory(
        &mut self,
        dir: &Inode,
        name: &[u8],
    ) -> Result<Option<DirectoryEntry>> {
        if !dir.is_dir() {
            return Err(Ext2Error::NotADirectory);
        }
        let mut cursor = 0;
        while let Some(entry) = self.next_directory_entry(dir, &mut cursor)? {
            if entry.name_bytes() == name {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// walk `path` from the root directory
    ///
    /// Empty components are ignored, so `//a///b/` is `/a/b`. Relative
    /// paths, missing components and components that are not directories
    /// all give `None`.
    pub fn find_file_from_path(&mut self, path: &[u8]) -> Result<Option<(u32, Inode)>> {
        if path.first() != Some(&b'/') {
            return Ok(None);
        }
        let mut inode_no = ROOT_INODE;
        let mut inode = self.read_inode(ROOT_INODE)?;
        for component in path.split(|b| *b == b'/').filter(|c| !c.is_empty()) {
            if !inode.is_dir() {
                debug!(
                    "{:?} is not a directory",
                    String::from_utf8_lossy(component)
                );
                return Ok(None);
            }
            let Some(entry) = self.find_file_in_directory(&inode, component)? else {
                debug!(
                    "no entry {:?} in inode {inode_no}",
                    String::from_utf8_lossy(component)
                );
                return Ok(None);
            };
            inode_no = entry.inode;
            inode = self.read_inode(inode_no)?;
        }
        Ok(Some((inode_no, inode)))
    }
}
