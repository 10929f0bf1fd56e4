//! walking the linear list of entries stored in a directory's data
use serde::Deserialize;

use std::ffi::{OsStr, OsString};
use std::io::{Read, Seek};
use std::os::unix::prelude::{OsStrExt, OsStringExt};

use super::{Ext2Error, FileKind, Inode, Result, Volume, MAX_NAME_LEN};
use crate::utils::traits::DiskRecord;

/// the fixed 8-byte head of every directory entry
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
struct DirEntryHeader {
    inode: u32,
    rec_len: u16,
    name_len: u8,
    file_type: u8,
}

impl DiskRecord for DirEntryHeader {
    const NAME: &'static str = "directory entry";
    const SIZE: usize = 8;
}

/// one live entry of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub inode: u32,
    /// distance to the next entry
    pub rec_len: u16,
    /// [FileKind::Unknown] unless the volume has the `filetype` feature
    pub file_type: FileKind,
    name: Vec<u8>,
}

impl DirectoryEntry {
    pub fn name(&self) -> &OsStr {
        OsStr::from_bytes(&self.name)
    }

    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    pub fn into_name(self) -> OsString {
        OsString::from_vec(self.name)
    }
}

impl<R: Read + Seek> Volume<R> {
    /// the next live entry at or after byte `cursor` of directory `dir`
    ///
    /// `cursor` starts at 0 and is left just past the returned entry, so it
    /// can be stored and handed back later to resume. Deleted entries are
    /// stepped over. `None` means the end of the directory.
    pub fn next_directory_entry(
        &mut self,
        dir: &Inode,
        cursor: &mut u64,
    ) -> Result<Option<DirectoryEntry>> {
        if !dir.is_dir() {
            return Err(Ext2Error::NotADirectory);
        }
        let block_size = self.block_size() as u64;
        let mut raw = [0u8; DirEntryHeader::SIZE + MAX_NAME_LEN];
        loop {
            let offset = *cursor;
            let read = self.read_file_content(dir, offset, &mut raw)?;
            if read == 0 {
                return Ok(None);
            }
            let header = DirEntryHeader::decode(&raw[..read])
                .map_err(|_| corrupt(offset, format!("only {read} bytes left for the header")))?;
            let rec_len = header.rec_len as u64;
            let name_end = DirEntryHeader::SIZE + header.name_len as usize;
            if rec_len == 0 {
                return Err(corrupt(offset, "rec_len is 0".to_string()));
            }
            if rec_len < name_end as u64 {
                return Err(corrupt(
                    offset,
                    format!("rec_len {rec_len} can't hold a {} byte name", header.name_len),
                ));
            }
            if offset % block_size + rec_len > block_size {
                return Err(corrupt(
                    offset,
                    format!("rec_len {rec_len} crosses a block boundary"),
                ));
            }
            *cursor += rec_len;
            if header.inode == 0 {
                continue;
            }
            if read < name_end {
                return Err(corrupt(offset, "name runs past the end of the directory".to_string()));
            }
            let file_type = if self.superblock().has_filetype() {
                FileKind::from_dir_entry_type(header.file_type)
            } else {
                FileKind::Unknown
            };
            return Ok(Some(DirectoryEntry {
                inode: header.inode,
                rec_len: header.rec_len,
                file_type,
                name: raw[DirEntryHeader::SIZE..name_end].to_vec(),
            }));
        }
    }

    /// iterate every live entry of `dir` from the start, in on-disk order
    pub fn directory_entries(&mut self, dir: Inode) -> DirectoryEntries<'_, R> {
        DirectoryEntries {
            volume: self,
            dir,
            cursor: 0,
            done: false,
        }
    }
}

/// Iterator over a directory, see [Volume::directory_entries].
/// Stops after the first error.
pub struct DirectoryEntries<'a, R> {
    volume: &'a mut Volume<R>,
    dir: Inode,
    cursor: u64,
    done: bool,
}

impl<R: Read + Seek> Iterator for DirectoryEntries<'_, R> {
    type Item = Result<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.volume.next_directory_entry(&self.dir, &mut self.cursor) {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn corrupt(offset: u64, detail: String) -> Ext2Error {
    Ext2Error::CorruptDirectory { offset, detail }
}
