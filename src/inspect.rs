//! the read-only subcommands: look inside an image without mounting it
use std::io::{Read, Seek, Write};
use std::os::unix::prelude::OsStrExt;
use std::path::Path;
use std::time::SystemTime;

use byte_unit::Byte;

use crate::fs::{Ext2Error, FileAttributes, FileKind, Volume};
use crate::utils::digest::file_digest;

/// how much of a file `cat` holds in memory at once, in blocks
const CAT_CHUNK_BLOCKS: usize = 16;

pub fn info<R>(volume: &Volume<R>, out: &mut impl Write) -> anyhow::Result<()> {
    let superblock = volume.superblock();
    let volume_size = Byte::from_bytes(volume.volume_size().into()).get_appropriate_unit(true);
    writeln!(out, "volume name:       {}", superblock.volume_name())?;
    writeln!(
        out,
        "revision:          {}.{}",
        superblock.rev_level, superblock.minor_rev_level
    )?;
    writeln!(out, "volume size:       {volume_size}")?;
    writeln!(out, "block size:        {}", volume.block_size())?;
    writeln!(out, "block groups:      {}", volume.num_groups())?;
    writeln!(
        out,
        "blocks:            {} ({} free)",
        superblock.blocks_count, superblock.free_blocks_count
    )?;
    writeln!(out, "blocks per group:  {}", superblock.blocks_per_group)?;
    writeln!(
        out,
        "inodes:            {} ({} free)",
        superblock.inodes_count, superblock.free_inodes_count
    )?;
    writeln!(out, "inodes per group:  {}", superblock.inodes_per_group)?;
    writeln!(out, "inode size:        {}", superblock.inode_size())?;
    writeln!(out, "filetype in dirs:  {}", superblock.has_filetype())?;
    Ok(())
}

pub fn ls<R: Read + Seek>(
    volume: &mut Volume<R>,
    path: impl AsRef<Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for name in volume.list_directory(path)? {
        out.write_all(name.as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

pub fn stat<R: Read + Seek>(
    volume: &mut Volume<R>,
    path: impl AsRef<Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let attrs = volume.attributes_of_path(path.as_ref())?;
    write_attributes(&attrs, path.as_ref(), out)
}

fn write_attributes(
    attrs: &FileAttributes,
    path: &Path,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let user = users::get_user_by_uid(attrs.uid)
        .map(|u| u.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let group = users::get_group_by_gid(attrs.gid)
        .map(|g| g.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    writeln!(out, "  File: {}", path.display())?;
    writeln!(
        out,
        "  Size: {}\tBlocks: {}\tIO Block: {}\t{}",
        attrs.size,
        attrs.blocks,
        attrs.block_size,
        kind_name(attrs.kind)
    )?;
    writeln!(out, " Inode: {}\tLinks: {}", attrs.ino, attrs.nlink)?;
    writeln!(
        out,
        "Access: ({:04o})\tUid: ({}/{user})\tGid: ({}/{group})",
        attrs.perm, attrs.uid, attrs.gid
    )?;
    writeln!(out, "Access: {}", seconds(attrs.accessed_at))?;
    writeln!(out, "Modify: {}", seconds(attrs.modified_at))?;
    writeln!(out, "Change: {}", seconds(attrs.changed_at))?;
    Ok(())
}

fn kind_name(kind: FileKind) -> &'static str {
    match kind {
        FileKind::RegularFile => "regular file",
        FileKind::Directory => "directory",
        FileKind::SymbolicLink => "symbolic link",
        FileKind::CharDevice => "character special file",
        FileKind::BlockDevice => "block special file",
        FileKind::NamedPipe => "fifo",
        FileKind::Socket => "socket",
        FileKind::Unknown => "unknown",
    }
}

/// seconds since the epoch, as ext2 stores them
fn seconds(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// copy `length` bytes of a file from `offset` to `out`, or up to the end of the file
pub fn cat<R: Read + Seek>(
    volume: &mut Volume<R>,
    path: impl AsRef<Path>,
    offset: u64,
    length: Option<u64>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let (_, inode) = volume.resolve(path)?;
    if inode.is_dir() {
        return Err(Ext2Error::IsADirectory.into());
    }
    let end = match length {
        Some(length) => offset.saturating_add(length).min(inode.file_size()),
        None => inode.file_size(),
    };
    let mut chunk = vec![0u8; volume.block_size() as usize * CAT_CHUNK_BLOCKS];
    let mut position = offset;
    while position < end {
        let wanted = (end - position).min(chunk.len() as u64) as usize;
        let read = volume.read_file_content(&inode, position, &mut chunk[..wanted])?;
        if read == 0 {
            break;
        }
        out.write_all(&chunk[..read])?;
        position += read as u64;
    }
    Ok(())
}

pub fn readlink<R: Read + Seek>(
    volume: &mut Volume<R>,
    path: impl AsRef<Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    out.write_all(&volume.read_link(path)?)?;
    out.write_all(b"\n")?;
    Ok(())
}

pub fn hash<R: Read + Seek>(
    volume: &mut Volume<R>,
    path: impl AsRef<Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let (_, inode) = volume.resolve(path.as_ref())?;
    if inode.is_dir() {
        return Err(Ext2Error::IsADirectory.into());
    }
    let digest = file_digest(volume, &inode)?;
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    writeln!(out, "{hex}  {}", path.as_ref().display())?;
    Ok(())
}
