use std::io::{Read, Seek};

use crate::fs::{Inode, Result, Volume};

/// calculate the [blake3] hash of a file's contents, one block at a time
pub fn file_digest<R: Read + Seek>(volume: &mut Volume<R>, inode: &Inode) -> Result<[u8; 32]> {
    let mut hasher = blake3::Hasher::new();
    let mut block = vec![0u8; volume.block_size() as usize];
    let mut offset = 0;
    loop {
        let read = volume.read_file_block(inode, offset, &mut block)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
        offset += read as u64;
    }
    let mut hash = hasher.finalize_xof();
    let mut output = [0u8; 32];
    hash.fill(&mut output);
    Ok(output)
}
