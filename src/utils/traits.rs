use bincode::config;
use serde::de::DeserializeOwned;

use crate::fs::{Ext2Error, Result};

/// Trait for fixed-layout records stored little-endian on disk
/// # Note
/// The field order of an implementing struct must follow the on-disk layout.
/// Only the first [DiskRecord::SIZE] bytes are decoded, so a record may
/// describe a prefix of a larger on-disk structure (the superblock is
/// 1024 bytes on disk, the inode may be 256).
pub trait DiskRecord: DeserializeOwned {
    /// name of the record, used in error messages
    const NAME: &'static str;
    /// number of bytes consumed by [DiskRecord::decode]
    const SIZE: usize;

    /// decode a record from the start of a slice
    /// # Returns
    /// The decoded record, or [Ext2Error::Decode] if `buf` is too short
    fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Ext2Error::Decode {
                record: Self::NAME,
                detail: format!("need {} bytes, got {}", Self::SIZE, buf.len()),
            });
        }
        let config = config::legacy();
        let (record, _bytes_read): (Self, usize) =
            bincode::serde::decode_from_slice(&buf[..Self::SIZE], config).map_err(|e| {
                Ext2Error::Decode {
                    record: Self::NAME,
                    detail: e.to_string(),
                }
            })?;
        Ok(record)
    }
}
