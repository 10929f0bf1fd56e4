use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// an ext2 timestamp: whole seconds since `1970-1-1 00:00:00`,named as [UNIX_EPOCH]
///
/// ext2 keeps 32 bits of seconds and no fraction of a second.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Timestamp(pub u32);

impl From<Timestamp> for SystemTime {
    fn from(value: Timestamp) -> Self {
        UNIX_EPOCH + Duration::from_secs(value.0 as u64)
    }
}
