//! helpers shared by the filesystem and the command line
pub mod digest;
pub mod fs_size_calculator;
pub mod time_util;
pub mod traits;
#[cfg(test)]
pub(crate) mod test_image;
