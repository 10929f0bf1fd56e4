//! command line of the `ext2fs` binary
mod cli_struct;
pub use cli_struct::*;
