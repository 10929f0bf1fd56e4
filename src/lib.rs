pub mod cli_interface;
mod fs;
pub mod inspect;
pub mod mount;
pub mod utils;
pub use fs::*;
