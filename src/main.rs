use std::io::Write;

use clap::Parser;
use ext2fs::{cli_interface::Ext2Cli, inspect, ImageVolume};
/// a CLI interface to users to look inside an ext2 image,
/// or register it to `FUSE` and mount it read-only.
///
/// The latter will block the program until we umount the filesystem ourselves,
///
/// or specify `--auto-unmount` when mounting it.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = Ext2Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args {
        Ext2Cli::Mount(args) => {
            ext2fs::mount::mount(
                args.image_file_path,
                args.mount_point,
                args.allow_other,
                args.auto_unmount,
            )?;
        }
        Ext2Cli::Info(args) => {
            let volume = ImageVolume::open(args.image_file_path)?;
            inspect::info(&volume, &mut out)?;
        }
        Ext2Cli::Ls(args) => {
            let mut volume = ImageVolume::open(args.image_file_path)?;
            inspect::ls(&mut volume, args.path, &mut out)?;
        }
        Ext2Cli::Stat(args) => {
            let mut volume = ImageVolume::open(args.image_file_path)?;
            inspect::stat(&mut volume, args.path, &mut out)?;
        }
        Ext2Cli::Cat(args) => {
            let mut volume = ImageVolume::open(args.image_file_path)?;
            inspect::cat(&mut volume, args.path, args.offset, args.length, &mut out)?;
        }
        Ext2Cli::Readlink(args) => {
            let mut volume = ImageVolume::open(args.image_file_path)?;
            inspect::readlink(&mut volume, args.path, &mut out)?;
        }
        Ext2Cli::Hash(args) => {
            let mut volume = ImageVolume::open(args.image_file_path)?;
            inspect::hash(&mut volume, args.path, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}
