//! register an ext2 image to `FUSE` and mount it
use fuser::MountOption;
use log::info;
use std::path::Path;

use crate::fs::ImageVolume;

/// options passed to the kernel for a read-only ext2 mount
pub fn mount_options(allow_other: bool, auto_unmount: bool) -> Vec<MountOption> {
    let mut opts = vec![
        MountOption::FSName("ext2".to_string()),
        MountOption::RO,
        MountOption::DefaultPermissions,
    ];
    if allow_other {
        opts.push(MountOption::AllowOther);
    }
    if auto_unmount {
        opts.push(MountOption::AutoUnmount);
    }
    opts
}

/// serve `image_path` at `mountpoint` until it is unmounted
pub fn mount<P, Q>(
    image_path: P,
    mountpoint: Q,
    allow_other: bool,
    auto_unmount: bool,
) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let volume = ImageVolume::open(image_path.as_ref())?;
    info!(
        "mounting {} at {}",
        image_path.as_ref().display(),
        mountpoint.as_ref().display()
    );
    let opts = mount_options(allow_other, auto_unmount);
    fuser::mount2(volume, mountpoint, &opts)?;
    info!("{} unmounted", image_path.as_ref().display());
    Ok(())
}
