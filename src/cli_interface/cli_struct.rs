use clap::Parser;

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum Ext2Cli {
    /// register an ext2 image to `FUSE` and mount it read-only
    Mount(MountArgs),
    /// show the geometry recorded in the superblock
    Info(ImageArgs),
    /// list a directory
    Ls(LsArgs),
    /// show the attributes of a file
    Stat(PathArgs),
    /// write the contents of a file to stdout
    Cat(CatArgs),
    /// print the target of a symbolic link
    Readlink(PathArgs),
    /// print the BLAKE3 digest of a file's contents
    Hash(PathArgs),
}

/// mount an image subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "mount an ext2 image")]
pub struct MountArgs {
    /// the path of the ext2 image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// the mount point of the file system
    #[clap(short, long)]
    pub mount_point: String,
    /// let users other than the one mounting access the files
    #[clap(long)]
    pub allow_other: bool,
    /// unmount automatically when the process exits
    #[clap(long)]
    pub auto_unmount: bool,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct ImageArgs {
    /// the path of the ext2 image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct LsArgs {
    /// the path of the ext2 image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// absolute path of the directory inside the image
    #[clap(default_value = "/")]
    pub path: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct PathArgs {
    /// the path of the ext2 image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// absolute path of the file inside the image
    pub path: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct CatArgs {
    /// the path of the ext2 image file
    #[clap(short = 'p', long)]
    pub image_file_path: String,
    /// absolute path of the file inside the image
    pub path: String,
    /// first byte to print
    #[clap(short, long, default_value_t = 0)]
    pub offset: u64,
    /// print at most this many bytes, default to the end of the file
    #[clap(short, long)]
    pub length: Option<u64>,
}
