/// mask selecting the file type bits of `i_mode`
pub const S_IFMT: u16 = 0xF000;

/// an enum to describe the type of a file
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// an regular file
    RegularFile,
    /// a directory
    Directory,
    /// a symbolic link
    SymbolicLink,
    CharDevice,
    BlockDevice,
    NamedPipe,
    Socket,
    /// Unknown
    #[default]
    Unknown,
}

impl FileKind {
    /// classify the type bits of an inode's `i_mode`
    pub fn from_mode(mode: u16) -> Self {
        match mode & S_IFMT {
            0x8000 => FileKind::RegularFile,
            0x4000 => FileKind::Directory,
            0xA000 => FileKind::SymbolicLink,
            0x2000 => FileKind::CharDevice,
            0x6000 => FileKind::BlockDevice,
            0x1000 => FileKind::NamedPipe,
            0xC000 => FileKind::Socket,
            _ => FileKind::Unknown,
        }
    }

    /// classify the `file_type` byte of a directory entry
    pub fn from_dir_entry_type(file_type: u8) -> Self {
        match file_type {
            1 => FileKind::RegularFile,
            2 => FileKind::Directory,
            3 => FileKind::CharDevice,
            4 => FileKind::BlockDevice,
            5 => FileKind::NamedPipe,
            6 => FileKind::Socket,
            7 => FileKind::SymbolicLink,
            _ => FileKind::Unknown,
        }
    }
}

/// implement a trait to convert [FileKind] to [fuser::FileType]
impl From<FileKind> for fuser::FileType {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::RegularFile => fuser::FileType::RegularFile,
            FileKind::Directory => fuser::FileType::Directory,
            FileKind::SymbolicLink => fuser::FileType::Symlink,
            FileKind::CharDevice => fuser::FileType::CharDevice,
            FileKind::BlockDevice => fuser::FileType::BlockDevice,
            FileKind::NamedPipe => fuser::FileType::NamedPipe,
            FileKind::Socket => fuser::FileType::Socket,
            // Unknown Types are treated as regular files
            FileKind::Unknown => fuser::FileType::RegularFile,
        }
    }
}
