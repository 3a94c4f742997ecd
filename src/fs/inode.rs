use bitflags::bitflags;

use crate::config::{DIRECT_BLOCKS, MAX_NAME_LEN};

bitflags! {
    /// Unix permission bits of an inode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u16 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;
    }
}

impl Permissions {
    /// Build from an octal mode, ignoring bits above 0o777.
    pub const fn from_mode(mode: u16) -> Self {
        Self::from_bits_truncate(mode)
    }

    pub const fn mode(self) -> u16 {
        self.bits()
    }
}

/// Block number meaning "no block".
pub const NO_BLOCK: u32 = 0;

/// File metadata record. Block contents are never touched by the kernel.
#[derive(Debug, Clone, Copy)]
pub struct Inode {
    pub number: u32,
    pub size: u32,
    pub direct_blocks: [u32; DIRECT_BLOCKS],
    pub indirect_block: u32,
    pub permissions: Permissions,
    pub created: u64,
    name: [u8; MAX_NAME_LEN],
    name_len: u8,
    occupied: bool,
}

impl Inode {
    pub const EMPTY: Inode = Inode {
        number: 0,
        size: 0,
        direct_blocks: [NO_BLOCK; DIRECT_BLOCKS],
        indirect_block: NO_BLOCK,
        permissions: Permissions::empty(),
        created: 0,
        name: [0; MAX_NAME_LEN],
        name_len: 0,
        occupied: false,
    };

    /// A fresh, empty file. `name` must already be validated.
    pub(super) fn new(number: u32, name: &str, permissions: Permissions, created: u64) -> Self {
        let mut inode = Inode {
            number,
            permissions,
            created,
            occupied: true,
            ..Self::EMPTY
        };
        inode.name[..name.len()].copy_from_slice(name.as_bytes());
        inode.name_len = name.len() as u8;
        inode
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn name(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name_len as usize]).unwrap_or("")
    }
}
