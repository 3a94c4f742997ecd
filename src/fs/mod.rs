pub mod inode;

pub use inode::{Inode, Permissions};

use crate::config::{MAX_FILES, MAX_NAME_LEN};
use crate::error::{KernelError, KernelResult, Resource};

/// Fixed table of file metadata records.
pub struct InodeTable<const M: usize = MAX_FILES> {
    inodes: [Inode; M],
}

impl<const M: usize> InodeTable<M> {
    pub const fn new() -> Self {
        InodeTable {
            inodes: [Inode::EMPTY; M],
        }
    }

    /// Claim the first unoccupied record for a new empty file and return
    /// its slot index.
    pub fn create(&mut self, name: &str, permissions: Permissions, now: u64) -> KernelResult<usize> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(KernelError::InvalidArgument);
        }
        let slot = self
            .inodes
            .iter()
            .position(|inode| !inode.is_occupied())
            .ok_or(KernelError::ResourceExhausted(Resource::Inodes))?;

        self.inodes[slot] = Inode::new(slot as u32, name, permissions, now);
        Ok(slot)
    }

    /// Occupied record at `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<&Inode> {
        self.inodes.get(slot).filter(|inode| inode.is_occupied())
    }

    pub fn occupied(&self) -> usize {
        self.inodes.iter().filter(|inode| inode.is_occupied()).count()
    }

    pub const fn capacity(&self) -> usize {
        M
    }

    pub fn clear(&mut self) {
        self.inodes = [Inode::EMPTY; M];
    }
}

impl<const M: usize> Default for InodeTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RW_R_R: Permissions = Permissions::from_mode(0o644);

    #[test]
    fn fills_up_then_reports_exhaustion() {
        let mut table = InodeTable::<3>::new();
        let slots: Vec<usize> = (0..3)
            .map(|i| table.create("f", RW_R_R, i).unwrap())
            .collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert_eq!(
            table.create("g", RW_R_R, 9),
            Err(KernelError::ResourceExhausted(Resource::Inodes))
        );
        assert_eq!(table.occupied(), 3);
    }

    #[test]
    fn empty_files_are_still_occupied() {
        let mut table = InodeTable::<2>::new();
        let first = table.create("empty", RW_R_R, 7).unwrap();
        let second = table.create("other", RW_R_R, 8).unwrap();
        assert_ne!(first, second);

        let inode = table.get(first).unwrap();
        assert_eq!(inode.size, 0);
        assert_eq!(inode.number, first as u32);
        assert_eq!(inode.name(), "empty");
        assert_eq!(inode.created, 7);
        assert_eq!(inode.permissions.mode(), 0o644);
        assert!(inode.direct_blocks.iter().all(|b| *b == inode::NO_BLOCK));
    }

    #[test]
    fn rejects_bad_names() {
        let mut table = InodeTable::<2>::new();
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(table.create("", RW_R_R, 0), Err(KernelError::InvalidArgument));
        assert_eq!(table.create(&long, RW_R_R, 0), Err(KernelError::InvalidArgument));
        let exact = "y".repeat(MAX_NAME_LEN);
        let slot = table.create(&exact, RW_R_R, 0).unwrap();
        assert_eq!(table.get(slot).unwrap().name(), exact);
    }

    #[test]
    fn unoccupied_slots_are_invisible() {
        let table = InodeTable::<2>::new();
        assert!(table.get(0).is_none());
        assert!(table.get(5).is_none());
    }

    #[test]
    fn mode_bits_above_0777_are_dropped() {
        assert_eq!(Permissions::from_mode(0o4755).mode(), 0o755);
        assert!(RW_R_R.contains(Permissions::OWNER_WRITE));
        assert!(!RW_R_R.contains(Permissions::GROUP_WRITE));
    }
}
