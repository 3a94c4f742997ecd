use crate::config::MAX_PROCESSES;
use crate::error::{KernelError, KernelResult, Resource};

use super::task::Pid;

/// FIFO of READY processes, stored as a fixed ring buffer of ids.
///
/// Enqueue at the tail and dequeue at the head are both O(1). The queue
/// never owns a descriptor, it only names it.
pub struct ReadyQueue<const CAP: usize = MAX_PROCESSES> {
    slots: [Option<Pid>; CAP],
    head: usize,
    len: usize,
}

impl<const CAP: usize> ReadyQueue<CAP> {
    pub const fn new() -> Self {
        ReadyQueue {
            slots: [None; CAP],
            head: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_back(&mut self, pid: Pid) -> KernelResult<()> {
        if self.len == CAP {
            return Err(KernelError::ResourceExhausted(Resource::ReadyQueue));
        }
        let tail = (self.head + self.len) % CAP;
        self.slots[tail] = Some(pid);
        self.len += 1;
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<Pid> {
        if self.len == 0 {
            return None;
        }
        let pid = self.slots[self.head].take();
        self.head = (self.head + 1) % CAP;
        self.len -= 1;
        pid
    }

    pub fn front(&self) -> Option<Pid> {
        if self.len == 0 {
            None
        } else {
            self.slots[self.head]
        }
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.iter().any(|queued| queued == pid)
    }

    /// Remove `pid` wherever it sits, keeping the order of the others.
    /// Returns whether it was queued.
    pub fn remove(&mut self, pid: Pid) -> bool {
        let Some(offset) = self.iter().position(|queued| queued == pid) else {
            return false;
        };
        for i in offset..self.len - 1 {
            let from = (self.head + i + 1) % CAP;
            let to = (self.head + i) % CAP;
            self.slots[to] = self.slots[from];
        }
        let last = (self.head + self.len - 1) % CAP;
        self.slots[last] = None;
        self.len -= 1;
        true
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % CAP])
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl<const CAP: usize> Default for ReadyQueue<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
