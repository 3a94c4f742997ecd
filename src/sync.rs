//! Interrupt-safe locking.
//!
//! None of the kernel tables carry internal synchronization. Every mutation
//! runs under an [`IrqMutex`], which masks interrupts for as long as the
//! guard lives so a timer interrupt can never observe a half-updated table.

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

use spin::{Mutex, MutexGuard};

use crate::interrupts;

/// A spinlock that disables interrupts while held.
pub struct IrqMutex<T> {
    inner: Mutex<T>,
}

/// Guard returned by [`IrqMutex::lock`]. Releases the lock, then restores
/// the interrupt flag that was in effect before locking.
pub struct IrqMutexGuard<'a, T> {
    guard: ManuallyDrop<MutexGuard<'a, T>>,
    irqs_were_enabled: bool,
}

impl<T> IrqMutex<T> {
    pub const fn new(value: T) -> Self {
        IrqMutex { inner: Mutex::new(value) }
    }

    /// Mask interrupts and spin until the lock is acquired.
    pub fn lock(&self) -> IrqMutexGuard<'_, T> {
        let irqs_were_enabled = interrupts::are_enabled();
        interrupts::disable();
        IrqMutexGuard {
            guard: ManuallyDrop::new(self.inner.lock()),
            irqs_were_enabled,
        }
    }

    /// Try to take the lock without spinning. Interrupts are left untouched
    /// when the lock is busy.
    pub fn try_lock(&self) -> Option<IrqMutexGuard<'_, T>> {
        let irqs_were_enabled = interrupts::are_enabled();
        interrupts::disable();
        match self.inner.try_lock() {
            Some(guard) => Some(IrqMutexGuard {
                guard: ManuallyDrop::new(guard),
                irqs_were_enabled,
            }),
            None => {
                if irqs_were_enabled {
                    interrupts::enable();
                }
                None
            }
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl<T> Deref for IrqMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for IrqMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for IrqMutexGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the guard is dropped exactly once, here.
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        if self.irqs_were_enabled {
            interrupts::enable();
        }
    }
}
