//! Exclusive access to the shared LED/display/buzzer surface.
//!
//! Whoever renders takes a [`SurfaceLease`]; while it lives, every other
//! task's `try_lease` fails and that task skips its tick. Dropping the
//! lease releases the surface on every exit path.
//!
//! Leasing never blocks: a contended caller gets `None` and retries on its
//! next poll.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use crate::hal::Panel;

/// Panel behind an exclusive lease.
pub struct Surface<P> {
    leased: AtomicBool,
    panel: UnsafeCell<P>,
}

// SAFETY: the panel is only reachable through a SurfaceLease, and at most
// one lease exists at a time (guarded by the compare_exchange on `leased`).
unsafe impl<P: Send> Sync for Surface<P> {}

impl<P: Panel> Surface<P> {
    pub const fn new(panel: P) -> Self {
        Self {
            leased: AtomicBool::new(false),
            panel: UnsafeCell::new(panel),
        }
    }

    /// Take exclusive rights, or `None` if someone else holds them.
    #[inline]
    pub fn try_lease(&self) -> Option<SurfaceLease<'_, P>> {
        self.leased
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SurfaceLease { surface: self })
    }

    /// True while a lease is outstanding.
    #[inline]
    pub fn is_leased(&self) -> bool {
        self.leased.load(Ordering::Acquire)
    }

    /// Recover the panel.
    pub fn into_inner(self) -> P {
        self.panel.into_inner()
    }
}

/// Scoped exclusive access to the panel.
pub struct SurfaceLease<'a, P> {
    surface: &'a Surface<P>,
}

impl<P> Deref for SurfaceLease<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        // SAFETY: this lease is the only live access path.
        unsafe { &*self.surface.panel.get() }
    }
}

impl<P> DerefMut for SurfaceLease<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        // SAFETY: this lease is the only live access path.
        unsafe { &mut *self.surface.panel.get() }
    }
}

impl<P> Drop for SurfaceLease<'_, P> {
    fn drop(&mut self) {
        self.surface.leased.store(false, Ordering::Release);
    }
}
