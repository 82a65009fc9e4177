//! Storage shared by the lazy cells: a slot that holds either the factory or
//! the value it produced, plus the bookkeeping stage of the single-threaded
//! cells.

use core::cell::Cell;
use core::mem::{self, ManuallyDrop};

/// Either the pending factory or the produced value. Which field is live is
/// tracked by the owning cell.
pub(crate) union Slot<T, F> {
   pending: ManuallyDrop<F>,
   ready: ManuallyDrop<T>,
}

impl<T, F> Slot<T, F> {
   #[inline(always)]
   pub(crate) const fn pending(factory: F) -> Self {
      Self {
         pending: ManuallyDrop::new(factory),
      }
   }

   #[inline(always)]
   pub(crate) const fn ready(value: T) -> Self {
      Self {
         ready: ManuallyDrop::new(value),
      }
   }

   /// # Safety
   ///
   /// `pending` must be live. It is dead afterwards.
   #[inline(always)]
   pub(crate) unsafe fn take_pending(&mut self) -> F {
      unsafe { ManuallyDrop::take(&mut self.pending) }
   }

   /// # Safety
   ///
   /// `ready` must be live. It is dead afterwards.
   #[inline(always)]
   pub(crate) unsafe fn take_ready(&mut self) -> T {
      unsafe { ManuallyDrop::take(&mut self.ready) }
   }

   /// # Safety
   ///
   /// `ready` must be live.
   #[inline(always)]
   pub(crate) unsafe fn ready_ref(&self) -> &T {
      unsafe { &self.ready }
   }

   /// # Safety
   ///
   /// `ready` must be live.
   #[inline(always)]
   pub(crate) unsafe fn ready_mut(&mut self) -> &mut T {
      unsafe { &mut self.ready }
   }

   /// # Safety
   ///
   /// `pending` must be live. It is dead afterwards.
   #[inline(always)]
   pub(crate) unsafe fn drop_pending(&mut self) {
      unsafe { ManuallyDrop::drop(&mut self.pending) }
   }

   /// # Safety
   ///
   /// `ready` must be live. It is dead afterwards.
   #[inline(always)]
   pub(crate) unsafe fn drop_ready(&mut self) {
      unsafe { ManuallyDrop::drop(&mut self.ready) }
   }
}

/// Lifecycle of a single-threaded cell.
///
/// Only the cold operations (`get`, `Drop`, `Debug`, `into_inner`) look at
/// this; the accessor itself dispatches through a function pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
   /// Slot holds the factory.
   Pending,
   /// Factory moved out and running. Slot holds nothing.
   Running,
   /// Factory unwound. Slot holds nothing.
   Poisoned,
   /// Slot holds the value.
   Ready,
}

/// Marks the stage poisoned if dropped while a factory is running.
pub(crate) struct PoisonOnUnwind<'a>(&'a Cell<Stage>);

impl<'a> PoisonOnUnwind<'a> {
   #[inline(always)]
   pub(crate) fn arm(stage: &'a Cell<Stage>) -> Self {
      stage.set(Stage::Running);
      Self(stage)
   }

   /// The factory returned; leaves the stage to the caller.
   #[inline(always)]
   pub(crate) fn disarm(self) {
      mem::forget(self);
   }
}

impl Drop for PoisonOnUnwind<'_> {
   #[cold]
   fn drop(&mut self) {
      self.0.set(Stage::Poisoned);
   }
}

/// Panic raised when a single-threaded cell is entered while unusable.
#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn unusable(kind: &str, stage: Stage) -> ! {
   match stage {
      Stage::Running => panic!("{kind} instance accessed during its own initialization"),
      _ => panic!("{kind} instance has previously been poisoned"),
   }
}
