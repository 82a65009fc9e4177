//! Initialization state shared by the thread-safe lazy cell.
//!
//! The state is packed into a single `AtomicU8`:
//! - Bit 0: DONE - the value has been produced
//! - Bit 1: LOCKED - a thread is running the factory
//! - Bit 2: WAITING - at least one thread is parked on the state
//! - Bit 3: POISONED - the factory panicked, the cell can never be initialized
//! - Bits 4-7: EPOCH - generation counter, bumped on every settle
//!
//! Readers of an initialized cell perform a single acquire load. Everything
//! else (locking, parking, waking) lives on the cold path.

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// Atomic state of a [`SyncLazy`](crate::SyncLazy).
#[repr(transparent)]
pub(crate) struct InitState(AtomicU8);

impl InitState {
   const DONE: u8 = 1;
   const LOCKED: u8 = 2;
   const WAITING: u8 = 4;
   const POISONED: u8 = 8;
   const EPOCH_1: u8 = 16;
   const EPOCH_MASK: u8 = !(Self::DONE | Self::LOCKED | Self::WAITING | Self::POISONED);
   /// Either terminal flag. Once set, the lock can no longer be taken.
   const SETTLED: u8 = Self::DONE | Self::POISONED;

   #[inline(always)]
   const fn next_epoch(current_state: u8) -> u8 {
      (current_state & Self::EPOCH_MASK).wrapping_add(Self::EPOCH_1) & Self::EPOCH_MASK
   }

   /// Creates the state of a cell whose factory has not run yet.
   #[inline]
   pub(crate) const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   /// Wakes every thread parked on this state.
   #[inline]
   fn notify_all(&self) {
      // SAFETY: park and unpark are keyed by the same address, the address of the atomic.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the calling thread until the state differs from `expected_state`.
   #[inline]
   fn wait(&self, expected_state: u8) {
      // SAFETY: see `notify_all`.
      unsafe {
         // The validate closure runs under the bucket lock, so a wake between
         // our load and the sleep cannot be missed.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected_state,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
   }

   /// Replaces the state with `flag` plus a fresh epoch and wakes waiters.
   /// Returns the previous state.
   #[inline]
   fn settle(&self, flag: u8) -> u8 {
      let current_state = self.0.load(Ordering::Relaxed);
      let new_state = flag | Self::next_epoch(current_state);
      // Release pairs with the acquire load in `is_done`: the value write
      // happens-before any reader observes DONE.
      let prev_state = self.0.swap(new_state, Ordering::Release);
      if prev_state & Self::WAITING != 0 {
         self.notify_all();
      }
      prev_state
   }

   /// Marks the cell initialized. Returns `true` if it was not already.
   #[inline]
   pub(crate) fn set_done(&self) -> bool {
      self.settle(Self::DONE) & Self::DONE == 0
   }

   /// Marks the cell poisoned after a factory unwound.
   #[inline]
   pub(crate) fn set_poisoned(&self) {
      self.settle(Self::POISONED);
   }

   #[inline]
   pub(crate) fn is_done(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::DONE != 0
   }

   #[inline]
   pub(crate) fn is_poisoned(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::POISONED != 0
   }

   /// One attempt at taking the initialization lock.
   ///
   /// - `Ok(None)`: the cell is settled (initialized or poisoned).
   /// - `Ok(Some(guard))`: the lock was acquired.
   /// - `Err(state)`: another thread holds the lock; `state` is the value to
   ///   park on. With `nowait` the WAITING flag is not set.
   #[inline]
   fn lock_step(&self, nowait: bool) -> Result<Option<InitGuard<'_>>, u8> {
      loop {
         let current_state = self.0.load(Ordering::Relaxed);
         if current_state & Self::SETTLED != 0 {
            return Ok(None);
         }

         if current_state & Self::LOCKED == 0 {
            match self.0.compare_exchange_weak(
               current_state,
               current_state | Self::LOCKED,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Ok(Some(InitGuard::new(self))),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }

         if !nowait && (current_state & Self::WAITING == 0) {
            let new_state = current_state | Self::WAITING;
            match self.0.compare_exchange_weak(
               current_state,
               new_state,
               Ordering::Relaxed,
               Ordering::Relaxed,
            ) {
               // WAITING is now set; park on the state that includes it.
               Ok(_) => return Err(new_state),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }
         // Held elsewhere, and either `nowait` or WAITING was already set.
         return Err(current_state);
      }
   }

   /// Acquires the initialization lock, parking while another thread holds it.
   ///
   /// Returns `None` once the cell is settled.
   #[inline]
   pub(crate) fn lock(&self) -> Option<InitGuard<'_>> {
      match self.lock_step(false) {
         Ok(guard_opt) => guard_opt,
         Err(mut state_when_failed) => loop {
            self.wait(state_when_failed);
            match self.lock_step(false) {
               Ok(guard_opt) => return guard_opt,
               Err(new_state) => state_when_failed = new_state,
            }
         },
      }
   }

   /// Acquires the initialization lock from async code.
   ///
   /// Yields to the runtime while the lock is held elsewhere. On the
   /// multi-threaded runtime it eventually falls back to `block_in_place`;
   /// elsewhere it keeps yielding until the holder settles the cell.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   #[inline]
   pub(crate) async fn lock_async(&self) -> Option<InitGuard<'_>> {
      loop {
         for _ in 0..16 {
            match self.lock_step(false) {
               Ok(guard_opt) => return guard_opt,
               Err(state) => {
                  for _ in 0..32 {
                     tokio::task::yield_now().await;
                     // Holder committed or unwound, retry the lock.
                     if self.0.load(Ordering::Relaxed) != state {
                        break;
                     }
                  }
               }
            }
         }

         // `block_in_place` panics on a current-thread runtime.
         #[cfg(feature = "async-tokio-mt")]
         if on_multi_thread_runtime() {
            return match self.lock_step(false) {
               Ok(guard_opt) => guard_opt,
               Err(state) => tokio::task::block_in_place(|| {
                  self.wait(state);
                  self.lock()
               }),
            };
         }
      }
   }

   /// Takes the lock only if nobody holds it and the cell is not settled.
   #[inline]
   pub(crate) fn try_lock(&self) -> Option<InitGuard<'_>> {
      self.lock_step(true).ok().flatten()
   }
}

/// Whether the current task runs on tokio's multi-threaded runtime.
#[cfg(feature = "async-tokio-mt")]
fn on_multi_thread_runtime() -> bool {
   use tokio::runtime::{Handle, RuntimeFlavor};

   matches!(
      Handle::try_current().map(|handle| handle.runtime_flavor()),
      Ok(RuntimeFlavor::MultiThread)
   )
}

/// Proof that the calling thread holds the initialization lock.
///
/// `commit` publishes the value. Dropping the guard without committing means
/// the factory unwound, which poisons the cell.
pub(crate) struct InitGuard<'a> {
   state: &'a InitState,
}

impl<'a> InitGuard<'a> {
   #[inline(always)]
   const fn new(state: &'a InitState) -> Self {
      Self { state }
   }

   /// Marks the cell initialized and wakes waiters.
   #[inline(always)]
   pub(crate) fn commit(self) {
      let fresh = self.state.set_done();
      debug_assert!(fresh, "committed an already initialized cell");
      mem::forget(self);
   }
}

impl Drop for InitGuard<'_> {
   #[inline(always)]
   fn drop(&mut self) {
      self.state.set_poisoned();
   }
}
