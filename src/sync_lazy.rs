//! Thread-safe lazy cell.
//!
//! [`SyncLazy`] trades the function-pointer swap of [`Lazy`](crate::Lazy)
//! for a one-byte atomic state: readers of an initialized cell do a single
//! acquire load, and the first thread to take the lock runs the factory while
//! the others park on the state. The factory runs at most once no matter how
//! many threads race for it.

use core::cell::UnsafeCell;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::Deref;
use core::sync::atomic::Ordering;

use crate::slot::Slot;
use crate::state::{InitGuard, InitState};

/// A lazily produced value that can be shared between threads.
///
/// ```rust
/// use swap_once::SyncLazy;
///
/// static BANNER: SyncLazy<String> = SyncLazy::new(|| format!("build {}", 42));
///
/// let handle = std::thread::spawn(|| BANNER.len());
/// assert_eq!(*BANNER, "build 42");
/// assert_eq!(handle.join().unwrap(), 8);
/// ```
pub struct SyncLazy<T, F = fn() -> T> {
   slot: UnsafeCell<Slot<T, F>>,
   state: InitState,
}

impl<T, F: FnOnce() -> T> SyncLazy<T, F> {
   /// Creates a new lazy value that will be produced by `factory`.
   #[inline]
   #[must_use]
   pub const fn new(factory: F) -> Self {
      Self {
         slot: UnsafeCell::new(Slot::pending(factory)),
         state: InitState::new(),
      }
   }

   /// Returns the value, running the factory if nobody has yet.
   ///
   /// If another thread is running the factory, blocks until it finishes.
   ///
   /// # Panics
   ///
   /// Panics if the factory panicked, here or on another thread. Calling this
   /// from inside the factory deadlocks.
   #[inline]
   pub fn get_or_init(&self) -> &T {
      if let Some(value) = self.get() {
         return value;
      }
      self.initialize();
      self.settled()
   }

   /// Same as [`get_or_init`](Self::get_or_init), in the `LazyLock::force` style.
   #[inline]
   pub fn force(this: &Self) -> &T {
      this.get_or_init()
   }

   /// Returns the value, running the factory only if no other thread is.
   ///
   /// Never blocks. Returns `None` while another thread is initializing,
   /// including when called from inside this cell's own factory.
   ///
   /// # Panics
   ///
   /// Panics if the cell is poisoned.
   pub fn try_force(&self) -> Option<&T> {
      if let Some(value) = self.get() {
         return Some(value);
      }
      match self.state.try_lock() {
         Some(guard) => {
            self.run(guard);
            Some(self.settled())
         }
         None if self.state.is_poisoned(Ordering::Acquire) => poisoned(),
         None => self.get(),
      }
   }

   /// Returns the value, running the factory if nobody has yet.
   ///
   /// While another thread runs the factory the calling task yields to the
   /// runtime instead of parking its worker thread.
   ///
   /// # Panics
   ///
   /// Panics if the factory panicked.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub async fn get_or_init_async(&self) -> &T {
      if let Some(value) = self.get() {
         return value;
      }
      if let Some(guard) = self.state.lock_async().await {
         self.run(guard);
      }
      self.settled()
   }

   /// Cold path for `get_or_init`.
   #[cold]
   fn initialize(&self) {
      if let Some(guard) = self.state.lock() {
         self.run(guard);
      }
   }

   /// Runs the factory under the lock and publishes its value.
   ///
   /// If the factory unwinds, `guard` is dropped and the cell is poisoned.
   fn run(&self, guard: InitGuard<'_>) {
      // SAFETY: holding the lock of an unsettled cell means the slot holds
      // the factory and no other thread touches it until we commit.
      let factory = unsafe { (*self.slot.get()).take_pending() };
      let value = factory();
      // SAFETY: still under the lock; the slot is empty.
      unsafe { self.slot.get().write(Slot::ready(value)) };
      guard.commit();
   }

   /// Returns the value of a settled cell, or panics if it was poisoned.
   #[inline]
   fn settled(&self) -> &T {
      match self.get() {
         Some(value) => value,
         None => poisoned(),
      }
   }
}

impl<T, F> SyncLazy<T, F> {
   /// Returns `true` once the value has been produced.
   #[inline]
   pub fn is_initialized(&self) -> bool {
      self.state.is_done(Ordering::Acquire)
   }

   /// Returns the value if it has already been produced. Never blocks.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      if self.is_initialized() {
         // SAFETY: DONE was observed with acquire ordering, so the value
         // write is visible and the slot is never written again.
         Some(unsafe { (*self.slot.get()).ready_ref() })
      } else {
         None
      }
   }

   /// Returns a mutable reference to the value if it has been produced.
   #[inline]
   pub fn get_mut(&mut self) -> Option<&mut T> {
      if self.state.is_done(Ordering::Relaxed) {
         // SAFETY: initialized, and `&mut self` excludes every other access.
         Some(unsafe { self.slot.get_mut().ready_mut() })
      } else {
         None
      }
   }

   /// Consumes the cell, returning the value or the unused factory.
   ///
   /// # Panics
   ///
   /// Panics if the cell is poisoned.
   pub fn into_inner(self) -> Result<T, F> {
      let mut this = ManuallyDrop::new(self);
      if this.state.is_poisoned(Ordering::Relaxed) {
         poisoned();
      }
      let done = this.state.is_done(Ordering::Relaxed);
      let slot = this.slot.get_mut();
      // SAFETY: the state names the live field, and `this` is never dropped.
      if done {
         Ok(unsafe { slot.take_ready() })
      } else {
         Err(unsafe { slot.take_pending() })
      }
   }
}

#[cold]
#[inline(never)]
#[track_caller]
fn poisoned() -> ! {
   panic!("SyncLazy instance has previously been poisoned")
}

impl<T, F: FnOnce() -> T> Deref for SyncLazy<T, F> {
   type Target = T;

   #[inline]
   fn deref(&self) -> &T {
      self.get_or_init()
   }
}

impl<T: Default> Default for SyncLazy<T> {
   /// Creates a lazy value produced by `T::default`.
   #[inline]
   fn default() -> Self {
      Self::new(T::default)
   }
}

impl<T: fmt::Debug, F> fmt::Debug for SyncLazy<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("SyncLazy");
      match self.get() {
         Some(v) => d.field(v),
         None if self.state.is_poisoned(Ordering::Acquire) => d.field(&format_args!("<poisoned>")),
         None => d.field(&format_args!("<uninit>")),
      };
      d.finish()
   }
}

// SAFETY:
// Shared access hands out `&T` to every thread, so `T: Sync`. The value is
// produced on one thread and may be dropped on another, so `T: Send`. The
// factory runs on whichever thread wins the lock, so `F: Send`.
unsafe impl<T: Sync + Send, F: Send> Sync for SyncLazy<T, F> {}

impl<T, F> Drop for SyncLazy<T, F> {
   fn drop(&mut self) {
      let done = self.state.is_done(Ordering::Relaxed);
      let abandoned = self.state.is_poisoned(Ordering::Relaxed);
      let slot = self.slot.get_mut();
      // SAFETY: exclusive access; the state names the live field, and a
      // poisoned slot holds nothing.
      if done {
         unsafe { slot.drop_ready() }
      } else if !abandoned {
         unsafe { slot.drop_pending() }
      }
   }
}
