//! Single-threaded lazy cell whose accessor rewrites itself.
//!
//! A conventional lazy cell tests "is the value there yet?" on every read.
//! [`Lazy`] instead reads through a function pointer stored next to the slot.
//! The pointer starts out aimed at the initializing path; that path runs the
//! factory, stores the value and re-aims the pointer at a path that simply
//! returns the stored value. Steady-state reads are an indirect call and a
//! load, with no occupancy compare.
//!
//! The trick relies on serialized access while the pointer is being swapped,
//! so `Lazy` is `!Sync`. Use [`SyncLazy`](crate::SyncLazy) to share a lazy
//! value between threads.

use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::Deref;

use crate::slot::{self, PoisonOnUnwind, Slot, Stage};

type Access<T, F> = fn(&Lazy<T, F>) -> &T;

/// A value computed by `F` on first access, then returned from a branch-free path.
///
/// ```rust
/// use swap_once::Lazy;
///
/// let greeting = Lazy::new(|| "hello".to_uppercase());
/// assert!(!greeting.is_initialized());
/// assert_eq!(greeting.get_or_init(), "HELLO");
/// assert_eq!(*greeting, "HELLO");
/// ```
pub struct Lazy<T, F = fn() -> T> {
   access: Cell<Access<T, F>>,
   stage: Cell<Stage>,
   slot: UnsafeCell<Slot<T, F>>,
}

impl<T, F: FnOnce() -> T> Lazy<T, F> {
   /// Creates a new lazy value that will be produced by `factory`.
   #[inline]
   #[must_use]
   pub const fn new(factory: F) -> Self {
      Self {
         access: Cell::new(Self::initialize as Access<T, F>),
         stage: Cell::new(Stage::Pending),
         slot: UnsafeCell::new(Slot::pending(factory)),
      }
   }

   /// Returns the value, running the factory if this is the first access.
   ///
   /// The factory runs at most once over the lifetime of the cell. After the
   /// first call this is an indirect call that loads the stored value.
   ///
   /// # Panics
   ///
   /// Panics if called from inside the factory, or if an earlier factory
   /// call panicked.
   #[inline(always)]
   pub fn get_or_init(&self) -> &T {
      (self.access.get())(self)
   }

   /// Same as [`get_or_init`](Self::get_or_init), in the `LazyCell::force` style.
   #[inline(always)]
   pub fn force(this: &Self) -> &T {
      this.get_or_init()
   }

   /// Returns a mutable reference to the value, initializing it first if needed.
   #[inline]
   pub fn force_mut(&mut self) -> &mut T {
      self.get_or_init();
      // SAFETY: `get_or_init` returned, so the slot holds the value.
      unsafe { self.slot.get_mut().ready_mut() }
   }

   /// Initializing path. Installed by `new`, replaced by `ready` on success.
   #[cold]
   #[inline(never)]
   fn initialize(this: &Self) -> &T {
      // Calls made while the factory runs land on the trap.
      this.access.set(Self::unusable);
      let unwind = PoisonOnUnwind::arm(&this.stage);
      // SAFETY: the stage was `Pending`, the only stage from which `initialize`
      // is reachable, so the slot holds the factory. The trap keeps every
      // other access away from the slot until we are done.
      let factory = unsafe { (*this.slot.get()).take_pending() };
      let value = factory();
      unwind.disarm();
      // SAFETY: the factory has been moved out; nothing borrows the slot.
      unsafe { this.slot.get().write(Slot::ready(value)) };
      this.stage.set(Stage::Ready);
      this.access.set(Self::ready);
      Self::ready(this)
   }

   /// Steady-state path: an unconditional read of the slot.
   #[inline]
   fn ready(this: &Self) -> &T {
      // SAFETY: `ready` is installed only after the value has been written,
      // and the value is never moved or dropped while `&self` is alive.
      unsafe { (*this.slot.get()).ready_ref() }
   }

   /// Trap installed while the factory runs; stays installed if it unwinds.
   fn unusable(this: &Self) -> &T {
      slot::unusable("Lazy", this.stage.get())
   }
}

impl<T, F> Lazy<T, F> {
   /// Returns `true` once the factory has produced the value.
   ///
   /// This inspects bookkeeping state and is not part of the fast path.
   #[inline]
   pub fn is_initialized(&self) -> bool {
      self.stage.get() == Stage::Ready
   }

   /// Returns the value if it has already been produced. Never runs the factory.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      if self.is_initialized() {
         // SAFETY: stage `Ready` means the slot holds the value.
         Some(unsafe { (*self.slot.get()).ready_ref() })
      } else {
         None
      }
   }

   /// Returns a mutable reference to the value if it has already been produced.
   #[inline]
   pub fn get_mut(&mut self) -> Option<&mut T> {
      if self.is_initialized() {
         // SAFETY: stage `Ready` and exclusive access.
         Some(unsafe { self.slot.get_mut().ready_mut() })
      } else {
         None
      }
   }

   /// Consumes the cell, returning the value if it was produced or the
   /// unused factory otherwise.
   ///
   /// # Panics
   ///
   /// Panics if the cell is poisoned.
   pub fn into_inner(self) -> Result<T, F> {
      let mut this = ManuallyDrop::new(self);
      let stage = this.stage.get();
      let slot = this.slot.get_mut();
      // SAFETY: the stage names the live field, and `this` is never dropped,
      // so each field is moved out at most once.
      match stage {
         Stage::Ready => Ok(unsafe { slot.take_ready() }),
         Stage::Pending => Err(unsafe { slot.take_pending() }),
         Stage::Running | Stage::Poisoned => slot::unusable("Lazy", stage),
      }
   }
}

impl<T, F: FnOnce() -> T> Deref for Lazy<T, F> {
   type Target = T;

   #[inline(always)]
   fn deref(&self) -> &T {
      self.get_or_init()
   }
}

impl<T: Default> Default for Lazy<T> {
   /// Creates a lazy value produced by `T::default`.
   #[inline]
   fn default() -> Self {
      Self::new(T::default)
   }
}

impl<T: fmt::Debug, F> fmt::Debug for Lazy<T, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("Lazy");
      match self.get() {
         Some(v) => d.field(v),
         None if self.stage.get() == Stage::Poisoned => d.field(&format_args!("<poisoned>")),
         None => d.field(&format_args!("<uninit>")),
      };
      d.finish()
   }
}

impl<T, F> Drop for Lazy<T, F> {
   fn drop(&mut self) {
      let stage = *self.stage.get_mut();
      let slot = self.slot.get_mut();
      // SAFETY: the stage names the live field; nothing can observe the cell
      // after drop.
      match stage {
         Stage::Ready => unsafe { slot.drop_ready() },
         Stage::Pending => unsafe { slot.drop_pending() },
         Stage::Running | Stage::Poisoned => {}
      }
   }
}
