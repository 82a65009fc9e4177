//! Single-threaded lazy cell with a fallible factory.
//!
//! [`TryLazy`] dispatches through a self-rewriting function pointer like
//! [`Lazy`](crate::Lazy). A factory error is handed back to the caller and
//! the initializing path stays installed, so the next access retries with
//! the same factory.

use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::mem::ManuallyDrop;

use crate::slot::{self, PoisonOnUnwind, Slot, Stage};

type TryAccess<T, E, F> = fn(&TryLazy<T, E, F>) -> Result<&T, E>;

/// A value produced by a fallible factory on first successful access.
///
/// ```rust
/// use swap_once::TryLazy;
///
/// let mut attempts = 0;
/// let port = TryLazy::new(move || {
///    attempts += 1;
///    if attempts < 2 { Err("not yet") } else { Ok(8080u16) }
/// });
///
/// assert_eq!(port.get_or_try_init(), Err("not yet"));
/// assert_eq!(port.get_or_try_init(), Ok(&8080));
/// assert_eq!(port.get_or_try_init(), Ok(&8080));
/// ```
pub struct TryLazy<T, E, F = fn() -> Result<T, E>> {
   access: Cell<TryAccess<T, E, F>>,
   stage: Cell<Stage>,
   slot: UnsafeCell<Slot<T, F>>,
}

impl<T, E, F: FnMut() -> Result<T, E>> TryLazy<T, E, F> {
   /// Creates a new lazy value that will be produced by `factory`.
   #[inline]
   #[must_use]
   pub const fn new(factory: F) -> Self {
      Self {
         access: Cell::new(Self::initialize as TryAccess<T, E, F>),
         stage: Cell::new(Stage::Pending),
         slot: UnsafeCell::new(Slot::pending(factory)),
      }
   }

   /// Returns the value, running the factory if it has not succeeded yet.
   ///
   /// - On `Ok(value)` the value is stored, the factory is dropped and every
   ///   later call returns the value without running anything.
   /// - On `Err(e)` the error is returned and the cell stays empty.
   ///
   /// # Panics
   ///
   /// Panics if called from inside the factory, or if an earlier factory
   /// call panicked.
   #[inline(always)]
   pub fn get_or_try_init(&self) -> Result<&T, E> {
      (self.access.get())(self)
   }

   /// Same as [`get_or_try_init`](Self::get_or_try_init).
   #[inline(always)]
   pub fn force(this: &Self) -> Result<&T, E> {
      this.get_or_try_init()
   }

   #[cold]
   #[inline(never)]
   fn initialize(this: &Self) -> Result<&T, E> {
      this.access.set(Self::unusable);
      let unwind = PoisonOnUnwind::arm(&this.stage);
      // SAFETY: reachable only from `Pending`, so the slot holds the factory;
      // the trap keeps reentrant calls off the slot.
      let mut factory = unsafe { (*this.slot.get()).take_pending() };
      let outcome = factory();
      unwind.disarm();
      match outcome {
         Ok(value) => {
            drop(factory);
            // SAFETY: the slot is empty and unborrowed.
            unsafe { this.slot.get().write(Slot::ready(value)) };
            this.stage.set(Stage::Ready);
            this.access.set(Self::ready);
            Self::ready(this)
         }
         Err(err) => {
            // SAFETY: as above; the factory goes back for the next attempt.
            unsafe { this.slot.get().write(Slot::pending(factory)) };
            this.stage.set(Stage::Pending);
            this.access.set(Self::initialize);
            Err(err)
         }
      }
   }

   #[inline]
   fn ready(this: &Self) -> Result<&T, E> {
      // SAFETY: installed only once the value has been written.
      Ok(unsafe { (*this.slot.get()).ready_ref() })
   }

   fn unusable(this: &Self) -> Result<&T, E> {
      slot::unusable("TryLazy", this.stage.get())
   }
}

impl<T, E, F> TryLazy<T, E, F> {
   /// Returns `true` once a factory call has succeeded.
   #[inline]
   pub fn is_initialized(&self) -> bool {
      self.stage.get() == Stage::Ready
   }

   /// Returns the value if a factory call has already succeeded.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      if self.is_initialized() {
         // SAFETY: stage `Ready` means the slot holds the value.
         Some(unsafe { (*self.slot.get()).ready_ref() })
      } else {
         None
      }
   }

   /// Returns a mutable reference to the value if it has been produced.
   #[inline]
   pub fn get_mut(&mut self) -> Option<&mut T> {
      if self.is_initialized() {
         // SAFETY: stage `Ready` and exclusive access.
         Some(unsafe { self.slot.get_mut().ready_mut() })
      } else {
         None
      }
   }

   /// Consumes the cell, returning the value or the factory that never succeeded.
   ///
   /// # Panics
   ///
   /// Panics if the cell is poisoned.
   pub fn into_inner(self) -> Result<T, F> {
      let mut this = ManuallyDrop::new(self);
      let stage = this.stage.get();
      let slot = this.slot.get_mut();
      // SAFETY: see `Lazy::into_inner`.
      match stage {
         Stage::Ready => Ok(unsafe { slot.take_ready() }),
         Stage::Pending => Err(unsafe { slot.take_pending() }),
         Stage::Running | Stage::Poisoned => slot::unusable("TryLazy", stage),
      }
   }
}

impl<T: fmt::Debug, E, F> fmt::Debug for TryLazy<T, E, F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("TryLazy");
      match self.get() {
         Some(v) => d.field(v),
         None if self.stage.get() == Stage::Poisoned => d.field(&format_args!("<poisoned>")),
         None => d.field(&format_args!("<uninit>")),
      };
      d.finish()
   }
}

impl<T, E, F> Drop for TryLazy<T, E, F> {
   fn drop(&mut self) {
      let stage = *self.stage.get_mut();
      let slot = self.slot.get_mut();
      // SAFETY: the stage names the live field.
      match stage {
         Stage::Ready => unsafe { slot.drop_ready() },
         Stage::Pending => unsafe { slot.drop_pending() },
         Stage::Running | Stage::Poisoned => {}
      }
   }
}
