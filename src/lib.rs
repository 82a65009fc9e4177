//! Lazy cells whose accessor rewrites itself, and non-negative modulo reduction.
//!
//! This crate packages two small hot-path techniques:
//!
//! - [`Lazy<T, F>`]: a single-threaded lazy cell. Reads go through a function
//!   pointer that the first read re-aims from "run the factory" to "return
//!   the value", so steady-state reads never test whether the value exists.
//! - [`TryLazy<T, E, F>`]: the same cell with a fallible factory; an error
//!   leaves the cell empty and the next read retries.
//! - [`SyncLazy<T, F>`]: a thread-safe lazy cell using an atomic state byte
//!   and `parking_lot`'s futex-based parking. The factory still runs exactly
//!   once.
//! - [`mod_nonneg`]: `input % modulus` through the unsigned view of a signed
//!   integer, for inputs the caller knows are non-negative. With a
//!   power-of-two modulus this compiles to a single mask.
//!
//! # Examples
//!
//! ## Single-threaded lazy value
//!
//! ```rust
//! use std::cell::Cell;
//! use swap_once::Lazy;
//!
//! let calls = Cell::new(0);
//! let table = Lazy::new(|| {
//!     calls.set(calls.get() + 1);
//!     (0..8u32).map(|i| i * i).collect::<Vec<_>>()
//! });
//!
//! assert_eq!(table.get_or_init()[3], 9);
//! assert_eq!(table.get_or_init()[7], 49);
//! assert_eq!(calls.get(), 1);
//! ```
//!
//! ## Non-negative modulo
//!
//! ```rust
//! use swap_once::mod_nonneg;
//!
//! let slot = mod_nonneg(1_000_003i32, 64);
//! assert_eq!(slot, 1_000_003 & 63);
//! ```

/// Single-threaded lazy cell.
mod lazy;

/// Non-negative modulo reduction.
mod modulo;

/// Factory/value storage shared by the cells.
mod slot;

/// Internal synchronization state management.
mod state;

/// Thread-safe lazy cell.
mod sync_lazy;

/// Single-threaded lazy cell with a fallible factory.
mod try_lazy;

pub use lazy::Lazy;
pub use modulo::{checked_mod_nonneg, mod_nonneg, NonNegRem};
pub use sync_lazy::SyncLazy;
pub use try_lazy::TryLazy;
