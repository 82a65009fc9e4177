//! Modulo reduction for operands known to be non-negative.
//!
//! Signed `%` has to honour negative dividends, so for a power-of-two
//! divisor the compiler emits a shift/add/mask fix-up sequence around the
//! mask. When the caller knows the dividend is never negative, viewing it as
//! the same-width unsigned integer makes the reduction a single `and`.
//!
//! The view is a bit-pattern reinterpretation (`as` between same-width
//! integers), never a clamping conversion. For `input >= 0` the two agree
//! with plain `%`; for negative input the result is whatever the unsigned
//! bit pattern reduces to, which is almost never the mathematical remainder.
//!
//! ```rust
//! use swap_once::mod_nonneg;
//!
//! assert_eq!(mod_nonneg(1000i32, 64), 1000 % 64);
//! assert_eq!(mod_nonneg(1000i32, 64), 1000 & 63);
//! assert_eq!(mod_nonneg(1000i64, 10), 0);
//! ```

/// Signed integers that can be reduced through their unsigned view.
pub trait NonNegRem: Copy {
   /// The unsigned integer of the same width.
   type Unsigned: Copy;

   /// Reinterprets the bits of `self` as [`Self::Unsigned`].
   fn to_unsigned_bits(self) -> Self::Unsigned;

   /// Computes `self % modulus` through the unsigned view.
   ///
   /// The caller guarantees `self >= 0`; this is not checked. With a
   /// negative `self` the result is the reduction of the reinterpreted bit
   /// pattern.
   ///
   /// # Panics
   ///
   /// Panics if `modulus` is zero. Debug builds also panic on a negative
   /// `modulus`.
   fn rem_nonneg(self, modulus: Self) -> Self;

   /// Like [`rem_nonneg`](Self::rem_nonneg) but returns `None` when
   /// `self < 0` or `modulus <= 0`.
   fn checked_rem_nonneg(self, modulus: Self) -> Option<Self>;
}

macro_rules! impl_non_neg_rem {
   ($($signed:ty => $unsigned:ty),* $(,)?) => {$(
      impl NonNegRem for $signed {
         type Unsigned = $unsigned;

         #[inline(always)]
         fn to_unsigned_bits(self) -> $unsigned {
            self as $unsigned
         }

         #[inline(always)]
         fn rem_nonneg(self, modulus: Self) -> Self {
            debug_assert!(modulus >= 0, "modulus must not be negative, got {modulus}");
            // The remainder is below `modulus`, so it fits back in the signed type.
            (self.to_unsigned_bits() % modulus.to_unsigned_bits()) as $signed
         }

         #[inline(always)]
         fn checked_rem_nonneg(self, modulus: Self) -> Option<Self> {
            if self < 0 || modulus <= 0 {
               None
            } else {
               Some(self.rem_nonneg(modulus))
            }
         }
      }
   )*};
}

impl_non_neg_rem! {
   i8 => u8,
   i16 => u16,
   i32 => u32,
   i64 => u64,
   i128 => u128,
   isize => usize,
}

/// Computes `input % modulus` for an `input` the caller knows is non-negative.
///
/// Inlined into the caller so a constant `modulus` folds; a power-of-two
/// constant becomes `input & (modulus - 1)`.
///
/// # Panics
///
/// Panics if `modulus` is zero.
#[inline(always)]
pub fn mod_nonneg<T: NonNegRem>(input: T, modulus: T) -> T {
   input.rem_nonneg(modulus)
}

/// Checked form of [`mod_nonneg`]: `None` if `input < 0` or `modulus <= 0`.
#[inline(always)]
pub fn checked_mod_nonneg<T: NonNegRem>(input: T, modulus: T) -> Option<T> {
   input.checked_rem_nonneg(modulus)
}
