use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use swap_once::Lazy;

#[test]
fn test_new_is_not_initialized() {
   let lazy = Lazy::new(|| 42);
   assert!(!lazy.is_initialized());
   assert_eq!(lazy.get(), None);
}

#[test]
fn test_get_or_init_runs_factory_once() {
   let counter = AtomicUsize::new(0);
   let lazy = Lazy::new(|| {
      counter.fetch_add(1, Ordering::SeqCst);
      42
   });

   for _ in 0..100 {
      assert_eq!(lazy.get_or_init(), &42);
   }
   assert!(lazy.is_initialized());
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_every_call_returns_same_instance() {
   let lazy = Lazy::new(|| String::from("instance"));
   let first: *const String = lazy.get_or_init();
   let second: *const String = lazy.get_or_init();
   let third: *const String = Lazy::force(&lazy);
   assert_eq!(first, second);
   assert_eq!(second, third);
   assert_eq!(lazy.get().map(|v| v as *const String), Some(first));
}

#[test]
fn test_get_does_not_run_factory() {
   let counter = AtomicUsize::new(0);
   let lazy = Lazy::new(|| {
      counter.fetch_add(1, Ordering::SeqCst);
      7
   });
   assert_eq!(lazy.get(), None);
   assert_eq!(counter.load(Ordering::SeqCst), 0);

   lazy.get_or_init();
   assert_eq!(lazy.get(), Some(&7));
   assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_independent_cells() {
   let first_calls = AtomicUsize::new(0);
   let second_calls = AtomicUsize::new(0);
   let first = Lazy::new(|| {
      first_calls.fetch_add(1, Ordering::SeqCst);
      1
   });
   let second = Lazy::new(|| {
      second_calls.fetch_add(1, Ordering::SeqCst);
      2
   });

   assert_eq!(*first, 1);
   assert!(first.is_initialized());
   assert!(!second.is_initialized());
   assert_eq!(second_calls.load(Ordering::SeqCst), 0);

   assert_eq!(*second, 2);
   assert_eq!(first_calls.load(Ordering::SeqCst), 1);
   assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_deref() {
   let lazy: Lazy<Vec<u32>> = Lazy::new(|| vec![1, 2, 3]);
   assert_eq!(lazy.len(), 3);
   assert_eq!(lazy.iter().sum::<u32>(), 6);
}

#[test]
fn test_default() {
   let lazy: Lazy<Vec<i32>> = Lazy::default();
   assert!(!lazy.is_initialized());
   assert!(lazy.get_or_init().is_empty());
   assert!(lazy.is_initialized());
}

#[test]
fn test_force_mut_and_get_mut() {
   let mut lazy = Lazy::new(|| String::from("hello"));
   assert_eq!(lazy.get_mut(), None);

   lazy.force_mut().push_str(" world");
   assert_eq!(lazy.get(), Some(&String::from("hello world")));

   if let Some(value) = lazy.get_mut() {
      value.push('!');
   }
   assert_eq!(*lazy, "hello world!");
}

#[test]
fn test_into_inner() {
   let lazy = Lazy::new(|| 5);
   let factory = lazy.into_inner().expect_err("factory never ran");
   assert_eq!(factory(), 5);

   let lazy = Lazy::new(|| 5);
   lazy.get_or_init();
   assert_eq!(lazy.into_inner().ok(), Some(5));
}

#[test]
fn test_reentrant_access_panics() {
   let lazy: Rc<Lazy<i32, Box<dyn FnOnce() -> i32>>> = Rc::new_cyclic(|weak: &std::rc::Weak<Lazy<i32, Box<dyn FnOnce() -> i32>>>| {
      let weak = weak.clone();
      Lazy::new(Box::new(move || {
         let this = weak.upgrade().expect("cell alive during init");
         *this.get_or_init() + 1
      }) as Box<dyn FnOnce() -> i32>)
   });

   let result = panic::catch_unwind(AssertUnwindSafe(|| *lazy.get_or_init()));
   assert!(result.is_err());
   assert!(!lazy.is_initialized());
}

#[test]
fn test_factory_panic_poisons() {
   let counter = AtomicUsize::new(0);
   let lazy = Lazy::new(|| -> i32 {
      counter.fetch_add(1, Ordering::SeqCst);
      panic!("factory failed");
   });

   let first = panic::catch_unwind(AssertUnwindSafe(|| *lazy.get_or_init()));
   assert!(first.is_err());
   let second = panic::catch_unwind(AssertUnwindSafe(|| *lazy.get_or_init()));
   assert!(second.is_err());

   // The factory is never re-run after unwinding.
   assert_eq!(counter.load(Ordering::SeqCst), 1);
   assert_eq!(lazy.get(), None);
   assert_eq!(format!("{lazy:?}"), "Lazy(<poisoned>)");
}

#[test]
fn test_debug() {
   let lazy = Lazy::new(|| 3);
   assert_eq!(format!("{lazy:?}"), "Lazy(<uninit>)");
   lazy.get_or_init();
   assert_eq!(format!("{lazy:?}"), "Lazy(3)");
}

// ===== Drop behavior tests =====

#[test]
fn test_drop_factory_on_init() {
   let captured = Rc::new(1u32);
   let witness = Rc::clone(&captured);
   let lazy = Lazy::new(move || *captured + 1);
   assert_eq!(Rc::strong_count(&witness), 2);

   assert_eq!(*lazy, 2);
   assert_eq!(Rc::strong_count(&witness), 1);
}

#[test]
fn test_drop_uninitialized_drops_factory() {
   let captured = Rc::new(1u32);
   let witness = Rc::clone(&captured);
   {
      let _lazy = Lazy::new(move || *captured);
      assert_eq!(Rc::strong_count(&witness), 2);
   }
   assert_eq!(Rc::strong_count(&witness), 1);
}

#[test]
fn test_drop_initialized_drops_value() {
   let value = Rc::new(20u32);
   let witness = Rc::clone(&value);
   {
      let lazy = Lazy::new(move || value);
      lazy.get_or_init();
      assert_eq!(Rc::strong_count(&witness), 2);
   }
   assert_eq!(Rc::strong_count(&witness), 1);
}

#[test]
fn test_drop_poisoned_drops_nothing_twice() {
   let captured = Rc::new(0u32);
   let witness = Rc::clone(&captured);
   {
      let lazy = Lazy::new(move || -> u32 {
         let _hold = captured;
         panic!("boom");
      });
      let _ = panic::catch_unwind(AssertUnwindSafe(|| *lazy.get_or_init()));
      // The factory and its captures were dropped while unwinding.
      assert_eq!(Rc::strong_count(&witness), 1);
   }
   assert_eq!(Rc::strong_count(&witness), 1);
}
