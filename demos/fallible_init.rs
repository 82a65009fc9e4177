use std::cell::Cell;

use swap_once::TryLazy;

fn main() {
   let fail = Cell::new(true);
   let maybe_data = TryLazy::new(|| {
      println!("Attempting initialization (fail={})...", fail.get());
      if fail.get() {
         Err("Initialization failed!")
      } else {
         Ok("Successfully initialized".to_string())
      }
   });

   // First attempt fails
   match maybe_data.get_or_try_init() {
      Ok(_) => panic!("Should have failed"),
      Err(e) => println!("Caught error: {}", e),
   }
   assert!(!maybe_data.is_initialized()); // Still uninitialized

   // Second attempt succeeds
   fail.set(false);
   match maybe_data.get_or_try_init() {
      Ok(data) => println!("Got data: {}", data),
      Err(_) => panic!("Should have succeeded"),
   }
   assert!(maybe_data.is_initialized());

   // Subsequent attempts return the stored value without calling the factory
   fail.set(true);
   match maybe_data.get_or_try_init() {
      Ok(data) => println!("Got data again: {}", data),
      Err(_) => panic!("Should have returned existing data"),
   }
}
