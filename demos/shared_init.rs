use std::sync::atomic::{AtomicUsize, Ordering};

use swap_once::SyncLazy;

static COUNTER: AtomicUsize = AtomicUsize::new(0);
static DATA: SyncLazy<String> = SyncLazy::new(|| {
   // This closure runs only once
   COUNTER.fetch_add(1, Ordering::Relaxed);
   println!("Initializing data...");
   // Simulate work
   std::thread::sleep(std::time::Duration::from_millis(50));
   "Expensive data".to_string()
});

fn main() {
   let threads: Vec<_> = (0..5)
      .map(|_| {
         std::thread::spawn(|| {
            println!("Thread access: {}", *DATA);
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   assert_eq!(DATA.get(), Some(&"Expensive data".to_string()));
   assert_eq!(COUNTER.load(Ordering::Relaxed), 1); // Initializer ran only once
   println!("Final data: {}", *DATA);
}
