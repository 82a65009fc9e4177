use std::sync::atomic::{AtomicUsize, Ordering};

use swap_once::SyncLazy;

static COUNTER: AtomicUsize = AtomicUsize::new(0);
static ASYNC_DATA: SyncLazy<String> = SyncLazy::new(|| {
   // This closure runs only once
   COUNTER.fetch_add(1, Ordering::Relaxed);
   // Factories are synchronous and run on the worker that wins the lock.
   println!("Initializing shared data...");
   "Async expensive data".to_string()
});

#[tokio::main]
async fn main() {
   let tasks: Vec<_> = (0..5)
      .map(|_| {
         tokio::spawn(async {
            println!("Task access: {}", ASYNC_DATA.get_or_init_async().await);
         })
      })
      .collect();

   for t in tasks {
      t.await.unwrap();
   }

   assert_eq!(ASYNC_DATA.get(), Some(&"Async expensive data".to_string()));
   assert_eq!(COUNTER.load(Ordering::Relaxed), 1); // Initializer ran only once
   println!("Final async data: {}", ASYNC_DATA.get_or_init_async().await);
}
