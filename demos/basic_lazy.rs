use std::cell::Cell;

use swap_once::Lazy;

fn main() {
   let calls = Cell::new(0);
   let primes = Lazy::new(|| {
      // This closure runs only once
      calls.set(calls.get() + 1);
      println!("Sieving primes...");
      let mut sieve = vec![true; 100];
      sieve[0] = false;
      sieve[1] = false;
      for i in 2..10 {
         if sieve[i] {
            for j in (i * i..100).step_by(i) {
               sieve[j] = false;
            }
         }
      }
      (0..100).filter(|&n| sieve[n]).collect::<Vec<usize>>()
   });

   println!("Initialized before first use: {}", primes.is_initialized());
   for round in 0..3 {
      // After the first round the accessor no longer checks for a value.
      println!("Round {round}: {} primes below 100", primes.get_or_init().len());
   }

   assert_eq!(primes.len(), 25);
   assert_eq!(calls.get(), 1); // Factory ran only once
   println!("Largest: {:?}", primes.last());
}
