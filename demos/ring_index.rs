use swap_once::mod_nonneg;

const SLOTS: i32 = 64;

/// Fixed-size ring addressed by a monotonically increasing sequence number.
struct Ring {
   slots: Vec<Option<i32>>,
   next: i32,
}

impl Ring {
   fn new() -> Self {
      Self {
         slots: vec![None; SLOTS as usize],
         next: 0,
      }
   }

   fn push(&mut self, value: i32) -> usize {
      // `next` only ever counts up from zero, so the mask form is valid.
      let index = mod_nonneg(self.next, SLOTS) as usize;
      self.slots[index] = Some(value);
      self.next += 1;
      index
   }
}

fn main() {
   let mut ring = Ring::new();
   let mut last = 0;
   for value in 0..200 {
      last = ring.push(value * 10);
   }
   println!("Last write landed in slot {last}");
   assert_eq!(last, 199 % 64);
   assert_eq!(ring.slots[last], Some(1990));

   // Outside the precondition the answer is the unsigned view, not -1 % 64.
   println!("mod_nonneg(-1, 64) = {} (signed % gives {})", mod_nonneg(-1i32, 64), -1i32 % 64);
}
