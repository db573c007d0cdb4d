//! Counter stores for rate limiter state.

mod clock;
mod counter;
mod mem;
mod mem_timed;
mod slots;
mod timed;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
pub use counter::CounterStore;
pub use mem::MemStore;
pub use mem_timed::MemTimedStore;
pub use timed::{TimedStore, TimedValue};
