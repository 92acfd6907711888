use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

pub mod characters;
pub mod revoked;
pub mod users;

pub use characters::CharacterStore;
pub use revoked::RevocationStore;
pub use users::UserStore;

/// Hands out ids derived from the creation time in milliseconds. Two records
/// created in the same millisecond still get distinct, increasing ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}
