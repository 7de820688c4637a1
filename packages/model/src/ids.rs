//! Block id generation.
//!
//! Ids look like `hero1-1718900000123-9f2c4e1a`: a slug of the block type,
//! a millisecond timestamp and a random suffix. The timestamp never repeats
//! within one generator (a stalled or rewound clock is bumped forward), so
//! ids from the same generator are unique even before the suffix is
//! considered. Not suitable as a secret.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct BlockIdGenerator {
    last_millis: AtomicU64,
}

impl BlockIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a fresh id for a block of `block_type`.
    pub fn next_id(&self, block_type: &str) -> String {
        let millis = self.next_millis();
        let random = Uuid::new_v4().simple().to_string();
        format!("{}-{}-{}", slug(block_type), millis, &random[..8])
    }

    fn next_millis(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

fn slug(block_type: &str) -> String {
    let slug: String = block_type
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();

    if slug.is_empty() {
        "block".to_string()
    } else {
        slug
    }
}
