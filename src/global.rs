// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use chrono::prelude::*;
use lazy_static::*;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

lazy_static! {
    /// Set once the process receives a termination request, either from a
    /// signal or from the `stop` RPC. Every long running task polls it.
    pub static ref EXIT_SIGNAL: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
}

/// Unix timestamp taken at process start
pub static STARTUP_TIME: AtomicI64 = AtomicI64::new(0);

/// Initialize globals
pub fn init() {
    STARTUP_TIME.store(Utc::now().timestamp(), Ordering::Relaxed);
}

#[must_use]
pub fn uptime_secs() -> u64 {
    let started = STARTUP_TIME.load(Ordering::Relaxed);
    (Utc::now().timestamp() - started).max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_counts_from_init() {
        init();
        assert!(uptime_secs() < 5);
    }
}
