//! BLE connection flag shared between the wireless stack and the tick loop.
//!
//! Single writer (the GATTS connect/disconnect callbacks, which run on the
//! Bluedroid task), single reader (the fan-out).  A word-sized atomic is
//! all the synchronisation this needs.

use core::sync::atomic::{AtomicBool, Ordering};

/// Atomically readable "is a central connected" cell.
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
}

impl ConnectionState {
    /// Starts disconnected.
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
        }
    }

    /// Writer side, called from the wireless stack's callbacks only.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
