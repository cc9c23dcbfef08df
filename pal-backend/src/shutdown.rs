//! Cooperative cancellation.
//!
//! Ctrl-C only raises a flag. Loops check it between iterations, so an
//! artifact write in progress always completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{PalError, PalResult};

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task that raises the flag on the first Ctrl-C.
    pub fn listen(&self) {
        let requested = Arc::clone(&self.requested);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received, stopping at the next safe point");
                    requested.store(true, Ordering::SeqCst);
                }
                Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
            }
        });
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once shutdown has been requested.
    pub fn check(&self) -> PalResult<()> {
        if self.is_requested() {
            Err(PalError::Cancelled)
        } else {
            Ok(())
        }
    }
}
