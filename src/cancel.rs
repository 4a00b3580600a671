use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{ProfileError, Result};

/// A shared flag used to abandon an in-progress load.
///
/// Clones observe the same flag, so one clone can be handed to a loader
/// while another is kept by whoever may want to cancel it, on any thread.
/// Once cancelled, a token stays cancelled.
#[derive(Clone, Debug, Default)]
pub struct Cancellable {
    cancelled: Arc<AtomicBool>,
}

impl Cancellable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every load observing this token to stop at its next read.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`ProfileError::Cancelled`] if the token has been signalled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ProfileError::Cancelled);
        }
        Ok(())
    }
}
