use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;

/// Exit code for an interrupted run (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared flag checked by the scanner between entries and before each file.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Installs a Ctrl+C handler that trips the returned token.
pub fn install_handler() -> Result<CancelToken, ctrlc::Error> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupted, stopping scan...");
        handler_token.cancel();
    })?;
    Ok(token)
}
