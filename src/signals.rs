use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use nix::sys::signal::{self, SigHandler, Signal};

/// Run-wide cancellation flag. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

static CANCEL: OnceLock<CancelToken> = OnceLock::new();

/// Route SIGINT and SIGTERM to `token`.
///
/// Only the first token installed is signalled; later calls just re-register
/// the handlers.
pub fn install_signal_handlers(token: CancelToken) -> nix::Result<()> {
    let _ = CANCEL.set(token);

    // SAFETY: the handler only performs an atomic store on a value that is
    // fully initialized before the handler is registered.
    unsafe {
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_cancel))?;
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_cancel))?;
    }

    Ok(())
}

extern "C" fn handle_cancel(_: i32) {
    if let Some(token) = CANCEL.get() {
        token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_install_signal_handlers() {
        let result = install_signal_handlers(CancelToken::new());
        assert!(result.is_ok());
    }
}
