//! SIGINT/SIGTERM handling.
//!
//! The first signal sets a flag the UI loop turns into the same shutdown
//! path as `Esc`. A second signal while shutdown is pending exits at once
//! with code 1.

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag raised by a termination signal.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    raised: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Register for SIGINT and SIGTERM.
    pub fn install() -> Result<Self, std::io::Error> {
        Self::install_for(TERM_SIGNALS)
    }

    fn install_for(signals: &[i32]) -> Result<Self, std::io::Error> {
        let signal = Self::default();
        for sig in signals {
            // Order matters: the conditional exit must only see flags set by
            // an earlier signal.
            flag::register_conditional_shutdown(*sig, 1, Arc::clone(&signal.raised))?;
            flag::register(*sig, Arc::clone(&signal.raised))?;
        }
        Ok(signal)
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// The raw flag, for code that waits on it.
    pub fn flag(&self) -> &AtomicBool {
        &self.raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_hook::consts::SIGUSR1;
    use signal_hook::low_level::raise;

    #[test]
    fn test_first_signal_raises_flag() {
        let signal = ShutdownSignal::install_for(&[SIGUSR1]).unwrap();
        assert!(!signal.is_raised());

        raise(SIGUSR1).unwrap();

        assert!(signal.is_raised());
        assert!(signal.clone().flag().load(Ordering::SeqCst));
    }
}
