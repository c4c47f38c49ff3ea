use crate::Error;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Installs a Ctrl-C handler that raises the returned flag.
///
/// `ctrlc` permits one handler per process, so this must be called at most once.
pub fn install_interrupt_handler() -> Result<Arc<AtomicBool>, Error> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .map_err(|source| Error::InterruptHandler { source })?;
    Ok(interrupted)
}
