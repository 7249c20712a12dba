//! Ctrl-C handling for graceful shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::error::Result;

/// Install a Ctrl-C handler and return the agent's running flag.
///
/// The flag starts set and is cleared by Ctrl-C. [`Runtime`] checks it
/// before every tick and before every restart, and hands it to each
/// controller it builds so a startup reconnect loop against a dead link
/// gives up too. The runtime then stops the motors and returns
/// [`StopReason::Shutdown`].
///
/// [`Runtime`]: crate::runtime::Runtime
/// [`StopReason::Shutdown`]: crate::runtime::StopReason::Shutdown
pub fn setup_ctrl_c_handler() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl-C received, stopping agent");
        flag.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
