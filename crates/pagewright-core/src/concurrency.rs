use crate::context::remove_live_scratch;
use pagewright_runtime::{kill_running, terminate_running};
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install a handler for Ctrl-C and SIGTERM.
///
/// The first signal asks the running child's process group to terminate and
/// the runner to stop at the next stage boundary; the scratch directory is
/// then removed as the runner unwinds. A second signal kills the group,
/// removes the scratch directory here and exits with 130.
pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(move || {
        if SHUTDOWN_REQUESTED.swap(true, Ordering::SeqCst) {
            kill_running();
            remove_live_scratch();
            std::process::exit(130);
        }
        eprintln!("\nshutdown requested, stopping the current stage...");
        terminate_running();
    });
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn request_shutdown_for_test(value: bool) {
    SHUTDOWN_REQUESTED.store(value, Ordering::SeqCst);
}
