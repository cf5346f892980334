//! ---
//! tbus_section: "05-command-harness"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Discovery, publish, echo and request commands over a messaging node."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::time::Duration;

/// Blocking delay used for the publish grace period and bounded echo.
pub trait Sleeper: Send + Sync {
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
