//! Progress reporting for pipeline stages.
//!
//! Defines a [`ProgressCallback`] trait that decouples stage reporting from
//! any rendering backend. The CLI renders it with `indicatif`; tests and
//! library callers use [`NullProgress`].

/// Receives progress updates as pipeline stages complete.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of stages.
    fn set_total(&self, total: u64);

    /// Advance by `delta` stages.
    fn inc(&self, delta: u64);

    /// Describe the stage now running.
    fn set_message(&self, msg: String);

    /// Mark the run as complete with a final message.
    fn finish(&self, msg: String);
}

/// A [`ProgressCallback`] that ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
