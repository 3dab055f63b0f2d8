//! Progress reporting for period evaluation.
//!
//! The pipeline reports one step per remote evaluation (scene check,
//! accuracy, area, each rendered layer). Rendering is left to the caller:
//! the CLI supplies `indicatif` bars, tests use [`NullProgress`].

/// Receives progress updates from the pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected number of steps.
    fn set_total(&self, total: u64);

    /// Advance by `delta` steps.
    fn inc(&self, delta: u64);

    /// Describe the step currently running.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);

    /// Mark progress as complete and remove the indicator.
    fn finish_and_clear(&self);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}
