/// Contract between a cleanup step and the orchestrator that sequences it
use crate::config::types::Result;

/// One unit of node cleanup.
///
/// The orchestrator logs `name()` and treats any error from `run()` as a
/// failed step. Steps are run one at a time and never concurrently.
pub trait Step {
    /// Static identifier for logging and ordering
    fn name(&self) -> &'static str;

    /// Execute the step, returning the first fatal error
    fn run(&self) -> Result<()>;
}
