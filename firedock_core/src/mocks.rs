//! Test and helper mocks for firedock_core

use firedock_traits::{BoxError, SampleSource, ScaleFeed, ScaleSample};

/// A feed that never delivers samples and accepts every flag write;
/// useful when driving the coordinator with externally injected samples
/// via `apply_sample`.
pub struct NullFeed;

impl ScaleFeed for NullFeed {
    fn subscribe(&mut self) -> Result<Box<dyn SampleSource + Send>, BoxError> {
        Ok(Box::new(NullSource))
    }

    fn set_weighing(&mut self, _on: bool) -> Result<(), BoxError> {
        Ok(())
    }
}

struct NullSource;

impl SampleSource for NullSource {
    fn latest(&mut self) -> Option<ScaleSample> {
        None
    }
}
