//! The single shared physical scale, seen through the store.

use crate::BoxError;

/// One published reading of the shared scale. Transient: only the latest
/// value matters, history is never kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSample {
    /// Instantaneous weight in kilograms. May be <= 0 (sensor noise,
    /// zeroed scale); such readings are valid live values but are never
    /// persisted.
    pub weight_kg: f64,
    /// Wall-clock unix milliseconds when the reading was published.
    pub at_ms: u64,
    /// Optional hardware echo of the weighing flag on the same record.
    pub is_weighing: Option<bool>,
}

/// Change feed for the single scale record.
///
/// Delivery matches store notification order; back-to-back writes may
/// coalesce into the latest value only (last-write-wins). A frozen feed
/// means "no new data", never an error — reconnection is the store
/// client's concern, not the consumer's.
pub trait ScaleFeed {
    /// Subscribe to scale record changes. Dropping the returned source
    /// ends the subscription.
    fn subscribe(&mut self) -> Result<Box<dyn SampleSource + Send>, BoxError>;

    /// Write the hardware-facing weighing flag on the scale record.
    /// External LED firmware treats this as the sole "scale is live"
    /// signal.
    fn set_weighing(&mut self, on: bool) -> Result<(), BoxError>;
}

impl<T: ScaleFeed + ?Sized> ScaleFeed for Box<T> {
    fn subscribe(&mut self) -> Result<Box<dyn SampleSource + Send>, BoxError> {
        (**self).subscribe()
    }

    fn set_weighing(&mut self, on: bool) -> Result<(), BoxError> {
        (**self).set_weighing(on)
    }
}

/// Consumer end of a scale subscription.
pub trait SampleSource {
    /// Latest sample delivered since the previous call, if any. Intermediate
    /// samples are discarded (last-write-wins).
    fn latest(&mut self) -> Option<ScaleSample>;
}
