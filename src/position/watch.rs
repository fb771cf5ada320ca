//! Watch policy over a position stream.
//!
//! One policy, applied uniformly: stay subscribed until the first fix with
//! accuracy below the threshold arrives, then stop. Errors on the stream also
//! stop the watch; a fresh user-initiated watch is how retries happen.

use crate::position::source::{FixResult, PositionSource, PositionSubscription};
use crate::errors::PositionErrorKind;

pub struct AccuracyWatch {
    subscription: Option<PositionSubscription>,
    threshold_m: f64,
}

impl AccuracyWatch {
    pub fn start(
        source: &dyn PositionSource,
        threshold_m: f64,
    ) -> Result<Self, PositionErrorKind> {
        let subscription = source.subscribe()?;
        log::debug!("position watch started, accuracy threshold {threshold_m}m");
        Ok(Self { subscription: Some(subscription), threshold_m })
    }

    /// Next fix or error from the stream; `None` once the watch has stopped.
    ///
    /// A fix below the accuracy threshold is still delivered, but the
    /// subscription is dropped before returning, so the following call yields
    /// `None`. A stream error stops the watch the same way.
    pub async fn next(&mut self) -> Option<FixResult> {
        let sub = self.subscription.as_mut()?;
        let item = match sub.recv().await {
            Some(item) => item,
            None => {
                self.stop();
                return None;
            }
        };

        match &item {
            Ok(fix) if fix.accuracy_m < self.threshold_m => {
                log::debug!("accuracy {}m below threshold, stopping watch", fix.accuracy_m);
                self.stop();
            }
            Ok(fix) => {
                log::trace!("fix at accuracy {}m, keeping watch open", fix.accuracy_m);
            }
            Err(kind) => {
                log::warn!("position stream error: {kind}");
                self.stop();
            }
        }
        Some(item)
    }

    /// Explicit unsubscribe. Always called on teardown, whatever accuracy was
    /// achieved.
    pub fn stop(&mut self) {
        if self.subscription.take().is_some() {
            log::debug!("position watch stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for AccuracyWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use crate::position::source::{PositionFix, SimulatedPositionSource};

    fn fix(accuracy_m: f64) -> FixResult {
        Ok(PositionFix {
            point: Point::new(17.7836, 83.3786),
            accuracy_m,
            timestamp_ms: 1_700_000_000_000,
        })
    }

    #[tokio::test]
    async fn stops_after_first_accurate_fix() {
        let source = SimulatedPositionSource::new(vec![fix(120.0), fix(80.0), fix(20.0), fix(5.0)]);
        let mut watch = AccuracyWatch::start(&source, 50.0).unwrap();

        assert_eq!(watch.next().await.unwrap().unwrap().accuracy_m, 120.0);
        assert!(watch.is_active());
        assert_eq!(watch.next().await.unwrap().unwrap().accuracy_m, 80.0);
        assert_eq!(watch.next().await.unwrap().unwrap().accuracy_m, 20.0);

        // The 20m fix crossed the threshold; the 5m fix is never seen.
        assert!(!watch.is_active());
        assert!(watch.next().await.is_none());
    }

    #[tokio::test]
    async fn stream_error_stops_the_watch() {
        let source = SimulatedPositionSource::new(vec![
            fix(120.0),
            Err(PositionErrorKind::Timeout),
            fix(10.0),
        ]);
        let mut watch = AccuracyWatch::start(&source, 50.0).unwrap();

        assert!(watch.next().await.unwrap().is_ok());
        assert_eq!(watch.next().await.unwrap().err(), Some(PositionErrorKind::Timeout));
        assert!(!watch.is_active());
        assert!(watch.next().await.is_none());
    }

    #[tokio::test]
    async fn explicit_stop_is_idempotent() {
        let source = SimulatedPositionSource::new(vec![fix(120.0)]);
        let mut watch = AccuracyWatch::start(&source, 50.0).unwrap();
        watch.stop();
        watch.stop();
        assert!(!watch.is_active());
        assert!(watch.next().await.is_none());
    }
}
