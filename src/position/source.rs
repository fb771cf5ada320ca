//! Live position sources.
//!
//! A source delivers zero or more position fixes over a channel until the
//! subscription is dropped. Dropping the subscription is the unsubscribe:
//! sources observe the closed channel and stop.

use crate::errors::PositionErrorKind;
use crate::geo::Point;
use tokio::sync::mpsc;

/// One reading from the device's location sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub point: Point,
    /// Radius of the 68% confidence circle, in meters.
    pub accuracy_m: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

pub type FixResult = Result<PositionFix, PositionErrorKind>;

/// A source of live position fixes: device GPS, a browser geolocation bridge,
/// or a simulator.
pub trait PositionSource: Send + Sync {
    /// Start delivering fixes. An environment with no geolocation capability
    /// fails here with [`PositionErrorKind::Unsupported`]; later failures
    /// (permission, timeout) arrive on the stream itself.
    fn subscribe(&self) -> Result<PositionSubscription, PositionErrorKind>;
}

/// Handle to an active position stream. Dropping it unsubscribes.
pub struct PositionSubscription {
    rx: mpsc::Receiver<FixResult>,
}

impl PositionSubscription {
    pub fn new(rx: mpsc::Receiver<FixResult>) -> Self {
        Self { rx }
    }

    /// Next fix or stream error; `None` once the source has stopped.
    pub async fn recv(&mut self) -> Option<FixResult> {
        self.rx.recv().await
    }
}

/// Plays back a scripted sequence of fixes. Used by tests and demos.
pub struct SimulatedPositionSource {
    script: Vec<FixResult>,
}

impl SimulatedPositionSource {
    pub fn new(script: Vec<FixResult>) -> Self {
        Self { script }
    }

    /// A source whose environment has no geolocation at all.
    pub fn unsupported() -> Self {
        Self { script: vec![] }
    }
}

impl PositionSource for SimulatedPositionSource {
    fn subscribe(&self) -> Result<PositionSubscription, PositionErrorKind> {
        if self.script.is_empty() {
            return Err(PositionErrorKind::Unsupported);
        }

        let (tx, rx) = mpsc::channel(self.script.len());
        let script = self.script.clone();
        tokio::spawn(async move {
            for item in script {
                // Receiver dropped means the watcher unsubscribed.
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        Ok(PositionSubscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(accuracy_m: f64) -> FixResult {
        Ok(PositionFix {
            point: Point::new(17.7836, 83.3786),
            accuracy_m,
            timestamp_ms: 1_700_000_000_000,
        })
    }

    #[tokio::test]
    async fn simulated_source_plays_back_script() {
        let source = SimulatedPositionSource::new(vec![fix(120.0), fix(30.0)]);
        let mut sub = source.subscribe().unwrap();

        assert_eq!(sub.recv().await.unwrap().unwrap().accuracy_m, 120.0);
        assert_eq!(sub.recv().await.unwrap().unwrap().accuracy_m, 30.0);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn unsupported_environment_fails_at_subscribe() {
        let source = SimulatedPositionSource::unsupported();
        assert_eq!(source.subscribe().err(), Some(PositionErrorKind::Unsupported));
    }
}
