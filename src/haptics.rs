use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;

use crate::compass::CompassEvent;

pub trait Haptics {
    fn pulse(&mut self, duration: Duration);
}

/// Stands in for a vibration motor by logging each pulse.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn pulse(&mut self, duration: Duration) {
        info!("Buzz ({} ms)", duration.as_millis());
    }
}

/// Turns compass events into user feedback until the event channel closes.
pub async fn run_feedback<H: Haptics>(
    mut events: mpsc::UnboundedReceiver<CompassEvent>,
    mut haptics: H,
    pulse: Duration,
) {
    while let Some(event) = events.recv().await {
        match event {
            CompassEvent::ZoneEntered(point) => {
                info!("Facing {point}");
                haptics.pulse(pulse);
            }
            CompassEvent::LocationUnavailable(e) => {
                warn!("Location unavailable ({e}). Enable location access for true north.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cardinal::CardinalPoint, gnss::LocationError};

    #[derive(Default)]
    struct Recorder(Vec<Duration>);

    impl Haptics for &mut Recorder {
        fn pulse(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    #[tokio::test]
    async fn pulses_once_per_zone_entry() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(CompassEvent::ZoneEntered(CardinalPoint::N)).unwrap();
        tx.send(CompassEvent::LocationUnavailable(LocationError::Denied(
            "test".to_owned(),
        )))
        .unwrap();
        tx.send(CompassEvent::ZoneEntered(CardinalPoint::E)).unwrap();
        drop(tx);

        let mut recorder = Recorder::default();
        run_feedback(rx, &mut recorder, Duration::from_millis(100)).await;
        assert_eq!(recorder.0, vec![Duration::from_millis(100); 2]);
    }
}
