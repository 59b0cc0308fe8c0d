//! Wires the magnetometer, the one-shot location fix and the heading
//! processor together and publishes results into [`Storage`].

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::{
    cardinal::CardinalPoint,
    gnss::{LocationError, LocationSource},
    heading::HeadingProcessor,
    magnetometer::{add_listener, Magnetometer, Subscription},
    storage::Storage,
};

/// Side-effect triggers for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum CompassEvent {
    /// The heading moved into a cardinal zone it was not already in.
    ZoneEntered(CardinalPoint),
    /// No fix; running with zero declination. Meant to be shown to the user.
    LocationUnavailable(LocationError),
}

#[derive(Clone)]
pub struct Compass {
    storage: Arc<Storage>,
    processor: Arc<Mutex<HeadingProcessor>>,
    events: mpsc::UnboundedSender<CompassEvent>,
}

impl Compass {
    pub fn new(processor: HeadingProcessor) -> (Self, mpsc::UnboundedReceiver<CompassEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let compass = Self {
            storage: Arc::new(Storage::new()),
            processor: Arc::new(Mutex::new(processor)),
            events,
        };
        (compass, rx)
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    fn processor(&self) -> MutexGuard<'_, HeadingProcessor> {
        self.processor.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts feeding `sensor` into the processor. Stops when the returned
    /// handle is dropped or unsubscribed.
    pub fn subscribe<M: Magnetometer>(&self, sensor: M, interval: Duration) -> Subscription {
        let compass = self.clone();
        info!("Subscribing to magnetometer every {} ms", interval.as_millis());
        add_listener(sensor, interval, move |sample| {
            let result = compass.processor().process(sample);
            match result {
                Ok(update) => {
                    compass.storage.update_reading(&update);
                    if let Some(point) = update.entered {
                        compass.emit(CompassEvent::ZoneEntered(point));
                    }
                }
                Err(e) => debug!("Dropping sample: {e}"),
            }
        })
    }

    /// Resolves the position once and applies the local declination. A
    /// missing fix leaves the declination at zero.
    pub async fn locate(&self, source: &LocationSource) {
        match source.fix().await {
            Ok(position) => {
                let magnetic = {
                    let mut processor = self.processor();
                    processor.set_declination(position.latitude, position.longitude);
                    processor.magnetic_data()
                };
                self.storage.update_location(position, magnetic);
            }
            Err(e) => {
                warn!("{e}; continuing without declination");
                self.emit(CompassEvent::LocationUnavailable(e));
            }
        }
    }

    fn emit(&self, event: CompassEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }
}
