//! Magnetometer sources and the polling listener that feeds them to the
//! heading processor.

use std::time::Duration;

use anyhow::anyhow;
use bno055::{BNO055OperationMode, Bno055};
use linux_embedded_hal::Delay;
use log::{info, warn};
use nalgebra::Vector3;
use rppal::i2c::I2c;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

pub trait Magnetometer: Send + 'static {
    /// One field reading in µT, device axes.
    fn read(&mut self) -> anyhow::Result<Vector3<f32>>;
}

pub struct Bno055Magnetometer {
    imu: Bno055<I2c>,
}

impl Bno055Magnetometer {
    pub fn open(bus: u8) -> anyhow::Result<Self> {
        let i2c = I2c::with_bus(bus)?;
        let mut imu = Bno055::new(i2c);
        let mut delay = Delay;

        imu.init(&mut delay)
            .map_err(|e| anyhow!("BNO055 init on bus {bus}: {e:?}"))?;
        imu.set_mode(BNO055OperationMode::MAG_ONLY, &mut delay)
            .map_err(|e| anyhow!("BNO055 mode: {e:?}"))?;
        info!("BNO055 magnetometer ready on I2C bus {bus}");
        Ok(Self { imu })
    }
}

impl Magnetometer for Bno055Magnetometer {
    fn read(&mut self) -> anyhow::Result<Vector3<f32>> {
        let field: mint::Vector3<f32> = self
            .imu
            .mag_data()
            .map_err(|e| anyhow!("BNO055 read: {e:?}"))?;
        Ok(Vector3::new(field.x, field.y, field.z))
    }
}

/// A level device turning at a constant rate under a 40 µT field.
#[derive(Clone, Debug)]
pub struct SimulatedMagnetometer {
    heading: f32,
    step: f32,
}

impl SimulatedMagnetometer {
    const HORIZONTAL_FIELD: f32 = 40.0;
    const VERTICAL_FIELD: f32 = -30.0;

    pub fn new(start: f32, step: f32) -> Self {
        Self {
            heading: start,
            step,
        }
    }
}

impl Magnetometer for SimulatedMagnetometer {
    fn read(&mut self) -> anyhow::Result<Vector3<f32>> {
        let rad = self.heading.to_radians();
        self.heading = (self.heading + self.step).rem_euclid(360.0);
        Ok(Vector3::new(
            -rad.sin() * Self::HORIZONTAL_FIELD,
            rad.cos() * Self::HORIZONTAL_FIELD,
            Self::VERTICAL_FIELD,
        ))
    }
}

/// Handle to a running listener. Dropping it stops the polling task.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stops polling and waits for the task to finish.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Polls `sensor` every `interval` and hands each reading to `listener`.
///
/// Read errors are logged and skipped. Must be called inside a tokio runtime.
pub fn add_listener<M, F>(mut sensor: M, interval: Duration, mut listener: F) -> Subscription
where
    M: Magnetometer,
    F: FnMut(Vector3<f32>) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => match sensor.read() {
                    Ok(sample) => listener(sample),
                    Err(e) => warn!("Magnetometer read failed: {e}"),
                },
            }
        }
        info!("Magnetometer listener stopped");
    });
    Subscription {
        cancel,
        task: Some(task),
    }
}
