use std::path::PathBuf;

use futures::join;
use log::info;
use static_cell::StaticCell;

use open_compass::{
    config::MagnetometerConfig,
    haptics::{run_feedback, LogHaptics},
    magnetic::WorldMagneticModel,
    magnetometer::{Bno055Magnetometer, SimulatedMagnetometer},
    storage::Storage,
    Compass, Config, HeadingProcessor,
};

static COMPASS: StaticCell<Compass> = StaticCell::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting");

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load(path.as_deref())?;

    let processor = HeadingProcessor::with_tolerance(
        Box::new(WorldMagneticModel::new(config.altitude_m)),
        config.tolerance_deg,
    );
    let (compass, events) = Compass::new(processor);
    let compass: &'static Compass = COMPASS.init(compass);

    let interval = config.update_interval();
    let subscription = match config.magnetometer {
        MagnetometerConfig::Bno055 { i2c_bus } => {
            compass.subscribe(Bno055Magnetometer::open(i2c_bus)?, interval)
        }
        MagnetometerConfig::Simulated {
            start_deg,
            step_deg,
        } => compass.subscribe(SimulatedMagnetometer::new(start_deg, step_deg), interval),
    };

    tokio::spawn(run_feedback(events, LogHaptics, config.haptic_pulse()));

    let location = config.location_source();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
        _ = async { join!(compass.locate(&location), handle_display(compass.storage())) } => {}
    }

    subscription.unsubscribe().await;
    Ok(())
}

/// Logs the readout whenever the whole-degree value or the highlight changes.
async fn handle_display(storage: &Storage) {
    let mut seen = 0;
    let mut shown = None;
    loop {
        let (reading, version) = storage.next_reading(seen).await;
        seen = version;
        let key = (reading.display_degrees(), reading.active);
        if shown != Some(key) {
            shown = Some(key);
            info!("{reading}");
        }
    }
}
