use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    cardinal::DEFAULT_TOLERANCE,
    error::{CompassError, Result},
    gnss::{LocationSource, Position},
};

pub const CONFIG_ENV: &str = "OPEN_COMPASS_CONFIG";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub update_interval_ms: u64,
    pub tolerance_deg: f32,
    pub haptic_pulse_ms: u64,
    /// Height used for the magnetic model, in metres.
    pub altitude_m: f32,
    pub magnetometer: MagnetometerConfig,
    pub location: LocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_interval_ms: 100,
            tolerance_deg: DEFAULT_TOLERANCE,
            haptic_pulse_ms: 100,
            altitude_m: 0.0,
            magnetometer: MagnetometerConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MagnetometerConfig {
    Bno055 {
        #[serde(default = "default_i2c_bus")]
        i2c_bus: u8,
    },
    Simulated {
        #[serde(default)]
        start_deg: f32,
        #[serde(default = "default_step")]
        step_deg: f32,
    },
}

impl Default for MagnetometerConfig {
    fn default() -> Self {
        MagnetometerConfig::Bno055 {
            i2c_bus: default_i2c_bus(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LocationConfig {
    Gpsd {
        #[serde(default = "default_gpsd_addr")]
        gpsd_addr: SocketAddr,
    },
    Fixed {
        latitude: f64,
        longitude: f64,
    },
    None,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig::Gpsd {
            gpsd_addr: default_gpsd_addr(),
        }
    }
}

fn default_i2c_bus() -> u8 {
    8
}

fn default_step() -> f32 {
    3.0
}

fn default_gpsd_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 2947))
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        let config: Config =
            toml_edit::de::from_str(text).map_err(|e| CompassError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, or the file named by `OPEN_COMPASS_CONFIG`. With
    /// neither, the defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(&path)
            .map_err(|e| CompassError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.update_interval_ms == 0 {
            return Err(CompassError::Config(
                "update_interval_ms must be positive".to_owned(),
            ));
        }
        // zones 45° apart must not overlap
        if !(0.0..22.5).contains(&self.tolerance_deg) {
            return Err(CompassError::Config(format!(
                "tolerance_deg {} outside [0, 22.5)",
                self.tolerance_deg
            )));
        }
        if let LocationConfig::Fixed {
            latitude,
            longitude,
        } = self.location
        {
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                return Err(CompassError::Config(format!(
                    "fixed location {latitude}, {longitude} out of range"
                )));
            }
        }
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn haptic_pulse(&self) -> Duration {
        Duration::from_millis(self.haptic_pulse_ms)
    }

    pub fn location_source(&self) -> LocationSource {
        match self.location {
            LocationConfig::Gpsd { gpsd_addr } => LocationSource::Gpsd(gpsd_addr),
            LocationConfig::Fixed {
                latitude,
                longitude,
            } => LocationSource::Fixed(Position {
                latitude,
                longitude,
                altitude: self.altitude_m,
            }),
            LocationConfig::None => LocationSource::Disabled,
        }
    }
}
