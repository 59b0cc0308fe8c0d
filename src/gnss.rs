use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use gpsd_proto::UnifiedResponse;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f32,
}

#[derive(Clone, Default, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mode {
    #[default]
    NoFix = 0,
    Fix2d = 1,
    Fix3d = 2,
}

impl Mode {
    pub fn has_fix(&self) -> bool {
        *self != Mode::NoFix
    }
}

impl From<gpsd_proto::Mode> for Mode {
    fn from(value: gpsd_proto::Mode) -> Self {
        match value {
            gpsd_proto::Mode::NoFix => Mode::NoFix,
            gpsd_proto::Mode::Fix2d => Mode::Fix2d,
            gpsd_proto::Mode::Fix3d => Mode::Fix3d,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocationError {
    /// The user or the configuration withheld the location.
    #[error("location access denied: {0}")]
    Denied(String),
    #[error("no position fix: {0}")]
    Unavailable(String),
}

/// Where the one-shot position fix comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum LocationSource {
    Gpsd(SocketAddr),
    Fixed(Position),
    Disabled,
}

impl LocationSource {
    /// Resolves a single position. Waits for gpsd to report a fix; never
    /// retries once the connection is gone.
    pub async fn fix(&self) -> Result<Position, LocationError> {
        match self {
            LocationSource::Fixed(position) => Ok(*position),
            LocationSource::Disabled => Err(LocationError::Denied(
                "location disabled in configuration".to_owned(),
            )),
            LocationSource::Gpsd(addr) => gpsd_fix(*addr).await,
        }
    }
}

async fn gpsd_fix(addr: SocketAddr) -> Result<Position, LocationError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| LocationError::Unavailable(format!("gpsd at {addr}: {e}")))?;
    let mut framed = Framed::new(stream, LinesCodec::new());
    framed
        .send(gpsd_proto::ENABLE_WATCH_CMD)
        .await
        .map_err(|e| LocationError::Unavailable(format!("gpsd watch: {e}")))?;
    info!("Waiting for a position fix from gpsd at {addr}");

    while let Some(line) = framed.next().await {
        let line = line.map_err(|e| LocationError::Unavailable(format!("gpsd read: {e}")))?;
        if let Some(position) = position_from_line(&line) {
            info!(
                "Fix: {:.5}, {:.5} ({} m)",
                position.latitude, position.longitude, position.altitude
            );
            return Ok(position);
        }
    }
    Err(LocationError::Unavailable(
        "gpsd closed the connection before a fix".to_owned(),
    ))
}

/// Extracts a position from a gpsd TPV report that carries a fix.
pub fn position_from_line(line: &str) -> Option<Position> {
    match serde_json::from_str(line) {
        Ok(UnifiedResponse::Tpv(t)) => {
            if !Mode::from(t.mode).has_fix() {
                return None;
            }
            Some(Position {
                latitude: t.lat?,
                longitude: t.lon?,
                altitude: t.alt.unwrap_or_default(),
            })
        }
        Ok(_) => None,
        Err(e) => {
            debug!("Error decoding gpsd line: {e}");
            None
        }
    }
}
