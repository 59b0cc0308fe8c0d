//! Heading correction and cardinal-zone tracking.
//!
//! [`HeadingProcessor`] turns raw 2-axis magnetometer readings into a compass
//! heading corrected for the local magnetic declination. It is synchronous and
//! owned by whichever task drives the sensor; results are published to the
//! rest of the program as [`CompassReading`]s.

use std::fmt;

use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::cardinal::{active_cardinals, ActiveCardinalState, CardinalPoint, CardinalSet, DEFAULT_TOLERANCE};
use crate::error::{CompassError, Result};
use crate::helpers::{round_degrees, wrap_once, FULL_TURN};
use crate::magnetic::{DeclinationModel, MagneticData};

/// Degrees clockwise from north, always in `[0, 360)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Heading(f32);

impl Heading {
    pub const NORTH: Heading = Heading(0.0);

    pub fn new(degrees: f32) -> Option<Self> {
        (degrees.is_finite() && (0.0..FULL_TURN).contains(&degrees)).then_some(Heading(degrees))
    }

    pub fn degrees(&self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for Heading {
    type Error = String;

    fn try_from(degrees: f32) -> std::result::Result<Self, Self::Error> {
        Heading::new(degrees).ok_or_else(|| format!("heading {degrees} outside [0, 360)"))
    }
}

impl From<Heading> for f32 {
    fn from(heading: Heading) -> f32 {
        heading.0
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", round_degrees(self.0))
    }
}

/// What the presentation layer reads after every accepted sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompassReading {
    pub heading: Heading,
    pub active: CardinalSet,
}

impl CompassReading {
    /// Whole degrees as shown under the dial.
    pub fn display_degrees(&self) -> u16 {
        round_degrees(self.heading.degrees())
    }

    /// The rose turns against the heading so that north stays put.
    pub fn dial_rotation(&self) -> f32 {
        -self.heading.degrees()
    }
}

impl fmt::Display for CompassReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.active.first() {
            Some(point) => write!(f, "{point} {}", self.heading),
            None => write!(f, "{}", self.heading),
        }
    }
}

/// Result of processing one sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingUpdate {
    pub reading: CompassReading,
    /// Set only on the sample that moved the heading into a new zone.
    pub entered: Option<CardinalPoint>,
}

/// Raw magnetic angle for a horizontal field reading, in `[0, 360)`.
///
/// Uses `atan2(-x, y)`; z is ignored, so the result is only meaningful with
/// the device held level.
pub fn raw_angle(x: f32, y: f32) -> f32 {
    let angle = (-x).atan2(y).to_degrees();
    wrap_once(angle)
}

pub struct HeadingProcessor {
    model: Box<dyn DeclinationModel + Send>,
    magnetic: MagneticData,
    tolerance: f32,
    heading: Heading,
    cardinals: ActiveCardinalState,
}

impl HeadingProcessor {
    pub fn new(model: Box<dyn DeclinationModel + Send>) -> Self {
        Self::with_tolerance(model, DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(model: Box<dyn DeclinationModel + Send>, tolerance: f32) -> Self {
        Self {
            model,
            magnetic: MagneticData::default(),
            tolerance,
            heading: Heading::NORTH,
            cardinals: ActiveCardinalState::new(),
        }
    }

    /// Corrects the raw angle of `(x, y)` by the current declination.
    ///
    /// Samples with a non-finite component or a zero horizontal field are
    /// rejected and leave the processor untouched.
    pub fn update(&mut self, x: f32, y: f32) -> Result<Heading> {
        if !x.is_finite() || !y.is_finite() || (x == 0.0 && y == 0.0) {
            return Err(CompassError::InvalidSample { x, y });
        }
        let corrected = wrap_once(raw_angle(x, y) - self.magnetic.declination);
        self.heading = Heading(corrected);
        Ok(self.heading)
    }

    /// Runs [`update`](Self::update) and advances the cardinal-zone state.
    pub fn process(&mut self, sample: Vector3<f32>) -> Result<HeadingUpdate> {
        let heading = self.update(sample.x, sample.y)?;
        let active = self.active_cardinals(heading);
        let entered = self.cardinals.advance(active);
        if let Some(point) = entered {
            debug!("Entered {point} zone at {heading}");
        }
        Ok(HeadingUpdate {
            reading: CompassReading { heading, active },
            entered,
        })
    }

    /// Looks up the field at the given position. Any model failure falls
    /// back to zero declination.
    pub fn set_declination(&mut self, latitude: f64, longitude: f64) {
        self.magnetic = match self.model.field_at(latitude, longitude) {
            // a single fold in `update` only absorbs up to half a turn
            Ok(data) if !data.declination.is_finite() || data.declination.abs() > 180.0 => {
                warn!(
                    "Falling back to zero declination: model gave {} at {latitude:.4}, {longitude:.4}",
                    data.declination
                );
                MagneticData::default()
            }
            Ok(data) => {
                info!(
                    "Declination at {latitude:.4}, {longitude:.4}: {:.2}°",
                    data.declination
                );
                data
            }
            Err(e) => {
                warn!("Falling back to zero declination: {e}");
                MagneticData::default()
            }
        };
    }

    pub fn active_cardinals(&self, heading: Heading) -> CardinalSet {
        active_cardinals(heading, self.tolerance)
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn declination(&self) -> f32 {
        self.magnetic.declination
    }

    pub fn magnetic_data(&self) -> MagneticData {
        self.magnetic
    }

    pub fn reading(&self) -> CompassReading {
        CompassReading {
            heading: self.heading,
            active: self.cardinals.active(),
        }
    }
}
