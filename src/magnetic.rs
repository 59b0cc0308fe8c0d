use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use world_magnetic_model::{
    time::Date,
    uom::si::{
        angle::degree,
        f32::{Angle, Length},
        length::meter,
        magnetic_flux_density::microtesla,
    },
    GeomagneticField,
};

use crate::error::{CompassError, Result};

#[derive(Deserialize, Serialize, Clone, Copy, Default, Debug, PartialEq)]
pub struct MagneticData {
    /// in degrees, positive when magnetic north lies west of true north.
    /// This is the amount subtracted from a magnetic heading.
    pub declination: f32,
    /// in degrees
    pub inclination: f32,
    /// in µT
    pub magnetic_flux_density: f32,
}

/// Source of the local geomagnetic field.
pub trait DeclinationModel {
    fn field_at(&self, latitude: f64, longitude: f64) -> Result<MagneticData>;
}

/// World Magnetic Model evaluated at a fixed altitude.
///
/// The date is today's unless pinned with [`WorldMagneticModel::on`].
#[derive(Clone, Debug, Default)]
pub struct WorldMagneticModel {
    altitude_m: f32,
    date: Option<NaiveDate>,
}

impl WorldMagneticModel {
    pub fn new(altitude_m: f32) -> Self {
        Self {
            altitude_m,
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    fn model_date(&self) -> Result<Date> {
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        Date::from_ordinal_date(date.year(), date.ordinal() as u16)
            .map_err(|e| CompassError::Declination(format!("invalid date {date}: {e}")))
    }
}

impl DeclinationModel for WorldMagneticModel {
    fn field_at(&self, latitude: f64, longitude: f64) -> Result<MagneticData> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CompassError::Declination(format!(
                "non-finite position {latitude}, {longitude}"
            )));
        }
        let field = GeomagneticField::new(
            Length::new::<meter>(self.altitude_m),
            Angle::new::<degree>(latitude as f32),
            Angle::new::<degree>(longitude as f32),
            self.model_date()?,
        )
        .map_err(|e| CompassError::Declination(format!("{e:?}")))?;

        Ok(MagneticData {
            // the model reports east-positive
            declination: -field.declination().get::<degree>(),
            inclination: field.inclination().get::<degree>(),
            magnetic_flux_density: field.f().get::<microtesla>(),
        })
    }
}

/// Same declination everywhere. Useful where the local value is known.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedDeclination(pub f32);

impl DeclinationModel for FixedDeclination {
    fn field_at(&self, _latitude: f64, _longitude: f64) -> Result<MagneticData> {
        Ok(MagneticData {
            declination: self.0,
            ..Default::default()
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct FailingModel;

    impl DeclinationModel for FailingModel {
        fn field_at(&self, latitude: f64, longitude: f64) -> Result<MagneticData> {
            Err(CompassError::Declination(format!(
                "no coverage at {latitude}, {longitude}"
            )))
        }
    }

    fn model() -> WorldMagneticModel {
        WorldMagneticModel::new(0.0).on(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[test]
    fn western_europe_has_small_east_declination() {
        // Paris: declination a couple of degrees east, so a small negative
        // correction in this crate's convention.
        let data = model().field_at(48.8566, 2.3522).unwrap();
        assert!(data.declination < 0.0 && data.declination > -5.0, "{data:?}");
        assert!(data.inclination > 55.0 && data.inclination < 70.0, "{data:?}");
        assert!(data.magnetic_flux_density > 40.0 && data.magnetic_flux_density < 55.0);
    }

    #[test]
    fn brazil_has_west_declination() {
        // São Paulo sits well inside the South Atlantic anomaly, ~20° west.
        let data = model().field_at(-23.55, -46.63).unwrap();
        assert!(data.declination > 15.0 && data.declination < 28.0, "{data:?}");
    }

    #[test]
    fn rejects_non_finite_position() {
        assert!(model().field_at(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn fixed_model_ignores_position() {
        let data = FixedDeclination(7.5).field_at(10.0, 20.0).unwrap();
        assert_eq!(data.declination, 7.5);
    }
}
