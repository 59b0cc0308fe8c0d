pub mod cardinal;
pub mod compass;
pub mod config;
pub mod error;
pub mod gnss;
pub mod haptics;
pub mod heading;
pub mod helpers;
pub mod magnetic;
pub mod magnetometer;
pub mod mutex_box;
pub mod storage;

pub use cardinal::{active_cardinals, CardinalPoint, CardinalSet};
pub use compass::{Compass, CompassEvent};
pub use config::Config;
pub use error::CompassError;
pub use heading::{CompassReading, Heading, HeadingProcessor};
