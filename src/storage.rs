use crate::{
    gnss::Position,
    heading::{CompassReading, HeadingUpdate},
    magnetic::MagneticData,
    mutex_box::MutexBox,
};

/// Everything the presentation layer can observe.
#[derive(Debug, Default)]
pub struct Storage {
    pub reading: MutexBox<CompassReading>,
    pub magnetic_data: MutexBox<MagneticData>,
    pub position: MutexBox<Option<Position>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_reading(&self, update: &HeadingUpdate) {
        self.reading.set(update.reading);
    }

    pub fn update_location(&self, position: Position, magnetic: MagneticData) {
        self.position.set(Some(position));
        self.magnetic_data.set(magnetic);
    }

    pub fn get_reading(&self) -> CompassReading {
        self.reading.clone_inner()
    }

    pub fn get_magnetic_data(&self) -> MagneticData {
        self.magnetic_data.clone_inner()
    }

    pub fn get_position(&self) -> Option<Position> {
        self.position.clone_inner()
    }

    /// Waits for a reading newer than `seen`; pass 0 to get the first one.
    pub async fn next_reading(&self, seen: u64) -> (CompassReading, u64) {
        self.reading.changed(seen).await
    }
}
