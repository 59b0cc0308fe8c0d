use std::fmt;

use serde::{Deserialize, Serialize};

use crate::heading::Heading;

pub const DEFAULT_TOLERANCE: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum CardinalPoint {
    N = 0,
    NE = 1,
    E = 2,
    SE = 3,
    S = 4,
    SW = 5,
    W = 6,
    NW = 7,
}

impl CardinalPoint {
    pub const ALL: [CardinalPoint; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Clockwise from north, in degrees.
    pub fn angle(&self) -> f32 {
        *self as u8 as f32 * 45.0
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }

    /// Whether `heading` lies within `tolerance` degrees of this point.
    ///
    /// The second comparison against `angle + 360` catches headings just
    /// below a full turn, so 358° still counts as north.
    pub fn is_near(&self, heading: Heading, tolerance: f32) -> bool {
        let heading = heading.degrees();
        let angle = self.angle();
        (heading - angle).abs() <= tolerance || (heading - (angle + 360.0)).abs() <= tolerance
    }
}

impl fmt::Display for CardinalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A set of cardinal points, one bit per point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardinalSet(u8);

impl CardinalSet {
    pub const EMPTY: CardinalSet = CardinalSet(0);

    pub fn insert(&mut self, point: CardinalPoint) {
        self.0 |= 1 << point as u8;
    }

    pub fn contains(&self, point: CardinalPoint) -> bool {
        self.0 & (1 << point as u8) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = CardinalPoint> + '_ {
        CardinalPoint::ALL
            .into_iter()
            .filter(move |point| self.contains(*point))
    }

    pub fn first(&self) -> Option<CardinalPoint> {
        self.iter().next()
    }
}

impl FromIterator<CardinalPoint> for CardinalSet {
    fn from_iter<I: IntoIterator<Item = CardinalPoint>>(iter: I) -> Self {
        let mut set = CardinalSet::EMPTY;
        for point in iter {
            set.insert(point);
        }
        set
    }
}

/// Cardinal points highlighted for `heading`.
pub fn active_cardinals(heading: Heading, tolerance: f32) -> CardinalSet {
    CardinalPoint::ALL
        .into_iter()
        .filter(|point| point.is_near(heading, tolerance))
        .collect()
}

/// Tracks which zone was last reported so that each entry fires once.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActiveCardinalState {
    active: CardinalSet,
    last_entered: Option<CardinalPoint>,
}

impl ActiveCardinalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> CardinalSet {
        self.active
    }

    pub fn last_entered(&self) -> Option<CardinalPoint> {
        self.last_entered
    }

    /// Records the new active set and returns the point that just became
    /// active, if any.
    pub fn advance(&mut self, active: CardinalSet) -> Option<CardinalPoint> {
        self.active = active;
        let Some(point) = active.first() else {
            self.last_entered = None;
            return None;
        };
        if self.last_entered == Some(point) {
            return None;
        }
        self.last_entered = Some(point);
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(degrees: f32) -> Heading {
        Heading::new(degrees).unwrap()
    }

    #[test]
    fn angles_and_labels() {
        let angles: Vec<f32> = CardinalPoint::ALL.iter().map(|p| p.angle()).collect();
        assert_eq!(
            angles,
            vec![0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0]
        );
        assert_eq!(CardinalPoint::SW.label(), "SW");
        assert_eq!(CardinalPoint::NW.to_string(), "NW");
    }

    #[test]
    fn north_matches_across_wraparound() {
        assert!(active_cardinals(heading(358.0), DEFAULT_TOLERANCE).contains(CardinalPoint::N));
        assert!(active_cardinals(heading(2.0), DEFAULT_TOLERANCE).contains(CardinalPoint::N));
        assert!(active_cardinals(heading(355.0), DEFAULT_TOLERANCE).contains(CardinalPoint::N));
        assert!(!active_cardinals(heading(354.0), DEFAULT_TOLERANCE).contains(CardinalPoint::N));
    }

    #[test]
    fn fifty_degrees_is_only_northeast() {
        let active = active_cardinals(heading(50.0), DEFAULT_TOLERANCE);
        assert_eq!(active.len(), 1);
        assert!(active.contains(CardinalPoint::NE));
        assert!(!active.contains(CardinalPoint::N));
        assert!(!active.contains(CardinalPoint::E));
    }

    #[test]
    fn nothing_active_between_zones() {
        assert!(active_cardinals(heading(20.0), DEFAULT_TOLERANCE).is_empty());
        assert!(active_cardinals(heading(200.0), DEFAULT_TOLERANCE).is_empty());
    }

    #[test]
    fn entry_fires_once_per_zone_visit() {
        let mut state = ActiveCardinalState::new();
        let entries: Vec<_> = [10.0, 4.0, 3.0, 1.0, 0.0]
            .into_iter()
            .filter_map(|d| state.advance(active_cardinals(heading(d), DEFAULT_TOLERANCE)))
            .collect();
        assert_eq!(entries, vec![CardinalPoint::N]);
        assert_eq!(state.last_entered(), Some(CardinalPoint::N));
    }

    #[test]
    fn leaving_and_returning_fires_again() {
        let mut state = ActiveCardinalState::new();
        assert_eq!(state.advance(active_cardinals(heading(1.0), 5.0)), Some(CardinalPoint::N));
        assert_eq!(state.advance(active_cardinals(heading(20.0), 5.0)), None);
        assert_eq!(state.last_entered(), None);
        assert_eq!(state.advance(active_cardinals(heading(359.0), 5.0)), Some(CardinalPoint::N));
    }

    #[test]
    fn moving_between_zones_fires_for_each() {
        let mut state = ActiveCardinalState::new();
        assert_eq!(state.advance(active_cardinals(heading(44.0), 5.0)), Some(CardinalPoint::NE));
        assert_eq!(state.advance(active_cardinals(heading(88.0), 5.0)), Some(CardinalPoint::E));
    }
}
