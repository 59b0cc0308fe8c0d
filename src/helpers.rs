pub const FULL_TURN: f32 = 360.0;

/// Brings an angle that is at most one turn out of range back into `[0, 360)`.
pub fn wrap_once(degrees: f32) -> f32 {
    let wrapped = if degrees < 0.0 {
        degrees + FULL_TURN
    } else if degrees >= FULL_TURN {
        degrees - FULL_TURN
    } else {
        degrees
    };
    // -1e-6 + 360.0 rounds to 360.0 in f32
    if wrapped >= FULL_TURN {
        0.0
    } else {
        // -0.0 from atan2 becomes 0.0
        wrapped + 0.0
    }
}

/// Rounds to whole degrees for display, so 359.6 reads as 0 and not 360.
pub fn round_degrees(degrees: f32) -> u16 {
    let rounded = degrees.round() as i32;
    rounded.rem_euclid(FULL_TURN as i32) as u16
}
