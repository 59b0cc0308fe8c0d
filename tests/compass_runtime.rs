use std::time::Duration;

use chrono::NaiveDate;
use open_compass::{
    gnss::{LocationSource, Position},
    magnetic::{FixedDeclination, WorldMagneticModel},
    magnetometer::SimulatedMagnetometer,
    CardinalPoint, Compass, CompassEvent, HeadingProcessor,
};

const EPSILON: f32 = 1e-3;

async fn wait_for_heading(compass: &Compass, mut pred: impl FnMut(f32) -> bool) -> f32 {
    let mut seen = 0;
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let (reading, version) = compass.storage().next_reading(seen).await;
            seen = version;
            if pred(reading.heading.degrees()) {
                return reading.heading.degrees();
            }
        }
    })
    .await
    .expect("no matching reading")
}

#[tokio::test]
async fn declination_applies_once_location_resolves() {
    let (compass, _events) = Compass::new(HeadingProcessor::new(Box::new(FixedDeclination(20.0))));
    let subscription = compass.subscribe(
        SimulatedMagnetometer::new(90.0, 0.0),
        Duration::from_millis(5),
    );

    let before = wait_for_heading(&compass, |_| true).await;
    assert!((before - 90.0).abs() < EPSILON);

    compass
        .locate(&LocationSource::Fixed(Position {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
        }))
        .await;

    let after = wait_for_heading(&compass, |d| (d - 70.0).abs() < EPSILON).await;
    assert!((after - 70.0).abs() < EPSILON);
    subscription.unsubscribe().await;
}

#[tokio::test]
async fn sweeping_past_north_buzzes_once_per_entry() {
    let (compass, mut events) =
        Compass::new(HeadingProcessor::new(Box::new(FixedDeclination(0.0))));
    // 340.5 -> 342.5 -> ... crosses N once, reaches NE later
    let subscription = compass.subscribe(
        SimulatedMagnetometer::new(340.5, 2.0),
        Duration::from_millis(2),
    );
    wait_for_heading(&compass, |d| d > 60.0 && d < 90.0).await;
    subscription.unsubscribe().await;

    let mut entered = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CompassEvent::ZoneEntered(point) = event {
            entered.push(point);
        }
    }
    assert_eq!(entered, vec![CardinalPoint::N, CardinalPoint::NE]);
}

#[tokio::test]
async fn missing_location_keeps_magnetic_heading() {
    let (compass, mut events) = Compass::new(HeadingProcessor::new(Box::new(
        WorldMagneticModel::new(0.0).on(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
    )));
    compass.locate(&LocationSource::Disabled).await;
    assert!(matches!(
        events.recv().await,
        Some(CompassEvent::LocationUnavailable(_))
    ));

    let subscription = compass.subscribe(
        SimulatedMagnetometer::new(180.0, 0.0),
        Duration::from_millis(5),
    );
    let heading = wait_for_heading(&compass, |_| true).await;
    subscription.unsubscribe().await;
    assert!((heading - 180.0).abs() < EPSILON);
}

#[tokio::test]
async fn world_model_corrects_toward_true_north() {
    let (compass, _events) = Compass::new(HeadingProcessor::new(Box::new(
        WorldMagneticModel::new(0.0).on(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
    )));
    compass
        .locate(&LocationSource::Fixed(Position {
            latitude: -23.55,
            longitude: -46.63,
            altitude: 760.0,
        }))
        .await;
    let declination = compass.storage().get_magnetic_data().declination;
    assert!(declination > 15.0, "{declination}");

    let subscription = compass.subscribe(
        SimulatedMagnetometer::new(0.0, 0.0),
        Duration::from_millis(5),
    );
    let heading = wait_for_heading(&compass, |_| true).await;
    subscription.unsubscribe().await;
    assert!((heading - (360.0 - declination)).abs() < 0.01, "{heading}");
}
