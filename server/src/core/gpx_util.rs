use std::time::SystemTime;

use chrono::{DateTime, Utc};
use geo_types::Point;
use gpx::{errors::GpxError, Gpx, GpxVersion, Metadata, Time, Waypoint};
use histoury_lib::journey::Journey;
use time::OffsetDateTime;

/// One waypoint per journey, named after the visited place.
pub fn journeys_to_gpx(journeys: &[Journey], now: DateTime<Utc>) -> Gpx {
    let mut gpx = Gpx::default();
    gpx.version = GpxVersion::Gpx11;
    gpx.creator = Some("histoury".to_string());
    gpx.metadata = Some(Metadata {
        name: Some("Journeys".to_string()),
        time: Some(to_gpx_time(now)),
        ..Default::default()
    });

    gpx.waypoints = journeys.iter().map(|journey| {
        let mut waypoint = Waypoint::new(Point::new(journey.lng, journey.lat));
        waypoint.name = Some(journey.place_name.clone());
        waypoint.description = Some(journey.description.clone()).filter(|d| !d.is_empty());
        waypoint.time = Some(to_gpx_time(journey.start_date));
        waypoint
    }).collect();

    gpx
}

pub fn write_gpx(gpx: &Gpx) -> Result<Vec<u8>, GpxError> {
    let mut buf = Vec::new();
    gpx::write(gpx, &mut buf)?;
    Ok(buf)
}

fn to_gpx_time(time: DateTime<Utc>) -> Time {
    let time: SystemTime = time.into();
    let time: OffsetDateTime = time.into();
    Time::from(time)
}
