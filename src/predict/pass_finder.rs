use chrono::{DateTime, Duration, SubsecRound, Utc};
use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;
use crate::predict::geometry::{satellite_ecef_km, TopocentricFrame};
use crate::predict::types::PredictedWindow;
use crate::predict::StationLocation;

const SCAN_STEP_SECONDS: i64 = 60;
const HORIZON_DEG: f64 = 0.0;

/// Elevation of one satellite as seen from one station.
struct Sky<'a> {
    frame: TopocentricFrame,
    elements: &'a Elements,
    constants: &'a Constants,
}

impl Sky<'_> {
    fn elevation_at(&self, at: DateTime<Utc>) -> Result<f64, PredictError> {
        let sat = satellite_ecef_km(self.elements, self.constants, at)?;
        Ok(self.frame.elevation_deg(sat))
    }

    /// Bisects `(before, after]` down to one second around a horizon crossing
    /// and returns the first whole second on the `after` side.
    fn crossing(
        &self,
        mut before: DateTime<Utc>,
        mut after: DateTime<Utc>,
        visible_after: bool,
    ) -> Result<DateTime<Utc>, PredictError> {
        while after - before > Duration::seconds(1) {
            let mid = before + (after - before) / 2;
            if (self.elevation_at(mid)? >= HORIZON_DEG) == visible_after {
                after = mid;
            } else {
                before = mid;
            }
        }
        Ok(after.trunc_subsecs(0))
    }
}

/// An open window while scanning.
struct Open {
    aos: DateTime<Utc>,
    peak: f64,
}

/// Find all visibility windows of a satellite over a station within `[start, end]`.
///
/// Windows whose peak elevation stays below `min_elevation` are dropped. A window
/// still open at `end` is closed at `end`.
pub fn find_windows(
    station: &StationLocation,
    elements: &Elements,
    constants: &Constants,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_elevation: f64,
) -> Result<Vec<PredictedWindow>, PredictError> {
    let sky = Sky {
        frame: TopocentricFrame::new(station),
        elements,
        constants,
    };
    let keep = |open: Open, los: DateTime<Utc>| {
        (open.peak >= min_elevation)
            .then(|| PredictedWindow::new(open.aos, los, (open.peak * 100.0).round() / 100.0))
    };

    let step = Duration::seconds(SCAN_STEP_SECONDS);
    let start = start.trunc_subsecs(0);
    let origin = scan_origin(start);
    let mut windows = Vec::new();
    let mut open: Option<Open> = None;
    let mut previous = origin;
    let mut t = origin;

    while t <= end {
        let elevation = sky.elevation_at(t)?;
        let visible = elevation >= HORIZON_DEG;

        open = match (open, visible) {
            (None, true) => {
                let aos = if t == origin {
                    start
                } else {
                    sky.crossing(previous, t, visible)?.max(start)
                };
                Some(Open { aos, peak: elevation })
            }
            (Some(o), true) => Some(Open {
                peak: o.peak.max(elevation),
                ..o
            }),
            (Some(o), false) => {
                let los = sky.crossing(previous, t, visible)?;
                windows.extend(keep(o, los));
                None
            }
            (None, false) => None,
        };

        previous = t;
        t += step;
    }

    if let Some(o) = open {
        windows.extend(keep(o, end.trunc_subsecs(0)));
    }

    Ok(windows)
}

/// The scan grid sits on whole multiples of the step since the Unix epoch, so
/// the same crossing is refined to the same second whatever instant a
/// prediction starts from.
fn scan_origin(start: DateTime<Utc>) -> DateTime<Utc> {
    let offset = start.timestamp().rem_euclid(SCAN_STEP_SECONDS);
    start - Duration::seconds(offset)
}
