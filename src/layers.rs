use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::anim::sequencer::Frame;
use crate::data::index::FloaterIndex;
use crate::data::model::Floater;

// ---------------------------------------------------------------------------
// Map layers
// ---------------------------------------------------------------------------
//
// Coordinates are `[lon, lat]` throughout, matching GeoJSON and the map's
// x/y axes.

/// The moving marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLayer {
    pub floater_id: String,
    pub position: [f64; 2],
}

/// The trail covered so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathLayer {
    pub floater_id: String,
    pub path: Vec<[f64; 2]>,
}

/// One marker per floater, at its first observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewPoint {
    pub floater_id: String,
    pub position: [f64; 2],
}

/// Marker for a step frame; nothing for the terminal frame.
pub fn to_point_layer(frame: &Frame) -> Option<PointLayer> {
    let step = frame.as_step()?;
    Some(PointLayer {
        floater_id: step.floater_id.clone(),
        position: step.position.lon_lat(),
    })
}

/// Trail for a step frame; nothing for the terminal frame.
pub fn to_path_layer(frame: &Frame) -> Option<PathLayer> {
    let step = frame.as_step()?;
    Some(PathLayer {
        floater_id: step.floater_id.clone(),
        path: step.path.iter().map(|p| p.lon_lat()).collect(),
    })
}

pub fn to_overview_layer(index: &FloaterIndex) -> Vec<OverviewPoint> {
    index
        .iter()
        .filter_map(|f| {
            Some(OverviewPoint {
                floater_id: f.id.clone(),
                position: f.first_position()?.lon_lat(),
            })
        })
        .collect()
}

impl PointLayer {
    pub fn to_geojson(&self) -> JsonValue {
        json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": self.position },
            "properties": { "floater": self.floater_id },
        })
    }
}

impl PathLayer {
    pub fn to_geojson(&self) -> JsonValue {
        json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": self.path },
            "properties": { "floater": self.floater_id },
        })
    }
}

// ---------------------------------------------------------------------------
// Info panel
// ---------------------------------------------------------------------------

/// Display unit for the known measurements.
pub fn unit(measurement: &str) -> &'static str {
    match measurement {
        "temperature" => "°C",
        "salinity" => "PSU",
        "pressure" => "dbar",
        _ => "",
    }
}

/// Tooltip / info text for a frame, measurements in `names` order.
pub fn to_info_text(frame: &Frame, names: &[&str]) -> String {
    let step = match frame {
        Frame::Step(step) => step,
        Frame::Complete {
            floater_id,
            total_steps,
        } => return format!("{floater_id}: completed {total_steps} steps"),
    };

    let mut lines = vec![
        format!("{}: Step {}", step.floater_id, step.step),
        step.position.to_string(),
    ];
    if let Some(time) = step.time {
        lines.push(time.format("%Y-%m-%d %H:%M UTC").to_string());
    }
    for name in names {
        if let Some(value) = step.measurements.get(*name) {
            lines.push(format!("{name}: {value:.2} {}", unit(name)).trim_end().to_string());
        }
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Measurement chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XAxis {
    /// Unix seconds.
    Time,
    /// Observation index.
    Step,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub floater_id: String,
    pub x_axis: XAxis,
    pub x: Vec<f64>,
    pub series: Vec<NamedSeries>,
}

/// Measurement series of one floater over time, or over steps when any
/// observation lacks a timestamp.
pub fn to_chart_series(floater: &Floater, names: &[&str]) -> ChartSeries {
    let (x_axis, x) = if floater.is_timed() {
        let x = floater
            .observations
            .iter()
            .filter_map(|o| o.time)
            .map(|t| t.timestamp_millis() as f64 / 1000.0)
            .collect();
        (XAxis::Time, x)
    } else {
        (XAxis::Step, (0..floater.len()).map(|i| i as f64).collect())
    };

    let series = names
        .iter()
        .map(|name| NamedSeries {
            name: name.to_string(),
            values: floater
                .observations
                .iter()
                .map(|o| o.measurements.get(*name).copied().unwrap_or(f64::NAN))
                .collect(),
        })
        .collect();

    ChartSeries {
        floater_id: floater.id.clone(),
        x_axis,
        x,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::sequencer::advance;
    use crate::data::model::{Observation, ObservationRow, Position};
    use chrono::{TimeZone, Utc};

    fn observation(lat: f64, lon: f64, hour: Option<u32>) -> Observation {
        Observation {
            time: hour.map(|h| Utc.with_ymd_and_hms(2023, 1, 1, h, 0, 0).unwrap()),
            position: Position::new(lat, lon).unwrap(),
            measurements: [
                ("temperature".to_string(), 27.5),
                ("salinity".to_string(), 35.0),
                ("pressure".to_string(), 10.0),
            ]
            .into(),
        }
    }

    fn floater(hours: &[Option<u32>]) -> Floater {
        Floater {
            id: "A".into(),
            observations: hours
                .iter()
                .enumerate()
                .map(|(i, h)| observation(-1.0 * i as f64, 70.0 + i as f64, *h))
                .collect(),
        }
    }

    #[test]
    fn point_and_path_use_lon_lat_order() {
        let f = floater(&[None, None, None]);
        let frame = advance(&f, 1);

        assert_eq!(to_point_layer(&frame).unwrap().position, [71.0, -1.0]);
        assert_eq!(
            to_path_layer(&frame).unwrap().path,
            vec![[70.0, 0.0], [71.0, -1.0]]
        );
    }

    #[test]
    fn terminal_frame_has_no_layers() {
        let f = floater(&[None]);
        let frame = advance(&f, 1);
        assert!(to_point_layer(&frame).is_none());
        assert!(to_path_layer(&frame).is_none());
        assert_eq!(to_info_text(&frame, &[]), "A: completed 1 steps");
    }

    #[test]
    fn overview_uses_first_observation() {
        let rows = vec![
            ObservationRow {
                float_id: "A".into(),
                observation: observation(1.0, 60.0, None),
            },
            ObservationRow {
                float_id: "B".into(),
                observation: observation(2.0, 61.0, None),
            },
            ObservationRow {
                float_id: "A".into(),
                observation: observation(3.0, 62.0, None),
            },
        ];
        let overview = to_overview_layer(&FloaterIndex::from_rows(rows));

        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].floater_id, "A");
        assert_eq!(overview[0].position, [60.0, 1.0]);
        assert_eq!(overview[1].position, [61.0, 2.0]);
    }

    #[test]
    fn chart_uses_time_axis_when_fully_timed() {
        let f = floater(&[Some(0), Some(6)]);
        let chart = to_chart_series(&f, &["temperature", "pressure"]);

        assert_eq!(chart.x_axis, XAxis::Time);
        assert_eq!(chart.x[1] - chart.x[0], 6.0 * 3600.0);
        assert_eq!(chart.series[0].name, "temperature");
        assert_eq!(chart.series[1].values, vec![10.0, 10.0]);
    }

    #[test]
    fn chart_falls_back_to_steps() {
        let f = floater(&[Some(0), None, Some(2)]);
        let chart = to_chart_series(&f, &["pH"]);

        assert_eq!(chart.x_axis, XAxis::Step);
        assert_eq!(chart.x, vec![0.0, 1.0, 2.0]);
        assert!(chart.series[0].values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn info_text_lists_measurements_with_units() {
        let f = floater(&[Some(3)]);
        let text = to_info_text(&advance(&f, 0), &["temperature", "salinity", "pressure"]);
        assert_eq!(
            text,
            "A: Step 0\n0.000°N 70.000°E\n2023-01-01 03:00 UTC\n\
             temperature: 27.50 °C\nsalinity: 35.00 PSU\npressure: 10.00 dbar"
        );
    }

    #[test]
    fn geojson_features() {
        let f = floater(&[None, None]);
        let frame = advance(&f, 1);
        let point = to_point_layer(&frame).unwrap().to_geojson();
        let path = to_path_layer(&frame).unwrap().to_geojson();

        assert_eq!(point["geometry"]["type"], "Point");
        assert_eq!(point["geometry"]["coordinates"], json!([71.0, -1.0]));
        assert_eq!(path["geometry"]["type"], "LineString");
        assert_eq!(path["properties"]["floater"], "A");
    }
}
