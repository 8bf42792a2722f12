use chrono::{DateTime, Utc};

use crate::data::model::{Floater, Measurements, Position};

// ---------------------------------------------------------------------------
// Frame – what one animation step shows
// ---------------------------------------------------------------------------

/// Snapshot for a step inside the floater's track.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFrame {
    pub floater_id: String,
    pub step: usize,
    pub total_steps: usize,
    pub position: Position,
    /// Positions `0..=step`.
    pub path: Vec<Position>,
    pub measurements: Measurements,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Step(StepFrame),
    /// Past the last observation: the animation is over.
    Complete { floater_id: String, total_steps: usize },
}

impl Frame {
    pub fn is_complete(&self) -> bool {
        matches!(self, Frame::Complete { .. })
    }

    pub fn as_step(&self) -> Option<&StepFrame> {
        match self {
            Frame::Step(step) => Some(step),
            Frame::Complete { .. } => None,
        }
    }
}

/// Frame for `step` of `floater`. Steps past the end yield [`Frame::Complete`].
pub fn advance(floater: &Floater, step: usize) -> Frame {
    let total_steps = floater.len();
    let Some(current) = floater.observations.get(step) else {
        return Frame::Complete {
            floater_id: floater.id.clone(),
            total_steps,
        };
    };

    Frame::Step(StepFrame {
        floater_id: floater.id.clone(),
        step,
        total_steps,
        position: current.position,
        path: floater.positions().take(step + 1).collect(),
        measurements: current.measurements.clone(),
        time: current.time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Observation;

    fn floater(n: usize) -> Floater {
        Floater {
            id: "F".to_string(),
            observations: (0..n)
                .map(|i| Observation {
                    time: None,
                    position: Position::new(i as f64, 60.0 + i as f64).unwrap(),
                    measurements: [("temperature".to_string(), 20.0 + i as f64)].into(),
                })
                .collect(),
        }
    }

    #[test]
    fn path_is_the_prefix_up_to_step() {
        let f = floater(6);
        for step in 0..6 {
            let frame = advance(&f, step);
            let frame = frame.as_step().unwrap();
            assert_eq!(frame.path.len(), step + 1);
            assert_eq!(frame.path, f.positions().take(step + 1).collect::<Vec<_>>());
            assert_eq!(frame.position, f.observations[step].position);
            assert_eq!(frame.measurements["temperature"], 20.0 + step as f64);
            assert_eq!(frame.total_steps, 6);
        }
    }

    #[test]
    fn out_of_range_step_is_complete() {
        let f = floater(3);
        assert_eq!(
            advance(&f, 3),
            Frame::Complete {
                floater_id: "F".into(),
                total_steps: 3
            }
        );
        assert!(advance(&f, usize::MAX).is_complete());
    }

    #[test]
    fn advance_is_idempotent() {
        let f = floater(4);
        assert_eq!(advance(&f, 2), advance(&f, 2));
        assert_eq!(advance(&f, 9), advance(&f, 9));
    }
}
