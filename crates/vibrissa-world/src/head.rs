//! Head locomotion for exploring runs.

use std::path::Path;

use tracing::info;
use vibrissa_whisker::RatHead;

use crate::table::{self, Table};
use crate::{Result, TrajectoryBoundary, TrajectoryError};

const COLUMNS: [&str; 6] = ["x", "y", "z", "yaw", "pitch", "roll"];

/// One head pose sample: position (mm) and `[yaw, pitch, roll]` (rad).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadSample {
    pub time: f64,
    pub position: [f64; 3],
    pub orientation: [f64; 3],
}

impl HeadSample {
    pub fn head(&self) -> RatHead {
        RatHead::from_ypr(self.position, self.orientation)
    }
}

/// Sampled head poses, read with hold-last like the whisking trajectory.
#[derive(Debug, Clone)]
pub struct HeadTrajectory {
    times: Vec<f64>,
    samples: Vec<HeadSample>,
}

impl HeadTrajectory {
    /// Parse rows of `time,x,y,z,yaw,pitch,roll`.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_table(table::parse(text)?)
    }

    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let trajectory = Self::from_table(table::read(path.as_ref())?)?;
        info!(
            path = %path.as_ref().display(),
            samples = trajectory.len(),
            "loaded head trajectory"
        );
        Ok(trajectory)
    }

    /// Build from samples; times must strictly increase.
    pub fn from_samples(samples: Vec<HeadSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(TrajectoryError::Empty);
        }
        for (i, pair) in samples.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(TrajectoryError::NonIncreasingTime {
                    line: i + 2,
                    time: pair[1].time,
                });
            }
        }
        Ok(Self::with_samples(samples))
    }

    fn with_samples(samples: Vec<HeadSample>) -> Self {
        Self {
            times: samples.iter().map(|s| s.time).collect(),
            samples,
        }
    }

    fn from_table(t: Table) -> Result<Self> {
        for name in COLUMNS {
            if !t.columns.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                return Err(TrajectoryError::MissingColumn(name.to_string()));
            }
        }
        let index = |name: &str| t.columns.iter().position(|c| c.eq_ignore_ascii_case(name));
        let cols: Vec<usize> = COLUMNS.iter().filter_map(|n| index(n)).collect();

        let samples = t
            .times
            .iter()
            .zip(&t.rows)
            .map(|(&time, row)| HeadSample {
                time,
                position: [row[cols[0]], row[cols[1]], row[cols[2]]],
                orientation: [row[cols[3]], row[cols[4]], row[cols[5]]],
            })
            .collect();
        Ok(Self::with_samples(samples))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[HeadSample] {
        &self.samples
    }

    /// Head pose held at time `t`.
    pub fn pose_at(&self, t: f64) -> (RatHead, TrajectoryBoundary) {
        let (i, position) = table::hold_index(&self.times, t);
        (self.samples[i].head(), position.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vibrissa_math::Vec3;

    #[test]
    fn test_head_hold_last() {
        let traj = HeadTrajectory::from_csv_str(
            "time,x,y,z,yaw,pitch,roll\n0,0,0,0,0,0,0\n1,10,0,0,0.5,0,0\n",
        )
        .unwrap();
        let (head, boundary) = traj.pose_at(0.5);
        assert_eq!(boundary, TrajectoryBoundary::Within);
        assert_eq!(head.position, Vec3::zeros());

        let (head, boundary) = traj.pose_at(3.0);
        assert_eq!(boundary, TrajectoryBoundary::HeldLast);
        assert_relative_eq!(head.position, Vec3::new(10.0, 0.0, 0.0));
        let turned = RatHead::from_ypr([0.0; 3], [0.5, 0.0, 0.0]);
        assert_relative_eq!(head.orientation, turned.orientation);
    }

    #[test]
    fn test_columns_in_any_order() {
        let traj =
            HeadTrajectory::from_csv_str("time,yaw,pitch,roll,X,Y,Z\n0,0,0,0,1,2,3\n").unwrap();
        assert_eq!(traj.samples()[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_column() {
        assert!(matches!(
            HeadTrajectory::from_csv_str("time,x,y,z,yaw,pitch\n0,0,0,0,0,0\n"),
            Err(TrajectoryError::MissingColumn(c)) if c == "roll"
        ));
    }

    #[test]
    fn test_from_samples_checks_order() {
        let s = |time| HeadSample {
            time,
            position: [0.0; 3],
            orientation: [0.0; 3],
        };
        assert!(HeadTrajectory::from_samples(vec![s(0.0), s(1.0)]).is_ok());
        assert!(HeadTrajectory::from_samples(vec![s(1.0), s(1.0)]).is_err());
        assert!(HeadTrajectory::from_samples(Vec::new()).is_err());
    }
}
