//! Whisking trajectories and the per-whisker base-angle driver.

use std::f64::consts::TAU;
use std::path::Path;

use tracing::info;
use vibrissa_whisker::{WhiskerArray, WhiskerId};

use crate::table::{self, Position};
use crate::{Result, TrajectoryError};

/// Where a sampled value came from relative to the recorded span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryBoundary {
    /// Inside the recorded span.
    Within,
    /// Before the first sample; the first sample is held.
    HeldFirst,
    /// After the last sample; the last sample is held.
    HeldLast,
}

impl From<Position> for TrajectoryBoundary {
    fn from(p: Position) -> Self {
        match p {
            Position::Before => TrajectoryBoundary::HeldFirst,
            Position::Inside => TrajectoryBoundary::Within,
            Position::After => TrajectoryBoundary::HeldLast,
        }
    }
}

/// Base angles (radians) per whisker over time, sampled with hold-last.
#[derive(Debug, Clone)]
pub struct WhiskingTrajectory {
    names: Vec<String>,
    times: Vec<f64>,
    /// `angles[sample][column]`
    angles: Vec<Vec<f64>>,
}

impl WhiskingTrajectory {
    /// Parse `time,<names...>` rows.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let t = table::parse(text)?;
        Ok(Self {
            names: t.columns,
            times: t.times,
            angles: t.rows,
        })
    }

    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let t = table::read(path.as_ref())?;
        info!(
            path = %path.as_ref().display(),
            samples = t.times.len(),
            whiskers = t.columns.len(),
            "loaded whisking trajectory"
        );
        Ok(Self {
            names: t.columns,
            times: t.times,
            angles: t.rows,
        })
    }

    /// Sinusoidal whisking, `offset + amplitude · sin(2π f t)`, identical
    /// for every named whisker, sampled every `period` seconds over
    /// `[0, duration]`.
    pub fn sinusoid<S: AsRef<str>>(
        names: &[S],
        amplitude: f64,
        frequency: f64,
        offset: f64,
        duration: f64,
        period: f64,
    ) -> Result<Self> {
        let check = |field: &'static str, value: f64, ok: bool| {
            if value.is_finite() && ok {
                Ok(())
            } else {
                Err(TrajectoryError::InvalidGenerator { field, value })
            }
        };
        check("amplitude", amplitude, true)?;
        check("offset", offset, true)?;
        check("frequency", frequency, frequency >= 0.0)?;
        check("duration", duration, duration >= 0.0)?;
        check("period", period, period > 0.0)?;

        // Tolerate rounding in duration / period.
        let samples = (duration / period + 1e-9).floor() as usize + 1;
        let times: Vec<f64> = (0..samples).map(|i| i as f64 * period).collect();
        let angles = times
            .iter()
            .map(|t| {
                let angle = offset + amplitude * (TAU * frequency * t).sin();
                vec![angle; names.len()]
            })
            .collect();
        Ok(Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            times,
            angles,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start_time(&self) -> f64 {
        self.times.first().copied().unwrap_or(0.0)
    }

    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Angle of `column` held at time `t`.
    pub fn sample(&self, column: usize, t: f64) -> Option<(f64, TrajectoryBoundary)> {
        if column >= self.names.len() || self.times.is_empty() {
            return None;
        }
        let (i, position) = table::hold_index(&self.times, t);
        Some((self.angles[i][column], position.into()))
    }

    /// First recorded angle of `column`.
    pub fn first(&self, column: usize) -> Option<f64> {
        self.angles.first()?.get(column).copied()
    }
}

/// How the base joints are moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiskingMode {
    /// Base joints follow the follicle spring only.
    Passive,
    /// Base joints track the trajectory through a servo.
    Active,
}

impl WhiskingMode {
    pub fn from_flag(active: bool) -> Self {
        if active {
            WhiskingMode::Active
        } else {
            WhiskingMode::Passive
        }
    }
}

/// Base-joint target for one whisker at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiskingTarget {
    pub angle: f64,
    pub boundary: TrajectoryBoundary,
}

/// Maps (whisker, time) to a base-joint target.
#[derive(Debug, Clone)]
pub struct WhiskingDriver {
    mode: WhiskingMode,
    trajectory: Option<WhiskingTrajectory>,
    /// Trajectory column per whisker, indexed by `WhiskerId`.
    columns: Vec<Option<usize>>,
}

impl WhiskingDriver {
    /// Bind `trajectory` columns to the whiskers of `array` by name.
    ///
    /// Active whisking needs a trajectory column for every whisker. In
    /// passive mode the trajectory, when given, only sets initial angles.
    pub fn new(
        mode: WhiskingMode,
        trajectory: Option<WhiskingTrajectory>,
        array: &WhiskerArray,
    ) -> Result<Self> {
        let columns: Vec<Option<usize>> = array
            .names()
            .map(|name| trajectory.as_ref().and_then(|t| t.column(name)))
            .collect();

        if mode == WhiskingMode::Active && !array.is_empty() {
            if trajectory.is_none() {
                return Err(TrajectoryError::NoTrajectory);
            }
            if let Some(name) = array
                .names()
                .zip(&columns)
                .find_map(|(name, col)| col.is_none().then_some(name))
            {
                return Err(TrajectoryError::MissingColumn(name.to_string()));
            }
        }

        info!(
            mode = ?mode,
            whiskers = columns.len(),
            bound = columns.iter().filter(|c| c.is_some()).count(),
            "whisking driver ready"
        );
        Ok(Self {
            mode,
            trajectory,
            columns,
        })
    }

    /// Passive driver without a trajectory.
    pub fn passive(array: &WhiskerArray) -> Self {
        Self {
            mode: WhiskingMode::Passive,
            trajectory: None,
            columns: vec![None; array.len()],
        }
    }

    pub fn mode(&self) -> WhiskingMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == WhiskingMode::Active
    }

    pub fn trajectory(&self) -> Option<&WhiskingTrajectory> {
        self.trajectory.as_ref()
    }

    /// Servo target of whisker `id` at time `t`; `None` when passive.
    pub fn target(&self, id: WhiskerId, t: f64) -> Option<WhiskingTarget> {
        if self.mode == WhiskingMode::Passive {
            return None;
        }
        let column = (*self.columns.get(id.0)?)?;
        let (angle, boundary) = self.trajectory.as_ref()?.sample(column, t)?;
        Some(WhiskingTarget { angle, boundary })
    }

    /// Starting base angle of whisker `id`, from the first trajectory sample.
    pub fn initial_angle(&self, id: WhiskerId) -> Option<f64> {
        let column = (*self.columns.get(id.0)?)?;
        self.trajectory.as_ref()?.first(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vibrissa_whisker::{MaterialParams, WhiskerFactory};

    const CSV: &str = "time,LA0,RA0\n0.0,0.1,-0.1\n0.5,0.2,-0.2\n1.0,0.3,-0.3\n";

    fn array() -> WhiskerArray {
        WhiskerFactory::new(4, MaterialParams::default())
            .build(&["LA0", "RA0"], &[0, 0])
            .unwrap()
    }

    #[test]
    fn test_hold_last_sampling() {
        let traj = WhiskingTrajectory::from_csv_str(CSV).unwrap();
        assert_eq!(traj.len(), 3);
        assert_eq!(traj.sample(0, 0.7), Some((0.2, TrajectoryBoundary::Within)));
        assert_eq!(traj.sample(1, 1.0), Some((-0.3, TrajectoryBoundary::Within)));
        assert_eq!(traj.sample(0, 7.0), Some((0.3, TrajectoryBoundary::HeldLast)));
        assert_eq!(traj.sample(0, -1.0), Some((0.1, TrajectoryBoundary::HeldFirst)));
        assert_eq!(traj.sample(2, 0.0), None);
    }

    #[test]
    fn test_active_driver_targets() {
        let array = array();
        let traj = WhiskingTrajectory::from_csv_str(CSV).unwrap();
        let driver = WhiskingDriver::new(WhiskingMode::Active, Some(traj), &array).unwrap();
        let ra0 = array.id_of("RA0").unwrap();

        let target = driver.target(ra0, 0.6).unwrap();
        assert_relative_eq!(target.angle, -0.2);
        assert_eq!(target.boundary, TrajectoryBoundary::Within);

        let late = driver.target(ra0, 100.0).unwrap();
        assert_relative_eq!(late.angle, -0.3);
        assert_eq!(late.boundary, TrajectoryBoundary::HeldLast);

        // Pure in time: repeated and out-of-order queries agree.
        assert_eq!(driver.target(ra0, 0.6), Some(target));
    }

    #[test]
    fn test_passive_driver_has_no_targets() {
        let array = array();
        let traj = WhiskingTrajectory::from_csv_str(CSV).unwrap();
        let driver = WhiskingDriver::new(WhiskingMode::Passive, Some(traj), &array).unwrap();
        let la0 = array.id_of("LA0").unwrap();
        assert!(driver.target(la0, 0.2).is_none());
        assert_eq!(driver.initial_angle(la0), Some(0.1));
        assert!(WhiskingDriver::passive(&array).initial_angle(la0).is_none());
    }

    #[test]
    fn test_active_driver_needs_columns() {
        let array = array();
        let traj = WhiskingTrajectory::from_csv_str("time,LA0\n0,0.1\n").unwrap();
        assert!(matches!(
            WhiskingDriver::new(WhiskingMode::Active, Some(traj), &array),
            Err(TrajectoryError::MissingColumn(name)) if name == "RA0"
        ));
        assert!(matches!(
            WhiskingDriver::new(WhiskingMode::Active, None, &array),
            Err(TrajectoryError::NoTrajectory)
        ));
        // An empty array needs nothing.
        assert!(WhiskingDriver::new(WhiskingMode::Active, None, &WhiskerArray::new()).is_ok());
    }

    #[test]
    fn test_sinusoid_generator() {
        let traj = WhiskingTrajectory::sinusoid(&["LA0"], 0.5, 8.0, 0.1, 1.0, 0.001).unwrap();
        assert_eq!(traj.len(), 1001);
        assert_relative_eq!(traj.end_time(), 1.0, epsilon = 1e-12);
        // Quarter period of 8 Hz.
        let (angle, _) = traj.sample(0, 1.0 / 32.0).unwrap();
        assert_relative_eq!(angle, 0.6, epsilon = 1e-3);
        assert!(WhiskingTrajectory::sinusoid(&["LA0"], 0.5, 8.0, 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("vibrissa_whisking_test.csv");
        std::fs::write(&path, CSV).unwrap();
        let traj = WhiskingTrajectory::from_csv_file(&path).unwrap();
        assert_eq!(traj.names(), &["LA0".to_string(), "RA0".to_string()]);
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            WhiskingTrajectory::from_csv_file("/nonexistent/whisking.csv"),
            Err(TrajectoryError::Io { .. })
        ));
    }
}
