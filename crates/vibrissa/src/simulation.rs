//! The fixed-step integration loop.
//!
//! A [`Simulation`] owns the whisker array, the collision environment, the
//! whisking driver and the head. Each frame runs `num_step_int` substeps;
//! every substep pulls whisking targets and the object pose for its start
//! time, then advances each whisker independently through a [`Solver`].

use tracing::{debug, error, info, warn};
use vibrissa_collision::{CollisionEnvironment, ObjectPose};
use vibrissa_contact::{find_contacts, ContactSolver};
use vibrissa_math::Vec3;
use vibrissa_rigid::{semi_implicit_euler, update_kinematics, ArticulatedFactor};
use vibrissa_whisker::{RatHead, Whisker, WhiskerArray, WhiskerId};
use vibrissa_world::{
    FrameRecord, HeadTrajectory, TrajectoryBoundary, WhiskingDriver, WhiskingMode, WhiskingTarget,
    WhiskingTrajectory,
};

use crate::{Parameters, Result, SimulationContext, VibrissaError};

/// ω·dt above which a bending joint is stiffer than the substep resolves.
const STIFF_JOINT: f64 = 2.0;

/// The collision object as seen during one substep.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRef<'a> {
    pub environment: &'a CollisionEnvironment,
    pub pose: &'a ObjectPose,
}

/// Pluggable per-whisker substep.
///
/// Implementations advance one whisker by `dt` and report which of its
/// links touch the object.
pub trait Solver: Send + Sync {
    fn step(&self, whisker: &mut Whisker, object: Option<ObjectRef<'_>>, dt: f64) -> Vec<bool>;
}

/// Semi-implicit Euler on ABA accelerations with PGS contact resolution.
#[derive(Debug, Clone, Default)]
pub struct SemiImplicitEulerSolver {
    pub contact: ContactSolver,
}

impl Solver for SemiImplicitEulerSolver {
    fn step(&self, whisker: &mut Whisker, object: Option<ObjectRef<'_>>, dt: f64) -> Vec<bool> {
        let mut flags = vec![false; whisker.num_links()];
        let margin = self.contact.material.margin;

        if whisker.is_kinematic() {
            // Massless whiskers pass through the object; contacts are only reported.
            whisker.step_kinematic(dt);
            if let Some(obj) = object {
                for c in find_contacts(whisker, obj.environment, obj.pose, margin) {
                    flags[c.link] |= c.depth > 0.0;
                }
            }
            return flags;
        }

        let contacts = object
            .map(|obj| find_contacts(whisker, obj.environment, obj.pose, margin))
            .unwrap_or_default();

        let (model, state) = whisker.parts_mut();
        let factor = ArticulatedFactor::new(model, state, dt, None);
        let qdd = if contacts.is_empty() {
            factor.qdd().clone()
        } else {
            let solution = self.contact.solve(model, state, &factor, &contacts, dt);
            for (j, c) in contacts.iter().enumerate() {
                flags[c.link] |= solution.is_loaded(j) || c.depth > 0.0;
            }
            solution.qdd
        };

        semi_implicit_euler(state, &qdd, dt);
        update_kinematics(model, state);
        flags
    }
}

/// Where the head is over the run.
#[derive(Debug, Clone)]
pub enum HeadMotion {
    Static(RatHead),
    /// Exploring: the head follows a trajectory (poses only, no velocity).
    Trajectory(HeadTrajectory),
}

impl HeadMotion {
    pub fn pose_at(&self, t: f64) -> (RatHead, TrajectoryBoundary) {
        match self {
            HeadMotion::Static(head) => (*head, TrajectoryBoundary::Within),
            HeadMotion::Trajectory(trajectory) => trajectory.pose_at(t),
        }
    }

    fn is_moving(&self) -> bool {
        matches!(self, HeadMotion::Trajectory(_))
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Terminated,
    Failed { last_valid_frame: u64 },
}

/// Counters and the latest contact set.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    /// Seconds, derived from `substep`.
    pub time: f64,
    /// Completed frames.
    pub frame: u64,
    /// Completed substeps.
    pub substep: u64,
    /// Contact flags per whisker and link after the latest substep.
    pub contacts: Vec<Vec<bool>>,
}

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub substeps: u64,
    pub time: f64,
    pub status: RunStatus,
}

pub struct Simulation {
    context: SimulationContext,
    array: WhiskerArray,
    environment: CollisionEnvironment,
    driver: WhiskingDriver,
    head: HeadMotion,
    solver: Box<dyn Solver>,
    state: SimulationState,
    status: RunStatus,
    whisking_held: bool,
    head_held: bool,
}

impl Simulation {
    /// Assemble a run from its parts and seat every whisker at t = 0.
    pub fn new(
        context: SimulationContext,
        array: WhiskerArray,
        environment: CollisionEnvironment,
        driver: WhiskingDriver,
        head: HeadMotion,
    ) -> Self {
        let solver = Box::new(SemiImplicitEulerSolver {
            contact: context.contact.clone(),
        });
        let mut sim = Self {
            context,
            array,
            environment,
            driver,
            head,
            solver,
            state: SimulationState::default(),
            status: RunStatus::Running,
            whisking_held: false,
            head_held: false,
        };
        sim.initialize();
        sim
    }

    /// Build every component from `params`, loading the files it names.
    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        params.validate()?;
        let context = SimulationContext::from_parameters(params);
        let array = params
            .whisker_factory()
            .build(&params.whisker_names, &params.whisker_index)?;
        let environment = CollisionEnvironment::new(params.object_spec()?)?;

        let trajectory = match &params.dir_param_bp_angles {
            Some(path) => Some(WhiskingTrajectory::from_csv_file(path)?),
            None if params.active => {
                let w = &params.whisking;
                info!(
                    amplitude = w.amplitude,
                    frequency = w.frequency,
                    "no whisking trajectory given, whisking sinusoidally"
                );
                Some(WhiskingTrajectory::sinusoid(
                    &params.whisker_names,
                    w.amplitude,
                    w.frequency,
                    w.offset,
                    params.time_stop,
                    context.substep_dt(),
                )?)
            }
            None => None,
        };
        let driver =
            WhiskingDriver::new(WhiskingMode::from_flag(params.active), trajectory, &array)?;

        let head = match (&params.head_trajectory, params.exploring) {
            (Some(path), true) => HeadMotion::Trajectory(HeadTrajectory::from_csv_file(path)?),
            (None, true) => {
                warn!("exploring without a head trajectory, the head stays put");
                HeadMotion::Static(params.rat_head())
            }
            (_, false) => HeadMotion::Static(params.rat_head()),
        };

        Ok(Self::new(context, array, environment, driver, head))
    }

    /// Replace the per-whisker solver.
    pub fn with_solver(mut self, solver: Box<dyn Solver>) -> Self {
        self.solver = solver;
        self
    }

    fn initialize(&mut self) {
        let (head, _) = self.head.pose_at(0.0);
        let dt = self.context.substep_dt();
        for (i, whisker) in self.array.whiskers_mut().iter_mut().enumerate() {
            let id = WhiskerId(i);
            whisker.set_head(&head);
            if let Some(angle) = self.driver.initial_angle(id) {
                whisker.set_initial_base_angle(angle);
            }
            if self.driver.is_active() {
                whisker.engage_servo(
                    self.context.servo_frequency,
                    self.context.servo_damping_ratio,
                );
                if let Some(target) = self.driver.target(id, 0.0) {
                    whisker.set_base_target(target.angle);
                }
            }

            let omega_dt = stiffest_joint(whisker) * dt;
            if omega_dt > STIFF_JOINT {
                warn!(
                    whisker = whisker.name(),
                    omega_dt,
                    "bending joints are stiffer than the substep resolves; \
                     implicit drives will overdamp them"
                );
            }
        }

        self.state.contacts = self
            .array
            .whiskers()
            .iter()
            .map(|w| vec![false; w.num_links()])
            .collect();
        if self.context.total_frames() == 0 {
            self.status = RunStatus::Terminated;
        }
        info!(
            whiskers = self.array.len(),
            object = ?self.environment.kind(),
            mode = ?self.driver.mode(),
            frames = self.context.total_frames(),
            substeps_per_frame = self.context.num_step_int,
            "simulation ready"
        );
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn array(&self) -> &WhiskerArray {
        &self.array
    }

    /// Mutable access to the whiskers between frames.
    pub fn array_mut(&mut self) -> &mut WhiskerArray {
        &mut self.array
    }

    pub fn environment(&self) -> &CollisionEnvironment {
        &self.environment
    }

    pub fn driver(&self) -> &WhiskingDriver {
        &self.driver
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn time(&self) -> f64 {
        self.state.time
    }

    /// Advance one output frame. A finished or failed run is left as is.
    pub fn step_frame(&mut self) -> Result<RunStatus> {
        if self.status != RunStatus::Running {
            return Ok(self.status);
        }
        for _ in 0..self.context.num_step_int {
            self.substep()?;
        }
        self.state.frame += 1;
        debug!(frame = self.state.frame, time = self.state.time, "frame done");

        if self.state.frame >= self.context.total_frames() {
            self.status = RunStatus::Terminated;
            info!(
                frames = self.state.frame,
                substeps = self.state.substep,
                time = self.state.time,
                "run finished"
            );
        }
        Ok(self.status)
    }

    fn substep(&mut self) -> Result<()> {
        let t = self.state.time;
        let dt = self.context.substep_dt();

        let (head, head_boundary) = self.head.pose_at(t);
        if head_boundary == TrajectoryBoundary::HeldLast && !self.head_held {
            warn!(time = t, "head trajectory ended, holding its last pose");
            self.head_held = true;
        }
        let moving_head = self.head.is_moving();

        let targets: Vec<Option<WhiskingTarget>> = (0..self.array.len())
            .map(|i| self.driver.target(WhiskerId(i), t))
            .collect();
        if !self.whisking_held
            && targets
                .iter()
                .flatten()
                .any(|target| target.boundary == TrajectoryBoundary::HeldLast)
        {
            warn!(time = t, "whisking trajectory ended, holding the last angles");
            self.whisking_held = true;
        }

        let pose = self.environment.pose_at(t);
        let object = pose.as_ref().map(|pose| ObjectRef {
            environment: &self.environment,
            pose,
        });
        let solver = self.solver.as_ref();
        let advance = |(i, whisker): (usize, &mut Whisker)| -> Vec<bool> {
            if let Some(target) = targets[i] {
                whisker.set_base_target(target.angle);
            }
            if moving_head {
                whisker.set_head(&head);
            }
            solver.step(whisker, object, dt)
        };

        #[cfg(feature = "parallel")]
        let contacts: Vec<Vec<bool>> = {
            use rayon::prelude::*;
            self.array
                .whiskers_mut()
                .par_iter_mut()
                .enumerate()
                .map(advance)
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let contacts: Vec<Vec<bool>> = self
            .array
            .whiskers_mut()
            .iter_mut()
            .enumerate()
            .map(advance)
            .collect();

        self.state.substep += 1;
        self.state.time = self.context.time_at(self.state.substep);

        if let Some(bad) = self.array.whiskers().iter().find(|w| !w.state().is_finite()) {
            let last_valid_frame = self.state.frame;
            self.status = RunStatus::Failed { last_valid_frame };
            error!(
                whisker = bad.name(),
                time = self.state.time,
                last_valid_frame,
                "simulation diverged"
            );
            return Err(VibrissaError::SimulationDivergence {
                last_valid_frame,
                whisker: bad.name().to_string(),
                time: self.state.time,
            });
        }
        self.state.contacts = contacts;
        Ok(())
    }

    /// Run until termination, handing each finished frame to `observer`.
    pub fn run<F: FnMut(&FrameRecord)>(&mut self, observer: F) -> Result<RunSummary> {
        self.run_for(u64::MAX, observer)
    }

    /// Like [`Simulation::run`], stopping after at most `max_frames` frames.
    pub fn run_for<F: FnMut(&FrameRecord)>(
        &mut self,
        max_frames: u64,
        mut observer: F,
    ) -> Result<RunSummary> {
        let mut frames = 0;
        while self.status == RunStatus::Running && frames < max_frames {
            self.step_frame()?;
            observer(&self.frame_record());
            frames += 1;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.state.frame,
            substeps: self.state.substep,
            time: self.state.time,
            status: self.status,
        }
    }

    /// Snapshot of every link at the current time.
    pub fn frame_record(&self) -> FrameRecord {
        FrameRecord::capture(
            self.state.frame,
            self.state.time,
            &self.array,
            &self.state.contacts,
        )
    }

    /// Kinetic energy of each whisker, in array order.
    pub fn kinetic_energies(&self) -> Vec<(String, f64)> {
        self.array
            .whiskers()
            .iter()
            .map(|w| (w.name().to_string(), w.kinetic_energy()))
            .collect()
    }
}

/// Largest undamped natural frequency of the bending joints, sqrt(k / J)
/// with J the link inertia about its proximal joint.
fn stiffest_joint(whisker: &Whisker) -> f64 {
    whisker
        .profile()
        .links()
        .iter()
        .skip(1)
        .filter_map(|link| {
            let j = link.inertia.moment_about_origin(&Vec3::z());
            (j > 0.0).then(|| (link.stiffness / j).sqrt())
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vibrissa_collision::ObjectSpec;
    use vibrissa_whisker::{MaterialParams, WhiskerFactory};

    fn short_context() -> SimulationContext {
        SimulationContext {
            time_step: 0.01,
            num_step_int: 100,
            time_stop: 0.03,
            ..SimulationContext::default()
        }
    }

    fn array(names: &[&str], indices: &[usize]) -> WhiskerArray {
        WhiskerFactory::new(6, MaterialParams::default())
            .build(names, indices)
            .unwrap()
    }

    fn passive(context: SimulationContext, array: WhiskerArray) -> Simulation {
        let driver = WhiskingDriver::passive(&array);
        Simulation::new(
            context,
            array,
            CollisionEnvironment::none(),
            driver,
            HeadMotion::Static(RatHead::default()),
        )
    }

    #[test]
    fn test_frames_and_time() {
        let mut sim = passive(short_context(), array(&["LA0"], &[0]));
        assert_eq!(sim.step_frame().unwrap(), RunStatus::Running);
        assert_eq!(sim.state().substep, 100);
        assert_relative_eq!(sim.time(), 0.01, epsilon = 1e-15);

        let summary = sim.run(|_| {}).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.substeps, 300);
        assert_eq!(summary.status, RunStatus::Terminated);
        assert_relative_eq!(summary.time, 0.03, epsilon = 1e-15);

        // Finished runs do not advance.
        assert_eq!(sim.step_frame().unwrap(), RunStatus::Terminated);
        assert_eq!(sim.state().substep, 300);
    }

    #[test]
    fn test_observer_sees_every_frame() {
        let mut sim = passive(short_context(), array(&["LA0", "RA0"], &[0, 0]));
        let mut seen = Vec::new();
        sim.run(|f| seen.push((f.frame, f.whiskers.len()))).unwrap();
        assert_eq!(seen, vec![(1, 2), (2, 2), (3, 2)]);
    }

    #[test]
    fn test_active_whisking_tracks_target() {
        let array = array(&["LA0"], &[0]);
        let traj = WhiskingTrajectory::from_csv_str("time,LA0\n0,0\n0.005,0.2\n").unwrap();
        let driver = WhiskingDriver::new(WhiskingMode::Active, Some(traj), &array).unwrap();
        let context = SimulationContext {
            time_stop: 0.1,
            ..short_context()
        };
        let mut sim = Simulation::new(
            context,
            array,
            CollisionEnvironment::none(),
            driver,
            HeadMotion::Static(RatHead::default()),
        );
        sim.run(|_| {}).unwrap();
        let angle = sim.array().whiskers()[0].base_angle();
        assert_relative_eq!(angle, 0.2, epsilon = 1e-2);
    }

    #[test]
    fn test_wall_contact_is_flagged() {
        let array = array(&["LC1"], &[13]);
        let whisker = &array.whiskers()[0];
        let base = whisker.link(0).unwrap().position;
        let chord = whisker.tip() - base;
        let environment = CollisionEnvironment::new(ObjectSpec::Wall {
            point: base + chord * 0.8,
            normal: -chord,
        })
        .unwrap();
        let driver = WhiskingDriver::passive(&array);
        let mut sim = Simulation::new(
            short_context(),
            array,
            environment,
            driver,
            HeadMotion::Static(RatHead::default()),
        );
        sim.step_frame().unwrap();
        let flags = &sim.state().contacts[0];
        assert!(flags.iter().any(|f| *f));
        assert!(!flags[0]);
        assert!(sim.array().whiskers()[0].state().is_finite());
    }

    #[test]
    fn test_divergence_stops_the_run() {
        let mut sim = passive(short_context(), array(&["LA0", "RC1"], &[0, 13]));
        sim.step_frame().unwrap();
        sim.array_mut().whiskers_mut()[1].state_mut().v[2] = f64::NAN;

        match sim.step_frame() {
            Err(VibrissaError::SimulationDivergence {
                last_valid_frame,
                whisker,
                ..
            }) => {
                assert_eq!(last_valid_frame, 1);
                assert_eq!(whisker, "RC1");
            }
            other => panic!("expected divergence, got {other:?}"),
        }
        assert_eq!(sim.status(), RunStatus::Failed { last_valid_frame: 1 });
        let substeps = sim.state().substep;
        assert_eq!(sim.step_frame().unwrap(), RunStatus::Failed { last_valid_frame: 1 });
        assert_eq!(sim.state().substep, substeps);
    }
}
