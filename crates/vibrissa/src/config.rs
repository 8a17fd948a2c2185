//! Run configuration.
//!
//! [`Parameters`] is the flat option table of a whisker run.
//! Keys are snake_case; the upper-case spellings of the legacy table
//! (`TIME_STEP`, `WHISKER_NAMES`, `E`, ...) are accepted as aliases, and
//! boolean switches may be given as `0`/`1`. Keys that only concern
//! rendering (camera placement and the like) are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use vibrissa_collision::{ObjectKind, ObjectSpec, PrismShape};
use vibrissa_contact::{ContactMaterial, ContactSolver};
use vibrissa_math::{rotation_from_ypr, Vec3};
use vibrissa_whisker::{MaterialParams, RatHead, WhiskerFactory};

use crate::{assets, Result, VibrissaError};

/// Sinusoidal whisking used when active whisking has no trajectory file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinusoidSettings {
    /// Radians.
    pub amplitude: f64,
    /// Hz.
    pub frequency: f64,
    /// Radians.
    pub offset: f64,
}

impl Default for SinusoidSettings {
    fn default() -> Self {
        Self {
            amplitude: 0.35,
            frequency: 8.0,
            offset: 0.0,
        }
    }
}

/// Contact solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSettings {
    pub friction: f64,
    pub bounce: f64,
    pub soft_cfm: f64,
    pub soft_erp: f64,
    /// mm
    pub margin: f64,
    /// mm/s
    pub max_correcting_vel: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for ContactSettings {
    fn default() -> Self {
        let material = ContactMaterial::default();
        let solver = ContactSolver::default();
        Self {
            friction: material.friction,
            bounce: material.bounce,
            soft_cfm: material.soft_cfm,
            soft_erp: material.soft_erp,
            margin: material.margin,
            max_correcting_vel: material.max_correcting_vel,
            max_iterations: solver.max_iterations,
            tolerance: solver.tolerance,
        }
    }
}

impl ContactSettings {
    pub fn solver(&self) -> ContactSolver {
        ContactSolver {
            material: ContactMaterial {
                friction: self.friction,
                bounce: self.bounce,
                soft_cfm: self.soft_cfm,
                soft_erp: self.soft_erp,
                margin: self.margin,
                max_correcting_vel: self.max_correcting_vel,
            },
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}

/// Every option of a run. Lengths in mm, angles in radians unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Output frame period (s).
    #[serde(alias = "TIME_STEP")]
    pub time_step: f64,
    /// Integration substeps per frame.
    #[serde(alias = "NUM_STEP_INT")]
    pub num_step_int: u32,
    #[serde(alias = "TIME_STOP")]
    pub time_stop: f64,
    /// 0 none, 1 peg, 2 wall, 3 scanned mesh, 4 prism.
    #[serde(alias = "OBJECT")]
    pub object: u8,

    #[serde(alias = "WHISKER_NAMES")]
    pub whisker_names: Vec<String>,
    #[serde(alias = "WHISKER_INDEX")]
    pub whisker_index: Vec<usize>,
    #[serde(alias = "BLOW")]
    pub blow: f64,
    #[serde(alias = "NO_CURVATURE", deserialize_with = "flag")]
    pub no_curvature: bool,
    #[serde(alias = "NO_MASS", deserialize_with = "flag")]
    pub no_mass: bool,
    #[serde(alias = "NO_WHISKERS", deserialize_with = "flag")]
    pub no_whiskers: bool,
    #[serde(alias = "NUM_LINKS")]
    pub num_links: usize,
    /// kg/m³
    #[serde(alias = "RHO_BASE")]
    pub rho_base: f64,
    /// kg/m³
    #[serde(alias = "RHO_TIP")]
    pub rho_tip: f64,
    /// Young's modulus at the base (Pa).
    #[serde(alias = "E")]
    pub youngs: f64,
    /// Young's modulus at the tip (Pa); the base value when unset.
    #[serde(alias = "E_TIP")]
    pub youngs_tip: Option<f64>,
    #[serde(alias = "ZETA")]
    pub zeta: f64,

    #[serde(alias = "ACTIVE", deserialize_with = "flag")]
    pub active: bool,
    /// Whisking trajectory (`time,<names...>`).
    #[serde(alias = "param_bp_angles")]
    pub dir_param_bp_angles: Option<PathBuf>,
    pub whisking: SinusoidSettings,
    pub servo_frequency: f64,
    pub servo_damping_ratio: f64,

    #[serde(alias = "EXPLORING", deserialize_with = "flag")]
    pub exploring: bool,
    /// Head trajectory (`time,x,y,z,yaw,pitch,roll`) for exploring runs.
    pub head_trajectory: Option<PathBuf>,
    #[serde(alias = "RATHEAD_LOC")]
    pub rathead_loc: [f64; 3],
    /// `[yaw, pitch, roll]`
    #[serde(alias = "RATHEAD_ORIENT")]
    pub rathead_orient: [f64; 3],

    #[serde(alias = "PEG_LOC")]
    pub peg_loc: [f64; 3],
    /// mm/s
    #[serde(alias = "PEG_SPEED")]
    pub peg_speed: f64,
    pub peg_direction: [f64; 3],
    pub peg_radius: f64,
    pub peg_height: f64,

    pub wall_point: [f64; 3],
    pub wall_normal: [f64; 3],

    /// Scanned environment mesh (Wavefront OBJ).
    pub file_env: Option<PathBuf>,
    pub env_position: [f64; 3],
    pub env_orient: [f64; 3],

    /// Prism mesh (Wavefront OBJ), placed at `prism_position`.
    pub file_prism: Option<PathBuf>,
    /// Box used when no prism mesh is given.
    pub prism_half_extents: [f64; 3],
    pub prism_position: [f64; 3],
    pub prism_orient: [f64; 3],

    /// mm/s²
    pub gravity: [f64; 3],
    pub contact: ContactSettings,

    pub dir_out: PathBuf,
    pub file_video: Option<PathBuf>,
    /// 0 quiet, 1 per-frame progress, 2 also per-frame kinematics.
    #[serde(alias = "PRINT")]
    pub print: u8,
    #[serde(alias = "SAVE", deserialize_with = "flag")]
    pub save: bool,
    #[serde(alias = "SAVE_VIDEO", deserialize_with = "flag")]
    pub save_video: bool,
    #[serde(alias = "DEBUG", deserialize_with = "flag")]
    pub debug: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            num_step_int: 100,
            time_stop: 5.0,
            object: ObjectKind::Prism.code(),
            whisker_names: ["LA0", "RA0", "LC1", "RC1"].map(String::from).to_vec(),
            whisker_index: vec![0, 0, 13, 13],
            blow: 1.0,
            no_curvature: false,
            no_mass: false,
            no_whiskers: false,
            num_links: 20,
            rho_base: 1260.0,
            rho_tip: 1690.0,
            youngs: 5e9,
            youngs_tip: None,
            zeta: 0.32,
            active: true,
            dir_param_bp_angles: None,
            whisking: SinusoidSettings::default(),
            servo_frequency: 600.0,
            servo_damping_ratio: 1.0,
            exploring: false,
            head_trajectory: None,
            rathead_loc: [0.0; 3],
            rathead_orient: [0.0; 3],
            peg_loc: [10.0, 10.0, 0.0],
            peg_speed: 10.0,
            peg_direction: [-1.0, 0.0, 0.0],
            peg_radius: 0.5,
            peg_height: 60.0,
            wall_point: [0.0, 30.0, 0.0],
            wall_normal: [0.0, -1.0, 0.0],
            file_env: None,
            env_position: [0.0; 3],
            env_orient: [0.0; 3],
            file_prism: None,
            prism_half_extents: [0.5; 3],
            prism_position: [15.0, 15.0, 0.0],
            prism_orient: [0.0; 3],
            gravity: [0.0, 0.0, -vibrissa_math::units::GRAVITY_MM],
            contact: ContactSettings::default(),
            dir_out: PathBuf::from("output"),
            file_video: None,
            print: 0,
            save: true,
            save_video: false,
            debug: false,
        }
    }
}

/// Accepts `true`/`false` as well as the integer switches of the legacy
/// table.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

fn vec3(v: [f64; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

impl Parameters {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load from a JSON file. Relative asset paths are taken relative to
    /// the file's directory.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VibrissaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut params = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            params.resolve_paths(base);
        }
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.dir_param_bp_angles,
            &mut self.head_trajectory,
            &mut self.file_env,
            &mut self.file_prism,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Reject values no run can start from.
    pub fn validate(&self) -> Result<()> {
        positive("time_step", self.time_step)?;
        if self.num_step_int == 0 {
            return Err(VibrissaError::parameter("num_step_int", "must be at least 1"));
        }
        non_negative("time_stop", self.time_stop)?;
        if ObjectKind::from_code(self.object).is_none() {
            return Err(VibrissaError::parameter(
                "object",
                format!("unknown object code {}, expected 0-4", self.object),
            ));
        }
        positive("blow", self.blow)?;
        positive("rho_base", self.rho_base)?;
        positive("rho_tip", self.rho_tip)?;
        positive("youngs", self.youngs)?;
        if let Some(e) = self.youngs_tip {
            positive("youngs_tip", e)?;
        }
        non_negative("zeta", self.zeta)?;
        positive("servo_frequency", self.servo_frequency)?;
        non_negative("servo_damping_ratio", self.servo_damping_ratio)?;
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(VibrissaError::parameter("gravity", "must be finite"));
        }

        let c = &self.contact;
        non_negative("contact.friction", c.friction)?;
        unit_interval("contact.bounce", c.bounce)?;
        unit_interval("contact.soft_erp", c.soft_erp)?;
        non_negative("contact.soft_cfm", c.soft_cfm)?;
        non_negative("contact.margin", c.margin)?;
        positive("contact.max_correcting_vel", c.max_correcting_vel)?;
        positive("contact.tolerance", c.tolerance)?;
        if c.max_iterations == 0 {
            return Err(VibrissaError::parameter(
                "contact.max_iterations",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn object_kind(&self) -> ObjectKind {
        ObjectKind::from_code(self.object).unwrap_or(ObjectKind::None)
    }

    pub fn material(&self) -> MaterialParams {
        MaterialParams {
            rho_base: self.rho_base,
            rho_tip: self.rho_tip,
            youngs_base: self.youngs,
            youngs_tip: self.youngs_tip,
            zeta: self.zeta,
            no_curvature: self.no_curvature,
            no_mass: self.no_mass,
        }
    }

    pub fn whisker_factory(&self) -> WhiskerFactory {
        WhiskerFactory::new(self.num_links, self.material())
            .blow(self.blow)
            .no_whiskers(self.no_whiskers)
            .gravity(vec3(self.gravity))
    }

    /// Static head pose from `rathead_loc` / `rathead_orient`.
    pub fn rat_head(&self) -> RatHead {
        RatHead::from_ypr(self.rathead_loc, self.rathead_orient)
    }

    /// Collision object description, loading any mesh it needs.
    pub fn object_spec(&self) -> Result<ObjectSpec> {
        Ok(match self.object_kind() {
            ObjectKind::None => ObjectSpec::None,
            ObjectKind::Peg => ObjectSpec::Peg {
                location: vec3(self.peg_loc),
                direction: vec3(self.peg_direction),
                speed: self.peg_speed,
                radius: self.peg_radius,
                height: self.peg_height,
            },
            ObjectKind::Wall => ObjectSpec::Wall {
                point: vec3(self.wall_point),
                normal: vec3(self.wall_normal),
            },
            ObjectKind::ScannedMesh => {
                let path = self.file_env.as_ref().ok_or_else(|| {
                    VibrissaError::parameter("file_env", "required for a scanned-mesh object")
                })?;
                let [yaw, pitch, roll] = self.env_orient;
                ObjectSpec::ScannedMesh {
                    mesh: assets::load_obj(path)?,
                    position: vec3(self.env_position),
                    orientation: rotation_from_ypr(yaw, pitch, roll),
                }
            }
            ObjectKind::Prism => {
                let shape = match &self.file_prism {
                    Some(path) => PrismShape::Mesh(assets::load_obj(path)?),
                    None => PrismShape::Box {
                        half_extents: vec3(self.prism_half_extents),
                    },
                };
                let [yaw, pitch, roll] = self.prism_orient;
                ObjectSpec::Prism {
                    shape,
                    position: vec3(self.prism_position),
                    orientation: rotation_from_ypr(yaw, pitch, roll),
                }
            }
        })
    }
}

fn positive(key: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VibrissaError::parameter(key, format!("must be positive, got {value}")))
    }
}

fn non_negative(key: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(VibrissaError::parameter(key, format!("must be non-negative, got {value}")))
    }
}

fn unit_interval(key: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(VibrissaError::parameter(key, format!("must lie in [0, 1], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let p = Parameters::default();
        p.validate().unwrap();
        assert_eq!(p.num_links, 20);
        assert_eq!(p.whisker_index, vec![0, 0, 13, 13]);
        assert_eq!(p.object_kind(), ObjectKind::Prism);
    }

    #[test]
    fn test_upper_case_aliases_and_int_flags() {
        let p = Parameters::from_json_str(
            r#"{
                "TIME_STEP": 0.02,
                "NUM_STEP_INT": 50,
                "OBJECT": 1,
                "WHISKER_NAMES": ["LA0"],
                "WHISKER_INDEX": [0],
                "NO_CURVATURE": 1,
                "ACTIVE": 0,
                "E": 3e9,
                "PEG_LOC": [1, 2, 3],
                "CPITCH": -89
            }"#,
        )
        .unwrap();
        assert_eq!(p.time_step, 0.02);
        assert_eq!(p.num_step_int, 50);
        assert_eq!(p.object_kind(), ObjectKind::Peg);
        assert!(p.no_curvature);
        assert!(!p.active);
        assert_eq!(p.youngs, 3e9);
        assert_eq!(p.peg_loc, [1.0, 2.0, 3.0]);
        // Untouched keys keep their defaults.
        assert_eq!(p.num_links, 20);
    }

    #[test]
    fn test_snake_case_keys() {
        let p = Parameters::from_json_str(r#"{"time_stop": 1.5, "no_mass": true}"#).unwrap();
        assert_eq!(p.time_stop, 1.5);
        assert!(p.no_mass);
    }

    #[test]
    fn test_validation_errors() {
        let bad = |json: &str| Parameters::from_json_str(json).unwrap_err();
        assert!(matches!(
            bad(r#"{"TIME_STEP": 0}"#),
            VibrissaError::Parameter { key: "time_step", .. }
        ));
        assert!(matches!(
            bad(r#"{"OBJECT": 7}"#),
            VibrissaError::Parameter { key: "object", .. }
        ));
        // Array layout errors belong to the whisker factory.
        let mismatch = r#"{"WHISKER_NAMES": ["LA0"], "WHISKER_INDEX": [0, 1]}"#;
        assert!(Parameters::from_json_str(mismatch).is_ok());
        assert!(Parameters::from_json_str(r#"{"NUM_LINKS": 1}"#).is_ok());
        assert!(matches!(bad("{ not json"), VibrissaError::ConfigFormat(_)));
    }

    #[test]
    fn test_defaults_reload_from_json() {
        let json = Parameters::default().to_json().unwrap();
        let p = Parameters::from_json_str(&json).unwrap();
        let d = Parameters::default();
        assert_eq!(p.whisker_names, d.whisker_names);
        assert_eq!(p.whisker_index, d.whisker_index);
        assert_eq!(p.num_step_int, d.num_step_int);
        assert_eq!(p.object, d.object);
        assert_eq!(p.active, d.active);
        assert_eq!(p.dir_param_bp_angles, None);
    }

    #[test]
    fn test_object_specs() {
        let mut p = Parameters {
            object: 2,
            ..Parameters::default()
        };
        assert!(matches!(p.object_spec().unwrap(), ObjectSpec::Wall { .. }));
        p.object = 4;
        assert!(matches!(
            p.object_spec().unwrap(),
            ObjectSpec::Prism {
                shape: PrismShape::Box { .. },
                ..
            }
        ));
        p.object = 3;
        assert!(matches!(
            p.object_spec(),
            Err(VibrissaError::Parameter { key: "file_env", .. })
        ));
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let dir = std::env::temp_dir().join("vibrissa_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("run.json");
        std::fs::write(&file, r#"{"dir_param_bp_angles": "angles.csv", "ACTIVE": 1}"#).unwrap();
        let p = Parameters::from_json_file(&file).unwrap();
        assert_eq!(p.dir_param_bp_angles, Some(dir.join("angles.csv")));
        std::fs::remove_file(&file).ok();
    }
}
