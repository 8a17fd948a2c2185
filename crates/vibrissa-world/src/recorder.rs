//! Per-frame recording of link poses and contact flags.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vibrissa_math::Quat;
use vibrissa_whisker::{Link, WhiskerArray};

use crate::RecordError;

/// World pose and velocity of one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub position: [f64; 3],
    /// Unit quaternion `[w, x, y, z]`, `w >= 0`.
    pub orientation: [f64; 4],
    pub linear_velocity: [f64; 3],
    pub angular_velocity: [f64; 3],
}

impl From<&Link> for LinkRecord {
    fn from(link: &Link) -> Self {
        Self {
            position: link.position.into(),
            orientation: Quat::from_matrix(&link.orientation).to_array(),
            linear_velocity: link.linear_velocity.into(),
            angular_velocity: link.angular_velocity.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiskerRecord {
    pub name: String,
    pub links: Vec<LinkRecord>,
    /// One flag per link, set while the link touches the object.
    pub contacts: Vec<bool>,
}

/// Snapshot of the whole array at the end of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame: u64,
    pub time: f64,
    pub whiskers: Vec<WhiskerRecord>,
}

impl FrameRecord {
    /// Capture `array` from its cached kinematics.
    ///
    /// `contacts[w][l]` flags link `l` of whisker `w`; missing entries are
    /// recorded as no contact.
    pub fn capture(frame: u64, time: f64, array: &WhiskerArray, contacts: &[Vec<bool>]) -> Self {
        let whiskers = array
            .whiskers()
            .iter()
            .enumerate()
            .map(|(w, whisker)| {
                let links: Vec<LinkRecord> =
                    whisker.links().map(|l| LinkRecord::from(&l)).collect();
                let flags = contacts.get(w);
                let contacts = (0..links.len())
                    .map(|l| flags.and_then(|f| f.get(l)).copied().unwrap_or(false))
                    .collect();
                WhiskerRecord {
                    name: whisker.name().to_string(),
                    links,
                    contacts,
                }
            })
            .collect();
        Self {
            frame,
            time,
            whiskers,
        }
    }
}

/// Accumulates frame records for export.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    frames: Vec<FrameRecord>,
}

/// Summary of a recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingStats {
    pub frames: usize,
    pub whiskers: usize,
    pub links: usize,
    /// Simulated time covered (seconds).
    pub duration: f64,
    /// Frames in which at least one link touched the object.
    pub contact_frames: usize,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, frame: FrameRecord) {
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn last(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn stats(&self) -> RecordingStats {
        let (Some(first), Some(last)) = (self.frames.first(), self.frames.last()) else {
            return RecordingStats::default();
        };
        RecordingStats {
            frames: self.frames.len(),
            whiskers: first.whiskers.len(),
            links: first.whiskers.iter().map(|w| w.links.len()).sum(),
            duration: last.time - first.time,
            contact_frames: self
                .frames
                .iter()
                .filter(|f| f.whiskers.iter().any(|w| w.contacts.iter().any(|c| *c)))
                .count(),
        }
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(&self.frames)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), RecordError> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json).map_err(|source| RecordError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}
