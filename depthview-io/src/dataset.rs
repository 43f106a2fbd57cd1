//! Recorded RGB-D datasets.
//!
//! A dataset directory holds `state.txt` (`pose_count width height`),
//! `calibration.txt` (`cx cy fx fy`) and, per frame, `NNNNNNNN.pose`,
//! `NNNNNNNN.jpg` and `NNNNNNNN.pcl`. Each pose file has one line per camera:
//! `name tx ty tz qx qy qz qw`.

use crate::IoError;
use depthview_core::{Intrinsics, Pose, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which device a pose belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraKind {
    Color,
    Depth,
}

impl CameraKind {
    pub fn name(&self) -> &'static str {
        match self {
            CameraKind::Color => "color",
            CameraKind::Depth => "depth",
        }
    }
}

impl fmt::Display for CameraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CameraKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "color" => Ok(CameraKind::Color),
            "depth" => Ok(CameraKind::Depth),
            other => Err(format!("unknown camera '{}'", other)),
        }
    }
}

/// Contents of `state.txt`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetState {
    pub pose_count: usize,
    /// Output resolution
    pub width: u32,
    pub height: u32,
}

/// An opened dataset directory
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    state: DatasetState,
    calibration: Intrinsics,
}

impl Dataset {
    /// Read the state and calibration of the dataset at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state_path = path.join("state.txt");
        let [pose_count, width, height] = read_values::<u32, 3>(&state_path)?;
        let state = DatasetState {
            pose_count: pose_count as usize,
            width,
            height,
        };

        let [cx, cy, fx, fy] = read_values::<f32, 4>(&path.join("calibration.txt"))?;
        let calibration = Intrinsics::new(cx, cy, fx, fy);

        debug!("opened dataset {}: {:?}, {:?}", path.display(), state, calibration);
        Ok(Self {
            path,
            state,
            calibration,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> DatasetState {
        self.state
    }

    pub fn calibration(&self) -> Intrinsics {
        self.calibration
    }

    /// Number of recorded frames
    pub fn frame_count(&self) -> usize {
        self.state.pose_count
    }

    /// Path of a per-frame file; `extension` includes the dot, e.g. `".jpg"`
    pub fn file_name(&self, index: usize, extension: &str) -> PathBuf {
        self.path.join(format!("{:08}{}", index, extension))
    }

    /// Pose of one camera at frame `index`
    pub fn pose(&self, index: usize, kind: CameraKind) -> Result<Pose> {
        let path = self.file_name(index, ".pose");
        let text = read_text(&path)?;

        for (number, line) in text.lines().enumerate() {
            let mut fields = line.split_whitespace();
            if fields.next() != Some(kind.name()) {
                continue;
            }
            let values: [f64; 7] = parse_fields(fields, &path, number + 1)?;
            let [tx, ty, tz, qx, qy, qz, qw] = values;
            return Ok(Pose {
                translation: [tx, ty, tz],
                orientation: [qx, qy, qz, qw],
            });
        }

        Err(IoError::Parse {
            path: path.display().to_string(),
            line: 0,
            message: format!("no pose for camera '{}'", kind),
        }
        .into())
    }

    /// A cursor over every frame, starting at the last one
    pub fn cursor(&self) -> FrameCursor {
        FrameCursor::new(self.frame_count(), self.frame_count().saturating_sub(1))
    }
}

/// Position in the frame sequence that wraps at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCursor {
    index: usize,
    count: usize,
}

impl FrameCursor {
    pub fn new(count: usize, index: usize) -> Self {
        Self {
            index: if count == 0 { 0 } else { index % count },
            count,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Step forward, wrapping to the first frame
    pub fn next(&mut self) -> usize {
        if self.count > 0 {
            self.index = (self.index + 1) % self.count;
        }
        self.index
    }

    /// Step back, wrapping to the last frame
    pub fn previous(&mut self) -> usize {
        if self.count > 0 {
            self.index = (self.index + self.count - 1) % self.count;
        }
        self.index
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => IoError::FileNotFound {
            path: path.display().to_string(),
        }
        .into(),
        _ => err.into(),
    })
}

/// Read the first line of a file as exactly `N` whitespace separated values
fn read_values<T: FromStr, const N: usize>(path: &Path) -> Result<[T; N]> {
    let text = read_text(path)?;
    let line = text.lines().next().unwrap_or_default();
    Ok(parse_fields(line.split_whitespace(), path, 1)?)
}

fn parse_fields<'a, T: FromStr, const N: usize>(
    fields: impl Iterator<Item = &'a str>,
    path: &Path,
    line: usize,
) -> std::result::Result<[T; N], IoError> {
    let error = |message: String| IoError::Parse {
        path: path.display().to_string(),
        line,
        message,
    };

    let values = fields
        .map(|field| field.parse::<T>().map_err(|_| error(format!("invalid number '{}'", field))))
        .collect::<std::result::Result<Vec<T>, IoError>>()?;
    let found = values.len();
    values
        .try_into()
        .map_err(|_| error(format!("expected {} values, found {}", N, found)))
}
