//! Run configuration, loaded from a YAML file.
//!
//! The settings own everything the core consumes as plain parameters:
//! resolution, frame count, iteration budget, the baseline extent, and
//! the waypoint list.  Validation happens once, up front; every check
//! here is a setup precondition, not a per-frame failure.

use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use crate::animation::{DEFAULT_X_SCALE, MIN_ITS};
use crate::error::Error;
use crate::trajectory::Waypoint;

fn default_colormap() -> String {
    "twilight".to_string()
}

fn default_resolution_x() -> usize {
    1920
}

fn default_resolution_y() -> usize {
    1080
}

fn default_nr_frames() -> usize {
    400
}

fn default_max_its() -> u32 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_fps() -> u32 {
    30
}

fn default_output_name() -> String {
    "mandelbrot".to_string()
}

fn default_smoothing_power() -> f64 {
    1.25
}

fn default_start_height() -> f64 {
    3.0
}

fn default_x_scale() -> f64 {
    DEFAULT_X_SCALE
}

fn default_trajectory() -> Vec<Waypoint> {
    // A classic deep dive; 4096^4 / 25 is near the deepest zoom f64
    // precision can carry.
    vec![
        Waypoint::from((-0.5, 0.0, 1.0)),
        Waypoint::from((
            0.360_240_443_437_7,
            -0.641_313_061_064_763_5,
            f64::powi(4096.0, 4) / 25.0,
        )),
    ]
}

/// The full run configuration.  Any field left out of the YAML file
/// takes its default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Name of the colormap CSV under the colormap directory.
    #[serde(default = "default_colormap")]
    pub colormap: String,
    /// Pixel columns.
    #[serde(default = "default_resolution_x")]
    pub x_resolution: usize,
    /// Pixel rows.
    #[serde(default = "default_resolution_y")]
    pub y_resolution: usize,
    /// Total frame count of the animation.
    #[serde(default = "default_nr_frames")]
    pub nr_frames: usize,
    /// Global iteration ceiling, reached at the end of the ramp.
    #[serde(default = "default_max_its")]
    pub max_its: u32,
    /// Zoom animation, or a single still image?
    #[serde(default = "default_true")]
    pub animate: bool,
    /// Write output, or just run the calculations?  Switching this
    /// off turns the run into a compute benchmark.
    #[serde(default = "default_true")]
    pub render: bool,
    /// Live preview toggle.  Accepted for compatibility; this build
    /// has no display window.
    #[serde(default)]
    pub liveplotting: bool,
    /// Frames per second of the video container.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Output name, without extension.
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// Exponent that makes the camera center converge faster than the
    /// zoom on a segment change.  Take a minimum of about 1.2.
    #[serde(default = "default_smoothing_power")]
    pub smoothing_power: f64,
    /// Baseline view height at zoom 1.
    #[serde(default = "default_start_height")]
    pub start_height: f64,
    /// Baseline view width at zoom 1.  Defaults to the height scaled
    /// by the pixel aspect ratio.
    #[serde(default)]
    pub start_width: Option<f64>,
    /// Steepness of the iteration ramp; higher front-loads the
    /// iteration growth.
    #[serde(default = "default_x_scale")]
    pub x_scale: f64,
    /// The waypoint list as `[x, y, zoom]` triples.  The first entry
    /// is the baseline and must have zoom 1.
    #[serde(default = "default_trajectory")]
    pub trajectory: Vec<Waypoint>,
}

impl Default for Settings {
    fn default() -> Settings {
        // An empty mapping takes every default.
        serde_yaml::from_str("{}").expect("default settings must parse")
    }
}

impl Settings {
    /// Loads and validates settings from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Settings, Error> {
        let file = File::open(path)
            .map_err(|e| Error::Config(format!("cannot open {}: {}", path.display(), e)))?;
        let settings: Settings = serde_yaml::from_reader(file)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// The baseline width, derived from the aspect ratio unless set
    /// explicitly.
    pub fn start_width(&self) -> f64 {
        self.start_width.unwrap_or_else(|| {
            self.start_height * (self.x_resolution as f64) / (self.y_resolution as f64)
        })
    }

    /// Checks every setup precondition.  Trajectory-shape checks are
    /// repeated by the planner's constructor; the point of doing them
    /// here too is to fail before a colormap is ever read.
    pub fn validate(&self) -> Result<(), Error> {
        if self.x_resolution == 0 || self.y_resolution == 0 {
            return Err(Error::Config(format!(
                "resolution must be positive, got {}x{}",
                self.x_resolution, self.y_resolution
            )));
        }
        if self.max_its < MIN_ITS {
            return Err(Error::Config(format!(
                "max_its must be at least {}, got {}",
                MIN_ITS, self.max_its
            )));
        }
        if self.animate {
            if self.trajectory.len() < 2 {
                return Err(Error::Config(format!(
                    "an animation needs at least 2 waypoints, got {}",
                    self.trajectory.len()
                )));
            }
            if self.nr_frames <= 1 {
                return Err(Error::Config(format!(
                    "an animation needs more than 1 frame, got {}",
                    self.nr_frames
                )));
            }
            if self.fps == 0 {
                return Err(Error::Config("fps must be positive".to_string()));
            }
        }
        if self.trajectory.is_empty() {
            return Err(Error::Config(
                "the trajectory needs at least its baseline waypoint".to_string(),
            ));
        }
        if (self.trajectory[0].zoom - 1.0).abs() > f64::EPSILON {
            return Err(Error::Config(format!(
                "the first waypoint is the baseline and must have zoom 1, got {}",
                self.trajectory[0].zoom
            )));
        }
        if !(self.start_height > 0.0) || !(self.start_width() > 0.0) {
            return Err(Error::Config(
                "the baseline extent must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.x_resolution, 1920);
        assert_eq!(settings.nr_frames, 400);
        assert_eq!(settings.trajectory.len(), 2);
        assert!((settings.smoothing_power - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn start_width_follows_the_aspect_ratio() {
        let settings = Settings::default();
        let expected = 3.0 * 1920.0 / 1080.0;
        assert!((settings.start_width() - expected).abs() < 1e-12);
    }

    #[test]
    fn parses_a_partial_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "x_resolution: 640").unwrap();
        writeln!(file, "y_resolution: 480").unwrap();
        writeln!(file, "nr_frames: 10").unwrap();
        writeln!(file, "trajectory: [[-0.5, 0, 1], [0, 0, 1000]]").unwrap();
        drop(file);

        let settings = Settings::from_yaml_file(&path).unwrap();
        assert_eq!(settings.x_resolution, 640);
        assert_eq!(settings.nr_frames, 10);
        assert_eq!(settings.trajectory.len(), 2);
        // Untouched fields keep their defaults.
        assert_eq!(settings.max_its, 2000);
    }

    #[test]
    fn rejects_a_nonbaseline_first_waypoint() {
        let mut settings = Settings::default();
        settings.trajectory[0].zoom = 2.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_too_few_waypoints_for_animation() {
        let mut settings = Settings::default();
        settings.trajectory.truncate(1);
        assert!(settings.validate().is_err());
        // The same list is fine for a still image.
        settings.animate = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_a_single_frame_animation() {
        let mut settings = Settings::default();
        settings.nr_frames = 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = Settings::from_yaml_file(Path::new("definitely-not-here.yaml"));
        match result {
            Err(Error::Config(_)) => {}
            other => panic!("expected a config error, got {:?}", other.map(|_| ())),
        }
    }
}
