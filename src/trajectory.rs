// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The zoom trajectory planner.
//!
//! A zoom animation is described by an ordered list of waypoints, each
//! a point of interest with a zoom level relative to the baseline
//! view.  From those and a total frame count the planner precomputes
//! everything the frame loop needs: the global per-frame decay ratio
//! of the viewing extent, the frame numbers at which the camera
//! retargets to the next waypoint, and the per-segment interpolation
//! parameters that steer the center point.
//!
//! The planner is immutable once built.  The one piece of per-frame
//! mutable state, the geometric cursor `f_xy`, deliberately does not
//! live here: the driver owns it as a plain scalar, which keeps the
//! single-writer rule visible in the types.

use itertools::Itertools;
use serde::Deserialize;

use crate::error::Error;

/// A point of interest on the complex plane and its zoom level
/// relative to the baseline view (zoom = 1 is the baseline extent).
/// In the settings file a waypoint is written as an `[x, y, zoom]`
/// triple.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(from = "(f64, f64, f64)")]
pub struct Waypoint {
    /// Real-axis coordinate of the point of interest.
    pub x: f64,
    /// Imaginary-axis coordinate of the point of interest.
    pub y: f64,
    /// Magnification relative to the baseline extent.
    pub zoom: f64,
}

impl From<(f64, f64, f64)> for Waypoint {
    fn from((x, y, zoom): (f64, f64, f64)) -> Waypoint {
        Waypoint { x, y, zoom }
    }
}

/// A waypoint resolved to an absolute viewing extent: the baseline
/// width and height divided by the waypoint's zoom factor.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryPoint {
    /// Real-axis coordinate of the view center.
    pub x: f64,
    /// Imaginary-axis coordinate of the view center.
    pub y: f64,
    /// Width of the view at this waypoint's zoom level.
    pub target_width: f64,
    /// Height of the view at this waypoint's zoom level.
    pub target_height: f64,
}

/// The precomputed interpolation parameters for one segment (one
/// consecutive waypoint pair).  Immutable; the decaying cursor that
/// walks a segment is a separate scalar owned by the driver.
#[derive(Debug, Clone, Copy)]
pub struct SegmentParameters {
    /// Center coordinates at the start of the segment.
    pub start: (f64, f64),
    /// Center coordinates at the end of the segment.
    pub end: (f64, f64),
    /// Per-frame decay ratio for the position cursor,
    /// `r_dim^smoothing_power`.  Smaller than `r_dim`, so the camera
    /// centers on the target before the zoom finishes shrinking.
    pub r_xy: f64,
    /// The residual the cursor would be left with at the end of the
    /// segment, `r_xy^N / (1 - r_xy^N)`.  Used to remap the naive
    /// geometric decay so it traverses exactly [1, 0] over the
    /// segment's N frames.
    pub f_err: f64,
}

/// Interpolation between `x0` and `x1` driven by the geometric cursor
/// `f_xy`, corrected so the result reaches `x1` exactly at the end of
/// the segment instead of asymptoting toward it.  `f_xy` starts at 1
/// and is multiplied by `r_xy` after every frame; `f_err` is the
/// constant from [`SegmentParameters`].
pub fn corrected_interpolation(x0: f64, x1: f64, f_xy: f64, f_err: f64) -> f64 {
    let f_corr = (f_err - f_xy) / (f_err - 1.0);
    x0 * f_corr + x1 * (1.0 - f_corr)
}

/// The precomputed zoom path: decay ratio, segment boundaries, and
/// per-segment interpolation parameters.  Built once, then read by the
/// driver every frame.
#[derive(Debug)]
pub struct Trajectory {
    waypoints: Vec<Waypoint>,
    /// Total number of frames in the animation.
    pub nr_frames: usize,
    /// Baseline view width (zoom = 1).
    pub start_width: f64,
    /// Baseline view height (zoom = 1).
    pub start_height: f64,
    /// Exponent applied to `r_dim` for the position cursor.  Values
    /// above 1 make the camera center converge faster than the zoom;
    /// take a minimum of about 1.2 for a smooth result.
    pub smoothing_power: f64,
    /// The per-frame geometric shrink factor of the viewing extent.
    /// Applying it `nr_frames - 1` times to the baseline extent lands
    /// exactly on the final waypoint's extent.  In (0, 1) whenever the
    /// path zooms in.
    pub r_dim: f64,
    boundaries: Vec<usize>,
    segments: Vec<SegmentParameters>,
}

impl Trajectory {
    /// Precomputes the zoom path.  At least two waypoints and two
    /// frames are required, and the smoothing power must exceed 1 or
    /// the position would converge no faster than the extent and the
    /// correction would not pull it in by the segment boundary.
    pub fn new(
        waypoints: Vec<Waypoint>,
        nr_frames: usize,
        start_width: f64,
        start_height: f64,
        smoothing_power: f64,
    ) -> Result<Trajectory, Error> {
        if waypoints.len() < 2 {
            return Err(Error::Config(format!(
                "a trajectory needs at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        if nr_frames <= 1 {
            return Err(Error::Config(format!(
                "an animation needs more than 1 frame, got {}",
                nr_frames
            )));
        }
        if !(start_width > 0.0) || !(start_height > 0.0) {
            return Err(Error::Config(format!(
                "the baseline extent must be positive, got {}x{}",
                start_width, start_height
            )));
        }
        if smoothing_power <= 1.0 {
            return Err(Error::Config(format!(
                "smoothing power must exceed 1, got {}",
                smoothing_power
            )));
        }

        let mut trajectory = Trajectory {
            waypoints,
            nr_frames,
            start_width,
            start_height,
            smoothing_power,
            r_dim: 0.0,
            boundaries: Vec::new(),
            segments: Vec::new(),
        };
        trajectory.set_r_dim();
        trajectory.set_boundaries()?;
        trajectory.set_segments();
        Ok(trajectory)
    }

    /// Resolves waypoint `i` to its absolute extent.
    pub fn trajectory_point(&self, i: usize) -> TrajectoryPoint {
        let wp = &self.waypoints[i];
        TrajectoryPoint {
            x: wp.x,
            y: wp.y,
            target_width: self.start_width / wp.zoom,
            target_height: self.start_height / wp.zoom,
        }
    }

    /// Resolves the final waypoint to its absolute extent.
    pub fn last_point(&self) -> TrajectoryPoint {
        self.trajectory_point(self.waypoints.len() - 1)
    }

    /// The frame numbers at which the camera retargets to the next
    /// waypoint.  Strictly increasing, one entry per waypoint, with
    /// the total frame count appended as a terminal sentinel.
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// The per-segment interpolation parameters, one per consecutive
    /// waypoint pair.
    pub fn segments(&self) -> &[SegmentParameters] {
        &self.segments
    }

    /// The per-frame ratio at which each frame's extent shrinks,
    /// defined over the complete animation range: the total extent
    /// change spread geometrically over `nr_frames - 1` intervals.
    fn set_r_dim(&mut self) {
        let tp_start = self.trajectory_point(0);
        let tp_end = self.last_point();
        self.r_dim = (tp_end.target_height / tp_start.target_height)
            .powf(1.0 / ((self.nr_frames - 1) as f64));
    }

    /// Walks the frames accumulating powers of `r_dim`.  The
    /// accumulated factor is the inverse zoom relative to the start of
    /// the animation; the first frame it undercuts the current target
    /// waypoint's `1/zoom`, that frame number is recorded as a
    /// boundary and the target advances.  Stops once the last waypoint
    /// becomes the target, then appends the sentinel.
    fn set_boundaries(&mut self) -> Result<(), Error> {
        let mut fac = 1.0;
        let mut j = 0;
        for i in 0..self.nr_frames {
            fac *= self.r_dim;
            if fac <= 1.0 / self.waypoints[j].zoom {
                self.boundaries.push(i);
                j += 1;
            }
            if j == self.waypoints.len() - 1 {
                break;
            }
        }
        self.boundaries.push(self.nr_frames);

        // One boundary per waypoint; coming up short means some
        // intermediate waypoint is zoomed past the end of the path and
        // can never be reached.
        if self.boundaries.len() != self.waypoints.len() {
            return Err(Error::Config(
                "trajectory contains waypoints whose zoom level is never reached".to_string(),
            ));
        }
        Ok(())
    }

    /// Derives the interpolation parameters for each consecutive
    /// boundary pair.  The position cursor decays with `r_xy`, a
    /// strictly smaller ratio than `r_dim`; `f_err` compensates for
    /// the residual a pure geometric decay would leave at the end of
    /// the segment, so position and extent complete in sync.
    fn set_segments(&mut self) {
        let r_xy = self.r_dim.powf(self.smoothing_power);
        let segments = self
            .boundaries
            .iter()
            .tuple_windows()
            .enumerate()
            .map(|(i, (&b0, &b1))| {
                let tp_i = self.trajectory_point(i);
                let tp_ip1 = self.trajectory_point(i + 1);
                let rn = r_xy.powi((b1 - b0) as i32);
                SegmentParameters {
                    start: (tp_i.x, tp_i.y),
                    end: (tp_ip1.x, tp_ip1.y),
                    r_xy,
                    f_err: rn / (1.0 - rn),
                }
            })
            .collect();
        self.segments = segments;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoints(spec: &[(f64, f64, f64)]) -> Vec<Waypoint> {
        spec.iter().map(|&w| Waypoint::from(w)).collect()
    }

    fn simple_trajectory(frames: usize) -> Trajectory {
        Trajectory::new(
            waypoints(&[(-0.5, 0.0, 1.0), (0.0, 0.0, 1000.0)]),
            frames,
            3.0,
            3.0,
            1.25,
        )
        .unwrap()
    }

    #[test]
    fn rejects_degenerate_configurations() {
        assert!(Trajectory::new(waypoints(&[(-0.5, 0.0, 1.0)]), 10, 3.0, 3.0, 1.25).is_err());
        assert!(Trajectory::new(
            waypoints(&[(-0.5, 0.0, 1.0), (0.0, 0.0, 10.0)]),
            1,
            3.0,
            3.0,
            1.25
        )
        .is_err());
        assert!(Trajectory::new(
            waypoints(&[(-0.5, 0.0, 1.0), (0.0, 0.0, 10.0)]),
            10,
            0.0,
            3.0,
            1.25
        )
        .is_err());
        assert!(Trajectory::new(
            waypoints(&[(-0.5, 0.0, 1.0), (0.0, 0.0, 10.0)]),
            10,
            3.0,
            3.0,
            1.0
        )
        .is_err());
    }

    #[test]
    fn r_dim_lands_on_the_final_extent() {
        let t = simple_trajectory(100);
        assert!(t.r_dim > 0.0 && t.r_dim < 1.0);
        let final_height = t.start_height * t.r_dim.powi(99);
        assert!((final_height - t.last_point().target_height).abs() < 1e-9);
    }

    #[test]
    fn boundaries_cover_the_waypoints() {
        for frames in &[2, 10, 100, 400] {
            let t = simple_trajectory(*frames);
            let b = t.boundaries();
            assert_eq!(b.len(), 2);
            assert_eq!(*b.last().unwrap(), *frames);
            for w in b.windows(2) {
                assert!(w[0] < w[1]);
            }
        }
    }

    #[test]
    fn boundaries_with_an_intermediate_waypoint() {
        let t = Trajectory::new(
            waypoints(&[
                (-0.5, 0.0, 1.0),
                (0.25, 0.25, 50.0),
                (0.0, 0.0, 5000.0),
            ]),
            200,
            3.0,
            3.0,
            1.25,
        )
        .unwrap();
        let b = t.boundaries();
        assert_eq!(b.len(), 3);
        assert_eq!(b[0], 0);
        assert_eq!(*b.last().unwrap(), 200);
        assert!(b[1] > b[0] && b[1] < b[2]);
        assert_eq!(t.segments().len(), 2);
    }

    #[test]
    fn unreachable_waypoints_are_rejected() {
        // The middle waypoint zooms past the final one, so the
        // accumulated factor never undercuts its threshold.
        let result = Trajectory::new(
            waypoints(&[
                (-0.5, 0.0, 1.0),
                (0.25, 0.25, 10_000.0),
                (0.0, 0.0, 100.0),
            ]),
            50,
            3.0,
            3.0,
            1.25,
        );
        assert!(result.is_err());
    }

    #[test]
    fn segment_parameters_match_their_definitions() {
        let t = simple_trajectory(10);
        let seg = &t.segments()[0];
        assert!((seg.r_xy - t.r_dim.powf(1.25)).abs() < 1e-15);
        let n = (t.boundaries()[1] - t.boundaries()[0]) as i32;
        let rn = seg.r_xy.powi(n);
        assert!((seg.f_err - rn / (1.0 - rn)).abs() < 1e-15);
        assert_eq!(seg.start, (-0.5, 0.0));
        assert_eq!(seg.end, (0.0, 0.0));
    }

    #[test]
    fn corrected_interpolation_starts_at_x0() {
        let t = simple_trajectory(10);
        let seg = &t.segments()[0];
        let v = corrected_interpolation(seg.start.0, seg.end.0, 1.0, seg.f_err);
        assert!((v - seg.start.0).abs() < 1e-12);
    }

    #[test]
    fn corrected_interpolation_converges_to_x1() {
        let t = simple_trajectory(10);
        let seg = &t.segments()[0];
        let v = corrected_interpolation(seg.start.0, seg.end.0, seg.f_err, seg.f_err);
        assert!((v - seg.end.0).abs() < 1e-9);
    }

    #[test]
    fn waypoint_deserializes_from_a_triple() {
        let wps: Vec<Waypoint> = serde_yaml::from_str("[[-0.5, 0, 1], [0.25, -0.1, 500]]").unwrap();
        assert_eq!(wps.len(), 2);
        assert!((wps[1].zoom - 500.0).abs() < f64::EPSILON);
    }
}
