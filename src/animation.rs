// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-frame animation loop, and the one-shot still-image path.
//!
//! The loop is strictly sequential: each frame's extent and position
//! cursor are geometric decays of the previous frame's, so frames are
//! computed and handed to the sink in order.  Inside a frame the
//! evaluator fans out over all pixels in parallel; across frames the
//! only mutable state is the cursor this module owns.

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::Error;
use crate::mandelbrot::{linspace, Frame, Mandelbrot};
use crate::sink::FrameSink;
use crate::trajectory::{corrected_interpolation, Trajectory};

/// The iteration floor for the first frames of an animation.  Shallow
/// views resolve fully well under this budget.
pub const MIN_ITS: u32 = 100;

/// Default steepness of the iteration ramp.
pub const DEFAULT_X_SCALE: f64 = 10.0;

/// Timing totals for a completed animation run.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    /// Frames produced.
    pub frames: usize,
    /// Time spent in the fractal evaluator only.
    pub compute: Duration,
    /// Time spent handing frames to the sink (encoding, writing).
    pub sink: Duration,
}

impl RunStats {
    /// Mean evaluator time per frame.
    pub fn avg_compute_per_frame(&self) -> Duration {
        if self.frames == 0 {
            Duration::from_secs(0)
        } else {
            self.compute / (self.frames as u32)
        }
    }
}

/// Drives a [`Trajectory`] through a [`Mandelbrot`] evaluator, one
/// frame at a time, emitting frames to a sink.
pub struct Animation<'a> {
    trajectory: &'a Trajectory,
    renderer: &'a Mandelbrot,
    max_its: u32,
    x_scale: f64,
}

impl<'a> Animation<'a> {
    /// Couples a trajectory to an evaluator.  `max_its` is the global
    /// iteration ceiling reached at the end of the ramp; it must be at
    /// least the [`MIN_ITS`] floor.
    pub fn new(
        trajectory: &'a Trajectory,
        renderer: &'a Mandelbrot,
        max_its: u32,
        x_scale: f64,
    ) -> Result<Animation<'a>, Error> {
        if max_its < MIN_ITS {
            return Err(Error::Config(format!(
                "max_its must be at least {}, got {}",
                MIN_ITS, max_its
            )));
        }
        if !(x_scale > 0.0) {
            return Err(Error::Config(format!(
                "x_scale must be positive, got {}",
                x_scale
            )));
        }
        Ok(Animation {
            trajectory,
            renderer,
            max_its,
            x_scale,
        })
    }

    /// The adaptive iteration schedule.  Deep frames need
    /// disproportionately more iterations, so the budget ramps
    /// logarithmically: fast growth early where it is cheap, flatter
    /// toward the ceiling.  Frame 0 always gets exactly [`MIN_ITS`].
    pub fn iteration_cap(&self, frame: usize) -> u32 {
        let frac = (frame as f64) / (self.trajectory.nr_frames as f64);
        let span = f64::from(self.max_its - MIN_ITS);
        let ramp = (1.0 + self.x_scale * frac).ln() / (1.0 + self.x_scale).ln();
        (f64::from(MIN_ITS) + span * ramp).floor() as u32
    }

    /// Runs the frame loop to completion, in order, emitting every
    /// frame to `sink` and finishing it.  Returns the timing totals.
    pub fn run<S: FrameSink>(&self, sink: &mut S) -> Result<RunStats, Error> {
        let tp_0 = self.trajectory.trajectory_point(0);
        let boundaries = self.trajectory.boundaries();
        let segments = self.trajectory.segments();

        // The per-frame cursor: everything here has exactly one
        // writer, this loop.
        let mut width = tp_0.target_width;
        let mut height = tp_0.target_height;
        let mut segment = 0;
        let mut f_xy = 1.0;

        let mut stats = RunStats {
            frames: 0,
            compute: Duration::from_secs(0),
            sink: Duration::from_secs(0),
        };

        info!(
            frames = self.trajectory.nr_frames,
            segments = segments.len(),
            r_dim = self.trajectory.r_dim,
            "begin animation"
        );

        for frame in 0..self.trajectory.nr_frames {
            // Retarget at a recorded boundary; the final sentinel ends
            // the loop instead of transitioning.
            if segment + 1 < segments.len() && frame == boundaries[segment + 1] {
                segment += 1;
                f_xy = 1.0;
                debug!(frame, segment, "trajectory segment change");
            }
            let pars = &segments[segment];

            let x = corrected_interpolation(pars.start.0, pars.end.0, f_xy, pars.f_err);
            let y = corrected_interpolation(pars.start.1, pars.end.1, f_xy, pars.f_err);
            let max_its = self.iteration_cap(frame);

            let t_compute = Instant::now();
            let image = self.render_view(x, y, width, height, max_its);
            stats.compute += t_compute.elapsed();

            let t_sink = Instant::now();
            sink.write_frame(&image)?;
            stats.sink += t_sink.elapsed();

            debug!(frame, x, y, width, height, max_its, "frame complete");

            f_xy *= pars.r_xy;
            width *= self.trajectory.r_dim;
            height *= self.trajectory.r_dim;
            stats.frames += 1;
        }

        let t_sink = Instant::now();
        sink.finish()?;
        stats.sink += t_sink.elapsed();
        Ok(stats)
    }

    fn render_view(&self, x: f64, y: f64, width: f64, height: f64, max_its: u32) -> Frame {
        render_still(self.renderer, x, y, width, height, max_its)
    }
}

/// Renders one view centered on `(x, y)` with the given extent.  The
/// y sequence descends so the top image row maps to the largest
/// imaginary value.  This is the whole of still-image mode: one frame
/// at the first waypoint's center, the baseline extent, and the full
/// iteration budget.
pub fn render_still(
    renderer: &Mandelbrot,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    max_its: u32,
) -> Frame {
    let (nx, ny) = renderer.resolution();
    let x_cor = linspace(x - width / 2.0, x + width / 2.0, nx);
    let y_cor = linspace(y + height / 2.0, y - height / 2.0, ny);
    renderer.render(&x_cor, &y_cor, max_its)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::Colormap;
    use crate::trajectory::Waypoint;

    /// A sink that keeps every frame so tests can inspect the run.
    struct CollectSink {
        frames: Vec<Frame>,
        finished: bool,
    }

    impl CollectSink {
        fn new() -> CollectSink {
            CollectSink {
                frames: Vec::new(),
                finished: false,
            }
        }
    }

    impl FrameSink for CollectSink {
        fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
            self.frames.push(frame.clone());
            Ok(())
        }
        fn finish(&mut self) -> Result<(), Error> {
            self.finished = true;
            Ok(())
        }
    }

    fn grayscale() -> Colormap {
        Colormap::new(vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]).unwrap()
    }

    fn waypoints() -> Vec<Waypoint> {
        vec![
            Waypoint::from((-0.5, 0.0, 1.0)),
            Waypoint::from((0.0, 0.0, 1000.0)),
        ]
    }

    #[test]
    fn full_run_produces_every_frame() {
        let trajectory = Trajectory::new(waypoints(), 10, 3.0, 3.0, 1.25).unwrap();
        let renderer = Mandelbrot::new(4, 4, grayscale(), 2).unwrap();
        let animation = Animation::new(&trajectory, &renderer, 500, DEFAULT_X_SCALE).unwrap();

        let mut sink = CollectSink::new();
        let stats = animation.run(&mut sink).unwrap();

        assert_eq!(stats.frames, 10);
        assert_eq!(sink.frames.len(), 10);
        assert!(sink.finished);
        for frame in &sink.frames {
            assert_eq!(frame.width, 4);
            assert_eq!(frame.height, 4);
        }
    }

    #[test]
    fn iteration_schedule_starts_at_the_floor_and_ramps_up() {
        let trajectory = Trajectory::new(waypoints(), 10, 3.0, 3.0, 1.25).unwrap();
        let renderer = Mandelbrot::new(4, 4, grayscale(), 1).unwrap();
        let animation = Animation::new(&trajectory, &renderer, 500, DEFAULT_X_SCALE).unwrap();

        assert_eq!(animation.iteration_cap(0), MIN_ITS);
        let last = animation.iteration_cap(9);
        assert!(last > MIN_ITS);
        assert!(last <= 500);
    }

    #[test]
    fn iteration_schedule_is_monotonic() {
        let trajectory = Trajectory::new(waypoints(), 100, 3.0, 3.0, 1.25).unwrap();
        let renderer = Mandelbrot::new(4, 4, grayscale(), 1).unwrap();
        let animation = Animation::new(&trajectory, &renderer, 2000, DEFAULT_X_SCALE).unwrap();
        let mut previous = 0;
        for frame in 0..100 {
            let cap = animation.iteration_cap(frame);
            assert!(cap >= previous);
            previous = cap;
        }
    }

    #[test]
    fn rejects_a_budget_below_the_floor() {
        let trajectory = Trajectory::new(waypoints(), 10, 3.0, 3.0, 1.25).unwrap();
        let renderer = Mandelbrot::new(4, 4, grayscale(), 1).unwrap();
        assert!(Animation::new(&trajectory, &renderer, 50, DEFAULT_X_SCALE).is_err());
        assert!(Animation::new(&trajectory, &renderer, 500, 0.0).is_err());
    }

    #[test]
    fn still_render_matches_the_resolution() {
        let renderer = Mandelbrot::new(6, 4, grayscale(), 2).unwrap();
        let frame = render_still(&renderer, -0.5, 0.0, 3.0, 3.0, 200);
        assert_eq!(frame.width, 6);
        assert_eq!(frame.height, 4);
    }
}
