#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot still and zoom-animation renderer
//!
//! The Mandelbrot takes a point on the complex plane and repeatedly
//! multiplies it by itself, measuring how quickly that number goes to
//! infinity.  This "velocity" is the number used to render the image;
//! renormalizing it to a fractional count gives gradients with no
//! banding, which is what makes a deep-zoom animation watchable.
//!
//! The crate splits into a small set of pieces: the escape-time
//! evaluator and its continuous colormap, the zoom trajectory planner
//! that turns a waypoint list into per-frame camera state, the
//! animation driver that walks the planner's output one frame at a
//! time, and the frame sinks (PNG, ffmpeg pipe, or discard) the
//! frames are emitted to.

pub mod animation;
pub mod colormap;
pub mod error;
pub mod mandelbrot;
pub mod settings;
pub mod sink;
pub mod timing;
pub mod trajectory;

pub use animation::{render_still, Animation, RunStats};
pub use colormap::Colormap;
pub use error::Error;
pub use mandelbrot::{linspace, Frame, Mandelbrot};
pub use settings::Settings;
pub use sink::{DiscardSink, FfmpegSink, FrameSink, PngSink};
pub use trajectory::{Trajectory, Waypoint};
