// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time evaluator with continuous coloring.
//!
//! The Mandelbrot takes a point on the complex plane and repeatedly
//! multiplies it by itself, measuring how quickly that number goes to
//! infinity.  This "velocity" is the number used to render the image.
//! The integer escape count produces visible bands of color; the
//! renormalized (fractional) count removes them, which is what lets a
//! zoom animation look smooth instead of strobing.
//!
//! Every pixel is independent of every other, so the grid is rendered
//! as a parallel fan-out over row bands with no shared mutable state.

use num::clamp;

use crate::colormap::{Colormap, Rgb};
use crate::error::Error;

/// The squared-magnitude threshold beyond which a point is considered
/// escaped.  Must be greater than 1: the renormalization takes
/// `ln(ln|z|)`, which is only defined when `|z|^2` past the bailout
/// keeps `ln|z|` positive.
pub const BAILOUT: f64 = 4.0;

/// Create an inclusive, evenly spaced sequence like np.linspace.
/// `num == 1` yields just the start value; `num == 0` yields nothing.
/// `end` may be smaller than `start`, giving a descending sequence.
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / ((num - 1) as f64);
            (0..num).map(|i| start + (i as f64) * step).collect()
        }
    }
}

/// A rendered frame: a row-major grid of float RGB pixels in [0, 1].
#[derive(Debug, Clone)]
pub struct Frame {
    /// Number of pixel columns.
    pub width: usize,
    /// Number of pixel rows.
    pub height: usize,
    data: Vec<Rgb>,
}

impl Frame {
    fn new(width: usize, height: usize) -> Frame {
        Frame {
            width,
            height,
            data: vec![[0.0; 3]; width * height],
        }
    }

    /// The pixel at column `i`, row `j`.
    pub fn pixel(&self, i: usize, j: usize) -> Rgb {
        self.data[j * self.width + i]
    }

    /// The raw row-major pixel buffer.
    pub fn data(&self) -> &[Rgb] {
        &self.data
    }

    /// Quantizes the float pixels to interleaved 8-bit RGB, which is
    /// what both the PNG encoder and the rawvideo pipe consume.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 3);
        for px in &self.data {
            for c in px {
                out.push(clamp(c * 255.0, 0.0, 255.0).round() as u8);
            }
        }
        out
    }
}

/// Runs the escape-time recurrence for a single point `c`, tracking
/// the squares of the real and imaginary parts incrementally rather
/// than going through a complex type.  Returns the iteration count and
/// the final squared components, which the coloring needs.
fn escape_time(cx: f64, cy: f64, max_its: u32) -> (u32, f64, f64) {
    let mut x = 0.0;
    let mut y = 0.0;
    let mut x2 = 0.0;
    let mut y2 = 0.0;
    let mut n = 0;
    while x2 + y2 <= BAILOUT && n < max_its {
        y = 2.0 * x * y + cy;
        x = x2 - y2 + cx;
        x2 = x * x;
        y2 = y * y;
        n += 1;
    }
    (n, x2, y2)
}

/// The per-frame fractal evaluator.  Holds the fixed pixel resolution,
/// the palette, and the worker count; `render` is a pure function of
/// the coordinate arrays and the iteration cap, so one evaluator is
/// reused across every frame of an animation.
pub struct Mandelbrot {
    nx: usize,
    ny: usize,
    colormap: Colormap,
    threads: usize,
}

impl Mandelbrot {
    /// Requires a positive resolution and at least one worker thread.
    pub fn new(nx: usize, ny: usize, colormap: Colormap, threads: usize) -> Result<Self, Error> {
        if nx == 0 || ny == 0 {
            return Err(Error::Config(format!(
                "resolution must be positive, got {}x{}",
                nx, ny
            )));
        }
        if threads == 0 {
            return Err(Error::Config("thread count must be at least 1".to_string()));
        }
        Ok(Mandelbrot {
            nx,
            ny,
            colormap,
            threads,
        })
    }

    /// The fixed pixel resolution as (columns, rows).
    pub fn resolution(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Colors one point.  Points that survive the full budget are
    /// presumed inside the set and painted black; escaped points get
    /// the renormalized fractional count, wrapped mod 255 so the
    /// finite palette cycles smoothly across large iteration counts.
    fn color_at(&self, cx: f64, cy: f64, max_its: u32) -> Rgb {
        let (n, x2, y2) = escape_time(cx, cy, max_its);
        if n == max_its {
            return [0.0, 0.0, 0.0];
        }

        // ln|z| of a complex number is ln(x^2 + y^2) / 2.
        let log_zn = (x2 + y2).ln() / 2.0;
        let nu = log_zn.ln() / std::f64::consts::LN_2;
        let n_frac = f64::from(n) + 1.0 - nu;

        // With the bailout above 1 this cannot go non-finite; if it
        // ever does, fall back to the plain integer count rather than
        // letting a NaN through to the image.
        if n_frac.is_finite() {
            self.colormap.lookup(n_frac % 255.0)
        } else {
            self.colormap.lookup(f64::from(n) % 255.0)
        }
    }

    /// Renders the full grid: `y_cor.len()` rows by `x_cor.len()`
    /// columns, row `j` at `y_cor[j]`, column `i` at `x_cor[i]`.
    /// The output buffer is split into contiguous row bands, one per
    /// worker; each band is written by exactly one thread and the scope
    /// joins them all before the frame is returned.
    pub fn render(&self, x_cor: &[f64], y_cor: &[f64], max_its: u32) -> Frame {
        assert_eq!(x_cor.len(), self.nx);
        assert_eq!(y_cor.len(), self.ny);

        let mut frame = Frame::new(self.nx, self.ny);
        let rows_per_band = (self.ny + self.threads - 1) / self.threads;
        {
            let nx = self.nx;
            let bands: Vec<&mut [Rgb]> = frame.data.chunks_mut(rows_per_band * nx).collect();
            crossbeam::scope(|spawner| {
                for (b, band) in bands.into_iter().enumerate() {
                    spawner.spawn(move |_| {
                        for (r, row) in band.chunks_mut(nx).enumerate() {
                            let cy = y_cor[b * rows_per_band + r];
                            for (i, px) in row.iter_mut().enumerate() {
                                *px = self.color_at(x_cor[i], cy, max_its);
                            }
                        }
                    });
                }
            })
            .unwrap();
        }
        frame
    }
}
