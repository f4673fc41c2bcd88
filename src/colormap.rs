//! Contains the Colormap struct: an ordered sequence of color stops
//! and the continuous interpolation between them.  The stock OpenCV /
//! matplotlib colormaps are discrete, which produces visible banding
//! when driven by a fractional iteration count; interpolating between
//! adjacent stops is what makes the coloring continuous.

use num::clamp;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

/// A single color as red, green, blue components, each in [0, 1].
pub type Rgb = [f64; 3];

/// Linear blend between two colors.  `t` is expected in [0, 1].
#[inline]
pub fn interpolate_color(color1: Rgb, color2: Rgb, t: f64) -> Rgb {
    [
        color1[0] * (1.0 - t) + color2[0] * t,
        color1[1] * (1.0 - t) + color2[1] * t,
        color1[2] * (1.0 - t) + color2[2] * t,
    ]
}

/// An ordered sequence of at least two color stops, looked up with a
/// value in [0, 255) and interpolated between the two nearest stops.
#[derive(Debug, Clone)]
pub struct Colormap {
    colors: Vec<Rgb>,
}

impl Colormap {
    /// Builds a colormap from an explicit stop sequence.  Fewer than
    /// two stops leaves nothing to interpolate between and is a
    /// configuration error.
    pub fn new(colors: Vec<Rgb>) -> Result<Colormap, Error> {
        if colors.len() < 2 {
            return Err(Error::Config(format!(
                "a colormap needs at least 2 stops, got {}",
                colors.len()
            )));
        }
        Ok(Colormap { colors })
    }

    /// Loads `<dir>/<name>.csv`, one `r,g,b` row per stop, components
    /// as floats in [0, 1].  The reference palettes are 1024 rows
    /// sampled from matplotlib's perceptual colormaps with:
    ///
    /// ```text
    /// n = 1024
    /// cmap = plt.get_cmap('twilight', n)
    /// colors = cmap(np.linspace(0, 1, n))[:, :3]
    /// np.savetxt('twilight.csv', colors, delimiter=',')
    /// ```
    pub fn from_csv(dir: &Path, name: &str) -> Result<Colormap, Error> {
        let path = dir.join(format!("{}.csv", name));
        let file = File::open(&path).map_err(|e| Error::Colormap {
            name: name.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        let mut colors = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::Colormap {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let components: Result<Vec<f64>, _> =
                line.split(',').map(|s| s.trim().parse::<f64>()).collect();
            match components {
                Ok(ref c) if c.len() == 3 => colors.push([c[0], c[1], c[2]]),
                _ => {
                    return Err(Error::Colormap {
                        name: name.to_string(),
                        reason: format!("line {} is not an r,g,b triple", lineno + 1),
                    })
                }
            }
        }

        Colormap::new(colors).map_err(|_| Error::Colormap {
            name: name.to_string(),
            reason: "fewer than 2 stops".to_string(),
        })
    }

    /// The number of stops.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// A colormap can never be empty; this exists to satisfy the
    /// usual len/is_empty pairing.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Maps a value in [0, 255) onto the stop sequence.  The value is
    /// normalized, scaled to the stop count, and split into the two
    /// neighboring indices and a fractional blend weight.  Values
    /// slightly outside the range are tolerated: indices are clamped
    /// to the ends of the sequence.
    pub fn lookup(&self, value: f64) -> Rgb {
        // -1 since we interpolate between adjacent stops.
        let num_colors = self.colors.len() - 1;
        let scaled = (value / 255.0) * (num_colors as f64);

        let index1 = clamp(scaled.floor(), 0.0, num_colors as f64) as usize;
        let index2 = usize::min(index1 + 1, num_colors);
        let t = clamp(scaled - (index1 as f64), 0.0, 1.0);

        interpolate_color(self.colors[index1], self.colors[index2], t)
    }
}
