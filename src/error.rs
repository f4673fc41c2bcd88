//! The crate-wide error type.  Everything that can go wrong here is
//! either a bad configuration, caught before any pixel is computed, or
//! a failure at the output boundary.

use failure::Fail;

/// All failure modes of the renderer.  There are deliberately no
/// per-frame errors: once the configuration has been validated the
/// frame loop is a deterministic pure function, and the only thing
/// left to fail is the sink.
#[derive(Debug, Fail)]
pub enum Error {
    /// A precondition on the settings was violated.  Raised before any
    /// computation begins.
    #[fail(display = "configuration error: {}", _0)]
    Config(String),

    /// The named colormap could not be loaded or was too short to
    /// interpolate over.
    #[fail(display = "colormap '{}' could not be loaded: {}", name, reason)]
    Colormap {
        /// The colormap name as given in the settings.
        name: String,
        /// What went wrong while reading it.
        reason: String,
    },

    /// The frame sink could not be opened or refused a frame.  Fatal
    /// for the run; no further frames are produced.
    #[fail(display = "frame sink failure: {}", _0)]
    Sink(String),

    /// An I/O error outside the sink, e.g. while reading the settings
    /// file or appending the performance log.
    #[fail(display = "i/o error: {}", _0)]
    Io(#[fail(cause)] std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
