//! Frame sinks: where rendered frames go.
//!
//! The driver produces frames in order and hands each one to a sink.
//! The still-image run writes a single PNG; the animation run pipes
//! raw RGB24 frames into an `ffmpeg` child process which assembles the
//! video container; the compute-only benchmark run discards frames.
//! A sink failure is fatal for the run: no further frames are
//! produced after one.

use image::png::PNGEncoder;
use image::ColorType;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::info;

use crate::error::Error;
use crate::mandelbrot::Frame;

/// An ordered stream of frames.  `write_frame` must be called in
/// presentation order; `finish` flushes and closes whatever backs the
/// sink and must be called exactly once, after the last frame.
pub trait FrameSink {
    /// Accepts the next frame in order.
    fn write_frame(&mut self, frame: &Frame) -> Result<(), Error>;
    /// Flushes and closes the sink.
    fn finish(&mut self) -> Result<(), Error>;
}

/// Writes each frame it receives as an 8-bit-per-channel PNG.  In
/// still-image mode it receives exactly one.
pub struct PngSink {
    path: PathBuf,
    frames_written: usize,
}

impl PngSink {
    /// A sink writing to `path` (a `.png` suffix is appended if the
    /// path has no extension).  Frames past the first get a numeric
    /// suffix so nothing is silently overwritten.
    pub fn new(path: &Path) -> PngSink {
        let path = if path.extension().is_none() {
            path.with_extension("png")
        } else {
            path.to_path_buf()
        };
        PngSink {
            path,
            frames_written: 0,
        }
    }

    fn frame_path(&self) -> PathBuf {
        if self.frames_written == 0 {
            self.path.clone()
        } else {
            self.path.with_extension(format!("{}.png", self.frames_written))
        }
    }
}

impl FrameSink for PngSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        let path = self.frame_path();
        let output = File::create(&path)
            .map_err(|e| Error::Sink(format!("cannot create {}: {}", path.display(), e)))?;
        PNGEncoder::new(output)
            .encode(
                &frame.to_rgb8(),
                frame.width as u32,
                frame.height as u32,
                ColorType::RGB(8),
            )
            .map_err(|e| Error::Sink(format!("cannot encode {}: {}", path.display(), e)))?;
        info!(path = %path.display(), "wrote image");
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Pipes raw RGB24 frames into an `ffmpeg` child process that encodes
/// an H.264 MP4.  Opening the process up front means a missing ffmpeg
/// binary fails the run before any frame is computed.
pub struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    path: PathBuf,
}

impl FfmpegSink {
    /// Spawns the encoder for a `width` x `height` stream at `fps`
    /// frames per second, writing to `path`.
    pub fn open(path: &Path, width: usize, height: usize, fps: u32) -> Result<FfmpegSink, Error> {
        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-s")
            .arg(format!("{}x{}", width, height))
            .arg("-r")
            .arg(fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-c:v")
            .arg("libx264")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Sink(format!("cannot start ffmpeg: {}", e)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Sink("ffmpeg stdin was not captured".to_string()))?;
        info!(path = %path.display(), width, height, fps, "opened video sink");
        Ok(FfmpegSink {
            child,
            stdin: Some(stdin),
            path: path.to_path_buf(),
        })
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), Error> {
        match self.stdin {
            Some(ref mut stdin) => stdin
                .write_all(&frame.to_rgb8())
                .map_err(|e| Error::Sink(format!("ffmpeg rejected a frame: {}", e))),
            None => Err(Error::Sink("video sink is already closed".to_string())),
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        // Closing stdin is what tells ffmpeg the stream is over.
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| Error::Sink(format!("ffmpeg did not exit: {}", e)))?;
        if !status.success() {
            return Err(Error::Sink(format!(
                "ffmpeg exited with {} while writing {}",
                status,
                self.path.display()
            )));
        }
        info!(path = %self.path.display(), "finished video");
        Ok(())
    }
}

/// Discards every frame.  Used when rendering is switched off to
/// benchmark the computation alone.
pub struct DiscardSink;

impl FrameSink for DiscardSink {
    fn write_frame(&mut self, _frame: &Frame) -> Result<(), Error> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
