//! Animated GIF assembly
//!
//! Reads rendered frames back in order and writes them as an endlessly
//! looping GIF with a fixed per-frame delay.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageError};
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Result, SkylapseError};

/// GIF delays are stored in hundredths of a second; browsers clamp anything
/// shorter than two
const MAX_FAITHFUL_FPS: u32 = 50;

/// What was written
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSummary {
    pub path: PathBuf,
    pub bytes: u64,
    pub frames: usize,
    pub fps: u32,
    /// Total playing time of one loop
    pub duration: Duration,
}

impl AnimationSummary {
    pub fn size_mb(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

impl fmt::Display for AnimationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  File:     {}", self.path.display())?;
        writeln!(f, "  Size:     {:.2} MB", self.size_mb())?;
        writeln!(f, "  Frames:   {}", self.frames)?;
        writeln!(f, "  FPS:      {}", self.fps)?;
        write!(f, "  Duration: {:.1} seconds", self.duration.as_secs_f64())
    }
}

fn encoding_err(path: &Path, e: ImageError) -> SkylapseError {
    match e {
        ImageError::IoError(io) => SkylapseError::IoError(io),
        other => SkylapseError::EncodingError(format!("{}: {other}", path.display())),
    }
}

/// Writes looping GIF animations at a fixed frame rate
#[derive(Debug, Clone, Copy)]
pub struct AnimationEncoder {
    fps: u32,
    speed: i32,
}

impl AnimationEncoder {
    pub fn new(fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(SkylapseError::EncodingError(
                "Frame rate must be positive".to_string(),
            ));
        }
        if fps > MAX_FAITHFUL_FPS {
            log::warn!(
                "{fps} fps is faster than GIF delays can express; \
                 players will show at most {MAX_FAITHFUL_FPS} fps"
            );
        }
        Ok(Self { fps, speed: 10 })
    }

    /// Colour quantisation speed, 1 (best) to 30 (fastest)
    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed.clamp(1, 30);
        self
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Display time of each frame
    pub fn frame_delay(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps))
    }

    /// Encode `frames` (PNG paths, in order) into a GIF at `output`
    ///
    /// A failure part way leaves no output file behind.
    pub fn encode(&self, frames: &[PathBuf], output: &Path) -> Result<AnimationSummary> {
        if frames.is_empty() {
            return Err(SkylapseError::EncodingError(
                "No frames to encode".to_string(),
            ));
        }

        if let Err(e) = self.write_gif(frames, output) {
            let _ = fs::remove_file(output);
            return Err(e);
        }

        let summary = AnimationSummary {
            path: output.to_path_buf(),
            bytes: fs::metadata(output)?.len(),
            frames: frames.len(),
            fps: self.fps,
            duration: self.frame_delay() * frames.len() as u32,
        };
        log::info!(
            "Wrote {} frames to {} ({} bytes)",
            summary.frames,
            output.display(),
            summary.bytes
        );
        Ok(summary)
    }

    fn write_gif(&self, frames: &[PathBuf], output: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(output)?);
        let mut encoder = GifEncoder::new_with_speed(writer, self.speed);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| encoding_err(output, e))?;

        let delay = Delay::from_numer_denom_ms(1000, self.fps);
        let mut size = None;

        for path in frames {
            let image = image::open(path)
                .map_err(|e| encoding_err(path, e))?
                .to_rgba8();

            let dimensions = image.dimensions();
            match size {
                None => size = Some(dimensions),
                Some(first) if first != dimensions => {
                    return Err(SkylapseError::EncodingError(format!(
                        "{} is {}x{}, expected {}x{}",
                        path.display(),
                        dimensions.0,
                        dimensions.1,
                        first.0,
                        first.1
                    )));
                }
                Some(_) => {}
            }

            log::debug!("Encoding {}", path.display());
            encoder
                .encode_frame(Frame::from_parts(image, 0, 0, delay))
                .map_err(|e| encoding_err(output, e))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, Rgb, RgbImage};

    fn write_frames(dir: &Path, count: usize, size: u32) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("frame_{i:03}.png"));
                let shade = (i * 40) as u8;
                RgbImage::from_pixel(size, size, Rgb([shade, 0, 255 - shade]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_encode_looping_gif() {
        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 4, 16);
        let output = dir.path().join("out.gif");

        let summary = AnimationEncoder::new(20)
            .unwrap()
            .encode(&frames, &output)
            .unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.duration, Duration::from_millis(200));
        assert!(summary.bytes > 0);

        let bytes = fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
        // Loop forever: Netscape application extension
        assert!(bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));

        let decoded = GifDecoder::new(File::open(&output).unwrap())
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(decoded.len(), 4);
        for frame in &decoded {
            assert_eq!(Duration::from(frame.delay()), Duration::from_millis(50));
        }
        // Frame order is preserved: red grows, blue fades
        let first = decoded[0].buffer().get_pixel(8, 8);
        let last = decoded[3].buffer().get_pixel(8, 8);
        assert!(first[0] < last[0]);
        assert!(first[2] > last[2]);
    }

    #[test]
    fn test_quantisation_speed() {
        let encoder = AnimationEncoder::new(20).unwrap();
        assert_eq!(encoder.with_speed(0).speed, 1);
        assert_eq!(encoder.with_speed(99).speed, 30);

        let dir = tempfile::tempdir().unwrap();
        let frames = write_frames(dir.path(), 3, 16);
        for speed in [1, 30] {
            let output = dir.path().join(format!("speed_{speed}.gif"));
            let summary = encoder.with_speed(speed).encode(&frames, &output).unwrap();
            assert_eq!(summary.frames, 3);
            let decoded = GifDecoder::new(File::open(&output).unwrap())
                .unwrap()
                .into_frames()
                .collect_frames()
                .unwrap();
            assert_eq!(decoded.len(), 3);
        }
    }

    #[test]
    fn test_summary_report() {
        let summary = AnimationSummary {
            path: PathBuf::from("cielo_nocturno_artieda.gif"),
            bytes: 3 * 1024 * 1024,
            frames: 144,
            fps: 20,
            duration: Duration::from_millis(50) * 144,
        };
        let text = summary.to_string();
        assert!(text.contains("3.00 MB"));
        assert!(text.contains("Frames:   144"));
        assert!(text.contains("7.2 seconds"));
    }

    #[test]
    fn test_empty_and_zero_fps_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.gif");
        assert!(matches!(
            AnimationEncoder::new(10).unwrap().encode(&[], &output),
            Err(SkylapseError::EncodingError(_))
        ));
        assert!(AnimationEncoder::new(0).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_corrupt_or_mismatched_frames_leave_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.gif");

        let mut frames = write_frames(dir.path(), 2, 16);
        let corrupt = dir.path().join("frame_002.png");
        fs::write(&corrupt, b"not a png").unwrap();
        frames.push(corrupt);
        assert!(AnimationEncoder::new(20).unwrap().encode(&frames, &output).is_err());
        assert!(!output.exists());

        let mut frames = write_frames(dir.path(), 2, 16);
        let odd = dir.path().join("odd.png");
        RgbImage::new(8, 8).save(&odd).unwrap();
        frames.push(odd);
        assert!(matches!(
            AnimationEncoder::new(20).unwrap().encode(&frames, &output),
            Err(SkylapseError::EncodingError(_))
        ));
        assert!(!output.exists());

        let missing = vec![dir.path().join("frame_999.png")];
        assert!(AnimationEncoder::new(20).unwrap().encode(&missing, &output).is_err());
    }
}
