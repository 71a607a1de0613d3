use std::{fs, path::Path};

use crate::{MlErr, Result};

/// Turns a sample file into a flat tensor.
pub trait Decode: Sync {
    /// Whether the file at `path` is a sample this decoder understands.
    fn accepts(&self, path: &Path) -> bool;

    /// Reads and decodes the sample at `path`.
    fn decode(&self, path: &Path) -> Result<Vec<f32>>;
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn decode_err(path: &Path, reason: impl Into<String>) -> MlErr {
    MlErr::Decode {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Little-endian `f32` blobs with the `.f32` extension, already laid out the way the model
/// expects them.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawF32;

impl Decode for RawF32 {
    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["f32"])
    }

    fn decode(&self, path: &Path) -> Result<Vec<f32>> {
        let bytes = fs::read(path)?;

        if bytes.len() % size_of::<f32>() != 0 {
            return Err(decode_err(
                path,
                format!("{} bytes is not a whole number of f32s", bytes.len()),
            ));
        }

        let words: Vec<u32> = bytemuck::pod_collect_to_vec(&bytes);
        Ok(words
            .into_iter()
            .map(|w| f32::from_bits(u32::from_le(w)))
            .collect())
    }
}

/// Binary netpbm images: greyscale `P5` (`.pgm`) and RGB `P6` (`.ppm`).
///
/// Samples are scaled to `[0, 1]` by the image's maximum value and laid out channel-major, every
/// pixel of the first channel, then every pixel of the second one, and so on.
#[derive(Debug, Default, Clone, Copy)]
pub struct Netpbm;

struct Header {
    channels: usize,
    width: usize,
    height: usize,
    maxval: usize,
}

impl Netpbm {
    fn header(bytes: &[u8]) -> std::result::Result<(Header, &[u8]), String> {
        let mut cursor = 0;

        let magic = token(bytes, &mut cursor).ok_or("missing magic number")?;
        let channels = match magic {
            b"P5" => 1,
            b"P6" => 3,
            other => {
                return Err(format!(
                    "unsupported magic number {}",
                    String::from_utf8_lossy(other)
                ));
            }
        };

        let mut number = |what: &str| -> std::result::Result<usize, String> {
            let tok = token(bytes, &mut cursor).ok_or_else(|| format!("missing {what}"))?;
            std::str::from_utf8(tok)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| format!("invalid {what}"))
        };

        let width = number("width")?;
        let height = number("height")?;
        let maxval = number("maximum value")?;

        if maxval == 0 || maxval > u16::MAX as usize {
            return Err(format!("maximum value {maxval} out of range"));
        }

        // A single whitespace byte separates the header from the raster.
        let raster = bytes.get(cursor + 1..).unwrap_or_default();

        let header = Header {
            channels,
            width,
            height,
            maxval,
        };

        Ok((header, raster))
    }
}

/// Returns the next whitespace-delimited token, skipping `#` comments.
fn token<'a>(bytes: &'a [u8], cursor: &mut usize) -> Option<&'a [u8]> {
    loop {
        match *bytes.get(*cursor)? {
            b'#' => {
                while bytes.get(*cursor).is_some_and(|&b| b != b'\n') {
                    *cursor += 1;
                }
            }
            b if b.is_ascii_whitespace() => *cursor += 1,
            _ => break,
        }
    }

    let start = *cursor;
    while bytes.get(*cursor).is_some_and(|b| !b.is_ascii_whitespace()) {
        *cursor += 1;
    }

    Some(&bytes[start..*cursor])
}

impl Decode for Netpbm {
    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["pgm", "ppm", "pnm"])
    }

    fn decode(&self, path: &Path) -> Result<Vec<f32>> {
        let bytes = fs::read(path)?;
        let (header, raster) = Self::header(&bytes).map_err(|reason| decode_err(path, reason))?;

        let Header {
            channels,
            width,
            height,
            maxval,
        } = header;

        let depth = if maxval > u8::MAX as usize { 2 } else { 1 };
        let overflow = || decode_err(path, "image dimensions overflow");
        let pixels = width.checked_mul(height).ok_or_else(overflow)?;
        let values = pixels.checked_mul(channels).ok_or_else(overflow)?;
        let expected = values.checked_mul(depth).ok_or_else(overflow)?;

        if raster.len() < expected {
            return Err(decode_err(
                path,
                format!("raster has {} bytes, expected {expected}", raster.len()),
            ));
        }

        let scale = maxval as f32;
        let sample = |i: usize| -> f32 {
            let value = match depth {
                1 => raster[i] as u16,
                _ => u16::from_be_bytes([raster[2 * i], raster[2 * i + 1]]),
            };
            value as f32 / scale
        };

        let mut out = vec![0.; values];
        for c in 0..channels {
            for p in 0..pixels {
                out[c * pixels + p] = sample(p * channels + c);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    /// A sample file removed when dropped.
    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str, bytes: &[u8]) -> Self {
            let path = std::env::temp_dir()
                .join(format!("training_engine_decode_{}_{name}", std::process::id()));
            fs::write(&path, bytes).unwrap();
            Self(path)
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn decodes_greyscale_with_comments() {
        let mut bytes = b"P5\n# a comment\n2 1\n255\n".to_vec();
        bytes.extend([0, 255]);
        let file = TempFile::new("grey.pgm", &bytes);

        assert_eq!(Netpbm.decode(&file.0).unwrap(), vec![0., 1.]);
    }

    #[test]
    fn rgb_is_laid_out_channel_major() {
        let mut bytes = b"P6 2 1 255\n".to_vec();
        bytes.extend([255, 0, 0, 0, 255, 0]);
        let file = TempFile::new("rgb.ppm", &bytes);

        assert_eq!(Netpbm.decode(&file.0).unwrap(), vec![1., 0., 0., 1., 0., 0.]);
    }

    #[test]
    fn rejects_truncated_raster() {
        let mut bytes = b"P5 2 2 255\n".to_vec();
        bytes.extend([1, 2, 3]);
        let file = TempFile::new("short.pgm", &bytes);

        assert!(matches!(Netpbm.decode(&file.0), Err(MlErr::Decode { .. })));
    }

    #[test]
    fn raw_f32_round_trips_little_endian() {
        let bytes: Vec<u8> = [0.5f32, -2.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let file = TempFile::new("sample.f32", &bytes);

        assert_eq!(RawF32.decode(&file.0).unwrap(), vec![0.5, -2.0]);
        assert!(RawF32.accepts(&file.0));
        assert!(!Netpbm.accepts(&file.0));
    }

    #[test]
    fn rejects_overflowing_dimensions() {
        let mut bytes = b"P5 4294967296 2147483648 65535\n".to_vec();
        bytes.extend([0, 0]);
        let file = TempFile::new("huge.pgm", &bytes);

        assert!(matches!(
            Netpbm.decode(&file.0),
            Err(MlErr::Decode { reason, .. }) if reason == "image dimensions overflow"
        ));
    }
}
