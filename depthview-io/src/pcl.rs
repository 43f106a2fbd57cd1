//! Raw depth clouds as recorded by the sensor.
//!
//! Layout, little-endian: a `u32` sample count, then per sample four `f32`
//! values `x y z confidence` in sensor space.

use depthview_core::{DepthCloud, DepthSample, Error, Point3f, Result};
use log::debug;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const SAMPLE_BYTES: usize = 16;

/// Read a `.pcl` depth cloud
pub fn read_pcl<P: AsRef<Path>>(path: P) -> Result<DepthCloud> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let cloud = decode_pcl(&bytes)
        .map_err(|message| Error::InvalidData(format!("{}: {}", path.display(), message)))?;
    debug!("read {} depth samples from {}", cloud.len(), path.display());
    Ok(cloud)
}

/// Write a depth cloud in `.pcl` layout
pub fn write_pcl<P: AsRef<Path>>(cloud: &DepthCloud, path: P) -> Result<()> {
    let count = u32::try_from(cloud.len())
        .map_err(|_| Error::InvalidData(format!("too many samples: {}", cloud.len())))?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&count.to_le_bytes())?;
    for sample in cloud {
        let p = sample.position;
        for value in [p.x, p.y, p.z, sample.confidence] {
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn decode_pcl(bytes: &[u8]) -> std::result::Result<DepthCloud, String> {
    let (header, body) = bytes
        .split_first_chunk::<4>()
        .ok_or_else(|| "missing sample count".to_string())?;
    let count = u32::from_le_bytes(*header) as usize;
    let expected = count
        .checked_mul(SAMPLE_BYTES)
        .ok_or_else(|| format!("sample count {} overflows", count))?;
    if body.len() < expected {
        return Err(format!("expected {} samples, file holds {}", count, body.len() / SAMPLE_BYTES));
    }

    Ok(body[..expected]
        .chunks_exact(SAMPLE_BYTES)
        .map(|chunk| {
            let value = |i: usize| {
                let mut word = [0u8; 4];
                word.copy_from_slice(&chunk[i * 4..i * 4 + 4]);
                f32::from_le_bytes(word)
            };
            DepthSample::with_confidence(Point3f::new(value(0), value(1), value(2)), value(3))
        })
        .collect())
}
