//! In-place image transforms

use crate::buffer::{PixelBuffer, CHANNELS};
use depthview_core::{Error, Result};
use rayon::prelude::*;

/// BT.601 luma of an RGB triple
pub(crate) fn luma(px: &[u8]) -> f32 {
    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
}

impl PixelBuffer {
    /// Box blur with a `(2 * size + 1)` wide kernel; borders are clamped.
    /// `size` is capped at the larger image side.
    pub fn blur(&mut self, size: u32) {
        if size == 0 {
            return;
        }
        let (w, h) = (self.width as usize, self.height as usize);
        let r = size.min(self.width.max(self.height)) as i64;
        let count = (2 * r + 1) as u64;
        let row_len = w * CHANNELS;

        // horizontal pass
        let src = &self.data;
        let mut tmp = vec![0u8; src.len()];
        tmp.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
            for x in 0..w {
                for c in 0..CHANNELS {
                    let sum: u64 = (-r..=r)
                        .map(|d| {
                            let sx = (x as i64 + d).clamp(0, w as i64 - 1) as usize;
                            src[(y * w + sx) * CHANNELS + c] as u64
                        })
                        .sum();
                    row[x * CHANNELS + c] = ((sum + count / 2) / count) as u8;
                }
            }
        });

        // vertical pass
        let mut out = vec![0u8; tmp.len()];
        out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
            for (i, value) in row.iter_mut().enumerate() {
                let sum: u64 = (-r..=r)
                    .map(|d| {
                        let sy = (y as i64 + d).clamp(0, h as i64 - 1) as usize;
                        tmp[sy * row_len + i] as u64
                    })
                    .sum();
                *value = ((sum + count / 2) / count) as u8;
            }
        });

        self.data = out;
    }

    /// Shrink by an integer factor, averaging each `scale` x `scale` block.
    ///
    /// Trailing rows or columns that do not fill a whole block are dropped,
    /// except that the result is never smaller than 1x1.
    pub fn downsize(&mut self, scale: u32) -> Result<()> {
        if scale == 0 {
            return Err(Error::InvalidData("downsize scale must be positive".to_string()));
        }
        if scale == 1 {
            return Ok(());
        }

        let (w, h) = (self.width as usize, self.height as usize);
        let s = scale as usize;
        let (nw, nh) = ((w / s).max(1), (h / s).max(1));
        let src = &self.data;

        let mut out = vec![0u8; nw * nh * CHANNELS];
        out.par_chunks_mut(nw * CHANNELS).enumerate().for_each(|(y, row)| {
            let rows = y * s..((y + 1) * s).min(h);
            for x in 0..nw {
                let cols = x * s..((x + 1) * s).min(w);
                let n = (rows.len() * cols.len()) as u32;
                let mut sum = [0u32; CHANNELS];
                for sy in rows.clone() {
                    for sx in cols.clone() {
                        let i = (sy * w + sx) * CHANNELS;
                        for (acc, &c) in sum.iter_mut().zip(&src[i..i + CHANNELS]) {
                            *acc += c as u32;
                        }
                    }
                }
                for c in 0..CHANNELS {
                    row[x * CHANNELS + c] = ((sum[c] + n / 2) / n) as u8;
                }
            }
        });

        self.replace(nw as u32, nh as u32, out);
        Ok(())
    }

    /// Replace the image with its Sobel gradient magnitude, as opaque gray
    pub fn edge_detect(&mut self) {
        let (w, h) = (self.width as i64, self.height as i64);
        let gray: Vec<f32> = self.data.chunks_exact(CHANNELS).map(luma).collect();
        let at = |x: i64, y: i64| gray[(y.clamp(0, h - 1) * w + x.clamp(0, w - 1)) as usize];

        let mut out = vec![0u8; self.data.len()];
        out.par_chunks_mut(w as usize * CHANNELS).enumerate().for_each(|(y, row)| {
            let y = y as i64;
            for x in 0..w {
                let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
                let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
                let m = (gx * gx + gy * gy).sqrt().round().min(255.0) as u8;
                let i = x as usize * CHANNELS;
                row[i..i + CHANNELS].copy_from_slice(&[m, m, m, 255]);
            }
        });

        self.data = out;
    }

    /// Rotate 90 degrees clockwise
    pub fn turn(&mut self) {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut out = vec![0u8; self.data.len()];
        // destination is h wide and w tall
        for dy in 0..w {
            for dx in 0..h {
                let src = ((h - 1 - dx) * w + dy) * CHANNELS;
                let dst = (dy * h + dx) * CHANNELS;
                out[dst..dst + CHANNELS].copy_from_slice(&self.data[src..src + CHANNELS]);
            }
        }
        self.replace(h as u32, w as u32, out);
    }

    /// Flip vertically
    pub fn upside_down(&mut self) {
        let row_len = self.width as usize * CHANNELS;
        let h = self.height as usize;
        for y in 0..h / 2 {
            let (top, bottom) = self.data.split_at_mut((h - 1 - y) * row_len);
            top[y * row_len..(y + 1) * row_len].swap_with_slice(&mut bottom[..row_len]);
        }
    }
}
