//! Planar YUV interop for camera and video frames
//!
//! Layout: a full resolution Y plane followed by the U and V planes, each
//! `ceil(width / s) x ceil(height / s)` for a chroma subsampling factor `s`
//! (`s == 2` is 4:2:0). Full-range BT.601 coefficients are used, as in JPEG.

use crate::buffer::{check_dimensions, PixelBuffer, CHANNELS};
use depthview_core::{Error, Result};
use std::path::Path;

/// A planar YUV frame
#[derive(Debug, Clone, PartialEq)]
pub struct YuvFrame {
    width: u32,
    height: u32,
    subsample: u32,
    data: Vec<u8>,
}

fn rgb_to_yuv(px: &[u8]) -> [f32; 3] {
    let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
    [
        0.299 * r + 0.587 * g + 0.114 * b,
        -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0,
        0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0,
    ]
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let (y, u, v) = (y as f32, u as f32 - 128.0, v as f32 - 128.0);
    let clamp = |c: f32| c.round().clamp(0.0, 255.0) as u8;
    [
        clamp(y + 1.402 * v),
        clamp(y - 0.344_136 * u - 0.714_136 * v),
        clamp(y + 1.772 * u),
    ]
}

fn check_scale(scale: u32) -> Result<()> {
    if !scale.is_power_of_two() {
        return Err(Error::InvalidData(format!(
            "downscale factor must be a power of two, got {}",
            scale
        )));
    }
    Ok(())
}

impl YuvFrame {
    /// Wrap planar bytes, checking them against the layout
    pub fn new(width: u32, height: u32, subsample: u32, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        if subsample == 0 {
            return Err(Error::InvalidData("chroma subsampling must be positive".to_string()));
        }
        let frame = Self {
            width,
            height,
            subsample,
            data,
        };
        if frame.data.len() != frame.expected_len() {
            return Err(Error::InvalidData(format!(
                "{}x{} YUV frame (subsample {}) needs {} bytes, got {}",
                width,
                height,
                subsample,
                frame.expected_len(),
                frame.data.len()
            )));
        }
        Ok(frame)
    }

    fn expected_len(&self) -> usize {
        self.luma_len() + 2 * self.chroma_len()
    }

    fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn chroma_len(&self) -> usize {
        self.chroma_width() as usize * self.chroma_height() as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn subsample(&self) -> u32 {
        self.subsample
    }

    pub fn chroma_width(&self) -> u32 {
        self.width.div_ceil(self.subsample)
    }

    pub fn chroma_height(&self) -> u32 {
        self.height.div_ceil(self.subsample)
    }

    /// All planes, back to back
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn y_plane(&self) -> &[u8] {
        &self.data[..self.luma_len()]
    }

    pub fn u_plane(&self) -> &[u8] {
        &self.data[self.luma_len()..self.luma_len() + self.chroma_len()]
    }

    pub fn v_plane(&self) -> &[u8] {
        &self.data[self.luma_len() + self.chroma_len()..]
    }

    /// Decode the pixel at `(x, y)` to RGB
    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let luma = self.y_plane()[(y * self.width + x) as usize];
        let c = ((y / self.subsample) * self.chroma_width() + x / self.subsample) as usize;
        yuv_to_rgb(luma, self.u_plane()[c], self.v_plane()[c])
    }

    /// Read a JPEG file straight into planar YUV
    pub fn read_jpeg<P: AsRef<Path>>(path: P, subsample: u32) -> Result<Self> {
        PixelBuffer::open(path)?.extract_yuv(subsample)
    }

    /// Write the frame as a JPEG file; `gray` keeps only the Y plane
    pub fn write_jpeg<P: AsRef<Path>>(&self, path: P, gray: bool) -> Result<()> {
        let image = if gray {
            let data = self.y_plane().iter().flat_map(|&l| [l, l, l, 255]).collect();
            PixelBuffer::from_rgba(self.width, self.height, data)?
        } else {
            PixelBuffer::from_yuv(self, 1)?
        };
        image.write(path)
    }
}

fn decode(frame: &YuvFrame, scale: u32) -> Result<(u32, u32, Vec<u8>)> {
    check_scale(scale)?;
    let width = (frame.width / scale).max(1);
    let height = (frame.height / scale).max(1);
    let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = frame.rgb_at(x * scale, y * scale);
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    Ok((width, height, data))
}

impl PixelBuffer {
    /// Decode a YUV frame, keeping every `scale`-th pixel (a power of two)
    pub fn from_yuv(frame: &YuvFrame, scale: u32) -> Result<Self> {
        let (width, height, data) = decode(frame, scale)?;
        Ok(PixelBuffer::from_parts(width, height, data))
    }

    /// Replace the contents with a decoded YUV frame
    pub fn update_yuv(&mut self, frame: &YuvFrame, scale: u32) -> Result<()> {
        let (width, height, data) = decode(frame, scale)?;
        self.replace(width, height, data);
        Ok(())
    }

    /// Convert to planar YUV with chroma averaged over `subsample` blocks
    pub fn extract_yuv(&self, subsample: u32) -> Result<YuvFrame> {
        if subsample == 0 {
            return Err(Error::InvalidData("chroma subsampling must be positive".to_string()));
        }
        let (w, h) = (self.width as usize, self.height as usize);
        let s = subsample as usize;
        let (cw, ch) = (w.div_ceil(s), h.div_ceil(s));

        let yuv: Vec<[f32; 3]> = self.data.chunks_exact(CHANNELS).map(rgb_to_yuv).collect();
        let mut data = Vec::with_capacity(w * h + 2 * cw * ch);
        data.extend(yuv.iter().map(|p| p[0].round().clamp(0.0, 255.0) as u8));

        for plane in 1..3 {
            for cy in 0..ch {
                for cx in 0..cw {
                    let rows = cy * s..((cy + 1) * s).min(h);
                    let cols = cx * s..((cx + 1) * s).min(w);
                    let n = (rows.len() * cols.len()) as f32;
                    let sum: f32 = rows
                        .flat_map(|y| cols.clone().map(move |x| y * w + x))
                        .map(|i| yuv[i][plane])
                        .sum();
                    data.push((sum / n).round().clamp(0.0, 255.0) as u8);
                }
            }
        }

        YuvFrame::new(self.width, self.height, subsample, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [u8; 4], b: [u8; 4], tolerance: i32) -> bool {
        a.iter().zip(&b).all(|(&x, &y)| (x as i32 - y as i32).abs() <= tolerance)
    }

    #[test]
    fn test_layout_sizes() {
        let image = PixelBuffer::new(5, 3).unwrap();
        let frame = image.extract_yuv(2).unwrap();
        assert_eq!(frame.chroma_width(), 3);
        assert_eq!(frame.chroma_height(), 2);
        assert_eq!(frame.y_plane().len(), 15);
        assert_eq!(frame.u_plane().len(), 6);
        assert_eq!(frame.v_plane().len(), 6);
        assert_eq!(frame.data().len(), 27);
    }

    #[test]
    fn test_solid_color_round_trip() {
        let colors = [[200, 30, 90, 255], [0, 0, 0, 255], [255, 255, 255, 255], [12, 180, 240, 255]];
        for rgba in colors {
            let image = PixelBuffer::from_rgba(4, 4, rgba.repeat(16)).unwrap();
            let frame = image.extract_yuv(2).unwrap();
            let back = PixelBuffer::from_yuv(&frame, 1).unwrap();
            for px in back.data().chunks_exact(4) {
                assert!(close([px[0], px[1], px[2], px[3]], rgba, 2), "{:?} vs {:?}", px, rgba);
            }
        }
    }

    #[test]
    fn test_gray_levels_have_neutral_chroma() {
        let image = PixelBuffer::from_rgba(2, 2, [77, 77, 77, 255].repeat(4)).unwrap();
        let frame = image.extract_yuv(1).unwrap();
        assert!(frame.y_plane().iter().all(|&y| y == 77));
        assert!(frame.u_plane().iter().all(|&u| u == 128));
        assert!(frame.v_plane().iter().all(|&v| v == 128));
    }

    #[test]
    fn test_update_yuv_downscales() {
        let source = PixelBuffer::from_rgba(8, 4, [40, 90, 160, 255].repeat(32)).unwrap();
        let frame = source.extract_yuv(2).unwrap();

        let mut target = PixelBuffer::solid(0, 0, 0, 0);
        target.update_yuv(&frame, 4).unwrap();
        assert_eq!((target.width(), target.height()), (2, 1));
        assert!(close(target.get_color_rgba(1, 0, 0, false), [40, 90, 160, 255], 2));

        assert!(target.update_yuv(&frame, 3).is_err());
        assert!(PixelBuffer::from_yuv(&frame, 0).is_err());
    }

    #[test]
    fn test_frame_length_checked() {
        assert!(YuvFrame::new(4, 4, 2, vec![0; 24]).is_ok());
        assert!(YuvFrame::new(4, 4, 2, vec![0; 23]).is_err());
        assert!(YuvFrame::new(4, 4, 0, vec![0; 24]).is_err());
    }

    #[test]
    fn test_jpeg_bridges() {
        let dir = tempfile::tempdir().unwrap();
        let color = dir.path().join("frame.jpg");
        let gray = dir.path().join("frame_gray.jpg");

        let image = PixelBuffer::from_rgba(16, 8, [180, 60, 20, 255].repeat(128)).unwrap();
        image.write(&color).unwrap();

        let frame = YuvFrame::read_jpeg(&color, 2).unwrap();
        assert_eq!((frame.width(), frame.height(), frame.subsample()), (16, 8, 2));

        frame.write_jpeg(&gray, true).unwrap();
        let loaded = PixelBuffer::open(&gray).unwrap();
        let [r, g, b, _] = loaded.get_color_rgba(8, 4, 0, false);
        assert!((r as i32 - g as i32).abs() <= 4 && (g as i32 - b as i32).abs() <= 4);
    }
}
