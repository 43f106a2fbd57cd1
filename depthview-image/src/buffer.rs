//! The owned RGBA pixel buffer

use crate::texture::{TextureId, TextureReclaimer, TextureUploader};
use depthview_core::{pack_rgba, Error, PackedColor, Result};
use log::warn;

/// Bytes per pixel; buffers always hold RGBA8
pub const CHANNELS: usize = 4;

/// An RGBA8 image owned in memory, optionally mirrored by a GPU texture.
///
/// `data.len() == width * height * CHANNELS` holds for the whole lifetime of
/// the buffer, and both dimensions are at least one.
#[derive(Debug)]
pub struct PixelBuffer {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
    extra: Option<Vec<[i32; 4]>>,
    name: String,
    instances: usize,
    texture: Option<TextureId>,
    reclaimer: Option<TextureReclaimer>,
}

impl PixelBuffer {
    /// Create a zeroed (transparent black) buffer
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        let len = width as usize * height as usize * CHANNELS;
        Ok(Self::from_parts(width, height, vec![0; len]))
    }

    /// Create a 1x1 buffer of a single color
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_parts(1, 1, vec![r, g, b, a])
    }

    /// Wrap existing RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(Error::InvalidData(format!(
                "{}x{} RGBA image needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self::from_parts(width, height, data))
    }

    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
            extra: None,
            name: String::new(),
            instances: 0,
            texture: None,
            reclaimer: None,
        }
    }

    /// Route texture releases of this buffer to the renderer's queue
    pub fn with_reclaimer(mut self, reclaimer: TextureReclaimer) -> Self {
        self.reclaimer = Some(reclaimer);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major from the top-left pixel
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Swap in new pixel contents; the overlay is dropped when the size changes
    pub(crate) fn replace(&mut self, width: u32, height: u32, data: Vec<u8>) {
        debug_assert_eq!(data.len(), width as usize * height as usize * CHANNELS);
        if (width, height) != (self.width, self.height) {
            self.extra = None;
        }
        self.width = width;
        self.height = height;
        self.data = data;
    }

    fn address(&self, x: i64, y: i64, repeat: bool) -> usize {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = if repeat {
            (x.rem_euclid(w), y.rem_euclid(h))
        } else {
            (x.clamp(0, w - 1), y.clamp(0, h - 1))
        };
        (y * w + x) as usize * CHANNELS
    }

    /// Packed color of one pixel; coordinates outside the image are clamped
    pub fn get_color(&self, x: i32, y: i32) -> PackedColor {
        let [r, g, b, a] = self.get_color_rgba(x, y, 0, false);
        pack_rgba(r, g, b, a)
    }

    /// Mean color of the `(2 * radius + 1)`² window centred on `(x, y)`.
    ///
    /// With `repeat` the image is addressed toroidally, otherwise coordinates
    /// are clamped to the border. Radii beyond the larger image side are
    /// treated as that side.
    pub fn get_color_rgba(&self, x: i32, y: i32, radius: u32, repeat: bool) -> [u8; 4] {
        let r = radius.min(self.width.max(self.height)) as i64;
        let mut sum = [0u64; 4];
        for dy in -r..=r {
            for dx in -r..=r {
                let i = self.address(x as i64 + dx, y as i64 + dy, repeat);
                for (s, &c) in sum.iter_mut().zip(&self.data[i..i + CHANNELS]) {
                    *s += c as u64;
                }
            }
        }
        let count = ((2 * r + 1) * (2 * r + 1)) as u64;
        sum.map(|s| ((s + count / 2) / count) as u8)
    }

    /// Overwrite one pixel; coordinates must be inside the image
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Register one more logical owner
    pub fn add_instance(&mut self) {
        self.instances += 1;
    }

    /// Drop one logical owner; pairs with exactly one `add_instance`
    pub fn del_instance(&mut self) {
        match self.instances.checked_sub(1) {
            Some(n) => self.instances = n,
            None => warn!("del_instance on '{}' without a matching add_instance", self.name),
        }
    }

    /// Whether no logical owner remains
    pub fn can_be_deleted(&self) -> bool {
        self.instances == 0
    }

    /// Allocate the per-pixel overlay, zeroed
    pub fn init_extra_data(&mut self) {
        self.extra = Some(vec![[0; 4]; self.width as usize * self.height as usize]);
    }

    pub fn extra_data(&self) -> Option<&[[i32; 4]]> {
        self.extra.as_deref()
    }

    pub fn extra_data_mut(&mut self) -> Option<&mut [[i32; 4]]> {
        self.extra.as_deref_mut()
    }

    /// Texture currently mirroring this buffer, if any
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Attach a texture created elsewhere; a replaced texture is released
    pub fn set_texture(&mut self, texture: Option<TextureId>) {
        if let Some(old) = self.texture.take() {
            if Some(old) != texture {
                self.release(old);
            }
        }
        self.texture = texture;
    }

    /// Push the current pixels to the GPU through `uploader`
    pub fn update_texture(&mut self, uploader: &mut dyn TextureUploader) -> Result<TextureId> {
        let id = uploader.upload(self.width, self.height, &self.data, self.texture)?;
        self.set_texture(Some(id));
        Ok(id)
    }

    fn release(&self, texture: TextureId) {
        match &self.reclaimer {
            Some(reclaimer) => reclaimer.release(texture),
            None => warn!("no reclaimer for '{}', leaking texture {}", self.name, texture.0),
        }
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.release(texture);
        }
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidData(format!(
            "image dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::reclaim_channel;

    fn checker() -> PixelBuffer {
        // 2x2: red, green / blue, white
        PixelBuffer::from_rgba(
            2,
            2,
            vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 255, 255],
        )
        .unwrap()
    }

    struct CountingUploader {
        next: u32,
    }

    impl TextureUploader for CountingUploader {
        fn upload(&mut self, _w: u32, _h: u32, _rgba: &[u8], existing: Option<TextureId>) -> Result<TextureId> {
            Ok(existing.unwrap_or_else(|| {
                self.next += 1;
                TextureId(self.next)
            }))
        }
    }

    #[test]
    fn test_solid_color_everywhere() {
        let image = PixelBuffer::solid(10, 20, 30, 40);
        let expected = pack_rgba(10, 20, 30, 40);
        for y in -3..3 {
            for x in -3..3 {
                assert_eq!(image.get_color(x, y), expected);
            }
        }
        assert_eq!(image.get_color_rgba(0, 0, 2, true), [10, 20, 30, 40]);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(PixelBuffer::new(0, 4).is_err());
        assert!(PixelBuffer::new(4, 0).is_err());
        assert!(PixelBuffer::from_rgba(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_wrap_and_clamp_addressing() {
        let image = checker();
        // one step left of the red pixel
        assert_eq!(image.get_color_rgba(-1, 0, 0, true), [0, 255, 0, 255]);
        assert_eq!(image.get_color_rgba(-1, 0, 0, false), [255, 0, 0, 255]);
        assert_eq!(image.get_color_rgba(5, 5, 0, true), [255, 255, 255, 255]);
        assert_eq!(image.get_color_rgba(5, 5, 0, false), [255, 255, 255, 255]);
    }

    #[test]
    fn test_neighbourhood_mean() {
        let image = checker();
        // toroidal 3x3 window around (0, 0) sees red x1, green x2, blue x2, white x4
        let [r, g, b, a] = image.get_color_rgba(0, 0, 1, true);
        assert_eq!(r, ((5 * 255) as f32 / 9.0).round() as u8);
        assert_eq!(g, ((6 * 255) as f32 / 9.0).round() as u8);
        assert_eq!(b, ((6 * 255) as f32 / 9.0).round() as u8);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_huge_radius_is_clamped() {
        let image = checker();
        let span = image.width().max(image.height());
        for repeat in [false, true] {
            assert_eq!(
                image.get_color_rgba(1, 1, u32::MAX, repeat),
                image.get_color_rgba(1, 1, span, repeat)
            );
        }
        assert_eq!(PixelBuffer::solid(7, 8, 9, 10).get_color_rgba(0, 0, u32::MAX, false), [7, 8, 9, 10]);
    }

    #[test]
    fn test_instance_counting() {
        let mut image = PixelBuffer::solid(0, 0, 0, 255);
        assert!(image.can_be_deleted());

        let n = 5;
        for _ in 0..n {
            image.add_instance();
        }
        for _ in 0..n - 1 {
            image.del_instance();
        }
        assert!(!image.can_be_deleted());

        image.del_instance();
        assert!(image.can_be_deleted());

        // unbalanced release stays at zero
        image.del_instance();
        assert!(image.can_be_deleted());
    }

    #[test]
    fn test_extra_data_follows_size() {
        let mut image = PixelBuffer::new(3, 2).unwrap();
        assert!(image.extra_data().is_none());
        image.init_extra_data();
        assert_eq!(image.extra_data().unwrap().len(), 6);
        image.extra_data_mut().unwrap()[5] = [1, 2, 3, 4];
        assert_eq!(image.extra_data().unwrap()[5], [1, 2, 3, 4]);
    }

    #[test]
    fn test_drop_posts_texture_once() {
        let (reclaimer, queue) = reclaim_channel();
        let mut uploader = CountingUploader { next: 0 };
        {
            let mut image = PixelBuffer::solid(1, 2, 3, 4).with_reclaimer(reclaimer);
            let first = image.update_texture(&mut uploader).unwrap();
            let second = image.update_texture(&mut uploader).unwrap();
            assert_eq!(first, second);
            assert!(queue.drain().is_empty());
        }
        assert_eq!(queue.drain(), vec![TextureId(1)]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_replaced_texture_is_released() {
        let (reclaimer, queue) = reclaim_channel();
        let mut image = PixelBuffer::solid(1, 2, 3, 4).with_reclaimer(reclaimer);
        image.set_texture(Some(TextureId(4)));
        image.set_texture(Some(TextureId(9)));
        assert_eq!(queue.drain(), vec![TextureId(4)]);
        drop(image);
        assert_eq!(queue.drain(), vec![TextureId(9)]);
    }

    #[test]
    fn test_untextured_drop_posts_nothing() {
        let (reclaimer, queue) = reclaim_channel();
        drop(PixelBuffer::solid(0, 0, 0, 0).with_reclaimer(reclaimer));
        assert_eq!(queue.pending(), 0);
    }
}
