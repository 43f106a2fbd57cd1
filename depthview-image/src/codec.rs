//! JPEG and PNG file support

use crate::buffer::PixelBuffer;
use depthview_core::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, ImageFormat};
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Quality used when writing JPEG files
pub const JPEG_QUALITY: u8 = 95;

/// Image file formats understood by [`PixelBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFileFormat {
    Jpeg,
    Png,
}

impl ImageFileFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());
        match extension.as_deref() {
            Some("jpg") | Some("jpeg") => Ok(ImageFileFormat::Jpeg),
            Some("png") => Ok(ImageFileFormat::Png),
            _ => Err(Error::UnsupportedFormat(format!(
                "Unsupported image format: {:?}",
                path.extension()
            ))),
        }
    }
}

impl From<ImageFileFormat> for ImageFormat {
    fn from(format: ImageFileFormat) -> Self {
        match format {
            ImageFileFormat::Jpeg => ImageFormat::Jpeg,
            ImageFileFormat::Png => ImageFormat::Png,
        }
    }
}

fn decode_error(err: ImageError) -> Error {
    match err {
        ImageError::IoError(e) => Error::Io(e),
        ImageError::Unsupported(e) => Error::UnsupportedFormat(e.to_string()),
        other => Error::Decode(other.to_string()),
    }
}

fn encode_error(err: ImageError) -> Error {
    match err {
        ImageError::IoError(e) => Error::Io(e),
        ImageError::Unsupported(e) => Error::UnsupportedFormat(e.to_string()),
        other => Error::Encode(other.to_string()),
    }
}

impl PixelBuffer {
    /// Read a JPEG or PNG file; the format follows the extension
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = ImageFileFormat::from_path(path)?;
        let reader = BufReader::new(File::open(path)?);
        let rgba = image::load(reader, format.into())
            .map_err(decode_error)?
            .to_rgba8();

        let (width, height) = rgba.dimensions();
        let mut buffer = PixelBuffer::from_rgba(width, height, rgba.into_raw())?;
        buffer.set_name(path.to_string_lossy());
        debug!("decoded {} ({}x{})", path.display(), width, height);
        Ok(buffer)
    }

    /// Write the buffer as JPEG (alpha dropped) or PNG, chosen by extension
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = ImageFileFormat::from_path(path)?;
        let mut writer = BufWriter::new(File::create(path)?);

        match format {
            ImageFileFormat::Jpeg => {
                let rgb: Vec<u8> = self
                    .data
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
                    .encode(&rgb, self.width, self.height, ColorType::Rgb8)
                    .map_err(encode_error)?;
            }
            ImageFileFormat::Png => {
                PngEncoder::new(&mut writer)
                    .write_image(&self.data, self.width, self.height, ColorType::Rgba8)
                    .map_err(encode_error)?;
            }
        }

        writer.flush()?;
        debug!("wrote {} ({}x{})", path.display(), self.width, self.height);
        Ok(())
    }
}
