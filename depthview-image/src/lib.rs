//! # depthview image
//!
//! Owned RGBA pixel buffers for color frames: JPEG/PNG files, planar YUV
//! interop, neighbourhood sampling with wrap or clamp addressing, in-place
//! filters, and GPU texture handles that are released through a queue drained
//! by the renderer.

pub mod buffer;
pub mod codec;
pub mod filter;
pub mod texture;
pub mod yuv;

pub use buffer::*;
pub use codec::*;
pub use texture::*;
pub use yuv::*;
