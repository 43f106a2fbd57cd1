//! Packed vertex colors
//!
//! Colors travel to the renderer as one `u32` per vertex whose bytes in memory
//! are `[r, g, b, a]`, so a slice of packed colors can be handed over directly
//! as an unsigned-byte4 attribute.

/// A color packed as little-endian RGBA bytes
pub type PackedColor = u32;

/// Opaque white
pub const WHITE: PackedColor = 0xFFFF_FFFF;

/// Pack four channels into one color
pub fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> PackedColor {
    u32::from_le_bytes([r, g, b, a])
}

/// Split a packed color into `[r, g, b, a]`
pub fn unpack_rgba(color: PackedColor) -> [u8; 4] {
    color.to_le_bytes()
}

/// Encode an opaque RGB color, clamping each channel to `0..=255`
pub fn encode_color(r: i32, g: i32, b: i32) -> PackedColor {
    let clamp = |c: i32| c.clamp(0, 255) as u8;
    pack_rgba(clamp(r), clamp(g), clamp(b), 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_byte_order() {
        let c = pack_rgba(1, 2, 3, 4);
        assert_eq!(bytemuck::bytes_of(&c), &[1, 2, 3, 4]);
        assert_eq!(unpack_rgba(c), [1, 2, 3, 4]);
    }

    #[test]
    fn test_encode_color_clamps() {
        assert_eq!(unpack_rgba(encode_color(0, 128, 0)), [0, 128, 0, 255]);
        assert_eq!(unpack_rgba(encode_color(-5, 300, 7)), [0, 255, 7, 255]);
        assert_eq!(encode_color(255, 255, 255), WHITE);
    }
}
