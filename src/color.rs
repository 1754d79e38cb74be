//! Colors.

use core::fmt;

/// An 8-bit-per-channel ARGB color.
///
/// This is the representation color setters receive; it packs into a single `u32` on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::from_argb(0x0000_0000);
    pub const BLACK: Color = Color::from_argb(0xff00_0000);
    pub const WHITE: Color = Color::from_argb(0xffff_ffff);
    pub const RED: Color = Color::from_argb(0xffff_0000);
    pub const GREEN: Color = Color::from_argb(0xff00_ff00);
    pub const BLUE: Color = Color::from_argb(0xff00_00ff);

    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { a: 0xff, r, g, b }
    }

    /// Unpacks a `0xAARRGGBB` value.
    pub const fn from_argb(argb: u32) -> Color {
        Color {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Packs into `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Returns this color with a different alpha channel.
    pub const fn with_alpha(self, a: u8) -> Color {
        Color { a, ..self }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:08x}", self.to_argb())
    }
}

/// Integer setters (e.g. `setTextColor` via `SetInt`) carry colors as signed ARGB.
impl From<i32> for Color {
    fn from(argb: i32) -> Color {
        Color::from_argb(argb as u32)
    }
}

impl From<Color> for i32 {
    fn from(color: Color) -> i32 {
        color.to_argb() as i32
    }
}

#[test]
fn test_color_packing() {
    let color = Color::from_argb(0x80ff_4020);
    assert_eq!(color, Color { a: 0x80, r: 0xff, g: 0x40, b: 0x20 });
    assert_eq!(color.to_argb(), 0x80ff_4020);
    assert_eq!(Color::from(-1i32), Color::WHITE);
    assert_eq!(i32::from(Color::BLACK), 0xff00_0000u32 as i32);
    assert_eq!(format!("{:?}", Color::RED.with_alpha(0)), "#00ff0000");
}
