//! Payload values and identifiers.

use crate::action::ConstructionError;
use crate::color::Color;
use core::fmt;
use std::sync::Arc;

/// Identifies a view within one layout template.
///
/// Ids are plain integers, not references: they are looked up against an applied tree every
/// time an action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub i32);

impl NodeId {
    /// A view without an id. Never a valid action target.
    pub const NONE: NodeId = NodeId(-1);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to a layout template in the host’s resource namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutId(pub i32);

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "layout {}", self.0)
    }
}

/// Reference to a drawable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub i32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "resource {}", self.0)
    }
}

/// Opaque token handed back to the host when a view is clicked.
///
/// The token only names a callback the host registered on its own side; no behavior crosses
/// the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackToken(pub u64);

/// View visibility.
///
/// The discriminants are the toolkit’s integer codes and are what goes over the wire.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible = 0,
    Invisible = 4,
    Gone = 8,
}

impl Visibility {
    pub fn from_code(code: i32) -> Option<Visibility> {
        match code {
            0 => Some(Visibility::Visible),
            4 => Some(Visibility::Invisible),
            8 => Some(Visibility::Gone),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A decoded ARGB bitmap.
///
/// Pixels are shared, so cloning a bitmap (and thus a descriptor carrying one) is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<[u32]>,
}

impl Bitmap {
    /// Creates a bitmap; `pixels` must hold exactly `width * height` row-major ARGB values.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Bitmap, ConstructionError> {
        if width as u64 * height as u64 != pixels.len() as u64 {
            return Err(ConstructionError::BitmapSize {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Bitmap {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// A bitmap filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> Bitmap {
        Bitmap {
            width,
            height,
            pixels: vec![color.to_argb(); width as usize * height as usize].into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.pixels.get(i).map(|p| Color::from_argb(*p))
    }

    /// Bytes occupied by the pixel buffer.
    pub fn byte_count(&self) -> usize {
        self.pixels.len() * 4
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Bitmap({}x{})", self.width, self.height)
    }
}

/// The typed argument of a reflective setter call.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    CharSequence(String),
    Color(Color),
    Uri(String),
    Bitmap(Bitmap),
}

/// Floats compare by bit pattern so that structural equality is reflexive.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (CharSequence(a), CharSequence(b)) => a == b,
            (Color(a), Color(b)) => a == b,
            (Uri(a), Uri(b)) => a == b,
            (Bitmap(a), Bitmap(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::CharSequence(_) => ValueKind::CharSequence,
            Value::Color(_) => ValueKind::Color,
            Value::Uri(_) => ValueKind::Uri,
            Value::Bitmap(_) => ValueKind::Bitmap,
        }
    }

    pub(crate) fn is_nan(&self) -> bool {
        match self {
            Value::Float(v) => v.is_nan(),
            Value::Double(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text-like payloads: both plain strings and char sequences.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::String(v) | Value::CharSequence(v) => Some(v),
            _ => None,
        }
    }

    /// Colors, or integers interpreted as ARGB.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            Value::Int(v) => Some(Color::from(*v)),
            _ => None,
        }
    }

    /// Bytes of bitmap data carried by this value.
    pub(crate) fn byte_count(&self) -> usize {
        match self {
            Value::Bitmap(bitmap) => bitmap.byte_count(),
            _ => 0,
        }
    }
}

/// Kinds of [`Value`]s. The discriminants are the wire tags.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool = 1,
    Int = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    String = 6,
    CharSequence = 7,
    Color = 8,
    Uri = 9,
    Bitmap = 10,
}

impl ValueKind {
    pub fn from_tag(tag: u8) -> Option<ValueKind> {
        Some(match tag {
            1 => ValueKind::Bool,
            2 => ValueKind::Int,
            3 => ValueKind::Long,
            4 => ValueKind::Float,
            5 => ValueKind::Double,
            6 => ValueKind::String,
            7 => ValueKind::CharSequence,
            8 => ValueKind::Color,
            9 => ValueKind::Uri,
            10 => ValueKind::Bitmap,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_codes() {
        for vis in [Visibility::Visible, Visibility::Invisible, Visibility::Gone] {
            assert_eq!(Visibility::from_code(vis.code()), Some(vis));
        }
        assert_eq!(Visibility::from_code(1), None);
    }

    #[test]
    fn bitmap_size_is_checked() {
        assert!(Bitmap::new(2, 2, vec![0; 4]).is_ok());
        let err = Bitmap::new(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(err, ConstructionError::BitmapSize { len: 3, .. }));
    }

    #[test]
    fn bitmap_pixel_lookup() {
        let bitmap = Bitmap::new(2, 1, vec![0xff00_0000, 0xffff_ffff]).unwrap();
        assert_eq!(bitmap.pixel(1, 0), Some(Color::WHITE));
        assert_eq!(bitmap.pixel(2, 0), None);
        assert_eq!(bitmap.byte_count(), 8);
    }

    #[test]
    fn float_values_compare_by_bits() {
        assert_eq!(Value::Float(f32::NAN), Value::Float(f32::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::String("a".into()), Value::CharSequence("a".into()));
    }

    #[test]
    fn color_accepts_ints() {
        assert_eq!(Value::Int(-1).as_color(), Some(Color::WHITE));
        assert_eq!(Value::Bool(true).as_color(), None);
    }
}
