//! Binary encoding of descriptors.
//!
//! Everything is big-endian. Strings are a `u32` byte length followed by UTF-8, booleans a
//! single `0` or `1` byte. A descriptor is an origin flag (and origin string), the layout id,
//! the action count and the actions; an action is its target id, its verb tag and the verb’s
//! payload. Reflective verbs carry the method name followed by a tagged value.
//!
//! Decoding fails closed: unknown tags, truncated input, leftover bytes and payloads that do
//! not fit their verb are all errors.

use crate::action::{Action, ConstructionError, Verb, VerbKind};
use crate::color::Color;
use crate::config::WireLimits;
use crate::remote_views::RemoteViews;
use crate::value::{
    Bitmap, CallbackToken, LayoutId, NodeId, ResourceId, Value, ValueKind, Visibility,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Errors from decoding a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("input ended early")]
    Truncated,
    #[error("unknown verb tag {0}")]
    UnknownVerb(i32),
    #[error("unknown value tag {0}")]
    UnknownValueTag(u8),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid visibility code {0}")]
    InvalidVisibility(i32),
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),
    #[error("{what} exceeds limit: {found} > {limit}")]
    LimitExceeded {
        what: &'static str,
        limit: u64,
        found: u64,
    },
    #[error("descriptors nested deeper than {0}")]
    NestingTooDeep(usize),
    #[error("{0} bytes left over after the descriptor")]
    TrailingBytes(usize),
    #[error("invalid action: {0}")]
    Construction(#[from] ConstructionError),
}

pub(crate) fn encode(views: &RemoteViews) -> Bytes {
    let mut buf = BytesMut::new();
    put_views(&mut buf, views);
    buf.freeze()
}

pub(crate) fn decode(bytes: &[u8], limits: &WireLimits) -> Result<RemoteViews, WireError> {
    let mut reader = Reader {
        buf: bytes,
        limits,
        depth: 0,
    };
    let views = reader.views()?;
    if reader.buf.has_remaining() {
        return Err(WireError::TrailingBytes(reader.buf.remaining()));
    }
    Ok(views)
}

fn put_views(buf: &mut BytesMut, views: &RemoteViews) {
    match views.origin() {
        Some(origin) => {
            buf.put_u8(1);
            put_string(buf, origin);
        }
        None => buf.put_u8(0),
    }
    buf.put_i32(views.layout_id().0);
    buf.put_u32(views.actions().len() as u32);
    for action in views.actions() {
        put_action(buf, action);
    }
}

fn put_action(buf: &mut BytesMut, action: &Action) {
    buf.put_i32(action.target().0);
    buf.put_i32(action.kind().tag());

    let verb = action.verb();
    if let (Some(method), Some(value)) = (verb.method(), verb.argument()) {
        put_string(buf, method);
        put_value(buf, &value);
        return;
    }

    match verb {
        Verb::SetVisibility(visibility) => buf.put_i32(visibility.code()),
        Verb::SetText(text) | Verb::SetImageFromUri(text) => put_string(buf, text),
        Verb::SetImageFromResource(id) => buf.put_i32(id.0),
        Verb::SetImageFromBytes(bitmap) => put_bitmap(buf, bitmap),
        Verb::SetOnClick(token) => buf.put_u64(token.0),
        Verb::SetChronometerState {
            base,
            format,
            started,
        } => {
            buf.put_i64(*base);
            match format {
                Some(format) => {
                    buf.put_u8(1);
                    put_string(buf, format);
                }
                None => buf.put_u8(0),
            }
            buf.put_u8(*started as u8);
        }
        Verb::SetProgressState {
            max,
            progress,
            indeterminate,
        } => {
            buf.put_i32(*max);
            buf.put_i32(*progress);
            buf.put_u8(*indeterminate as u8);
        }
        Verb::AddView(nested) => put_views(buf, nested),
        Verb::RemoveAllViews => (),
        Verb::SetPadding {
            left,
            top,
            right,
            bottom,
        } => {
            buf.put_i32(*left);
            buf.put_i32(*top);
            buf.put_i32(*right);
            buf.put_i32(*bottom);
        }
        // reflective verbs were written above
        Verb::SetBoolean { .. }
        | Verb::SetInt { .. }
        | Verb::SetLong { .. }
        | Verb::SetFloat { .. }
        | Verb::SetString { .. }
        | Verb::SetCharSequence { .. }
        | Verb::SetColor { .. }
        | Verb::ReflectiveCall { .. } => (),
    }
}

fn put_value(buf: &mut BytesMut, value: &Value) {
    buf.put_u8(value.kind().tag());
    match value {
        Value::Bool(v) => buf.put_u8(*v as u8),
        Value::Int(v) => buf.put_i32(*v),
        Value::Long(v) => buf.put_i64(*v),
        Value::Float(v) => buf.put_f32(*v),
        Value::Double(v) => buf.put_f64(*v),
        Value::String(v) | Value::CharSequence(v) | Value::Uri(v) => put_string(buf, v),
        Value::Color(color) => buf.put_u32(color.to_argb()),
        Value::Bitmap(bitmap) => put_bitmap(buf, bitmap),
    }
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn put_bitmap(buf: &mut BytesMut, bitmap: &Bitmap) {
    buf.put_u32(bitmap.width());
    buf.put_u32(bitmap.height());
    for pixel in bitmap.pixels() {
        buf.put_u32(*pixel);
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    limits: &'a WireLimits,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn need(&self, len: u64) -> Result<(), WireError> {
        if (self.buf.remaining() as u64) < len {
            return Err(WireError::Truncated);
        }
        Ok(())
    }

    fn limit(&self, what: &'static str, limit: usize, found: u64) -> Result<(), WireError> {
        if found > limit as u64 {
            return Err(WireError::LimitExceeded {
                what,
                limit: limit as u64,
                found,
            });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, WireError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn i32(&mut self) -> Result<i32, WireError> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    fn i64(&mut self) -> Result<i64, WireError> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    fn u64(&mut self) -> Result<u64, WireError> {
        self.need(8)?;
        Ok(self.buf.get_u64())
    }

    fn bool(&mut self) -> Result<bool, WireError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }

    fn string(&mut self) -> Result<String, WireError> {
        let len = self.u32()?;
        self.limit("string", self.limits.max_string_bytes, len as u64)?;
        self.need(len as u64)?;
        let (bytes, rest) = self.buf.split_at(len as usize);
        let s = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)?;
        self.buf = rest;
        Ok(s.to_string())
    }

    fn optional_string(&mut self) -> Result<Option<String>, WireError> {
        if self.bool()? {
            Ok(Some(self.string()?))
        } else {
            Ok(None)
        }
    }

    fn bitmap(&mut self) -> Result<Bitmap, WireError> {
        let width = self.u32()?;
        let height = self.u32()?;
        let count = width as u64 * height as u64;
        self.limit("bitmap", self.limits.max_bitmap_pixels, count)?;
        self.need(count.saturating_mul(4))?;
        let pixels = (0..count).map(|_| self.buf.get_u32()).collect();
        Ok(Bitmap::new(width, height, pixels)?)
    }

    fn value(&mut self) -> Result<Value, WireError> {
        let tag = self.u8()?;
        let kind = ValueKind::from_tag(tag).ok_or(WireError::UnknownValueTag(tag))?;
        Ok(match kind {
            ValueKind::Bool => Value::Bool(self.bool()?),
            ValueKind::Int => Value::Int(self.i32()?),
            ValueKind::Long => Value::Long(self.i64()?),
            ValueKind::Float => Value::Float(f32::from_bits(self.u32()?)),
            ValueKind::Double => Value::Double(f64::from_bits(self.u64()?)),
            ValueKind::String => Value::String(self.string()?),
            ValueKind::CharSequence => Value::CharSequence(self.string()?),
            ValueKind::Color => Value::Color(Color::from_argb(self.u32()?)),
            ValueKind::Uri => Value::Uri(self.string()?),
            ValueKind::Bitmap => Value::Bitmap(self.bitmap()?),
        })
    }

    fn views(&mut self) -> Result<RemoteViews, WireError> {
        let origin = self.optional_string()?;
        let layout = LayoutId(self.i32()?);
        let count = self.u32()?;
        self.limit("action count", self.limits.max_actions, count as u64)?;

        // every action takes at least 8 bytes
        let mut actions = Vec::with_capacity((count as usize).min(self.buf.remaining() / 8));
        for _ in 0..count {
            actions.push(self.action()?);
        }
        Ok(RemoteViews::from_parts(origin, layout, actions))
    }

    fn action(&mut self) -> Result<Action, WireError> {
        let target = NodeId(self.i32()?);
        let tag = self.i32()?;
        let kind = VerbKind::from_tag(tag).ok_or(WireError::UnknownVerb(tag))?;

        if kind.is_reflective() {
            let method = self.string()?;
            let value = self.value()?;
            return Ok(Action::reflective(target, kind, method, value)?);
        }

        let verb = match kind {
            VerbKind::SetVisibility => {
                let code = self.i32()?;
                Verb::SetVisibility(
                    Visibility::from_code(code).ok_or(WireError::InvalidVisibility(code))?,
                )
            }
            VerbKind::SetText => Verb::SetText(self.string()?),
            VerbKind::SetImageFromResource => Verb::SetImageFromResource(ResourceId(self.i32()?)),
            VerbKind::SetImageFromBytes => Verb::SetImageFromBytes(self.bitmap()?),
            VerbKind::SetImageFromUri => Verb::SetImageFromUri(self.string()?),
            VerbKind::SetOnClick => Verb::SetOnClick(CallbackToken(self.u64()?)),
            VerbKind::SetChronometerState => Verb::SetChronometerState {
                base: self.i64()?,
                format: self.optional_string()?,
                started: self.bool()?,
            },
            VerbKind::SetProgressState => Verb::SetProgressState {
                max: self.i32()?,
                progress: self.i32()?,
                indeterminate: self.bool()?,
            },
            VerbKind::AddView => {
                if self.depth >= self.limits.max_nesting_depth {
                    return Err(WireError::NestingTooDeep(self.limits.max_nesting_depth));
                }
                self.depth += 1;
                let nested = self.views()?;
                self.depth -= 1;
                Verb::AddView(Box::new(nested))
            }
            VerbKind::RemoveAllViews => Verb::RemoveAllViews,
            VerbKind::SetPadding => Verb::SetPadding {
                left: self.i32()?,
                top: self.i32()?,
                right: self.i32()?,
                bottom: self.i32()?,
            },
            VerbKind::SetBoolean
            | VerbKind::SetInt
            | VerbKind::SetLong
            | VerbKind::SetFloat
            | VerbKind::SetString
            | VerbKind::SetCharSequence
            | VerbKind::SetColor
            | VerbKind::ReflectiveCall => return Err(WireError::UnknownVerb(tag)),
        };
        Ok(Action::new(target, verb)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RemoteViews {
        let mut nested = RemoteViews::builder(LayoutId(2));
        nested.set_text_view_text(NodeId(1), "inner").unwrap();

        let mut builder = RemoteViews::builder(LayoutId(0x0102_0304));
        builder
            .origin("com.example.widget")
            .unwrap()
            .set_view_visibility(NodeId(1), Visibility::Invisible)
            .unwrap()
            .set_float(NodeId(2), "setTextSize", 18.5)
            .unwrap()
            .set_image_view_bitmap(NodeId(3), Bitmap::solid(2, 1, Color::RED))
            .unwrap()
            .set_chronometer(NodeId(4), -5, Some("%s"), true)
            .unwrap()
            .call(NodeId(5), "setImageAlpha", Value::Int(80))
            .unwrap()
            .add_view(NodeId(6), nested.build())
            .unwrap()
            .remove_all_views(NodeId(7))
            .unwrap();
        builder.build()
    }

    fn header(actions: u32) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_u8(0);
        buf.put_i32(1);
        buf.put_u32(actions);
        buf
    }

    #[test]
    fn decode_inverts_encode() {
        let views = sample();
        let decoded = RemoteViews::deserialize(&views.serialize()).unwrap();
        assert_eq!(decoded, views);
        assert_eq!(decoded.origin(), Some("com.example.widget"));
    }

    #[test]
    fn float_bit_patterns_survive() {
        let mut builder = RemoteViews::builder(LayoutId(1));
        builder.set_float(NodeId(1), "setAlpha", -0.0).unwrap();
        let negative = builder.build();
        let decoded = decode(&encode(&negative), &WireLimits::default()).unwrap();
        assert_eq!(decoded, negative);

        let mut builder = RemoteViews::builder(LayoutId(1));
        builder.set_float(NodeId(1), "setAlpha", 0.0).unwrap();
        assert_ne!(decoded, builder.build());
    }

    #[test]
    fn header_is_big_endian() {
        let mut builder = RemoteViews::builder(LayoutId(0x0102_0304));
        builder.set_text_view_text(NodeId(7), "ab").unwrap();
        let bytes = builder.build().serialize();
        assert_eq!(
            &bytes[..],
            &[
                0, // no origin
                1, 2, 3, 4, // layout
                0, 0, 0, 1, // action count
                0, 0, 0, 7, // target
                0, 0, 0, 2, // SetText
                0, 0, 0, 2, b'a', b'b',
            ]
        );
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = sample().serialize();
        for len in 0..bytes.len() {
            assert!(
                RemoteViews::deserialize(&bytes[..len]).is_err(),
                "prefix of {} bytes decoded",
                len
            );
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = BytesMut::from(&sample().serialize()[..]);
        bytes.put_u8(0);
        assert_eq!(
            RemoteViews::deserialize(&bytes).unwrap_err(),
            WireError::TrailingBytes(1)
        );
    }

    #[test]
    fn unknown_tags_fail_closed() {
        let mut buf = header(1);
        buf.put_i32(1);
        buf.put_i32(99);
        assert_eq!(
            RemoteViews::deserialize(&buf).unwrap_err(),
            WireError::UnknownVerb(99)
        );

        let mut buf = header(1);
        buf.put_i32(1);
        buf.put_i32(VerbKind::ReflectiveCall.tag());
        put_string(&mut buf, "setText");
        buf.put_u8(42);
        assert_eq!(
            RemoteViews::deserialize(&buf).unwrap_err(),
            WireError::UnknownValueTag(42)
        );

        let mut buf = header(1);
        buf.put_i32(1);
        buf.put_i32(VerbKind::SetVisibility.tag());
        buf.put_i32(3);
        assert_eq!(
            RemoteViews::deserialize(&buf).unwrap_err(),
            WireError::InvalidVisibility(3)
        );
    }

    #[test]
    fn mismatched_payload_fails_construction() {
        let mut buf = header(1);
        buf.put_i32(1);
        buf.put_i32(VerbKind::SetInt.tag());
        put_string(&mut buf, "setMaxLines");
        put_value(&mut buf, &Value::String("two".into()));
        assert_eq!(
            RemoteViews::deserialize(&buf).unwrap_err(),
            WireError::Construction(ConstructionError::PayloadMismatch {
                verb: VerbKind::SetInt,
                found: ValueKind::String,
            })
        );

        let mut buf = header(1);
        buf.put_i32(NodeId::NONE.0);
        buf.put_i32(VerbKind::RemoveAllViews.tag());
        assert_eq!(
            RemoteViews::deserialize(&buf).unwrap_err(),
            WireError::Construction(ConstructionError::InvalidTarget)
        );

        let mut buf = header(1);
        buf.put_i32(1);
        buf.put_i32(VerbKind::SetProgressState.tag());
        buf.put_i32(100);
        buf.put_i32(5);
        buf.put_u8(2);
        assert_eq!(
            RemoteViews::deserialize(&buf).unwrap_err(),
            WireError::InvalidBool(2)
        );
    }

    #[test]
    fn limits_are_enforced() {
        let limits = WireLimits {
            max_actions: 2,
            max_string_bytes: 4,
            max_bitmap_pixels: 1,
            max_nesting_depth: 0,
        };

        let buf = header(3);
        assert!(matches!(
            RemoteViews::deserialize_with(&buf, &limits),
            Err(WireError::LimitExceeded { what: "action count", .. })
        ));

        let mut builder = RemoteViews::builder(LayoutId(1));
        builder.set_text_view_text(NodeId(1), "too long").unwrap();
        assert!(matches!(
            RemoteViews::deserialize_with(&builder.build().serialize(), &limits),
            Err(WireError::LimitExceeded { what: "string", found: 8, .. })
        ));

        // the count is checked before any pixel is read
        let mut buf = header(1);
        buf.put_i32(1);
        buf.put_i32(VerbKind::SetImageFromBytes.tag());
        buf.put_u32(u32::MAX);
        buf.put_u32(u32::MAX);
        assert!(matches!(
            RemoteViews::deserialize_with(&buf, &limits),
            Err(WireError::LimitExceeded { what: "bitmap", .. })
        ));

        let bytes = sample().serialize();
        assert!(matches!(
            RemoteViews::deserialize_with(
                &bytes,
                &WireLimits {
                    max_nesting_depth: 0,
                    ..WireLimits::default()
                }
            ),
            Err(WireError::NestingTooDeep(0))
        ));
    }
}
