use crate::color::Color;
use crate::value::{Bitmap, CallbackToken, NodeId, ResourceId, Value, ValueKind, Visibility};
use core::any::Any;
use core::fmt;

/// Implements the `View` trait for a widget struct with a `base: ViewBase` field.
///
/// Syntax:
///
/// ```text
/// impl_view! {
///     StructName: "TypeName";
///     (put overrides like call_method() or is_group() here, using normal rust syntax)
/// }
/// ```
#[macro_export]
macro_rules! impl_view {
    (
        $(#[$attr:meta])*
        $struct:ty : $type_name:expr;
        $($extra:tt)*
    ) => {
        $(#[$attr])*
        impl $crate::View for $struct {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            fn base(&self) -> &$crate::ViewBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::ViewBase {
                &mut self.base
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            $($extra)*
        }
    };
}

/// A node in an applied tree.
///
/// Views are created only by constructors in a [`ClassAllowlist`](crate::ClassAllowlist) and
/// mutated only through their remotable methods and capabilities, which is all an action can
/// reach.
pub trait View: Any + fmt::Debug + Send {
    /// The name this type is registered under.
    fn type_name(&self) -> &'static str;

    /// Properties shared by all views.
    fn base(&self) -> &ViewBase;

    fn base_mut(&mut self) -> &mut ViewBase;

    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Invokes a remotable setter by name.
    ///
    /// This is a closed table per type; anything not in it fails with
    /// [`CapabilityError::NoSuchMethod`].
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        let type_name = self.type_name();
        self.base_mut().call_method(type_name, method, arg)
    }

    /// If true, this view may hold subviews.
    fn is_group(&self) -> bool {
        false
    }

    fn text_mut(&mut self) -> Option<&mut TextContent> {
        None
    }

    fn image_mut(&mut self) -> Option<&mut ImageContent> {
        None
    }

    fn chronometer_mut(&mut self) -> Option<&mut ChronometerState> {
        None
    }

    fn progress_mut(&mut self) -> Option<&mut ProgressState> {
        None
    }
}

/// Errors raised by a view when asked to perform a mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapabilityError {
    #[error("{type_name} has no remotable method `{method}`")]
    NoSuchMethod {
        type_name: &'static str,
        method: String,
    },
    #[error("`{method}` expects {expected}, got {found:?}")]
    ArgumentType {
        method: String,
        expected: &'static str,
        found: ValueKind,
    },
    #[error("`{method}` rejected its argument: {reason}")]
    InvalidArgument { method: String, reason: String },
}

/// Extracts a typed argument or reports what was expected.
pub(crate) fn expect_arg<'a, T>(
    method: &str,
    arg: &'a Value,
    expected: &'static str,
    extract: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<T, CapabilityError> {
    extract(arg).ok_or_else(|| CapabilityError::ArgumentType {
        method: method.to_string(),
        expected,
        found: arg.kind(),
    })
}

/// View padding in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Properties every view has.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewBase {
    pub id: NodeId,
    pub visibility: Visibility,
    pub enabled: bool,
    pub alpha: f32,
    pub background: Option<Color>,
    pub content_description: Option<String>,
    pub padding: Padding,
    pub min_width: i32,
    pub min_height: i32,
    /// Set by `SetOnClick`; reported back to the host on click.
    pub on_click: Option<CallbackToken>,
}

impl Default for ViewBase {
    fn default() -> Self {
        ViewBase {
            id: NodeId::NONE,
            visibility: Visibility::Visible,
            enabled: true,
            alpha: 1.,
            background: None,
            content_description: None,
            padding: Padding::default(),
            min_width: 0,
            min_height: 0,
            on_click: None,
        }
    }
}

impl ViewBase {
    /// Remotable methods available on every view.
    pub fn call_method(
        &mut self,
        type_name: &'static str,
        method: &str,
        arg: &Value,
    ) -> Result<(), CapabilityError> {
        match method {
            "setVisibility" => {
                let code = expect_arg(method, arg, "an int", Value::as_int)?;
                self.visibility =
                    Visibility::from_code(code).ok_or_else(|| CapabilityError::InvalidArgument {
                        method: method.to_string(),
                        reason: format!("{} is not a visibility code", code),
                    })?;
            }
            "setEnabled" => self.enabled = expect_arg(method, arg, "a boolean", Value::as_bool)?,
            "setAlpha" => self.alpha = expect_arg(method, arg, "a float", Value::as_float)?,
            "setBackgroundColor" => {
                self.background = Some(expect_arg(method, arg, "a color", Value::as_color)?)
            }
            "setContentDescription" => {
                let text = expect_arg(method, arg, "a char sequence", Value::as_text)?;
                self.content_description = Some(text.to_string());
            }
            "setMinimumWidth" => self.min_width = expect_arg(method, arg, "an int", Value::as_int)?,
            "setMinimumHeight" => {
                self.min_height = expect_arg(method, arg, "an int", Value::as_int)?
            }
            _ => {
                return Err(CapabilityError::NoSuchMethod {
                    type_name,
                    method: method.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Whether a click on this view should reach the host.
    pub fn is_clickable(&self) -> bool {
        self.on_click.is_some() && self.enabled && self.visibility == Visibility::Visible
    }
}

/// Text content of text-capable views.
#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub text: String,
    pub color: Color,
    pub size: f32,
    pub max_lines: Option<i32>,
    pub single_line: bool,
    pub hint: Option<String>,
}

impl Default for TextContent {
    fn default() -> Self {
        TextContent {
            text: String::new(),
            color: Color::BLACK,
            size: 14.,
            max_lines: None,
            single_line: false,
            hint: None,
        }
    }
}

impl TextContent {
    /// Returns `None` if `method` is not a text method.
    pub fn call_method(
        &mut self,
        method: &str,
        arg: &Value,
    ) -> Option<Result<(), CapabilityError>> {
        let result = match method {
            "setText" => expect_arg(method, arg, "a char sequence", Value::as_text)
                .map(|text| self.text = text.to_string()),
            "setTextColor" => {
                expect_arg(method, arg, "a color", Value::as_color).map(|c| self.color = c)
            }
            "setTextSize" => {
                expect_arg(method, arg, "a float", Value::as_float).map(|s| self.size = s)
            }
            "setMaxLines" => {
                expect_arg(method, arg, "an int", Value::as_int).map(|n| self.max_lines = Some(n))
            }
            "setSingleLine" => {
                expect_arg(method, arg, "a boolean", Value::as_bool).map(|b| self.single_line = b)
            }
            "setHint" => expect_arg(method, arg, "a char sequence", Value::as_text)
                .map(|hint| self.hint = Some(hint.to_string())),
            _ => return None,
        };
        Some(result)
    }
}

/// Where the current image came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSource {
    #[default]
    None,
    Resource(ResourceId),
    Bitmap,
    Uri(String),
}

/// Image content of image-capable views.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    pub bitmap: Option<Bitmap>,
    pub source: ImageSource,
    pub alpha: i32,
    pub level: i32,
    pub adjust_view_bounds: bool,
    pub color_filter: Option<Color>,
}

impl Default for ImageContent {
    fn default() -> Self {
        ImageContent {
            bitmap: None,
            source: ImageSource::None,
            alpha: 255,
            level: 0,
            adjust_view_bounds: false,
            color_filter: None,
        }
    }
}

impl ImageContent {
    /// Replaces the image; `None` clears it.
    pub fn set(&mut self, bitmap: Option<Bitmap>, source: ImageSource) {
        match bitmap {
            Some(bitmap) => {
                self.bitmap = Some(bitmap);
                self.source = source;
            }
            None => {
                self.bitmap = None;
                self.source = ImageSource::None;
            }
        }
    }

    /// Returns `None` if `method` is not an image method.
    pub fn call_method(
        &mut self,
        method: &str,
        arg: &Value,
    ) -> Option<Result<(), CapabilityError>> {
        let result = match method {
            "setImageBitmap" => match arg {
                Value::Bitmap(bitmap) => {
                    self.set(Some(bitmap.clone()), ImageSource::Bitmap);
                    Ok(())
                }
                _ => expect_arg(method, arg, "a bitmap", |_| None::<()>),
            },
            "setImageAlpha" => expect_arg(method, arg, "an int", Value::as_int)
                .map(|a| self.alpha = a.clamp(0, 255)),
            "setImageLevel" => {
                expect_arg(method, arg, "an int", Value::as_int).map(|l| self.level = l)
            }
            "setAdjustViewBounds" => expect_arg(method, arg, "a boolean", Value::as_bool)
                .map(|b| self.adjust_view_bounds = b),
            "setColorFilter" => expect_arg(method, arg, "a color", Value::as_color)
                .map(|c| self.color_filter = Some(c)),
            _ => return None,
        };
        Some(result)
    }
}

/// Progress state of progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub max: i32,
    pub progress: i32,
    pub secondary_progress: i32,
    pub indeterminate: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        ProgressState {
            max: 100,
            progress: 0,
            secondary_progress: 0,
            indeterminate: false,
        }
    }
}

impl ProgressState {
    /// Sets the maximum; current progress is clamped into the new range.
    pub fn set_max(&mut self, max: i32) {
        self.max = max.max(0);
        self.progress = self.progress.min(self.max);
        self.secondary_progress = self.secondary_progress.min(self.max);
    }

    pub fn set_progress(&mut self, progress: i32) {
        self.progress = progress.clamp(0, self.max);
    }

    pub fn set_secondary_progress(&mut self, progress: i32) {
        self.secondary_progress = progress.clamp(0, self.max);
    }

    /// Returns `None` if `method` is not a progress method.
    pub fn call_method(
        &mut self,
        method: &str,
        arg: &Value,
    ) -> Option<Result<(), CapabilityError>> {
        let result = match method {
            "setMax" => expect_arg(method, arg, "an int", Value::as_int).map(|m| self.set_max(m)),
            "setProgress" => {
                expect_arg(method, arg, "an int", Value::as_int).map(|p| self.set_progress(p))
            }
            "setSecondaryProgress" => expect_arg(method, arg, "an int", Value::as_int)
                .map(|p| self.set_secondary_progress(p)),
            "setIndeterminate" => {
                expect_arg(method, arg, "a boolean", Value::as_bool).map(|b| self.indeterminate = b)
            }
            _ => return None,
        };
        Some(result)
    }
}

/// Chronometer state.
///
/// `base` is a timestamp in the host’s elapsed-realtime clock; rendering the elapsed time is
/// left to the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChronometerState {
    pub base: i64,
    pub format: Option<String>,
    pub started: bool,
}

impl ChronometerState {
    /// Returns `None` if `method` is not a chronometer method.
    pub fn call_method(
        &mut self,
        method: &str,
        arg: &Value,
    ) -> Option<Result<(), CapabilityError>> {
        let result = match method {
            "setBase" => expect_arg(method, arg, "a long", Value::as_long).map(|b| self.base = b),
            "setFormat" => expect_arg(method, arg, "a string", Value::as_text)
                .map(|f| self.format = Some(f.to_string())),
            "setStarted" => {
                expect_arg(method, arg, "a boolean", Value::as_bool).map(|s| self.started = s)
            }
            _ => return None,
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_methods() {
        let mut base = ViewBase::default();
        base.call_method("View", "setVisibility", &Value::Int(8)).unwrap();
        assert_eq!(base.visibility, Visibility::Gone);
        base.call_method("View", "setBackgroundColor", &Value::Int(-1)).unwrap();
        assert_eq!(base.background, Some(Color::WHITE));

        let err = base.call_method("View", "setVisibility", &Value::Int(3)).unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidArgument { .. }));

        let err = base.call_method("View", "setEnabled", &Value::Int(1)).unwrap_err();
        assert_eq!(
            err,
            CapabilityError::ArgumentType {
                method: "setEnabled".into(),
                expected: "a boolean",
                found: ValueKind::Int,
            }
        );

        let err = base
            .call_method("View", "setText", &Value::String("x".into()))
            .unwrap_err();
        assert!(matches!(err, CapabilityError::NoSuchMethod { type_name: "View", .. }));
    }

    #[test]
    fn text_arguments_accept_strings_and_char_sequences() {
        let mut base = ViewBase::default();
        base.call_method("View", "setContentDescription", &Value::String("close".into()))
            .unwrap();
        assert_eq!(base.content_description.as_deref(), Some("close"));

        let mut text = TextContent::default();
        text.call_method("setHint", &Value::CharSequence("name".into())).unwrap().unwrap();
        text.call_method("setText", &Value::String("Ada".into())).unwrap().unwrap();
        assert_eq!((text.text.as_str(), text.hint.as_deref()), ("Ada", Some("name")));

        let mut chronometer = ChronometerState::default();
        chronometer.call_method("setFormat", &Value::String("%s".into())).unwrap().unwrap();
        assert_eq!(chronometer.format.as_deref(), Some("%s"));
        assert!(chronometer.call_method("setFormat", &Value::Int(1)).unwrap().is_err());
    }

    #[test]
    fn clickable_requires_visible_enabled_and_token() {
        let mut base = ViewBase::default();
        assert!(!base.is_clickable());
        base.on_click = Some(CallbackToken(1));
        assert!(base.is_clickable());
        base.visibility = Visibility::Invisible;
        assert!(!base.is_clickable());
        base.visibility = Visibility::Visible;
        base.enabled = false;
        assert!(!base.is_clickable());
    }

    #[test]
    fn progress_is_clamped() {
        let mut progress = ProgressState::default();
        progress.set_progress(150);
        assert_eq!(progress.progress, 100);
        progress.set_max(40);
        assert_eq!(progress.progress, 40);
        progress.set_progress(-3);
        assert_eq!(progress.progress, 0);
    }

    #[test]
    fn text_methods_pass_through_unknown_names() {
        let mut text = TextContent::default();
        assert!(text.call_method("setAlpha", &Value::Float(0.5)).is_none());
        text.call_method("setText", &Value::CharSequence("hi".into()))
            .unwrap()
            .unwrap();
        assert_eq!(text.text, "hi");
    }
}
