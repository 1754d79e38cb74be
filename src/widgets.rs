//! The built-in widget set.
//!
//! These are the only types [`ClassAllowlist::builtin`](crate::ClassAllowlist::builtin) can
//! instantiate. Each one exposes a closed table of remotable methods through
//! [`View::call_method`](crate::View::call_method); rendering them is the host’s business.

use crate::view::{
    expect_arg, CapabilityError, ChronometerState, ImageContent, ProgressState, TextContent,
    ViewBase,
};
use crate::value::Value;
use crate::View;

/// Stacks its subviews on top of each other.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameLayout {
    pub base: ViewBase,
    pub measure_all_children: bool,
}

impl_view! {
    FrameLayout: "FrameLayout";
    fn is_group(&self) -> bool {
        true
    }
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match method {
            "setMeasureAllChildren" => {
                self.measure_all_children = expect_arg(method, arg, "a boolean", Value::as_bool)?;
                Ok(())
            }
            _ => self.base.call_method("FrameLayout", method, arg),
        }
    }
}

/// Layout direction of a [`LinearLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Lays its subviews out in a single row or column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearLayout {
    pub base: ViewBase,
    pub orientation: Orientation,
    pub gravity: i32,
    pub weight_sum: f32,
}

impl_view! {
    LinearLayout: "LinearLayout";
    fn is_group(&self) -> bool {
        true
    }
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match method {
            "setOrientation" => {
                self.orientation = match expect_arg(method, arg, "an int", Value::as_int)? {
                    0 => Orientation::Horizontal,
                    1 => Orientation::Vertical,
                    other => {
                        return Err(CapabilityError::InvalidArgument {
                            method: method.to_string(),
                            reason: format!("{} is not an orientation", other),
                        })
                    }
                };
            }
            "setGravity" => self.gravity = expect_arg(method, arg, "an int", Value::as_int)?,
            "setWeightSum" => {
                self.weight_sum = expect_arg(method, arg, "a float", Value::as_float)?
            }
            _ => return self.base.call_method("LinearLayout", method, arg),
        }
        Ok(())
    }
}

/// Positions subviews relative to each other; the rules live in the host.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelativeLayout {
    pub base: ViewBase,
    pub gravity: i32,
}

impl_view! {
    RelativeLayout: "RelativeLayout";
    fn is_group(&self) -> bool {
        true
    }
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match method {
            "setGravity" => {
                self.gravity = expect_arg(method, arg, "an int", Value::as_int)?;
                Ok(())
            }
            _ => self.base.call_method("RelativeLayout", method, arg),
        }
    }
}

/// Displays text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextView {
    pub base: ViewBase,
    pub text: TextContent,
}

impl_view! {
    TextView: "TextView";
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match self.text.call_method(method, arg) {
            Some(result) => result,
            None => self.base.call_method("TextView", method, arg),
        }
    }
    fn text_mut(&mut self) -> Option<&mut TextContent> {
        Some(&mut self.text)
    }
}

/// A text view meant to be clicked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Button {
    pub base: ViewBase,
    pub text: TextContent,
}

impl_view! {
    Button: "Button";
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match self.text.call_method(method, arg) {
            Some(result) => result,
            None => self.base.call_method("Button", method, arg),
        }
    }
    fn text_mut(&mut self) -> Option<&mut TextContent> {
        Some(&mut self.text)
    }
}

/// Displays an image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageView {
    pub base: ViewBase,
    pub image: ImageContent,
}

impl_view! {
    ImageView: "ImageView";
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match self.image.call_method(method, arg) {
            Some(result) => result,
            None => self.base.call_method("ImageView", method, arg),
        }
    }
    fn image_mut(&mut self) -> Option<&mut ImageContent> {
        Some(&mut self.image)
    }
}

/// An image view meant to be clicked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageButton {
    pub base: ViewBase,
    pub image: ImageContent,
}

impl_view! {
    ImageButton: "ImageButton";
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match self.image.call_method(method, arg) {
            Some(result) => result,
            None => self.base.call_method("ImageButton", method, arg),
        }
    }
    fn image_mut(&mut self) -> Option<&mut ImageContent> {
        Some(&mut self.image)
    }
}

/// A progress indicator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressBar {
    pub base: ViewBase,
    pub progress: ProgressState,
}

impl_view! {
    ProgressBar: "ProgressBar";
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        match self.progress.call_method(method, arg) {
            Some(result) => result,
            None => self.base.call_method("ProgressBar", method, arg),
        }
    }
    fn progress_mut(&mut self) -> Option<&mut ProgressState> {
        Some(&mut self.progress)
    }
}

/// A text view that counts up from a base time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chronometer {
    pub base: ViewBase,
    pub text: TextContent,
    pub chronometer: ChronometerState,
}

impl_view! {
    Chronometer: "Chronometer";
    fn call_method(&mut self, method: &str, arg: &Value) -> Result<(), CapabilityError> {
        if let Some(result) = self.chronometer.call_method(method, arg) {
            return result;
        }
        match self.text.call_method(method, arg) {
            Some(result) => result,
            None => self.base.call_method("Chronometer", method, arg),
        }
    }
    fn text_mut(&mut self) -> Option<&mut TextContent> {
        Some(&mut self.text)
    }
    fn chronometer_mut(&mut self) -> Option<&mut ChronometerState> {
        Some(&mut self.chronometer)
    }
}

/// Creates a default instance of `T`; used as the allowlist constructor for built-in types.
pub(crate) fn create<T: View + Default>() -> Box<dyn View> {
    Box::new(T::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::value::{Bitmap, ValueKind};

    #[test]
    fn text_view_methods() {
        let mut view = TextView::default();
        view.call_method("setText", &Value::CharSequence("hello".into())).unwrap();
        view.call_method("setTextColor", &Value::Color(Color::RED)).unwrap();
        view.call_method("setAlpha", &Value::Float(0.5)).unwrap();
        assert_eq!(view.text.text, "hello");
        assert_eq!(view.text.color, Color::RED);
        assert_eq!(view.base.alpha, 0.5);

        let err = view.call_method("setMax", &Value::Int(3)).unwrap_err();
        assert_eq!(
            err,
            CapabilityError::NoSuchMethod {
                type_name: "TextView",
                method: "setMax".into()
            }
        );
    }

    #[test]
    fn linear_layout_orientation() {
        let mut view = LinearLayout::default();
        view.call_method("setOrientation", &Value::Int(1)).unwrap();
        assert_eq!(view.orientation, Orientation::Vertical);
        assert!(view.call_method("setOrientation", &Value::Int(2)).is_err());
        assert!(view.is_group());
    }

    #[test]
    fn image_view_bitmap_method() {
        let mut view = ImageView::default();
        let bitmap = Bitmap::solid(1, 1, Color::BLUE);
        view.call_method("setImageBitmap", &Value::Bitmap(bitmap.clone()))
            .unwrap();
        assert_eq!(view.image.bitmap, Some(bitmap));

        let err = view
            .call_method("setImageBitmap", &Value::Int(1))
            .unwrap_err();
        assert!(matches!(
            err,
            CapabilityError::ArgumentType {
                found: ValueKind::Int,
                ..
            }
        ));
    }

    #[test]
    fn chronometer_has_text_and_timer_methods() {
        let mut view = Chronometer::default();
        view.call_method("setBase", &Value::Long(1000)).unwrap();
        view.call_method("setStarted", &Value::Bool(true)).unwrap();
        view.call_method("setTextSize", &Value::Float(20.)).unwrap();
        assert_eq!(view.chronometer.base, 1000);
        assert!(view.chronometer.started);
        assert_eq!(view.text.size, 20.);
        assert!(view.text_mut().is_some());
        assert!(view.image_mut().is_none());
    }
}
