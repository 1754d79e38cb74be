//! Actions.
//!
//! An action is one declarative mutation: a target id, a verb and the verb’s payload. The verb
//! enum is closed and every verb has exactly one handler, so an action can only ever do what is
//! listed here.

use crate::applier;
use crate::color::Color;
use crate::error::ApplyError;
use crate::host::{HostContext, ResourceError};
use crate::remote_views::RemoteViews;
use crate::tree::AppliedTree;
use crate::value::{Bitmap, CallbackToken, NodeId, ResourceId, Value, ValueKind, Visibility};
use crate::view::{ImageSource, Padding, View};

/// Errors from building an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    #[error("actions need a target id")]
    InvalidTarget,
    #[error("method name is empty")]
    EmptyMethod,
    #[error("`{method}` was given NaN")]
    NotANumber { method: String },
    #[error("{verb:?} cannot carry a {found:?} payload")]
    PayloadMismatch { verb: VerbKind, found: ValueKind },
    #[error("{0:?} does not take a method name")]
    NotReflective(VerbKind),
    #[error("{width}x{height} bitmap given {len} pixels")]
    BitmapSize { width: u32, height: u32, len: usize },
    #[error("{what} exceeds limit: {found} > {limit}")]
    LimitExceeded {
        what: &'static str,
        limit: u64,
        found: u64,
    },
}

/// Verb tags. The discriminants are what goes over the wire.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerbKind {
    SetVisibility = 1,
    SetText = 2,
    SetImageFromResource = 3,
    SetImageFromBytes = 4,
    SetImageFromUri = 5,
    SetBoolean = 6,
    SetInt = 7,
    SetLong = 8,
    SetFloat = 9,
    SetString = 10,
    SetCharSequence = 11,
    SetColor = 12,
    SetOnClick = 13,
    SetChronometerState = 14,
    SetProgressState = 15,
    ReflectiveCall = 16,
    AddView = 17,
    RemoveAllViews = 18,
    SetPadding = 19,
}

impl VerbKind {
    pub fn from_tag(tag: i32) -> Option<VerbKind> {
        use VerbKind::*;
        Some(match tag {
            1 => SetVisibility,
            2 => SetText,
            3 => SetImageFromResource,
            4 => SetImageFromBytes,
            5 => SetImageFromUri,
            6 => SetBoolean,
            7 => SetInt,
            8 => SetLong,
            9 => SetFloat,
            10 => SetString,
            11 => SetCharSequence,
            12 => SetColor,
            13 => SetOnClick,
            14 => SetChronometerState,
            15 => SetProgressState,
            16 => ReflectiveCall,
            17 => AddView,
            18 => RemoveAllViews,
            19 => SetPadding,
            _ => return None,
        })
    }

    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Reflective verbs carry a method name and a [`Value`].
    pub fn is_reflective(self) -> bool {
        use VerbKind::*;
        matches!(
            self,
            SetBoolean
                | SetInt
                | SetLong
                | SetFloat
                | SetString
                | SetCharSequence
                | SetColor
                | ReflectiveCall
        )
    }
}

/// A verb with its payload.
///
/// Float payloads compare by bit pattern, as [`Value`] does.
#[derive(Debug, Clone)]
pub enum Verb {
    SetVisibility(Visibility),
    SetText(String),
    SetImageFromResource(ResourceId),
    SetImageFromBytes(Bitmap),
    /// An empty URI clears the image.
    SetImageFromUri(String),
    SetBoolean { method: String, value: bool },
    SetInt { method: String, value: i32 },
    SetLong { method: String, value: i64 },
    SetFloat { method: String, value: f32 },
    SetString { method: String, value: String },
    SetCharSequence { method: String, value: String },
    SetColor { method: String, value: Color },
    SetOnClick(CallbackToken),
    SetChronometerState {
        base: i64,
        format: Option<String>,
        started: bool,
    },
    SetProgressState {
        max: i32,
        progress: i32,
        indeterminate: bool,
    },
    ReflectiveCall { method: String, arg: Value },
    /// Applies a nested descriptor and appends the result to the target group.
    AddView(Box<RemoteViews>),
    RemoveAllViews,
    SetPadding {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },
}

impl PartialEq for Verb {
    fn eq(&self, other: &Verb) -> bool {
        use Verb::*;
        match (self, other) {
            (SetVisibility(a), SetVisibility(b)) => a == b,
            (SetText(a), SetText(b)) | (SetImageFromUri(a), SetImageFromUri(b)) => a == b,
            (SetImageFromResource(a), SetImageFromResource(b)) => a == b,
            (SetImageFromBytes(a), SetImageFromBytes(b)) => a == b,
            (SetOnClick(a), SetOnClick(b)) => a == b,
            (SetFloat { method: m, value: a }, SetFloat { method: n, value: b }) => {
                m == n && a.to_bits() == b.to_bits()
            }
            (ReflectiveCall { method: m, arg: a }, ReflectiveCall { method: n, arg: b }) => {
                m == n && a == b
            }
            (SetBoolean { method: m, value: a }, SetBoolean { method: n, value: b }) => {
                m == n && a == b
            }
            (SetInt { method: m, value: a }, SetInt { method: n, value: b }) => m == n && a == b,
            (SetLong { method: m, value: a }, SetLong { method: n, value: b }) => m == n && a == b,
            (SetString { method: m, value: a }, SetString { method: n, value: b })
            | (
                SetCharSequence { method: m, value: a },
                SetCharSequence { method: n, value: b },
            ) => m == n && a == b,
            (SetColor { method: m, value: a }, SetColor { method: n, value: b }) => {
                m == n && a == b
            }
            (
                SetChronometerState {
                    base,
                    format,
                    started,
                },
                SetChronometerState {
                    base: b,
                    format: f,
                    started: s,
                },
            ) => (base, format, started) == (b, f, s),
            (
                SetProgressState {
                    max,
                    progress,
                    indeterminate,
                },
                SetProgressState {
                    max: m,
                    progress: p,
                    indeterminate: i,
                },
            ) => (max, progress, indeterminate) == (m, p, i),
            (AddView(a), AddView(b)) => a == b,
            (RemoveAllViews, RemoveAllViews) => true,
            (
                SetPadding {
                    left,
                    top,
                    right,
                    bottom,
                },
                SetPadding {
                    left: l,
                    top: t,
                    right: r,
                    bottom: b,
                },
            ) => (left, top, right, bottom) == (l, t, r, b),
            _ => false,
        }
    }
}

impl Verb {
    pub fn kind(&self) -> VerbKind {
        match self {
            Verb::SetVisibility(_) => VerbKind::SetVisibility,
            Verb::SetText(_) => VerbKind::SetText,
            Verb::SetImageFromResource(_) => VerbKind::SetImageFromResource,
            Verb::SetImageFromBytes(_) => VerbKind::SetImageFromBytes,
            Verb::SetImageFromUri(_) => VerbKind::SetImageFromUri,
            Verb::SetBoolean { .. } => VerbKind::SetBoolean,
            Verb::SetInt { .. } => VerbKind::SetInt,
            Verb::SetLong { .. } => VerbKind::SetLong,
            Verb::SetFloat { .. } => VerbKind::SetFloat,
            Verb::SetString { .. } => VerbKind::SetString,
            Verb::SetCharSequence { .. } => VerbKind::SetCharSequence,
            Verb::SetColor { .. } => VerbKind::SetColor,
            Verb::SetOnClick(_) => VerbKind::SetOnClick,
            Verb::SetChronometerState { .. } => VerbKind::SetChronometerState,
            Verb::SetProgressState { .. } => VerbKind::SetProgressState,
            Verb::ReflectiveCall { .. } => VerbKind::ReflectiveCall,
            Verb::AddView(_) => VerbKind::AddView,
            Verb::RemoveAllViews => VerbKind::RemoveAllViews,
            Verb::SetPadding { .. } => VerbKind::SetPadding,
        }
    }

    /// Method name of reflective verbs.
    pub fn method(&self) -> Option<&str> {
        match self {
            Verb::SetBoolean { method, .. }
            | Verb::SetInt { method, .. }
            | Verb::SetLong { method, .. }
            | Verb::SetFloat { method, .. }
            | Verb::SetString { method, .. }
            | Verb::SetCharSequence { method, .. }
            | Verb::SetColor { method, .. }
            | Verb::ReflectiveCall { method, .. } => Some(method),
            _ => None,
        }
    }

    /// The argument of reflective verbs, as a [`Value`].
    pub fn argument(&self) -> Option<Value> {
        Some(match self {
            Verb::SetBoolean { value, .. } => Value::Bool(*value),
            Verb::SetInt { value, .. } => Value::Int(*value),
            Verb::SetLong { value, .. } => Value::Long(*value),
            Verb::SetFloat { value, .. } => Value::Float(*value),
            Verb::SetString { value, .. } => Value::String(value.clone()),
            Verb::SetCharSequence { value, .. } => Value::CharSequence(value.clone()),
            Verb::SetColor { value, .. } => Value::Color(*value),
            Verb::ReflectiveCall { arg, .. } => arg.clone(),
            _ => return None,
        })
    }

    /// Bitmap bytes carried by this verb.
    pub(crate) fn byte_count(&self) -> usize {
        match self {
            Verb::SetImageFromBytes(bitmap) => bitmap.byte_count(),
            Verb::ReflectiveCall { arg, .. } => arg.byte_count(),
            Verb::AddView(nested) => nested.estimate_memory_usage(),
            _ => 0,
        }
    }

    /// Performs the mutation on a single view.
    fn apply_to(&self, view: &mut dyn View, host: &HostContext) -> Result<(), ApplyError> {
        let verb = self.kind();
        let type_name = view.type_name();
        let unsupported = || ApplyError::Unsupported { verb, type_name };

        match self {
            Verb::SetVisibility(visibility) => view.base_mut().visibility = *visibility,
            Verb::SetText(text) => view.text_mut().ok_or_else(unsupported)?.text = text.clone(),
            Verb::SetImageFromResource(id) => {
                let image = view.image_mut().ok_or_else(unsupported)?;
                let bitmap = host
                    .resources()
                    .drawable(*id)
                    .ok_or(ResourceError::DrawableNotFound(*id))?;
                image.set(Some(bitmap), ImageSource::Resource(*id));
            }
            Verb::SetImageFromBytes(bitmap) => {
                let image = view.image_mut().ok_or_else(unsupported)?;
                image.set(Some(bitmap.clone()), ImageSource::Bitmap);
            }
            Verb::SetImageFromUri(uri) => {
                let image = view.image_mut().ok_or_else(unsupported)?;
                if uri.is_empty() {
                    image.set(None, ImageSource::None);
                } else {
                    let bitmap = host.load_uri(uri)?;
                    image.set(Some(bitmap), ImageSource::Uri(uri.clone()));
                }
            }
            Verb::SetBoolean { method, value } => view.call_method(method, &Value::Bool(*value))?,
            Verb::SetInt { method, value } => view.call_method(method, &Value::Int(*value))?,
            Verb::SetLong { method, value } => view.call_method(method, &Value::Long(*value))?,
            Verb::SetFloat { method, value } => view.call_method(method, &Value::Float(*value))?,
            Verb::SetString { method, value } => {
                view.call_method(method, &Value::String(value.clone()))?
            }
            Verb::SetCharSequence { method, value } => {
                view.call_method(method, &Value::CharSequence(value.clone()))?
            }
            Verb::SetColor { method, value } => view.call_method(method, &Value::Color(*value))?,
            Verb::ReflectiveCall { method, arg } => view.call_method(method, arg)?,
            Verb::SetOnClick(token) => view.base_mut().on_click = Some(*token),
            Verb::SetChronometerState {
                base,
                format,
                started,
            } => {
                let chronometer = view.chronometer_mut().ok_or_else(unsupported)?;
                chronometer.base = *base;
                chronometer.format = format.clone();
                chronometer.started = *started;
            }
            Verb::SetProgressState {
                max,
                progress,
                indeterminate,
            } => {
                let state = view.progress_mut().ok_or_else(unsupported)?;
                state.indeterminate = *indeterminate;
                // max and progress are left alone while indeterminate
                if !*indeterminate {
                    state.set_max(*max);
                    state.set_progress(*progress);
                }
            }
            Verb::SetPadding {
                left,
                top,
                right,
                bottom,
            } => {
                view.base_mut().padding = Padding {
                    left: *left,
                    top: *top,
                    right: *right,
                    bottom: *bottom,
                }
            }
            // structural verbs are handled by Action::execute
            Verb::AddView(_) | Verb::RemoveAllViews => return Err(unsupported()),
        }
        Ok(())
    }
}

/// One mutation of one view.
///
/// Actions are immutable once constructed, and construction guarantees the payload fits the verb.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    target: NodeId,
    verb: Verb,
}

impl Action {
    /// Validates and creates an action.
    pub fn new(target: NodeId, verb: Verb) -> Result<Action, ConstructionError> {
        if target == NodeId::NONE {
            return Err(ConstructionError::InvalidTarget);
        }
        if let Some(method) = verb.method() {
            if method.is_empty() {
                return Err(ConstructionError::EmptyMethod);
            }
            let nan = match &verb {
                Verb::SetFloat { value, .. } => value.is_nan(),
                Verb::ReflectiveCall { arg, .. } => arg.is_nan(),
                _ => false,
            };
            if nan {
                return Err(ConstructionError::NotANumber {
                    method: method.to_string(),
                });
            }
        }
        Ok(Action { target, verb })
    }

    /// Creates a reflective action from a verb tag, method name and dynamically typed value.
    ///
    /// The value kind must match the verb (`SetBoolean` takes a `Bool`, and so on);
    /// `ReflectiveCall` takes any kind.
    pub fn reflective(
        target: NodeId,
        kind: VerbKind,
        method: impl Into<String>,
        value: Value,
    ) -> Result<Action, ConstructionError> {
        let method = method.into();
        let verb = match (kind, value) {
            (VerbKind::SetBoolean, Value::Bool(value)) => Verb::SetBoolean { method, value },
            (VerbKind::SetInt, Value::Int(value)) => Verb::SetInt { method, value },
            (VerbKind::SetLong, Value::Long(value)) => Verb::SetLong { method, value },
            (VerbKind::SetFloat, Value::Float(value)) => Verb::SetFloat { method, value },
            (VerbKind::SetString, Value::String(value)) => Verb::SetString { method, value },
            (VerbKind::SetCharSequence, Value::CharSequence(value)) => {
                Verb::SetCharSequence { method, value }
            }
            (VerbKind::SetColor, Value::Color(value)) => Verb::SetColor { method, value },
            (VerbKind::ReflectiveCall, arg) => Verb::ReflectiveCall { method, arg },
            (kind, value) if kind.is_reflective() => {
                return Err(ConstructionError::PayloadMismatch {
                    verb: kind,
                    found: value.kind(),
                })
            }
            (kind, _) => return Err(ConstructionError::NotReflective(kind)),
        };
        Action::new(target, verb)
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    pub fn kind(&self) -> VerbKind {
        self.verb.kind()
    }

    /// Executes this action against a tree.
    ///
    /// Touches nothing but the target view (and, for structural verbs, its subviews).
    pub fn execute(&self, tree: &mut AppliedTree, host: &HostContext) -> Result<(), ApplyError> {
        let key = tree.resolve(self.target)?;
        match &self.verb {
            Verb::AddView(nested) => {
                let view = tree
                    .view_mut(key)
                    .ok_or(ApplyError::NoSuchNode(self.target))?;
                if !view.is_group() {
                    return Err(ApplyError::NotAGroup {
                        type_name: view.type_name(),
                    });
                }
                let subtree =
                    applier::apply(nested, host).map_err(|err| ApplyError::Nested(Box::new(err)))?;
                tree.graft(key, subtree)
            }
            Verb::RemoveAllViews => tree.remove_subviews(key),
            verb => {
                let view = tree
                    .view_mut(key)
                    .ok_or(ApplyError::NoSuchNode(self.target))?;
                verb.apply_to(view, host)
            }
        }
    }
}
