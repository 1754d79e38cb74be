//! The remote view descriptor.

use crate::action::{Action, ConstructionError, Verb, VerbKind};
use crate::applier;
use crate::color::Color;
use crate::config::WireLimits;
use crate::error::ActionException;
use crate::host::HostContext;
use crate::tree::AppliedTree;
use crate::value::{Bitmap, CallbackToken, LayoutId, NodeId, ResourceId, Value, Visibility};
use crate::wire::{self, WireError};
use bytes::Bytes;

/// A layout reference plus an ordered list of actions, to be applied somewhere else.
///
/// Descriptors are immutable; build them with [`RemoteViews::builder`]. Two descriptors are
/// equal if they use the same layout and have equal actions in the same order (the origin is
/// not compared).
#[derive(Debug, Clone)]
pub struct RemoteViews {
    origin: Option<String>,
    layout: LayoutId,
    actions: Vec<Action>,
}

impl PartialEq for RemoteViews {
    fn eq(&self, other: &RemoteViews) -> bool {
        self.layout == other.layout && self.actions == other.actions
    }
}

impl RemoteViews {
    /// Starts a descriptor that stays within the default [`WireLimits`].
    pub fn builder(layout: LayoutId) -> RemoteViewsBuilder {
        RemoteViews::builder_with(layout, WireLimits::default())
    }

    /// Starts a descriptor that stays within `limits`, so that decoding it with the same limits
    /// succeeds.
    pub fn builder_with(layout: LayoutId, limits: WireLimits) -> RemoteViewsBuilder {
        RemoteViewsBuilder {
            views: RemoteViews {
                origin: None,
                layout,
                actions: Vec::new(),
            },
            limits,
        }
    }

    pub(crate) fn from_parts(
        origin: Option<String>,
        layout: LayoutId,
        actions: Vec<Action>,
    ) -> RemoteViews {
        RemoteViews {
            origin,
            layout,
            actions,
        }
    }

    /// Identity of the producer, e.g. a package name.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn layout_id(&self) -> LayoutId {
        self.layout
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Inflates the layout through the host and runs all actions on the new tree.
    pub fn apply(&self, host: &HostContext) -> Result<AppliedTree, ActionException> {
        applier::apply(self, host)
    }

    /// Runs all actions on a tree produced by an earlier [`apply`](Self::apply).
    pub fn reapply(
        &self,
        host: &HostContext,
        tree: &mut AppliedTree,
    ) -> Result<(), ActionException> {
        applier::reapply(self, host, tree)
    }

    /// Encodes this descriptor in the binary wire format.
    pub fn serialize(&self) -> Bytes {
        wire::encode(self)
    }

    /// Decodes a descriptor with the default limits.
    pub fn deserialize(bytes: &[u8]) -> Result<RemoteViews, WireError> {
        wire::decode(bytes, &WireLimits::default())
    }

    pub fn deserialize_with(bytes: &[u8], limits: &WireLimits) -> Result<RemoteViews, WireError> {
        wire::decode(bytes, limits)
    }

    /// How many levels of `AddView` descriptors this one contains.
    pub fn nesting_depth(&self) -> usize {
        self.actions
            .iter()
            .filter_map(|action| match action.verb() {
                Verb::AddView(nested) => Some(1 + nested.nesting_depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Bytes of bitmap data carried by this descriptor, nested descriptors included.
    pub fn estimate_memory_usage(&self) -> usize {
        self.actions.iter().map(|action| action.verb().byte_count()).sum()
    }
}

/// Appends actions to a descriptor.
///
/// Every call validates its action and fails without appending anything if it is invalid.
/// Actions are also held to the builder’s [`WireLimits`], so that whatever it builds can be
/// decoded again.
#[derive(Debug, Clone)]
pub struct RemoteViewsBuilder {
    views: RemoteViews,
    limits: WireLimits,
}

type BuildResult<'a> = Result<&'a mut RemoteViewsBuilder, ConstructionError>;

impl RemoteViewsBuilder {
    pub fn origin(&mut self, origin: impl Into<String>) -> BuildResult {
        let origin = origin.into();
        check_string(&self.limits, &origin)?;
        self.views.origin = Some(origin);
        Ok(self)
    }

    /// Appends an action.
    pub fn add_action(&mut self, action: Action) -> BuildResult {
        let count = self.views.actions.len() + 1;
        check_limit("action count", self.limits.max_actions, count as u64)?;
        check_verb(&self.limits, action.verb())?;
        self.views.actions.push(action);
        Ok(self)
    }

    fn push(&mut self, target: NodeId, verb: Verb) -> BuildResult {
        let action = Action::new(target, verb)?;
        self.add_action(action)
    }

    fn push_reflective(
        &mut self,
        target: NodeId,
        kind: VerbKind,
        method: &str,
        value: Value,
    ) -> BuildResult {
        let action = Action::reflective(target, kind, method, value)?;
        self.add_action(action)
    }

    pub fn set_view_visibility(&mut self, id: NodeId, visibility: Visibility) -> BuildResult {
        self.push(id, Verb::SetVisibility(visibility))
    }

    pub fn set_text_view_text(&mut self, id: NodeId, text: impl Into<String>) -> BuildResult {
        self.push(id, Verb::SetText(text.into()))
    }

    pub fn set_image_view_resource(&mut self, id: NodeId, resource: ResourceId) -> BuildResult {
        self.push(id, Verb::SetImageFromResource(resource))
    }

    pub fn set_image_view_bitmap(&mut self, id: NodeId, bitmap: Bitmap) -> BuildResult {
        self.push(id, Verb::SetImageFromBytes(bitmap))
    }

    /// An empty URI clears the image.
    pub fn set_image_view_uri(&mut self, id: NodeId, uri: impl Into<String>) -> BuildResult {
        self.push(id, Verb::SetImageFromUri(uri.into()))
    }

    pub fn set_boolean(&mut self, id: NodeId, method: &str, value: bool) -> BuildResult {
        self.push_reflective(id, VerbKind::SetBoolean, method, Value::Bool(value))
    }

    pub fn set_int(&mut self, id: NodeId, method: &str, value: i32) -> BuildResult {
        self.push_reflective(id, VerbKind::SetInt, method, Value::Int(value))
    }

    pub fn set_long(&mut self, id: NodeId, method: &str, value: i64) -> BuildResult {
        self.push_reflective(id, VerbKind::SetLong, method, Value::Long(value))
    }

    pub fn set_float(&mut self, id: NodeId, method: &str, value: f32) -> BuildResult {
        self.push_reflective(id, VerbKind::SetFloat, method, Value::Float(value))
    }

    pub fn set_string(
        &mut self,
        id: NodeId,
        method: &str,
        value: impl Into<String>,
    ) -> BuildResult {
        self.push_reflective(id, VerbKind::SetString, method, Value::String(value.into()))
    }

    pub fn set_char_sequence(
        &mut self,
        id: NodeId,
        method: &str,
        value: impl Into<String>,
    ) -> BuildResult {
        self.push_reflective(
            id,
            VerbKind::SetCharSequence,
            method,
            Value::CharSequence(value.into()),
        )
    }

    pub fn set_color(&mut self, id: NodeId, method: &str, value: Color) -> BuildResult {
        self.push_reflective(id, VerbKind::SetColor, method, Value::Color(value))
    }

    pub fn set_text_color(&mut self, id: NodeId, color: Color) -> BuildResult {
        self.set_color(id, "setTextColor", color)
    }

    pub fn set_content_description(
        &mut self,
        id: NodeId,
        description: impl Into<String>,
    ) -> BuildResult {
        self.set_char_sequence(id, "setContentDescription", description)
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> BuildResult {
        self.set_boolean(id, "setEnabled", enabled)
    }

    /// Makes the view send `token` to the host when clicked.
    pub fn set_on_click(&mut self, id: NodeId, token: CallbackToken) -> BuildResult {
        self.push(id, Verb::SetOnClick(token))
    }

    pub fn set_chronometer(
        &mut self,
        id: NodeId,
        base: i64,
        format: Option<&str>,
        started: bool,
    ) -> BuildResult {
        self.push(
            id,
            Verb::SetChronometerState {
                base,
                format: format.map(str::to_string),
                started,
            },
        )
    }

    /// While `indeterminate` is set, `max` and `progress` are not applied.
    pub fn set_progress_bar(
        &mut self,
        id: NodeId,
        max: i32,
        progress: i32,
        indeterminate: bool,
    ) -> BuildResult {
        self.push(
            id,
            Verb::SetProgressState {
                max,
                progress,
                indeterminate,
            },
        )
    }

    /// Calls any remotable method on the view.
    pub fn call(&mut self, id: NodeId, method: &str, arg: Value) -> BuildResult {
        self.push_reflective(id, VerbKind::ReflectiveCall, method, arg)
    }

    /// Appends the tree produced by `nested` to the group `parent`.
    ///
    /// Ids inside `nested` are looked up in its own tree while it is applied. Nesting is bounded
    /// by `max_nesting_depth`.
    pub fn add_view(&mut self, parent: NodeId, nested: RemoteViews) -> BuildResult {
        self.push(parent, Verb::AddView(Box::new(nested)))
    }

    pub fn remove_all_views(&mut self, parent: NodeId) -> BuildResult {
        self.push(parent, Verb::RemoveAllViews)
    }

    pub fn set_view_padding(
        &mut self,
        id: NodeId,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    ) -> BuildResult {
        self.push(
            id,
            Verb::SetPadding {
                left,
                top,
                right,
                bottom,
            },
        )
    }

    pub fn build(&self) -> RemoteViews {
        self.views.clone()
    }
}

fn check_limit(what: &'static str, limit: usize, found: u64) -> Result<(), ConstructionError> {
    if found > limit as u64 {
        return Err(ConstructionError::LimitExceeded {
            what,
            limit: limit as u64,
            found,
        });
    }
    Ok(())
}

fn check_string(limits: &WireLimits, s: &str) -> Result<(), ConstructionError> {
    check_limit("string", limits.max_string_bytes, s.len() as u64)
}

fn check_bitmap(limits: &WireLimits, bitmap: &Bitmap) -> Result<(), ConstructionError> {
    let pixels = bitmap.width() as u64 * bitmap.height() as u64;
    check_limit("bitmap", limits.max_bitmap_pixels, pixels)
}

fn check_verb(limits: &WireLimits, verb: &Verb) -> Result<(), ConstructionError> {
    if let Some(method) = verb.method() {
        check_string(limits, method)?;
    }
    match verb {
        Verb::SetText(s)
        | Verb::SetImageFromUri(s)
        | Verb::SetString { value: s, .. }
        | Verb::SetCharSequence { value: s, .. }
        | Verb::SetChronometerState {
            format: Some(s), ..
        } => check_string(limits, s),
        Verb::SetImageFromBytes(bitmap) => check_bitmap(limits, bitmap),
        Verb::ReflectiveCall { arg, .. } => match arg {
            Value::String(s) | Value::CharSequence(s) | Value::Uri(s) => check_string(limits, s),
            Value::Bitmap(bitmap) => check_bitmap(limits, bitmap),
            _ => Ok(()),
        },
        Verb::AddView(nested) => {
            let depth = 1 + nested.nesting_depth();
            check_limit("nesting depth", limits.max_nesting_depth, depth as u64)?;
            // the nested descriptor may have been built under other limits
            if let Some(origin) = nested.origin() {
                check_string(limits, origin)?;
            }
            check_limit(
                "action count",
                limits.max_actions,
                nested.actions().len() as u64,
            )?;
            nested
                .actions()
                .iter()
                .try_for_each(|action| check_verb(limits, action.verb()))
        }
        _ => Ok(()),
    }
}
