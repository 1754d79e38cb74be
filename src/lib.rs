//! Remote views: describe UI mutations in one place, apply them in another.
//!
//! A producer builds a [`RemoteViews`] descriptor (a layout id plus an ordered list of
//! [`Action`]s), serializes it, and hands the bytes to a consumer. The consumer deserializes
//! it and applies it through a [`HostContext`]: the layout is inflated using only types from the
//! [`ClassAllowlist`], then every action runs against the new tree in order. Later descriptors
//! can be reapplied to the same tree in place.
//!
//! Only integer ids and the action log cross the boundary; views are always constructed by the
//! receiving side.
//!
//! ```
//! use remote_views::*;
//! use std::sync::Arc;
//!
//! let layout = LayoutTemplate::new(
//!     TemplateNode::new("FrameLayout").child(TemplateNode::new("TextView").id(NodeId(1))),
//! );
//! let host = HostContext::new(Arc::new(ResourceTable::new().with_layout(LayoutId(1), layout)));
//!
//! let mut builder = RemoteViews::builder(LayoutId(1));
//! builder.set_text_view_text(NodeId(1), "hello").unwrap();
//! let bytes = builder.build().serialize();
//!
//! let views = RemoteViews::deserialize(&bytes).unwrap();
//! let tree = views.apply(&host).unwrap();
//! assert_eq!(tree.view::<widgets::TextView>(NodeId(1)).unwrap().text.text, "hello");
//! ```

pub mod action;
pub mod applier;
pub mod color;
pub mod config;
mod error;
pub mod host;
pub mod layout;
pub mod registry;
mod remote_views;
mod tree;
pub mod value;
#[macro_use]
mod view;
pub mod widgets;
pub mod wire;

pub use action::{Action, ConstructionError, Verb, VerbKind};
pub use color::Color;
pub use config::{HostConfig, WireLimits};
pub use error::{ActionException, ApplyError, FailureCategory, FailureSite};
pub use host::{ClickEvent, HostContext, ResourceError, ResourceTable, Resources};
pub use layout::{LayoutTemplate, TemplateNode};
pub use registry::{ClassAllowlist, ClassAllowlistBuilder, NotAllowed};
pub use remote_views::{RemoteViews, RemoteViewsBuilder};
pub use tree::{AppliedTree, TreeId};
pub use value::{
    Bitmap, CallbackToken, LayoutId, NodeId, ResourceId, Value, ValueKind, Visibility,
};
pub use view::{
    CapabilityError, ChronometerState, ImageContent, ImageSource, Padding, ProgressState,
    TextContent, View, ViewBase,
};
pub use wire::WireError;
