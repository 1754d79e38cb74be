//! Errors surfaced by `apply` and `reapply`.

use crate::action::VerbKind;
use crate::host::ResourceError;
use crate::registry::NotAllowed;
use crate::value::{LayoutId, NodeId};
use crate::view::CapabilityError;
use core::fmt;

/// Why applying a descriptor failed.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("no view with id {0} in the tree")]
    NoSuchNode(NodeId),

    #[error("{type_name} does not support {verb:?}")]
    Unsupported {
        verb: VerbKind,
        type_name: &'static str,
    },

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    NotAllowed(#[from] NotAllowed),

    #[error("{type_name} cannot hold subviews")]
    NotAGroup { type_name: &'static str },

    #[error("{0} could not be resolved")]
    UnknownLayout(LayoutId),

    #[error("tree was inflated from {found}, descriptor uses {expected}")]
    LayoutMismatch { expected: LayoutId, found: LayoutId },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("nested descriptor failed: {0}")]
    Nested(#[source] Box<ActionException>),
}

/// Coarse classification of an [`ApplyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// The target id was not found.
    Resolution,
    /// The target exists but cannot perform the mutation.
    Capability,
    /// The template references a type outside the allowlist.
    Allowlist,
    /// A drawable or URI could not be loaded.
    Resource,
    /// The layout could not be resolved or does not match the tree.
    Layout,
}

impl ApplyError {
    pub fn category(&self) -> FailureCategory {
        match self {
            ApplyError::NoSuchNode(_) => FailureCategory::Resolution,
            ApplyError::Unsupported { .. }
            | ApplyError::Capability(_)
            | ApplyError::NotAGroup { .. } => FailureCategory::Capability,
            ApplyError::NotAllowed(_) => FailureCategory::Allowlist,
            ApplyError::UnknownLayout(_) | ApplyError::LayoutMismatch { .. } => {
                FailureCategory::Layout
            }
            ApplyError::Resource(_) => FailureCategory::Resource,
            ApplyError::Nested(inner) => inner.category(),
        }
    }
}

/// Where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSite {
    /// While inflating (or, for reapply, checking) the tree; no action has run.
    Inflate { layout: LayoutId },
    /// While executing the action at `index`.
    Action {
        index: usize,
        verb: VerbKind,
        target: NodeId,
    },
}

impl fmt::Display for FailureSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureSite::Inflate { layout } => write!(f, "inflating {}", layout),
            FailureSite::Action {
                index,
                verb,
                target,
            } => write!(f, "action {} ({:?} on {})", index, verb, target),
        }
    }
}

/// The single error type raised by `apply` and `reapply`.
///
/// Actions before the failing one stay applied; there is no rollback.
#[derive(Debug, thiserror::Error)]
#[error("{site} failed: {cause}")]
pub struct ActionException {
    pub site: FailureSite,
    #[source]
    pub cause: ApplyError,
}

impl ActionException {
    pub(crate) fn inflate(layout: LayoutId, cause: ApplyError) -> ActionException {
        ActionException {
            site: FailureSite::Inflate { layout },
            cause,
        }
    }

    pub(crate) fn action(
        index: usize,
        verb: VerbKind,
        target: NodeId,
        cause: ApplyError,
    ) -> ActionException {
        ActionException {
            site: FailureSite::Action {
                index,
                verb,
                target,
            },
            cause,
        }
    }

    /// Index of the failing action, if an action failed.
    pub fn action_index(&self) -> Option<usize> {
        match self.site {
            FailureSite::Action { index, .. } => Some(index),
            FailureSite::Inflate { .. } => None,
        }
    }

    pub fn verb(&self) -> Option<VerbKind> {
        match self.site {
            FailureSite::Action { verb, .. } => Some(verb),
            FailureSite::Inflate { .. } => None,
        }
    }

    pub fn category(&self) -> FailureCategory {
        self.cause.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_message_names_the_action() {
        let err = ActionException::action(
            2,
            VerbKind::SetText,
            NodeId(7),
            ApplyError::NoSuchNode(NodeId(7)),
        );
        assert_eq!(
            err.to_string(),
            "action 2 (SetText on #7) failed: no view with id #7 in the tree"
        );
        assert_eq!(err.action_index(), Some(2));
        assert_eq!(err.verb(), Some(VerbKind::SetText));
        assert_eq!(err.category(), FailureCategory::Resolution);
    }

    #[test]
    fn nested_failures_keep_their_category() {
        let inner = ActionException::inflate(
            LayoutId(3),
            ApplyError::NotAllowed(NotAllowed("WebView".into())),
        );
        let outer = ActionException::action(
            0,
            VerbKind::AddView,
            NodeId(1),
            ApplyError::Nested(Box::new(inner)),
        );
        assert_eq!(outer.category(), FailureCategory::Allowlist);
        assert_eq!(outer.action_index(), Some(0));
    }
}
