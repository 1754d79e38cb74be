//! Drives descriptors against trees.

use crate::error::{ActionException, ApplyError};
use crate::host::HostContext;
use crate::remote_views::RemoteViews;
use crate::tree::AppliedTree;

/// Inflates the descriptor’s layout and runs every action against the new tree.
pub fn apply(views: &RemoteViews, host: &HostContext) -> Result<AppliedTree, ActionException> {
    let layout = views.layout_id();
    let template = host
        .resources()
        .layout(layout)
        .ok_or_else(|| fail_inflate(views, ApplyError::UnknownLayout(layout)))?;
    let mut tree = AppliedTree::inflate(layout, &template, host.allowlist())
        .map_err(|cause| fail_inflate(views, cause))?;

    tracing::debug!(
        %layout,
        origin = views.origin(),
        actions = views.actions().len(),
        tree = ?tree.id(),
        "applying remote views"
    );
    run_actions(views, &mut tree, host)?;
    Ok(tree)
}

/// Runs every action against an existing tree, without inflating anything.
///
/// The tree must have been inflated from the same layout.
pub fn reapply(
    views: &RemoteViews,
    host: &HostContext,
    tree: &mut AppliedTree,
) -> Result<(), ActionException> {
    if tree.layout_id() != views.layout_id() {
        return Err(fail_inflate(
            views,
            ApplyError::LayoutMismatch {
                expected: views.layout_id(),
                found: tree.layout_id(),
            },
        ));
    }

    tracing::debug!(
        layout = %views.layout_id(),
        origin = views.origin(),
        actions = views.actions().len(),
        tree = ?tree.id(),
        "reapplying remote views"
    );
    run_actions(views, tree, host)
}

/// Executes actions in order, stopping at the first failure. Earlier effects are kept.
fn run_actions(
    views: &RemoteViews,
    tree: &mut AppliedTree,
    host: &HostContext,
) -> Result<(), ActionException> {
    for (index, action) in views.actions().iter().enumerate() {
        tracing::trace!(
            index,
            verb = ?action.kind(),
            target = %action.target(),
            "executing action"
        );
        if let Err(cause) = action.execute(tree, host) {
            tracing::warn!(
                index,
                verb = ?action.kind(),
                target = %action.target(),
                tree = ?tree.id(),
                error = %cause,
                "action failed"
            );
            return Err(ActionException::action(
                index,
                action.kind(),
                action.target(),
                cause,
            ));
        }
    }
    Ok(())
}

fn fail_inflate(views: &RemoteViews, cause: ApplyError) -> ActionException {
    tracing::warn!(layout = %views.layout_id(), error = %cause, "cannot prepare tree");
    ActionException::inflate(views.layout_id(), cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ResourceTable;
    use crate::layout::{LayoutTemplate, TemplateNode};
    use crate::value::{LayoutId, NodeId, Visibility};
    use crate::{FailureCategory, FailureSite};
    use std::sync::Arc;

    fn host() -> HostContext {
        let layout = LayoutTemplate::new(
            TemplateNode::new("FrameLayout")
                .id(NodeId(1))
                .child(TemplateNode::new("TextView").id(NodeId(2))),
        );
        HostContext::new(Arc::new(ResourceTable::new().with_layout(LayoutId(1), layout)))
    }

    #[test]
    fn unknown_layout_fails_before_actions() {
        let views = RemoteViews::builder(LayoutId(9)).build();
        let err = apply(&views, &host()).unwrap_err();
        assert_eq!(err.site, FailureSite::Inflate { layout: LayoutId(9) });
        assert_eq!(err.category(), FailureCategory::Layout);
    }

    #[test]
    fn reapply_checks_layout() {
        let host = host();
        let mut tree = apply(&RemoteViews::builder(LayoutId(1)).build(), &host).unwrap();

        let mut other = RemoteViews::builder(LayoutId(2));
        other
            .set_view_visibility(NodeId(2), Visibility::Gone)
            .unwrap();
        let err = reapply(&other.build(), &host, &mut tree).unwrap_err();
        assert!(matches!(err.cause, ApplyError::LayoutMismatch { .. }));
        assert_eq!(err.action_index(), None);
        assert_eq!(
            tree.find(NodeId(2)).unwrap().base().visibility,
            Visibility::Visible
        );
    }

    #[test]
    fn failing_action_reports_its_index() {
        let mut views = RemoteViews::builder(LayoutId(1));
        views
            .set_text_view_text(NodeId(2), "hello")
            .unwrap()
            .set_text_view_text(NodeId(1), "frames have no text")
            .unwrap();
        let err = apply(&views.build(), &host()).unwrap_err();
        assert_eq!(err.action_index(), Some(1));
        assert_eq!(err.category(), FailureCategory::Capability);
    }
}
