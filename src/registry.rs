//! The class allowlist.
//!
//! Templates may come from another trust domain, so inflation can only construct types that
//! trusted code registered here. There is no fallback: an unknown type name fails closed.

use crate::view::View;
use crate::widgets::{
    self, Button, Chronometer, FrameLayout, ImageButton, ImageView, LinearLayout, ProgressBar,
    RelativeLayout, TextView,
};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Creates a fresh view of a registered type.
pub type Constructor = fn() -> Box<dyn View>;

/// Error returned for type names that are not on the allowlist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("view type `{0}` is not on the allowlist")]
pub struct NotAllowed(pub String);

/// An immutable table from type names to constructors.
#[derive(Clone)]
pub struct ClassAllowlist {
    constructors: HashMap<&'static str, Constructor>,
}

impl ClassAllowlist {
    pub fn builder() -> ClassAllowlistBuilder {
        ClassAllowlistBuilder {
            constructors: HashMap::new(),
        }
    }

    /// The built-in widget set.
    pub fn builtin() -> ClassAllowlist {
        ClassAllowlistBuilder::with_builtin().build()
    }

    /// Looks up the constructor for a type name.
    pub fn resolve(&self, type_name: &str) -> Result<Constructor, NotAllowed> {
        self.constructors
            .get(type_name)
            .copied()
            .ok_or_else(|| NotAllowed(type_name.to_string()))
    }

    /// Constructs a view of the given type.
    pub fn instantiate(&self, type_name: &str) -> Result<Box<dyn View>, NotAllowed> {
        let constructor = self.resolve(type_name)?;
        Ok(constructor())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constructors.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ClassAllowlist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Builds a [`ClassAllowlist`].
///
/// Names are `&'static str` so that only code, never decoded data, can extend the list.
pub struct ClassAllowlistBuilder {
    constructors: HashMap<&'static str, Constructor>,
}

impl ClassAllowlistBuilder {
    /// A builder pre-populated with the built-in widget set.
    pub fn with_builtin() -> ClassAllowlistBuilder {
        ClassAllowlist::builder()
            .register("FrameLayout", widgets::create::<FrameLayout>)
            .register("LinearLayout", widgets::create::<LinearLayout>)
            .register("RelativeLayout", widgets::create::<RelativeLayout>)
            .register("TextView", widgets::create::<TextView>)
            .register("Button", widgets::create::<Button>)
            .register("ImageView", widgets::create::<ImageView>)
            .register("ImageButton", widgets::create::<ImageButton>)
            .register("ProgressBar", widgets::create::<ProgressBar>)
            .register("Chronometer", widgets::create::<Chronometer>)
    }

    /// Registers a type; a later registration under the same name replaces the earlier one.
    pub fn register(mut self, name: &'static str, constructor: Constructor) -> Self {
        self.constructors.insert(name, constructor);
        self
    }

    pub fn build(self) -> ClassAllowlist {
        ClassAllowlist {
            constructors: self.constructors,
        }
    }
}

static GLOBAL: OnceCell<Arc<ClassAllowlist>> = OnceCell::new();

/// Installs the process-wide allowlist.
///
/// Must be called at startup, before the first call to [`global`]; once a list is in place it
/// cannot be replaced and the rejected list is handed back.
pub fn install(allowlist: ClassAllowlist) -> Result<(), ClassAllowlist> {
    let mut allowlist = Some(allowlist);
    GLOBAL.get_or_init(|| {
        tracing::debug!("installing process-wide class allowlist");
        Arc::new(allowlist.take().unwrap_or_else(ClassAllowlist::builtin))
    });
    match allowlist {
        Some(rejected) => Err(rejected),
        None => Ok(()),
    }
}

/// The process-wide allowlist: the installed one, or the built-in set if none was installed.
pub fn global() -> Arc<ClassAllowlist> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(ClassAllowlist::builtin())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::TextView;

    #[test]
    fn builtin_set_resolves() {
        let allowlist = ClassAllowlist::builtin();
        for name in [
            "FrameLayout",
            "LinearLayout",
            "RelativeLayout",
            "TextView",
            "Button",
            "ImageView",
            "ImageButton",
            "ProgressBar",
            "Chronometer",
        ] {
            let view = allowlist.instantiate(name).unwrap();
            assert_eq!(view.type_name(), name);
        }
        assert_eq!(allowlist.names().len(), 9);
    }

    #[test]
    fn unknown_types_fail_closed() {
        let allowlist = ClassAllowlist::builtin();
        assert_eq!(
            allowlist.resolve("WebView").unwrap_err(),
            NotAllowed("WebView".into())
        );
        assert!(allowlist.resolve("textview").is_err());
        assert!(allowlist.resolve("").is_err());
    }

    #[test]
    fn custom_lists_only_contain_what_was_registered() {
        let allowlist = ClassAllowlist::builder()
            .register("Label", widgets::create::<TextView>)
            .build();
        assert!(allowlist.contains("Label"));
        assert!(!allowlist.contains("TextView"));
        assert_eq!(allowlist.instantiate("Label").unwrap().type_name(), "TextView");
    }

    #[test]
    fn global_list_is_installed_once() {
        let first = global();
        assert!(first.contains("TextView"));
        // the global list is already initialized, so installing is refused
        let rejected = install(ClassAllowlist::builder().build()).unwrap_err();
        assert!(rejected.names().is_empty());
        assert!(Arc::ptr_eq(&first, &global()));
    }
}
