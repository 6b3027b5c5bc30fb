//! Purpose: Derive the bus address of a shared model from its service identifier.
//! Exports: `MODEL_OBJECT_ROOT`, `MODEL_INTERFACE`, `CLONE_METHOD`, `resolve_object_path`.
//! Role: Pure naming rules shared by every bus implementation.
//! Invariants: Resolution is total; validity of the result is the bus layer's concern.

/// Object path namespace reserved for shared models.
pub const MODEL_OBJECT_ROOT: &str = "/com/canonical/dee/model";

/// Well-known interface implemented by every shared model object.
pub const MODEL_INTERFACE: &str = "com.canonical.Dee.Model";

/// Remote method returning a full snapshot of the model.
pub const CLONE_METHOD: &str = "Clone";

/// `com.foo.Bar` resolves to `/com/canonical/dee/model/com/foo/Bar`.
pub fn resolve_object_path(service: &str) -> String {
    let mut path = String::with_capacity(MODEL_OBJECT_ROOT.len() + 1 + service.len());
    path.push_str(MODEL_OBJECT_ROOT);
    path.push('/');
    path.push_str(&service.replace('.', "/"));
    path
}
