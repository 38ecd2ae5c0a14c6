//! Graph edges.

use crate::ModuleId;

/// A resolved static import: the specifier as written plus the module it
/// landed on. Order within a module is declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// Import specifier exactly as it appears in the source.
    pub specifier: String,
    /// Module the specifier resolved to.
    pub resolved: ModuleId,
}

impl ImportRecord {
    pub fn new(specifier: impl Into<String>, resolved: ModuleId) -> Self {
        Self {
            specifier: specifier.into(),
            resolved,
        }
    }
}
