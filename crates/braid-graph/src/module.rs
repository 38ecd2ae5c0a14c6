//! Module identity and payloads.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::ImportRecord;

/// Stable module identity: the root-relative path with forward slashes.
///
/// Ids are what the emitted bundle keys its module registry by, so they must
/// be identical across platforms and runs for the same source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Build an id from a path relative to the project root.
    pub fn from_relative(relative: &Path) -> Self {
        let mut id = String::new();
        for component in relative.components() {
            if !id.is_empty() {
                id.push('/');
            }
            id.push_str(&component.as_os_str().to_string_lossy());
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Text source dialect, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl SourceKind {
    /// Map an extension (no dot) to a source kind, `None` for anything braid
    /// cannot treat as a text module.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" | "cjs" => Some(SourceKind::JavaScript),
            "jsx" => Some(SourceKind::Jsx),
            "ts" | "mts" | "cts" => Some(SourceKind::TypeScript),
            "tsx" => Some(SourceKind::Tsx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn is_typescript(self) -> bool {
        matches!(self, SourceKind::TypeScript | SourceKind::Tsx)
    }

    pub fn has_jsx(self) -> bool {
        matches!(self, SourceKind::Jsx | SourceKind::Tsx)
    }
}

/// Coarse module classification used by the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Parsed, compiled and rewritten text source.
    Text(SourceKind),
    /// Opaque WebAssembly unit, embedded without inspection.
    Binary,
}

/// What a module carries through the pipeline.
#[derive(Debug, Clone)]
pub enum ModulePayload {
    Text {
        kind: SourceKind,
        /// Original source as read from disk.
        source: String,
        /// Plain JavaScript produced by the compilation stage.
        compiled: Option<String>,
    },
    Binary {
        bytes: Vec<u8>,
    },
}

/// One node of the module graph.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    /// Absolute path the module was read from.
    pub path: PathBuf,
    pub payload: ModulePayload,
    /// Outgoing edges in declaration order.
    pub imports: Vec<ImportRecord>,
}

impl Module {
    pub fn text(id: ModuleId, path: PathBuf, kind: SourceKind, source: String) -> Self {
        Self {
            id,
            path,
            payload: ModulePayload::Text {
                kind,
                source,
                compiled: None,
            },
            imports: Vec::new(),
        }
    }

    pub fn binary(id: ModuleId, path: PathBuf, bytes: Vec<u8>) -> Self {
        Self {
            id,
            path,
            payload: ModulePayload::Binary { bytes },
            imports: Vec::new(),
        }
    }

    pub fn kind(&self) -> ModuleKind {
        match &self.payload {
            ModulePayload::Text { kind, .. } => ModuleKind::Text(*kind),
            ModulePayload::Binary { .. } => ModuleKind::Binary,
        }
    }

    /// Map an import specifier back to the module it resolved to.
    pub fn resolve_import(&self, specifier: &str) -> Option<&ModuleId> {
        self.imports
            .iter()
            .find(|record| record.specifier == specifier)
            .map(|record| &record.resolved)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.payload, ModulePayload::Binary { .. })
    }

    /// Original text source, `None` for binary modules.
    pub fn source(&self) -> Option<&str> {
        match &self.payload {
            ModulePayload::Text { source, .. } => Some(source),
            ModulePayload::Binary { .. } => None,
        }
    }

    /// Compiled JavaScript if the compilation stage has run.
    pub fn compiled(&self) -> Option<&str> {
        match &self.payload {
            ModulePayload::Text { compiled, .. } => compiled.as_deref(),
            ModulePayload::Binary { .. } => None,
        }
    }

    /// Record the compilation result for a text module.
    ///
    /// No-op for binary modules; they never reach the compiler.
    pub fn set_compiled(&mut self, output: String) {
        if let ModulePayload::Text { compiled, .. } = &mut self.payload {
            *compiled = Some(output);
        }
    }

    /// Binary payload, `None` for text modules.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            ModulePayload::Binary { bytes } => Some(bytes),
            ModulePayload::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_from_relative_uses_forward_slashes() {
        let id = ModuleId::from_relative(Path::new("src").join("lib").join("util.ts").as_path());
        assert_eq!(id.as_str(), "src/lib/util.ts");
    }

    #[test]
    fn id_display_matches_as_str() {
        let id = ModuleId::from("src/index.ts");
        assert_eq!(id.to_string(), "src/index.ts");
    }

    #[test]
    fn source_kind_covers_js_family() {
        assert_eq!(
            SourceKind::from_extension("ts"),
            Some(SourceKind::TypeScript)
        );
        assert_eq!(SourceKind::from_extension("tsx"), Some(SourceKind::Tsx));
        assert_eq!(
            SourceKind::from_extension("mjs"),
            Some(SourceKind::JavaScript)
        );
        assert_eq!(SourceKind::from_extension("jsx"), Some(SourceKind::Jsx));
        assert_eq!(SourceKind::from_extension("wasm"), None);
        assert_eq!(SourceKind::from_extension("css"), None);
    }

    #[test]
    fn typescript_flags() {
        assert!(SourceKind::TypeScript.is_typescript());
        assert!(SourceKind::Tsx.is_typescript());
        assert!(SourceKind::Tsx.has_jsx());
        assert!(!SourceKind::JavaScript.is_typescript());
    }

    #[test]
    fn text_module_compiles_in_place() {
        let mut module = Module::text(
            ModuleId::from("index.ts"),
            PathBuf::from("/p/index.ts"),
            SourceKind::TypeScript,
            "const x: number = 1;".to_string(),
        );
        assert!(module.compiled().is_none());
        module.set_compiled("const x = 1;".to_string());
        assert_eq!(module.compiled(), Some("const x = 1;"));
        assert!(!module.is_binary());
    }

    #[test]
    fn binary_module_exposes_bytes_only() {
        let module = Module::binary(
            ModuleId::from("pkg/index_bg.wasm"),
            PathBuf::from("/p/pkg/index_bg.wasm"),
            vec![0, 0x61, 0x73, 0x6d],
        );
        assert!(module.is_binary());
        assert_eq!(module.kind(), ModuleKind::Binary);
        assert!(module.source().is_none());
        assert_eq!(module.bytes(), Some(&[0u8, 0x61, 0x73, 0x6d][..]));
    }
}
