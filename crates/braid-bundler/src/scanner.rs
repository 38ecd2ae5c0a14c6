//! Source scanning.
//!
//! Two walks over module source share the parsing machinery here. The
//! first runs during resolution on the original source and only
//! collects import specifiers so the resolver can grow the graph. The
//! second runs during linking on compiled JavaScript and records every
//! import/export statement with its span so the linker can splice the
//! module body into a registry factory.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, Declaration, ImportDeclarationSpecifier, ModuleDeclaration,
    ModuleExportName,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};

use braid_graph::SourceKind;

use crate::error::{BuildError, Result};

/// One import or export statement found in compiled JavaScript.
#[derive(Debug, Clone)]
pub(crate) struct LinkStatement {
    /// Span of the whole statement in the compiled source.
    pub span: Span,
    pub kind: LinkStatementKind,
}

/// The statement shapes the linker rewrites.
#[derive(Debug, Clone)]
pub(crate) enum LinkStatementKind {
    /// `import d, { a as b } from "./x"` or `import "./x"`.
    Import {
        source: String,
        bindings: Vec<ImportBinding>,
    },
    /// `export const a = ..` / `export function f() ..` / `export class C ..`.
    ///
    /// `decl_start` is where the declaration itself begins, so the
    /// rewrite can drop the `export` keyword and keep the rest.
    ExportDecl { decl_start: u32, names: Vec<String> },
    /// `export default <expr or declaration>`.
    ExportDefault { decl_start: u32 },
    /// `export { a, b as c }` over local bindings.
    ExportLocal { items: Vec<(String, String)> },
    /// `export { a, b as c } from "./x"`. Items are `(imported, exported)`.
    ExportNamedFrom {
        source: String,
        items: Vec<(String, String)>,
    },
    /// `export * from "./x"`.
    ExportStar { source: String },
    /// `export * as ns from "./x"`.
    ExportNamespace { source: String, alias: String },
}

/// One binding introduced by an import statement.
#[derive(Debug, Clone)]
pub(crate) enum ImportBinding {
    Default { local: String },
    Namespace { local: String },
    Named { imported: String, local: String },
}

/// Scan result for one compiled module.
#[derive(Debug, Default)]
pub(crate) struct LinkScan {
    pub statements: Vec<LinkStatement>,
}

impl LinkScan {
    /// Import sources in statement order, used to sanity-check against
    /// the records collected during resolution.
    #[cfg(test)]
    pub fn import_sources(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter_map(|statement| match &statement.kind {
                LinkStatementKind::Import { source, .. } => Some(source.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub(crate) fn source_type_for(kind: SourceKind) -> SourceType {
    match kind {
        SourceKind::JavaScript => SourceType::mjs(),
        SourceKind::Jsx => SourceType::jsx(),
        SourceKind::TypeScript => SourceType::ts(),
        SourceKind::Tsx => SourceType::tsx(),
    }
}

/// Collect the import specifiers of an original source file.
///
/// Type-only imports and re-exports never survive compilation, so they
/// do not pull files into the graph. Dynamic `import()` expressions are
/// left alone entirely.
pub(crate) fn collect_import_specifiers(
    path: &Path,
    kind: SourceKind,
    source: &str,
) -> Result<Vec<String>> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type_for(kind)).parse();
    if !parsed.errors.is_empty() {
        return Err(compile_failure(path, &parsed.errors));
    }

    let mut specifiers = Vec::new();
    for statement in &parsed.program.body {
        let Some(declaration) = statement.as_module_declaration() else {
            continue;
        };
        match declaration {
            ModuleDeclaration::ImportDeclaration(import) => {
                if !import.import_kind.is_type() {
                    specifiers.push(import.source.value.to_string());
                }
            }
            ModuleDeclaration::ExportNamedDeclaration(named) => {
                if let Some(source) = &named.source {
                    if !named.export_kind.is_type() {
                        specifiers.push(source.value.to_string());
                    }
                }
            }
            ModuleDeclaration::ExportAllDeclaration(all) => {
                if !all.export_kind.is_type() {
                    specifiers.push(all.source.value.to_string());
                }
            }
            _ => {}
        }
    }
    Ok(specifiers)
}

/// Scan compiled JavaScript for the statements the linker rewrites.
pub(crate) fn scan_for_linking(path: &Path, compiled: &str) -> Result<LinkScan> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, compiled, SourceType::mjs()).parse();
    if !parsed.errors.is_empty() {
        return Err(compile_failure(path, &parsed.errors));
    }

    let mut scan = LinkScan::default();
    for statement in &parsed.program.body {
        let Some(declaration) = statement.as_module_declaration() else {
            continue;
        };
        let span = statement.span();
        match declaration {
            ModuleDeclaration::ImportDeclaration(import) => {
                let mut bindings = Vec::new();
                if let Some(specifiers) = &import.specifiers {
                    for specifier in specifiers {
                        bindings.push(import_binding(specifier));
                    }
                }
                scan.statements.push(LinkStatement {
                    span,
                    kind: LinkStatementKind::Import {
                        source: import.source.value.to_string(),
                        bindings,
                    },
                });
            }
            ModuleDeclaration::ExportDefaultDeclaration(export) => {
                scan.statements.push(LinkStatement {
                    span,
                    kind: LinkStatementKind::ExportDefault {
                        decl_start: export.declaration.span().start,
                    },
                });
            }
            ModuleDeclaration::ExportNamedDeclaration(named) => {
                let kind = if let Some(declaration) = &named.declaration {
                    let mut names = Vec::new();
                    declared_names(declaration, &mut names);
                    LinkStatementKind::ExportDecl {
                        decl_start: declaration.span().start,
                        names,
                    }
                } else {
                    let items = named
                        .specifiers
                        .iter()
                        .map(|specifier| {
                            (export_name(&specifier.local), export_name(&specifier.exported))
                        })
                        .collect();
                    match &named.source {
                        Some(source) => LinkStatementKind::ExportNamedFrom {
                            source: source.value.to_string(),
                            items,
                        },
                        None => LinkStatementKind::ExportLocal { items },
                    }
                };
                scan.statements.push(LinkStatement { span, kind });
            }
            ModuleDeclaration::ExportAllDeclaration(all) => {
                let source = all.source.value.to_string();
                let kind = match &all.exported {
                    Some(alias) => LinkStatementKind::ExportNamespace {
                        source,
                        alias: export_name(alias),
                    },
                    None => LinkStatementKind::ExportStar { source },
                };
                scan.statements.push(LinkStatement { span, kind });
            }
            _ => {}
        }
    }
    Ok(scan)
}

fn import_binding(specifier: &ImportDeclarationSpecifier) -> ImportBinding {
    match specifier {
        ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => ImportBinding::Default {
            local: default.local.name.to_string(),
        },
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
            ImportBinding::Namespace {
                local: namespace.local.name.to_string(),
            }
        }
        ImportDeclarationSpecifier::ImportSpecifier(named) => ImportBinding::Named {
            imported: export_name(&named.imported),
            local: named.local.name.to_string(),
        },
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}

/// Names bound by an exported declaration, in source order.
fn declared_names(declaration: &Declaration, out: &mut Vec<String>) {
    match declaration {
        Declaration::FunctionDeclaration(function) => {
            if let Some(id) = &function.id {
                out.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                out.push(id.name.to_string());
            }
        }
        Declaration::VariableDeclaration(variable) => {
            for declarator in &variable.declarations {
                binding_names(&declarator.id.kind, out);
            }
        }
        _ => {}
    }
}

fn binding_names(kind: &BindingPatternKind, out: &mut Vec<String>) {
    match kind {
        BindingPatternKind::BindingIdentifier(ident) => out.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(pattern) => {
            for property in &pattern.properties {
                binding_names(&property.value.kind, out);
            }
            if let Some(rest) = &pattern.rest {
                binding_names(&rest.argument.kind, out);
            }
        }
        BindingPatternKind::ArrayPattern(pattern) => {
            for element in pattern.elements.iter().flatten() {
                binding_names(&element.kind, out);
            }
            if let Some(rest) = &pattern.rest {
                binding_names(&rest.argument.kind, out);
            }
        }
        BindingPatternKind::AssignmentPattern(pattern) => {
            binding_names(&pattern.left.kind, out);
        }
    }
}

/// Fold parser or transformer diagnostics into one compile error.
pub(crate) fn compile_failure(path: &Path, errors: &[impl std::fmt::Display]) -> BuildError {
    let diagnostic = errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    BuildError::Compile {
        path: path.to_path_buf(),
        diagnostic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_value_imports_only() {
        let source = r#"
import { render } from "./render";
import type { Config } from "./types";
export { helper } from "./util";
export * from "./shared";
const local = 1;
"#;
        let specifiers = collect_import_specifiers(
            Path::new("index.ts"),
            SourceKind::TypeScript,
            source,
        )
        .unwrap();
        assert_eq!(specifiers, vec!["./render", "./util", "./shared"]);
    }

    #[test]
    fn syntax_error_is_a_compile_failure() {
        let err = collect_import_specifiers(
            Path::new("broken.ts"),
            SourceKind::TypeScript,
            "import { from",
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Compile { .. }));
    }

    #[test]
    fn link_scan_records_statement_shapes() {
        let compiled = r#"import d, { a as b } from "./x";
import * as ns from "./y";
import "./effects";
export const one = 1;
export default d + one;
export { one as first };
export { two } from "./z";
export * from "./w";
export * as wide from "./v";
"#;
        let scan = scan_for_linking(Path::new("index.js"), compiled).unwrap();
        assert_eq!(scan.statements.len(), 9);
        assert_eq!(scan.import_sources(), vec!["./x", "./y", "./effects"]);

        match &scan.statements[0].kind {
            LinkStatementKind::Import { bindings, .. } => {
                assert_eq!(bindings.len(), 2);
                assert!(matches!(&bindings[0], ImportBinding::Default { local } if local == "d"));
                assert!(matches!(
                    &bindings[1],
                    ImportBinding::Named { imported, local } if imported == "a" && local == "b"
                ));
            }
            other => panic!("expected import, got {other:?}"),
        }
        match &scan.statements[3].kind {
            LinkStatementKind::ExportDecl { names, .. } => assert_eq!(names, &["one"]),
            other => panic!("expected export decl, got {other:?}"),
        }
        match &scan.statements[8].kind {
            LinkStatementKind::ExportNamespace { alias, .. } => assert_eq!(alias, "wide"),
            other => panic!("expected namespace re-export, got {other:?}"),
        }
    }

    #[test]
    fn destructured_export_names_are_collected() {
        let compiled = "export const { a, b: renamed, ...rest } = source();";
        let scan = scan_for_linking(Path::new("index.js"), compiled).unwrap();
        match &scan.statements[0].kind {
            LinkStatementKind::ExportDecl { names, .. } => {
                assert_eq!(names, &["a", "renamed", "rest"]);
            }
            other => panic!("expected export decl, got {other:?}"),
        }
    }
}
