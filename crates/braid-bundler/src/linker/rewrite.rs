//! Statement rewriting.
//!
//! Turns one compiled module body into the body of a registry factory.
//! Import and export statements are replaced span by span, back to
//! front so earlier offsets stay valid, and the export wiring lines
//! are prepended so every exported name is defined before the body
//! runs. Function declarations hoist past the wiring, so cyclic
//! imports of functions behave; reading a `const` before its module
//! finished initializing throws, as it would under native ESM.

use braid_graph::Module;

use super::exports::{DEFAULT_BINDING, ExportBinding, ExportMap};
use super::{EXPORTS_PARAM, REQUIRE_FN, target_of};
use crate::error::{BuildError, Result};
use crate::scanner::{ImportBinding, LinkScan, LinkStatementKind};

/// Name of the runtime helper that installs an export getter.
pub(crate) const DEFINE_FN: &str = "__braid_define__";

struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Rewrite a compiled module into factory-body JavaScript.
pub(crate) fn factory_body(
    module: &Module,
    scan: &LinkScan,
    exports: &ExportMap,
) -> Result<String> {
    let compiled = module.compiled().ok_or_else(|| BuildError::Compile {
        path: module.path.clone(),
        diagnostic: "module reached the linker without a compilation result".to_string(),
    })?;

    let mut edits = Vec::new();
    for statement in &scan.statements {
        let start = statement.span.start as usize;
        let end = statement.span.end as usize;
        match &statement.kind {
            LinkStatementKind::Import { source, bindings } => {
                let target = target_of(module, source)?;
                edits.push(Edit {
                    start,
                    end,
                    text: import_lines(bindings, target.as_str()),
                });
            }
            LinkStatementKind::ExportDecl { decl_start, .. } => {
                // drop the `export` keyword, keep the declaration
                edits.push(Edit {
                    start,
                    end: *decl_start as usize,
                    text: String::new(),
                });
            }
            LinkStatementKind::ExportDefault { decl_start } => {
                edits.push(Edit {
                    start,
                    end: *decl_start as usize,
                    text: format!("const {DEFAULT_BINDING} = "),
                });
                // `export default function f() {}` carries no
                // semicolon; the assignment form needs one.
                if !compiled[start..end].trim_end().ends_with(';') {
                    edits.push(Edit {
                        start: end,
                        end,
                        text: ";".to_string(),
                    });
                }
            }
            LinkStatementKind::ExportLocal { .. }
            | LinkStatementKind::ExportNamedFrom { .. }
            | LinkStatementKind::ExportStar { .. }
            | LinkStatementKind::ExportNamespace { .. } => {
                // wired through the export map, nothing left to run
                edits.push(Edit {
                    start,
                    end,
                    text: String::new(),
                });
            }
        }
    }

    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));
    let mut body = compiled.to_string();
    for edit in &edits {
        body.replace_range(edit.start..edit.end, &edit.text);
    }

    let mut out = String::new();
    for (name, binding) in exports {
        out.push_str(&define_line(name, binding));
        out.push('\n');
    }
    out.push_str(body.trim_start_matches('\n'));
    Ok(out)
}

/// Replacement lines for one import statement.
fn import_lines(bindings: &[ImportBinding], target: &str) -> String {
    let require = format!("{REQUIRE_FN}({})", js_string(target));
    if bindings.is_empty() {
        return format!("{require};");
    }

    let mut lines = Vec::new();
    let mut named = Vec::new();
    for binding in bindings {
        match binding {
            ImportBinding::Default { local } => {
                lines.push(format!("const {local} = {require}.default;"));
            }
            ImportBinding::Namespace { local } => {
                lines.push(format!("const {local} = {require};"));
            }
            ImportBinding::Named { imported, local } => {
                if imported == local {
                    named.push(local.clone());
                } else if is_identifier(imported) {
                    named.push(format!("{imported}: {local}"));
                } else {
                    named.push(format!("{}: {local}", js_string(imported)));
                }
            }
        }
    }
    if !named.is_empty() {
        lines.push(format!("const {{ {} }} = {require};", named.join(", ")));
    }
    lines.join("\n")
}

fn define_line(name: &str, binding: &ExportBinding) -> String {
    let getter = match binding {
        ExportBinding::Local { expr } => format!("function () {{ return {expr}; }}"),
        ExportBinding::Reexport { from, name } => format!(
            "function () {{ return {REQUIRE_FN}({}){}; }}",
            js_string(from.as_str()),
            member_access(name)
        ),
        ExportBinding::Namespace { from } => format!(
            "function () {{ return {REQUIRE_FN}({}); }}",
            js_string(from.as_str())
        ),
    };
    format!(
        "{DEFINE_FN}({EXPORTS_PARAM}, {}, {getter});",
        js_string(name)
    )
}

fn member_access(name: &str) -> String {
    if is_identifier(name) {
        format!(".{name}")
    } else {
        format!("[{}]", js_string(name))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

/// Render a Rust string as a double-quoted JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
