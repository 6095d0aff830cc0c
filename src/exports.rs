//! Export extraction for concern files.
//!
//! Only the named exports of a module are needed: for an async concern they
//! decide how many bindings the wrapper declares and in which order the hooks
//! are called, so the result follows source declaration order exactly.

use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPattern, Declaration, ModuleExportName, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::fs;
use std::path::Path;
use tracing::warn;

const DEFAULT_EXPORT: &str = "default";

/// Named exports of the file at `file_path`, in declaration order.
///
/// Unreadable or unparseable files yield an empty list.
pub fn export_names(file_path: &Path) -> Vec<String> {
    match fs::read_to_string(file_path) {
        Ok(source) => export_names_from_source(&source, file_path),
        Err(err) => {
            warn!(path = %file_path.display(), error = %err, "could not read concern file");
            Vec::new()
        }
    }
}

fn source_type_for(file_path: &Path) -> SourceType {
    let ext = file_path.extension().and_then(|e| e.to_str()).unwrap_or("ts");
    SourceType::default()
        .with_module(true)
        .with_typescript(matches!(ext, "ts" | "tsx" | "mts" | "cts"))
        .with_jsx(matches!(ext, "tsx" | "jsx" | "js"))
}

/// Same as [`export_names`] over in-memory source; `file_path` only picks the dialect.
pub fn export_names_from_source(source: &str, file_path: &Path) -> Vec<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type_for(file_path)).parse();

    if ret.panicked || !ret.errors.is_empty() {
        warn!(
            path = %file_path.display(),
            errors = ret.errors.len(),
            "unparseable concern file, assuming no exports"
        );
        return Vec::new();
    }

    let mut names = Vec::new();

    for stmt in &ret.program.body {
        let Statement::ExportNamedDeclaration(export) = stmt else {
            continue;
        };
        if export.export_kind.is_type() {
            continue;
        }

        if let Some(declaration) = &export.declaration {
            match declaration {
                Declaration::VariableDeclaration(var_decl) => {
                    for decl in &var_decl.declarations {
                        collect_binding_names(&decl.id, &mut names);
                    }
                }
                Declaration::FunctionDeclaration(func) => {
                    if let Some(id) = &func.id {
                        names.push(id.name.to_string());
                    }
                }
                Declaration::ClassDeclaration(class) => {
                    if let Some(id) = &class.id {
                        names.push(id.name.to_string());
                    }
                }
                Declaration::TSEnumDeclaration(decl) => {
                    names.push(decl.id.name.to_string());
                }
                // Interfaces, type aliases and namespaces carry no runtime value.
                _ => {}
            }
        }

        for specifier in &export.specifiers {
            if specifier.export_kind.is_type() {
                continue;
            }
            let name = match &specifier.exported {
                ModuleExportName::IdentifierName(id) => id.name.as_str(),
                ModuleExportName::IdentifierReference(id) => id.name.as_str(),
                ModuleExportName::StringLiteral(s) => s.value.as_str(),
            };
            // `export { x as default }` is the default export.
            if name != DEFAULT_EXPORT {
                names.push(name.to_string());
            }
        }
    }

    names
}

fn collect_binding_names(pattern: &BindingPattern, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => {
            names.push(id.name.to_string());
        }
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_binding_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for pattern in arr.elements.iter().flatten() {
                collect_binding_names(pattern, names);
            }
            if let Some(rest) = &arr.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(source: &str) -> Vec<String> {
        export_names_from_source(source, Path::new("async.ts"))
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let source = r#"
            export const save = (dp) => async (x) => x;
            export function load(dp) { return async () => 1; }
            let a = 1, b = 2;
            export { a, b as bee };
            export let counter = 0;
        "#;
        assert_eq!(names(source), vec!["save", "load", "a", "bee", "counter"]);
    }

    #[test]
    fn test_type_and_default_exports_are_ignored() {
        let source = r#"
            export type Item = { id: number };
            export interface Props { id: number }
            export default function main() {}
            export const fetchItems = (dp: unknown) => async () => [] as Item[];
        "#;
        assert_eq!(names(source), vec!["fetchItems"]);
    }

    #[test]
    fn test_renamed_default_is_not_named() {
        let source = "const load = () => 1; const keep = 2; export { load as default, keep };";
        assert_eq!(names(source), vec!["keep"]);
    }

    #[test]
    fn test_destructured_exports() {
        let source = "const o = { x: 1, y: 2 }; export const { x, y: why } = o;";
        assert_eq!(names(source), vec!["x", "why"]);
    }

    #[test]
    fn test_unparseable_source_is_empty() {
        assert!(names("export const = ;;; {{").is_empty());
    }

    #[test]
    fn test_missing_file_is_empty() {
        assert!(export_names(Path::new("/definitely/not/here/async.ts")).is_empty());
    }
}
