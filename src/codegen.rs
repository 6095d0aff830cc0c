//! Codegen module for the Weave compiler
//!
//! Turns a `ComponentDescriptor` into the source of a wrapper module that
//! composes the component's concerns around its lazily loaded view. The
//! composition order is fixed:
//!
//! ```text
//! ErrorBoundary > Suspense > Themed > HookCore > LazyView
//! ```
//!
//! Each layer exists only when its concern does, except Suspense, which is
//! forced by localization and theming (both suspend while loading). When
//! either of those is present the hook-bearing part moves into its own inner
//! function so the suspending component is never the boundary's direct owner.
//!
//! Every identifier introduced here is `prefix + suffix`. Internal suffixes
//! always start lowercase; the exported function uses the PascalCase display
//! name, so the two namespaces cannot meet. Async export names are imported and
//! used verbatim because the view's props are keyed by them.

use rayon::prelude::*;
use std::path::{Component, Path};
use tracing::debug;

use crate::descriptor::{ComponentDescriptor, ConcernKind, RouteNode};
use crate::exports::export_names;
use crate::hygiene::HygienePrefix;
use crate::options::SynthesisOptions;

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Synthesize the wrapper module for `descriptor` with default module specifiers.
pub fn synthesize(descriptor: &ComponentDescriptor, prefix: &HygienePrefix, project_root: &Path) -> String {
    synthesize_with_options(descriptor, prefix, project_root, &SynthesisOptions::default())
}

pub fn synthesize_with_options(
    descriptor: &ComponentDescriptor,
    prefix: &HygienePrefix,
    project_root: &Path,
    options: &SynthesisOptions,
) -> String {
    let async_exports = descriptor
        .concern(ConcernKind::Async)
        .map(export_names)
        .unwrap_or_default()
        .into_iter()
        .filter(|name| {
            let usable = is_identifier(name);
            if !usable {
                debug!(component = %descriptor.name, export = %name, "skipping non-identifier async export");
            }
            usable
        })
        .collect();

    let module = Synthesizer::new(descriptor, prefix, project_root, options, async_exports).emit();
    debug!(component = %descriptor.name, bytes = module.len(), "synthesized wrapper");
    module
}

/// Synthesize many descriptors in parallel, each under its own fresh prefix.
/// Output order matches input order.
pub fn synthesize_all(
    descriptors: &[ComponentDescriptor],
    project_root: &Path,
    options: &SynthesisOptions,
) -> Vec<(String, String)> {
    descriptors
        .par_iter()
        .map(|descriptor| {
            let prefix = HygienePrefix::generate();
            let module = synthesize_with_options(descriptor, &prefix, project_root, options);
            (descriptor.name.clone(), module)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPOSITION PLAN
// ═══════════════════════════════════════════════════════════════════════════════

/// Which layers the wrapper needs, derived purely from the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionPlan {
    pub error_boundary: bool,
    pub suspense: bool,
    pub themed: bool,
    /// An inner function carrying hook calls (async bindings, i18n, routes).
    pub hook_core: bool,
    /// Hooks and boundaries live in different functions.
    pub split: bool,
}

impl CompositionPlan {
    pub fn new(descriptor: &ComponentDescriptor, async_binding_count: usize) -> Self {
        let i18n = descriptor.has(ConcernKind::I18n);
        let themed = !descriptor.skins.is_empty();
        let hook_core = async_binding_count > 0 || i18n || !descriptor.routes.is_empty();

        Self {
            error_boundary: descriptor.has(ConcernKind::Error),
            suspense: descriptor.has(ConcernKind::Placeholder) || i18n || themed,
            themed,
            hook_core,
            split: i18n || themed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Error,
    Suspense,
}

/// A route flattened in preorder, with the index used for its identifiers.
struct IndexedRoute<'a> {
    index: usize,
    node: &'a RouteNode,
    loader_export: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHESIZER
// ═══════════════════════════════════════════════════════════════════════════════

struct Synthesizer<'a> {
    descriptor: &'a ComponentDescriptor,
    prefix: &'a HygienePrefix,
    project_root: &'a Path,
    options: &'a SynthesisOptions,
    async_exports: Vec<String>,
    plan: CompositionPlan,
    routes: Vec<IndexedRoute<'a>>,
    imports: Vec<ImportDecl>,
}

enum ImportDecl {
    Named {
        source: String,
        specifiers: Vec<(String, String)>,
    },
    Default {
        source: String,
        local: String,
    },
}

impl<'a> Synthesizer<'a> {
    fn new(
        descriptor: &'a ComponentDescriptor,
        prefix: &'a HygienePrefix,
        project_root: &'a Path,
        options: &'a SynthesisOptions,
        async_exports: Vec<String>,
    ) -> Self {
        let plan = CompositionPlan::new(descriptor, async_exports.len());

        let mut routes = Vec::new();
        flatten_routes(&descriptor.routes, &mut routes);

        Self {
            descriptor,
            prefix,
            project_root,
            options,
            async_exports,
            plan,
            routes,
            imports: Vec::new(),
        }
    }

    fn id(&self, suffix: &str) -> String {
        self.prefix.ident(suffix)
    }

    fn emit(mut self) -> String {
        self.collect_imports();

        let mut sections: Vec<String> = Vec::new();
        sections.push(self.render_imports());

        let mut decls = vec![format!(
            "const {} = {}(() => import({}));",
            self.id("view"),
            self.id("lazy"),
            js_string(&self.specifier(&self.descriptor.view_file_path))
        )];
        if self.descriptor.has(ConcernKind::I18n) {
            decls.push(self.i18n_declarations());
        }
        sections.push(decls.join("\n"));

        if !self.routes.is_empty() {
            sections.extend(self.route_declarations());
        }

        let display_name = self.descriptor.display_name();
        let export_name = self.id(&display_name);

        if self.plan.split {
            if self.plan.hook_core {
                sections.push(self.hook_function(&self.id("core"), Vec::new()));
            }
            if self.plan.themed {
                let target = if self.plan.hook_core { self.id("core") } else { self.id("view") };
                sections.push(self.themed_declaration(&target));
            }

            // With a split the outer function only renders boundaries around the inner layer.
            let inner = if self.plan.themed { self.id("themed") } else { self.id("core") };
            let body = format!(
                "  return {};",
                self.compose(&self.boundaries(), self.element(&inner, Some(&self.id("props"))), 1)
            );
            sections.push(format!(
                "function {}({}) {{\n{}\n}}",
                export_name,
                self.id("props"),
                body
            ));
        } else {
            sections.push(self.hook_function(&export_name, self.boundaries()));
        }

        sections.push(format!(
            "{}.displayName = {};\nexport default {};",
            export_name,
            js_string(&display_name),
            export_name
        ));

        let mut module = sections.join("\n\n");
        module.push('\n');
        module
    }

    fn boundaries(&self) -> Vec<Boundary> {
        let mut layers = Vec::new();
        if self.plan.error_boundary {
            layers.push(Boundary::Error);
        }
        if self.plan.suspense {
            layers.push(Boundary::Suspense);
        }
        layers
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Imports
    // ───────────────────────────────────────────────────────────────────────────

    fn collect_imports(&mut self) {
        let mut framework = vec!["createElement", "lazy"];
        if self.plan.suspense {
            framework.push("Suspense");
        }
        let framework_source = self.options.framework_module.clone();
        self.import_named(&framework_source, &framework);

        if !self.routes.is_empty() {
            let router_source = self.options.router_module.clone();
            self.import_named(&router_source, &["useRoutes"]);
        }

        let has_loaders = self.descriptor.has_route_loaders();
        let mut runtime = Vec::new();
        if !self.async_exports.is_empty() || has_loaders {
            runtime.push("useDataPlane");
        }
        if !self.async_exports.is_empty() {
            runtime.push("useAsyncHandler");
        }
        if has_loaders {
            runtime.push("useRouteLoader");
        }
        if self.descriptor.has(ConcernKind::I18n) {
            runtime.push("useI18n");
        }
        if self.plan.error_boundary {
            runtime.push("ErrorBoundary");
        }
        if self.plan.themed {
            runtime.push("skinned");
        }
        if !runtime.is_empty() {
            let runtime_source = self.options.runtime_module.clone();
            self.import_named(&runtime_source, &runtime);
        }

        // User-authored files.
        if let Some(path) = self.descriptor.concern(ConcernKind::Async) {
            if !self.async_exports.is_empty() {
                let source = self.specifier(path);
                let specifiers = self.async_exports.iter().map(|n| (n.clone(), n.clone())).collect();
                self.imports.push(ImportDecl::Named { source, specifiers });
            }
        }
        if let Some(path) = self.descriptor.concern(ConcernKind::Placeholder) {
            self.import_default(path, "placeholder");
        }
        if let Some(path) = self.descriptor.concern(ConcernKind::Error) {
            self.import_default(path, "errorFallback");
        }
        if let Some(path) = self.descriptor.concern(ConcernKind::I18n) {
            self.import_default(path, "i18nBundle");
        }
        let skins: Vec<_> = self.descriptor.skins.values().cloned().collect();
        for (i, path) in skins.iter().enumerate() {
            self.import_default(path, &format!("skin{}", i));
        }

        let mut route_imports = Vec::new();
        for route in &self.routes {
            if let Some(loader) = &route.node.loader_file_path {
                let local = self.id(&format!("routeLoader{}", route.index));
                let source = self.specifier(loader);
                route_imports.push(match &route.loader_export {
                    Some(name) => ImportDecl::Named {
                        source,
                        specifiers: vec![(name.clone(), local)],
                    },
                    None => ImportDecl::Default { source, local },
                });
            }
            if let Some(meta) = &route.node.meta_file_path {
                route_imports.push(ImportDecl::Default {
                    source: self.specifier(meta),
                    local: self.id(&format!("routeMeta{}", route.index)),
                });
            }
        }
        self.imports.extend(route_imports);
    }

    fn import_named(&mut self, source: &str, names: &[&str]) {
        let specifiers = names
            .iter()
            .map(|name| (name.to_string(), self.id(&alias_suffix(name))))
            .collect();
        self.imports.push(ImportDecl::Named {
            source: source.to_string(),
            specifiers,
        });
    }

    fn import_default(&mut self, path: &Path, suffix: &str) {
        let decl = ImportDecl::Default {
            source: self.specifier(path),
            local: self.id(suffix),
        };
        self.imports.push(decl);
    }

    fn render_imports(&self) -> String {
        self.imports
            .iter()
            .map(|decl| match decl {
                ImportDecl::Named { source, specifiers } => {
                    let specs = specifiers
                        .iter()
                        .map(|(imported, local)| {
                            if imported == local {
                                imported.clone()
                            } else {
                                format!("{} as {}", imported, local)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("import {{ {} }} from {};", specs, js_string(source))
                }
                ImportDecl::Default { source, local } => {
                    format!("import {} from {};", local, js_string(source))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Root-relative specifier for paths inside the project, absolute otherwise.
    fn specifier(&self, path: &Path) -> String {
        match path.strip_prefix(self.project_root) {
            Ok(relative) => {
                let joined = relative
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("/");
                format!("/{}", joined)
            }
            Err(_) => path.to_string_lossy().replace('\\', "/"),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Declarations
    // ───────────────────────────────────────────────────────────────────────────

    fn i18n_declarations(&self) -> String {
        let translations = if self.options.translations_glob {
            let pattern = format!("{}/*.json", self.specifier(&self.descriptor.directory.join("i18n")));
            format!(
                "import.meta.glob({}, {{ query: \"?url\", import: \"default\", eager: true }})",
                js_string(&pattern)
            )
        } else {
            "{}".to_string()
        };

        format!(
            "const {} = () => {};\nconst {} = {};",
            self.id("i18nDefaults"),
            self.id("i18nBundle"),
            self.id("translations"),
            translations
        )
    }

    fn route_declarations(&self) -> Vec<String> {
        let mut out = Vec::new();

        for route in &self.routes {
            let Some(view) = &route.node.view_file_path else {
                continue;
            };
            let route_view = self.id(&format!("routeView{}", route.index));
            out.push(format!(
                "const {} = {}(() => import({}));",
                route_view,
                self.id("lazy"),
                js_string(&self.specifier(view))
            ));

            if route.node.loader_file_path.is_some() {
                let data_plane = self.id("dataPlane");
                let load = self.id("load");
                out.push(format!(
                    "function {}({}) {{\n  const {} = {}();\n  const {} = {}({}, {});\n  return {};\n}}",
                    self.id(&format!("route{}", route.index)),
                    self.id("props"),
                    data_plane,
                    self.id("useDataPlane"),
                    load,
                    self.id("useRouteLoader"),
                    self.id(&format!("routeLoader{}", route.index)),
                    data_plane,
                    self.element(
                        &route_view,
                        Some(&format!("{{ ...{}, load: {} }}", self.id("props"), load))
                    )
                ));
            }
        }

        let mut index = 0;
        let tree = self.route_array(&self.descriptor.routes, &mut index, 0);
        out.push(format!("const {} = {};", self.id("routes"), tree));
        out
    }

    fn route_array(&self, nodes: &[RouteNode], index: &mut usize, depth: usize) -> String {
        if nodes.is_empty() {
            return "[]".to_string();
        }
        let indent = "  ".repeat(depth + 1);
        let mut entries = Vec::new();

        for node in nodes {
            let i = *index;
            *index += 1;

            let path = if node.meta_file_path.is_some() {
                format!(
                    "{}.path ?? {}",
                    self.id(&format!("routeMeta{}", i)),
                    js_string(&node.resolved_path)
                )
            } else {
                js_string(&node.resolved_path)
            };

            let mut fields = vec![format!("path: {}", path)];
            if node.view_file_path.is_some() {
                let component = if node.loader_file_path.is_some() {
                    self.id(&format!("route{}", i))
                } else {
                    self.id(&format!("routeView{}", i))
                };
                fields.push(format!("element: {}", self.element(&component, None)));
            }
            if !node.children.is_empty() {
                fields.push(format!("children: {}", self.route_array(&node.children, index, depth + 1)));
            }
            entries.push(format!("{}{{ {} }}", indent, fields.join(", ")));
        }

        format!("[\n{},\n{}]", entries.join(",\n"), "  ".repeat(depth))
    }

    fn themed_declaration(&self, target: &str) -> String {
        let skins = self
            .descriptor
            .skins
            .keys()
            .enumerate()
            .map(|(i, name)| format!("{}: {}", js_string(name), self.id(&format!("skin{}", i))))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "const {} = {}({}, {{ {} }});",
            self.id("themed"),
            self.id("skinned"),
            target,
            skins
        )
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Functions
    // ───────────────────────────────────────────────────────────────────────────

    /// A function whose body runs every hook and renders the view, wrapped in
    /// `boundaries` (empty when the boundaries live in an outer function).
    fn hook_function(&self, name: &str, boundaries: Vec<Boundary>) -> String {
        let mut body = Vec::new();
        let mut view_props = Vec::new();

        if !self.async_exports.is_empty() {
            let data_plane = self.id("dataPlane");
            body.push(format!("  const {} = {}();", data_plane, self.id("useDataPlane")));
            for name in &self.async_exports {
                let binding = self.id(&format!("binding_{}", name));
                body.push(format!(
                    "  const {} = {}({}, {});",
                    binding,
                    self.id("useAsyncHandler"),
                    name,
                    data_plane
                ));
                view_props.push(format!("{}: {}", name, binding));
            }
        }

        if self.descriptor.has(ConcernKind::I18n) {
            let messages = self.id("messages");
            body.push(format!(
                "  const {} = {}({}, {}, {});",
                messages,
                self.id("useI18n"),
                self.id("i18nDefaults"),
                js_string(&self.descriptor.name),
                self.id("translations")
            ));
            view_props.push(format!("i18n: {}", messages));
        }

        if !self.routes.is_empty() {
            let routed = self.id("routed");
            body.push(format!(
                "  const {} = {}({});",
                routed,
                self.id("useRoutes"),
                self.id("routes")
            ));
            view_props.push(format!("routes: {}", routed));
        }

        let props = if view_props.is_empty() {
            self.id("props")
        } else {
            format!("{{ ...{}, {} }}", self.id("props"), view_props.join(", "))
        };
        let view = self.element(&self.id("view"), Some(&props));
        body.push(format!("  return {};", self.compose(&boundaries, view, 1)));

        format!("function {}({}) {{\n{}\n}}", name, self.id("props"), body.join("\n"))
    }

    fn element(&self, component: &str, props: Option<&str>) -> String {
        match props {
            Some(props) => format!("{}({}, {})", self.id("createElement"), component, props),
            None => format!("{}({})", self.id("createElement"), component),
        }
    }

    /// Nest `innermost` inside `layers`, outermost first.
    fn compose(&self, layers: &[Boundary], innermost: String, indent: usize) -> String {
        let create = self.id("createElement");
        let mut out = String::new();

        for (depth, layer) in layers.iter().enumerate() {
            if depth > 0 {
                out.push('\n');
                out.push_str(&"  ".repeat(indent + depth));
            }
            let (component, props) = match layer {
                Boundary::Error => (
                    self.id("errorBoundary"),
                    format!("{{ fallback: {} }}", self.id("errorFallback")),
                ),
                Boundary::Suspense => {
                    let fallback = if self.descriptor.has(ConcernKind::Placeholder) {
                        self.element(&self.id("placeholder"), None)
                    } else {
                        "null".to_string()
                    };
                    (self.id("suspense"), format!("{{ fallback: {} }}", fallback))
                }
            };
            out.push_str(&format!("{}({}, {},", create, component, props));
        }

        if !layers.is_empty() {
            out.push('\n');
            out.push_str(&"  ".repeat(indent + layers.len()));
        }
        out.push_str(&innermost);
        out.push_str(&")".repeat(layers.len()));
        out
    }
}

fn flatten_routes<'a>(nodes: &'a [RouteNode], out: &mut Vec<IndexedRoute<'a>>) {
    for node in nodes {
        let loader_export = node
            .loader_file_path
            .as_deref()
            .and_then(|path| export_names(path).into_iter().next());
        out.push(IndexedRoute {
            index: out.len(),
            node,
            loader_export,
        });
        flatten_routes(&node.children, out);
    }
}

/// Local alias suffix for an imported framework symbol; always lowercase-first.
fn alias_suffix(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Words that cannot name an imported binding in a module.
const RESERVED_WORDS: [&str; 48] = [
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield", "arguments",
    "eval",
];

fn is_identifier(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED_WORDS.contains(&name)
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
