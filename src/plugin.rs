//! Bundler plugin surface.
//!
//! Imports that resolve to a managed component directory are redirected to a
//! virtual module whose source is the synthesized wrapper. Everything else is
//! left to the bundler.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

use crate::codegen::synthesize_with_options;
use crate::descriptor::ComponentDescriptor;
use crate::discovery::scan;
use crate::hygiene::HygienePrefix;
use crate::options::SynthesisOptions;

/// Marks ids owned by this plugin; the NUL keeps other plugins away from them.
pub const VIRTUAL_PREFIX: &str = "\0weave:component:";

pub struct ComponentRegistry {
    project_root: PathBuf,
    options: SynthesisOptions,
    components: HashMap<PathBuf, ComponentDescriptor>,
}

impl ComponentRegistry {
    /// Scan `components_root` once and index the result by directory.
    pub fn new(components_root: &Path, project_root: &Path, options: SynthesisOptions) -> Self {
        Self::from_descriptors(scan(components_root), project_root, options)
    }

    pub fn from_descriptors(
        descriptors: Vec<ComponentDescriptor>,
        project_root: &Path,
        options: SynthesisOptions,
    ) -> Self {
        let components: HashMap<_, _> = descriptors
            .into_iter()
            .map(|d| (normalize(&d.directory), d))
            .collect();
        debug!(count = components.len(), "component registry built");
        Self {
            project_root: project_root.to_path_buf(),
            options,
            components,
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, directory: &Path) -> Option<&ComponentDescriptor> {
        self.components.get(&normalize(directory))
    }

    /// Virtual id for an import of a component directory.
    ///
    /// Only relative (`./`, `../`) and absolute specifiers are considered, and
    /// only when the importer is known.
    pub fn resolve_id(&self, source: &str, importer: Option<&Path>) -> Option<String> {
        let importer = importer?;
        if !(source.starts_with('.') || source.starts_with('/')) {
            return None;
        }

        let base = importer.parent().unwrap_or(Path::new(""));
        let resolved = normalize(&base.join(source));
        if !self.components.contains_key(&resolved) {
            return None;
        }

        trace!(source, resolved = %resolved.display(), "redirected component import");
        Some(format!("{}{}", VIRTUAL_PREFIX, resolved.to_string_lossy()))
    }

    /// Wrapper source for a virtual id, under a freshly generated prefix.
    pub fn load(&self, id: &str) -> Option<String> {
        let directory = id.strip_prefix(VIRTUAL_PREFIX)?;
        let descriptor = self.components.get(Path::new(directory))?;
        let prefix = HygienePrefix::generate();
        Some(synthesize_with_options(descriptor, &prefix, &self.project_root, &self.options))
    }
}

/// Lexical `.`/`..` resolution; the filesystem is not consulted.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let button = tmp.path().join("src/components/button");
        fs::create_dir_all(&button).unwrap();
        fs::write(button.join("index.tsx"), "export default () => null;").unwrap();
        fs::write(button.join("placeholder.tsx"), "export default () => null;").unwrap();

        let plain = tmp.path().join("src/components/plain");
        fs::create_dir_all(&plain).unwrap();
        fs::write(plain.join("index.tsx"), "export default () => null;").unwrap();

        let root = tmp.path().to_path_buf();
        (tmp, root)
    }

    #[test]
    fn test_resolves_relative_component_import() {
        let (_tmp, root) = project();
        let registry =
            ComponentRegistry::new(&root.join("src/components"), &root, SynthesisOptions::default());
        assert_eq!(registry.len(), 1);

        let importer = root.join("src/pages/home.tsx");
        let id = registry
            .resolve_id("../components/button", Some(&importer))
            .unwrap();
        assert!(id.starts_with(VIRTUAL_PREFIX));
        assert!(id.ends_with("button"));

        let module = registry.load(&id).unwrap();
        assert!(module.contains("\"/src/components/button/index.tsx\""));
        assert!(module.contains("export default"));
    }

    #[test]
    fn test_ignores_bare_plain_and_orphan_imports() {
        let (_tmp, root) = project();
        let registry =
            ComponentRegistry::new(&root.join("src/components"), &root, SynthesisOptions::default());
        let importer = root.join("src/main.tsx");

        assert_eq!(registry.resolve_id("react", Some(&importer)), None);
        assert_eq!(registry.resolve_id("./components/plain", Some(&importer)), None);
        assert_eq!(registry.resolve_id("./components/button", None), None);
        assert!(registry
            .resolve_id("./components/button", Some(&importer))
            .is_some());
    }

    #[test]
    fn test_absolute_specifier() {
        let (_tmp, root) = project();
        let registry =
            ComponentRegistry::new(&root.join("src/components"), &root, SynthesisOptions::default());
        let absolute = root.join("src/components/button");
        let id = registry.resolve_id(&absolute.to_string_lossy(), Some(&root.join("x.ts")));
        assert!(id.is_some());
    }

    #[test]
    fn test_load_rejects_foreign_ids() {
        let registry = ComponentRegistry::from_descriptors(Vec::new(), Path::new("/p"), SynthesisOptions::default());
        assert!(registry.is_empty());
        assert_eq!(registry.load("/p/src/components/button"), None);
        assert_eq!(registry.load(&format!("{}/p/missing", VIRTUAL_PREFIX)), None);
    }

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(normalize(Path::new("/a/b/./c/../d")), PathBuf::from("/a/b/d"));
    }
}
