//! Discovery Module for the Weave compiler
//!
//! Recursively scans a components root and turns the directory layout into
//! `ComponentDescriptor`s by naming convention. This is a best-effort pass:
//! a missing root or an unreadable entry shrinks the result, it never fails.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::descriptor::{ComponentDescriptor, ConcernKind, RouteNode};

// ═══════════════════════════════════════════════════════════════════════════════
// NAMING CONVENTIONS
// ═══════════════════════════════════════════════════════════════════════════════

pub const VIEW_EXTENSIONS: [&str; 2] = [".tsx", ".jsx"];
pub const ENTRY_EXTENSIONS: [&str; 4] = [".ts", ".tsx", ".js", ".jsx"];

pub const SKINS_DIR: &str = "skins";
pub const ROUTES_DIR: &str = "[routes]";

const INDEX_STEM: &str = "index";
const LOADER_STEM: &str = "async";
const META_STEM: &str = "meta";

/// `[posts]` style names belong to a routes subtree.
pub fn is_bracketed(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('[') && name.ends_with(']')
}

fn is_bracketed_entry(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_str().is_some_and(is_bracketed)
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Discover all managed components under `components_root`, in file-name order.
pub fn scan(components_root: &Path) -> Vec<ComponentDescriptor> {
    if !components_root.is_dir() {
        debug!(root = %components_root.display(), "components root missing, nothing to scan");
        return Vec::new();
    }

    let mut components = Vec::new();

    // Route subtrees are pruned here; they are picked up by their owning component.
    let walker = WalkDir::new(components_root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_bracketed_entry(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                trace!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        if let Some(descriptor) = describe_directory(components_root, entry.path()) {
            debug!(
                name = %descriptor.name,
                concerns = descriptor.concerns.len(),
                skins = descriptor.skins.len(),
                routes = descriptor.routes.len(),
                "registered component"
            );
            components.push(descriptor);
        }
    }

    components
}

/// Build the descriptor for one directory, or `None` if it is plain.
pub fn describe_directory(components_root: &Path, dir: &Path) -> Option<ComponentDescriptor> {
    let view_file_path = find_file(dir, INDEX_STEM, &VIEW_EXTENSIONS)?;

    let mut descriptor = ComponentDescriptor::new(component_name(components_root, dir), dir, view_file_path);

    for kind in ConcernKind::ALL {
        if let Some(path) = find_concern(dir, kind) {
            descriptor.concerns.insert(kind, path);
        }
    }
    descriptor.skins = scan_skins(&dir.join(SKINS_DIR));
    descriptor.routes = scan_routes(&dir.join(ROUTES_DIR));

    descriptor.is_managed().then_some(descriptor)
}

fn component_name(components_root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(components_root).unwrap_or(dir);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// First `<stem><ext>` that exists as a file, in extension priority order.
pub fn find_file(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{}{}", stem, ext)))
        .find(|path| path.is_file())
}

/// Resolve a concern as a sibling file, falling back to `<kind>/index.<ext>`.
pub fn find_concern(dir: &Path, kind: ConcernKind) -> Option<PathBuf> {
    let stem = kind.file_stem();
    find_file(dir, stem, &ENTRY_EXTENSIONS).or_else(|| {
        let sub_dir = dir.join(stem);
        if sub_dir.is_dir() {
            find_file(&sub_dir, INDEX_STEM, &ENTRY_EXTENSIONS)
        } else {
            None
        }
    })
}

fn children_of(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
}

fn entry_stem(file_name: &str) -> Option<&str> {
    ENTRY_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SKINS
// ═══════════════════════════════════════════════════════════════════════════════

/// Every non-index source file in `skins/`, keyed by its stem.
fn scan_skins(skins_dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut skins = BTreeMap::new();
    if !skins_dir.is_dir() {
        return skins;
    }

    let stems: BTreeSet<String> = children_of(skins_dir)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            entry_stem(name).map(str::to_string)
        })
        .filter(|stem| stem != INDEX_STEM)
        .collect();

    // A stem present under several extensions resolves by extension priority.
    for stem in stems {
        if let Some(path) = find_file(skins_dir, &stem, &ENTRY_EXTENSIONS) {
            skins.insert(stem, path);
        }
    }

    skins
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTES
// ═══════════════════════════════════════════════════════════════════════════════

/// Route tree under a component's `[routes]` directory.
pub fn scan_routes(routes_root: &Path) -> Vec<RouteNode> {
    if !routes_root.is_dir() {
        return Vec::new();
    }
    route_children(routes_root)
}

fn route_children(dir: &Path) -> Vec<RouteNode> {
    children_of(dir)
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            if !is_bracketed(name) {
                return None;
            }
            let segment = &name[1..name.len() - 1];
            Some(build_route_node(segment, entry.path()))
        })
        .collect()
}

fn build_route_node(segment: &str, dir: &Path) -> RouteNode {
    let mut node = RouteNode::new(segment, dir);
    node.view_file_path = find_file(dir, INDEX_STEM, &VIEW_EXTENSIONS);
    node.loader_file_path = find_file(dir, LOADER_STEM, &ENTRY_EXTENSIONS);
    node.meta_file_path = find_file(dir, META_STEM, &ENTRY_EXTENSIONS);
    node.children = route_children(dir);
    trace!(segment, path = %node.resolved_path, "resolved route");
    node
}
