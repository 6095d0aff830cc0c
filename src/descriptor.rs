//! Descriptor Model
//!
//! The structured result of discovery: one `ComponentDescriptor` per managed
//! component directory, with its resolved concern files, skins and route tree.
//! Everything the synthesizer needs is in here; it never walks the tree itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════════════════════
// CONCERNS
// ═══════════════════════════════════════════════════════════════════════════════

/// A cross-cutting behavior supplied by a sibling file of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcernKind {
    Async,
    Placeholder,
    Error,
    I18n,
}

impl ConcernKind {
    pub const ALL: [ConcernKind; 4] = [
        ConcernKind::Async,
        ConcernKind::Placeholder,
        ConcernKind::Error,
        ConcernKind::I18n,
    ];

    /// Base name of the concern file (`async.ts`) or directory (`async/index.ts`).
    pub fn file_stem(self) -> &'static str {
        match self {
            ConcernKind::Async => "async",
            ConcernKind::Placeholder => "placeholder",
            ConcernKind::Error => "error",
            ConcernKind::I18n => "i18n",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    /// Directory name with the brackets stripped (`@id` for `[@id]`).
    pub segment: String,
    pub resolved_path: String,
    pub directory: PathBuf,
    pub view_file_path: Option<PathBuf>,
    /// Sibling `async` file used as this route's data loader factory.
    pub loader_file_path: Option<PathBuf>,
    /// Sibling `meta` file whose `path` may override `resolved_path`.
    pub meta_file_path: Option<PathBuf>,
    #[serde(default)]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(segment: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        let segment = segment.into();
        Self {
            resolved_path: resolve_route_path(&segment),
            segment,
            directory: directory.into(),
            view_file_path: None,
            loader_file_path: None,
            meta_file_path: None,
            children: Vec::new(),
        }
    }

    /// Height of the subtree rooted here (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(RouteNode::depth).max().unwrap_or(0)
    }

    /// True if this node or any descendant declares a loader.
    pub fn has_loader(&self) -> bool {
        self.loader_file_path.is_some() || self.children.iter().any(RouteNode::has_loader)
    }
}

pub const WILDCARD_SEGMENT: &str = "...";
pub const PARAM_SIGIL: char = '@';
pub const OPTIONAL_SUFFIX: char = '?';

/// Map a raw route segment to its router path.
///
/// `...` is the catch-all (`*`), `@name` a named parameter (`:name`) and
/// `@name?` an optional one (`:name?`). Anything else passes through verbatim.
pub fn resolve_route_path(segment: &str) -> String {
    if segment == WILDCARD_SEGMENT {
        return "*".to_string();
    }

    if let Some(param) = segment.strip_prefix(PARAM_SIGIL) {
        let (name, optional) = match param.strip_suffix(OPTIONAL_SUFFIX) {
            Some(name) => (name, true),
            None => (param, false),
        };
        if name.is_empty() {
            return segment.to_string();
        }
        return if optional {
            format!(":{}?", name)
        } else {
            format!(":{}", name)
        };
    }

    segment.to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT DESCRIPTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    /// Slash-joined path relative to the components root.
    pub name: String,
    pub directory: PathBuf,
    pub view_file_path: PathBuf,
    #[serde(default)]
    pub concerns: BTreeMap<ConcernKind, PathBuf>,
    #[serde(default)]
    pub skins: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub routes: Vec<RouteNode>,
}

impl ComponentDescriptor {
    /// A view-only descriptor; callers add concerns, skins and routes.
    pub fn new(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        view_file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            view_file_path: view_file_path.into(),
            concerns: BTreeMap::new(),
            skins: BTreeMap::new(),
            routes: Vec::new(),
        }
    }

    pub fn concern(&self, kind: ConcernKind) -> Option<&Path> {
        self.concerns.get(&kind).map(PathBuf::as_path)
    }

    pub fn has(&self, kind: ConcernKind) -> bool {
        self.concerns.contains_key(&kind)
    }

    /// Registration rule: a view plus at least one concern, skin or route.
    pub fn is_managed(&self) -> bool {
        !self.concerns.is_empty() || !self.skins.is_empty() || !self.routes.is_empty()
    }

    pub fn has_route_loaders(&self) -> bool {
        self.routes.iter().any(RouteNode::has_loader)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }
}

/// PascalCase name derived from a component path: `widgets/user-list` becomes
/// `WidgetsUserList`.
///
/// Path separators, hyphens and underscores split segments; any other
/// character that cannot appear in an identifier splits as well so the result
/// is always usable as an identifier suffix.
pub fn display_name(name: &str) -> String {
    let joined: String = name
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '$'))
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if joined.is_empty() {
        "Component".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_path_wildcard() {
        assert_eq!(resolve_route_path("..."), "*");
    }

    #[test]
    fn test_route_path_params() {
        assert_eq!(resolve_route_path("@id"), ":id");
        assert_eq!(resolve_route_path("@id?"), ":id?");
        assert_eq!(resolve_route_path("posts"), "posts");
        assert_eq!(resolve_route_path("@"), "@");
    }

    #[test]
    fn test_display_name_segments() {
        assert_eq!(display_name("user-list"), "UserList");
        assert_eq!(display_name("widgets/button"), "WidgetsButton");
        assert_eq!(display_name("app_shell/nav-bar"), "AppShellNavBar");
        assert_eq!(display_name("my.widget"), "MyWidget");
        assert_eq!(display_name(""), "Component");
    }

    #[test]
    fn test_registration_rule() {
        let mut d = ComponentDescriptor::new("card", "/c/card", "/c/card/index.tsx");
        assert!(!d.is_managed());
        d.skins.insert("material".into(), "/c/card/skins/material.ts".into());
        assert!(d.is_managed());
    }

    #[test]
    fn test_route_depth_and_loader() {
        let mut posts = RouteNode::new("posts", "/r/[posts]");
        let mut id = RouteNode::new("@id", "/r/[posts]/[@id]");
        id.loader_file_path = Some("/r/[posts]/[@id]/async.ts".into());
        posts.children.push(id);
        assert_eq!(posts.depth(), 2);
        assert!(posts.has_loader());
        assert_eq!(posts.children[0].resolved_path, ":id");
    }

    #[test]
    fn test_descriptor_json_shape() {
        let mut d = ComponentDescriptor::new("card", "/c/card", "/c/card/index.tsx");
        d.concerns.insert(ConcernKind::I18n, "/c/card/i18n.ts".into());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["viewFilePath"], "/c/card/index.tsx");
        assert_eq!(json["concerns"]["i18n"], "/c/card/i18n.ts");
        let back: ComponentDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
