//! Discovery Tests
//!
//! Real directory trees built with tempfile; the scanner never sees a mock.

#[cfg(test)]
mod tests {
    use crate::descriptor::{resolve_route_path, ConcernKind};
    use crate::discovery::{find_concern, scan, scan_routes};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::fs;
    use std::path::Path;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export default null;\n").unwrap();
    }

    fn tree(files: &[&str]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for file in files {
            touch(tmp.path(), file);
        }
        tmp
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn test_registration_rule() {
        let tmp = tree(&[
            "plain/index.tsx",
            "button/index.tsx",
            "button/error.tsx",
            "helpers/async.ts",
            "jsx-only/index.jsx",
            "jsx-only/placeholder.jsx",
        ]);
        let names: Vec<_> = scan(tmp.path()).into_iter().map(|d| d.name).collect();
        // `plain` has no concern, `helpers` has no view.
        assert_eq!(names, vec!["button", "jsx-only"]);
    }

    #[test]
    fn test_nested_components_are_named_by_relative_path() {
        let tmp = tree(&[
            "widgets/index.tsx",
            "widgets/async.ts",
            "widgets/user-list/index.tsx",
            "widgets/user-list/i18n.ts",
        ]);
        let components = scan(tmp.path());
        let names: Vec<_> = components.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["widgets", "widgets/user-list"]);
        assert_eq!(components[1].display_name(), "WidgetsUserList");
        assert_eq!(
            components[1].concern(ConcernKind::I18n),
            Some(tmp.path().join("widgets/user-list/i18n.ts").as_path())
        );
    }

    #[test]
    fn test_view_and_concern_extension_priority() {
        let tmp = tree(&[
            "card/index.jsx",
            "card/index.tsx",
            "card/async.js",
            "card/async.ts",
        ]);
        let components = scan(tmp.path());
        assert_eq!(components[0].view_file_path, tmp.path().join("card/index.tsx"));
        assert_eq!(
            components[0].concern(ConcernKind::Async),
            Some(tmp.path().join("card/async.ts").as_path())
        );
    }

    #[test]
    fn test_concern_directory_fallback() {
        let tmp = tree(&["menu/index.tsx", "menu/placeholder/index.tsx", "menu/error.jsx"]);
        let dir = tmp.path().join("menu");
        assert_eq!(
            find_concern(&dir, ConcernKind::Placeholder),
            Some(dir.join("placeholder/index.tsx"))
        );
        assert_eq!(find_concern(&dir, ConcernKind::Error), Some(dir.join("error.jsx")));
        assert_eq!(find_concern(&dir, ConcernKind::I18n), None);
    }

    #[test]
    fn test_skins_keyed_by_stem() {
        let tmp = tree(&[
            "tile/index.tsx",
            "tile/skins/index.ts",
            "tile/skins/dark.tsx",
            "tile/skins/light.ts",
            "tile/skins/notes.md",
        ]);
        let components = scan(tmp.path());
        assert_eq!(components.len(), 1);
        let skins: Vec<_> = components[0].skins.keys().map(String::as_str).collect();
        assert_eq!(skins, vec!["dark", "light"]);
        assert_eq!(components[0].skins["light"], tmp.path().join("tile/skins/light.ts"));
    }

    #[test]
    fn test_route_directories_are_never_components() {
        let tmp = tree(&[
            "shop/index.tsx",
            "shop/[routes]/[cart]/index.tsx",
            "shop/[routes]/[cart]/error.tsx",
        ]);
        let components = scan(tmp.path());
        let names: Vec<_> = components.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["shop"]);
        assert_eq!(components[0].routes.len(), 1);
        assert_eq!(components[0].routes[0].resolved_path, "cart");
    }

    #[test]
    fn test_route_tree_shape() {
        let tmp = tree(&[
            "[posts]/index.tsx",
            "[posts]/[@id]/index.tsx",
            "[posts]/[@id]/async.ts",
            "[posts]/[@id]/meta.ts",
            "[posts]/[@page?]/index.tsx",
            "[...]/index.jsx",
            "not-a-route/index.tsx",
        ]);
        let routes = scan_routes(tmp.path());

        let top: Vec<_> = routes.iter().map(|r| r.resolved_path.as_str()).collect();
        assert_eq!(top, vec!["*", "posts"]);

        let posts = &routes[1];
        let children: Vec<_> = posts.children.iter().map(|r| r.resolved_path.as_str()).collect();
        assert_eq!(children, vec![":id", ":page?"]);
        assert_eq!(posts.depth(), 2);
        assert!(posts.has_loader());

        let id = &posts.children[0];
        assert_eq!(id.segment, "@id");
        assert!(id.view_file_path.is_some());
        assert_eq!(id.loader_file_path, Some(tmp.path().join("[posts]/[@id]/async.ts")));
        assert_eq!(id.meta_file_path, Some(tmp.path().join("[posts]/[@id]/meta.ts")));
        assert!(!posts.children[1].has_loader());
    }

    #[test]
    fn test_routes_only_component_is_managed() {
        let tmp = tree(&["app/index.tsx", "app/[routes]/[home]/index.tsx"]);
        let components = scan(tmp.path());
        assert_eq!(components.len(), 1);
        assert!(components[0].concerns.is_empty());
        assert!(!components[0].has_route_loaders());
    }

    #[test]
    fn test_descriptor_json_is_camel_case() {
        let tmp = tree(&["chip/index.tsx", "chip/async.ts"]);
        let components = scan(tmp.path());
        let json = serde_json::to_value(&components[0]).unwrap();
        assert!(json.get("viewFilePath").is_some());
        assert!(json["concerns"].get("async").is_some());
    }

    proptest! {
        #[test]
        fn prop_param_segments_resolve(name in "[a-z][a-zA-Z0-9]{0,8}", optional in any::<bool>()) {
            let segment = if optional { format!("@{}?", name) } else { format!("@{}", name) };
            let expected = if optional { format!(":{}?", name) } else { format!(":{}", name) };
            prop_assert_eq!(resolve_route_path(&segment), expected);
        }

        #[test]
        fn prop_literal_segments_pass_through(segment in "[a-z0-9-]{1,12}") {
            prop_assert_eq!(resolve_route_path(&segment), segment);
        }
    }
}
