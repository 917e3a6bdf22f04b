//! Manifest parser (C3): read a project's `package.json`, extract its
//! declared name and the set of dependency target package names across
//! every supported specifier dialect. See spec §4.3.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Parsed result of reading one project's manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestInfo {
    /// The manifest's declared `name`, if any.
    pub package_name: Option<String>,
    /// Every dependency target package name discovered, merged across
    /// `dependencies`/`devDependencies`/`peerDependencies`/
    /// `optionalDependencies`/`bundleDependencies` and every alias dialect.
    pub dependency_package_names: BTreeSet<String>,
}

/// A parsed dependency specifier, per the sum-type recommendation in
/// spec §9 ("Path dialect parsing").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySpecifier {
    /// An ordinary (non-local) version range, e.g. `^1.0.0`.
    Registry,
    /// `npm:<name>[@suffix]` — an npm-registry alias naming a package.
    NpmAlias(String),
    /// `workspace:<path>` where `<path>` is relative or absolute.
    WorkspacePath(String),
    /// `file:<path>` (including the `workspace:file:<path>` form).
    FilePath(String),
    /// `link:<path>` (including the `workspace:link:<path>` form).
    LinkPath(String),
    /// `portal:<path>` (including the `workspace:portal:<path>` form).
    PortalPath(String),
    /// `workspace:<name>[@suffix]` where `<name>` looks like a package name.
    WorkspaceAliasPackage(String),
    /// Anything else: wildcard-only bodies, empty bodies, or unrecognized
    /// shapes. Contributes nothing beyond the dependency object's key.
    Unknown,
}

const DEPENDENCY_FIELDS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

const BUNDLE_FIELDS: [&str; 2] = ["bundleDependencies", "bundledDependencies"];

/// Caches path → resolved package name lookups so that `file:`/`link:`/
/// `portal:`/`workspace:<path>` targets are only read once, per spec
/// §4.3 ("A small cache from absolute path to resolved package name
/// prevents repeated manifest reads").
#[derive(Debug, Default)]
pub struct ManifestNameCache {
    resolved: HashMap<PathBuf, Option<String>>,
}

impl ManifestNameCache {
    /// Builds an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&mut self, manifest_path: &Path) -> Option<String> {
        if let Some(cached) = self.resolved.get(manifest_path) {
            return cached.clone();
        }
        let name = wiggum_standard_tools::path::read_json(manifest_path)
            .ok()
            .and_then(|value| package_name_field(&value));
        self.resolved.insert(manifest_path.to_path_buf(), name.clone());
        name
    }
}

fn package_name_field(value: &Value) -> Option<String> {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|name| !name.is_empty())
}

/// Cuts a specifier at its first `?` or `#`, per the closed list of
/// query/hash suffix cutoffs in spec §9.
fn strip_query_hash(raw: &str) -> &str {
    let cut = raw
        .find(['?', '#'])
        .unwrap_or(raw.len());
    &raw[..cut]
}

/// Strips a trailing `@<version>` from an (optionally scoped) package
/// name, e.g. `@s/shared@1.2.3` → `@s/shared`, `left-pad@^2` → `left-pad`.
fn strip_trailing_version(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix('@') {
        match rest.find('@') {
            Some(idx) => &name[..idx + 1],
            None => name,
        }
    } else {
        match name.find('@') {
            Some(idx) => &name[..idx],
            None => name,
        }
    }
}

fn is_wildcard_only(body: &str) -> bool {
    matches!(body, "*" | "^" | "~")
}

/// Parses a single dependency specifier value into its dialect.
#[must_use]
pub fn parse_specifier(raw: &str) -> DependencySpecifier {
    if let Some(body) = raw.strip_prefix("npm:") {
        let body = strip_query_hash(body);
        if body.is_empty() {
            return DependencySpecifier::Unknown;
        }
        let name = strip_trailing_version(body);
        return if name.is_empty() {
            DependencySpecifier::Unknown
        } else {
            DependencySpecifier::NpmAlias(name.to_string())
        };
    }

    if let Some(body) = raw.strip_prefix("workspace:") {
        if is_wildcard_only(body) {
            return DependencySpecifier::Unknown;
        }
        if let Some(path) = body.strip_prefix("file:") {
            return path_specifier(path, DependencySpecifier::FilePath);
        }
        if let Some(path) = body.strip_prefix("link:") {
            return path_specifier(path, DependencySpecifier::LinkPath);
        }
        if let Some(path) = body.strip_prefix("portal:") {
            return path_specifier(path, DependencySpecifier::PortalPath);
        }
        if body.starts_with("./") || body.starts_with("../") || body.starts_with('/') {
            return path_specifier(body, DependencySpecifier::WorkspacePath);
        }
        let body = strip_query_hash(body);
        if body.is_empty() {
            return DependencySpecifier::Unknown;
        }
        let name = strip_trailing_version(body);
        return if name.is_empty() {
            DependencySpecifier::Unknown
        } else {
            DependencySpecifier::WorkspaceAliasPackage(name.to_string())
        };
    }

    if let Some(path) = raw.strip_prefix("file:") {
        return path_specifier(path, DependencySpecifier::FilePath);
    }
    if let Some(path) = raw.strip_prefix("link:") {
        return path_specifier(path, DependencySpecifier::LinkPath);
    }
    if let Some(path) = raw.strip_prefix("portal:") {
        return path_specifier(path, DependencySpecifier::PortalPath);
    }

    DependencySpecifier::Registry
}

fn path_specifier(body: &str, variant: fn(String) -> DependencySpecifier) -> DependencySpecifier {
    let path = strip_query_hash(body);
    if path.is_empty() {
        DependencySpecifier::Unknown
    } else {
        variant(path.to_string())
    }
}

/// Resolves a path specifier's target directory or `package.json` file
/// (spec §4.3 dialect 6: "may point either to a directory … or directly
/// to the `package.json` file").
fn manifest_path_for(root: &Path, relative: &str) -> PathBuf {
    let joined = wiggum_standard_tools::path::normalize(Path::new(relative), root);
    if joined.file_name().is_some_and(|name| name == "package.json") {
        joined
    } else {
        joined.join("package.json")
    }
}

/// Reads `root/package.json`, returning the empty/default info on a
/// missing file or parse failure (non-fatal per spec §4.3).
pub fn read_package_info(root: &Path, cache: &mut ManifestNameCache) -> ManifestInfo {
    let manifest_path = root.join("package.json");
    let Ok(value) = wiggum_standard_tools::path::read_json(&manifest_path) else {
        return ManifestInfo::default();
    };

    let package_name = package_name_field(&value);
    let mut dependency_package_names = BTreeSet::new();

    for field in DEPENDENCY_FIELDS {
        let Some(entries) = value.get(field).and_then(Value::as_object) else {
            continue;
        };
        for (key, specifier_value) in entries {
            dependency_package_names.insert(key.clone());
            let Some(raw) = specifier_value.as_str() else {
                continue;
            };
            match parse_specifier(raw) {
                DependencySpecifier::NpmAlias(name)
                | DependencySpecifier::WorkspaceAliasPackage(name) => {
                    dependency_package_names.insert(name);
                }
                DependencySpecifier::FilePath(path)
                | DependencySpecifier::LinkPath(path)
                | DependencySpecifier::PortalPath(path)
                | DependencySpecifier::WorkspacePath(path) => {
                    let manifest_path = manifest_path_for(root, &path);
                    if let Some(name) = cache.resolve(&manifest_path) {
                        dependency_package_names.insert(name);
                    }
                }
                DependencySpecifier::Registry | DependencySpecifier::Unknown => {}
            }
        }
    }

    for field in BUNDLE_FIELDS {
        let Some(entries) = value.get(field).and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            if let Some(name) = entry.as_str() {
                dependency_package_names.insert(name.to_string());
            }
        }
    }

    ManifestInfo {
        package_name,
        dependency_package_names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("^1.2.3", DependencySpecifier::Registry)]
    #[case("npm:@s/shared@1.2.3", DependencySpecifier::NpmAlias("@s/shared".into()))]
    #[case("npm:left-pad@^2", DependencySpecifier::NpmAlias("left-pad".into()))]
    #[case("workspace:*", DependencySpecifier::Unknown)]
    #[case("workspace:^", DependencySpecifier::Unknown)]
    #[case("workspace:~", DependencySpecifier::Unknown)]
    #[case("workspace:@s/shared", DependencySpecifier::WorkspaceAliasPackage("@s/shared".into()))]
    #[case("workspace:@s/shared@^1", DependencySpecifier::WorkspaceAliasPackage("@s/shared".into()))]
    #[case("workspace:./packages/shared", DependencySpecifier::WorkspacePath("./packages/shared".into()))]
    #[case("workspace:../shared", DependencySpecifier::WorkspacePath("../shared".into()))]
    #[case("file:../shared", DependencySpecifier::FilePath("../shared".into()))]
    #[case("link:../shared", DependencySpecifier::LinkPath("../shared".into()))]
    #[case("portal:../shared", DependencySpecifier::PortalPath("../shared".into()))]
    #[case("workspace:file:../shared", DependencySpecifier::FilePath("../shared".into()))]
    #[case("workspace:link:../shared", DependencySpecifier::LinkPath("../shared".into()))]
    #[case("workspace:portal:../shared", DependencySpecifier::PortalPath("../shared".into()))]
    #[case("npm:@s/shared@workspace:*", DependencySpecifier::NpmAlias("@s/shared".into()))]
    fn parses_every_dialect(#[case] raw: &str, #[case] expected: DependencySpecifier) {
        assert_eq!(parse_specifier(raw), expected);
    }

    #[test]
    fn strips_query_and_hash_suffixes() {
        assert_eq!(
            parse_specifier("file:../shared?foo=bar"),
            DependencySpecifier::FilePath("../shared".into())
        );
        assert_eq!(
            parse_specifier("npm:left-pad@1.0.0#hash"),
            DependencySpecifier::NpmAlias("left-pad".into())
        );
    }

    #[test]
    fn missing_manifest_is_non_fatal() {
        let mut cache = ManifestNameCache::new();
        let info = read_package_info(Path::new("/does/not/exist"), &mut cache);
        assert!(info.package_name.is_none());
        assert!(info.dependency_package_names.is_empty());
    }

    #[test]
    fn collects_keys_and_alias_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("package.json"),
            r#"{
                "name": "@s/app",
                "dependencies": {
                    "@s/shared": "workspace:*",
                    "shared-alias": "npm:@s/shared@workspace:*",
                    "left-pad": "^1.0.0"
                },
                "bundleDependencies": ["vendored-thing"]
            }"#,
        )
        .expect("write manifest");

        let mut cache = ManifestNameCache::new();
        let info = read_package_info(dir.path(), &mut cache);
        assert_eq!(info.package_name.as_deref(), Some("@s/app"));
        assert!(info.dependency_package_names.contains("@s/shared"));
        assert!(info.dependency_package_names.contains("shared-alias"));
        assert!(info.dependency_package_names.contains("left-pad"));
        assert!(info.dependency_package_names.contains("vendored-thing"));
    }

    #[test]
    fn resolves_file_path_alias_target_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let shared = dir.path().join("shared");
        std::fs::create_dir_all(&shared).expect("mkdir shared");
        std::fs::write(shared.join("package.json"), r#"{"name": "@s/shared"}"#)
            .expect("write shared manifest");

        let app = dir.path().join("app");
        std::fs::create_dir_all(&app).expect("mkdir app");
        std::fs::write(
            app.join("package.json"),
            r#"{"name": "@s/app", "dependencies": {"@s/shared": "file:../shared"}}"#,
        )
        .expect("write app manifest");

        let mut cache = ManifestNameCache::new();
        let info = read_package_info(&app, &mut cache);
        assert!(info.dependency_package_names.contains("@s/shared"));
    }
}
