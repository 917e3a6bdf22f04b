//! Config loader (C2): locate and load the runner configuration file,
//! then walk its nested project-entry tree into a flat, de-duplicated set
//! of projects. See spec §4.2.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, RunnerError};
use crate::manifest::{self, ManifestNameCache};
use crate::project::{self, MutableProject, Project};
use wiggum_standard_tools::path::{
    exists, expand_glob, is_dynamic_pattern, normalize, read_json, substitute_root_dir,
};

/// Recognized runner config file names, in precedence order.
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "wiggum.config.mjs",
    "wiggum.config.js",
    "wiggum.config.cjs",
    "wiggum.config.json",
];

/// Config file names with a source-language type suffix — explicitly
/// unsupported, but recognized so the diagnostic can name them.
const UNSUPPORTED_CONFIG_NAMES: [&str; 3] = [
    "wiggum.config.ts",
    "wiggum.config.mts",
    "wiggum.config.cts",
];

fn tool_config_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^(rslib|rsbuild|rspack|rspress|rstest|rslint)\.config\.(mjs|js|cjs|mts|cts|ts)$")
            .unwrap()
    })
}

/// A config file format the loader knows how to evaluate into a
/// `serde_json::Value` (SPEC_FULL §12). JSON is the one variant every
/// build supports; `ScriptConfigSource` is the seam a future `.mjs`/
/// `.js`/`.cjs` evaluator plugs into as a second implementation, without
/// touching the dispatch in [`config_source_for`].
trait ConfigSource {
    fn load(&self, path: &Path) -> Result<Value>;
}

/// The baseline, always-available variant: reads the file as JSON.
struct JsonConfigSource;

impl ConfigSource for JsonConfigSource {
    fn load(&self, path: &Path) -> Result<Value> {
        Ok(read_json(path)?)
    }
}

/// Evaluates `.mjs`/`.js`/`.cjs` runner configs. Gated behind the
/// `script-config` feature; no JavaScript engine is embedded today, so
/// this still reports the variant as unsupported rather than silently
/// treating the file as JSON.
#[cfg(feature = "script-config")]
struct ScriptConfigSource;

#[cfg(feature = "script-config")]
impl ConfigSource for ScriptConfigSource {
    fn load(&self, path: &Path) -> Result<Value> {
        Err(RunnerError::UnsupportedConfigVariant {
            path: path.to_path_buf(),
        })
    }
}

/// Picks the [`ConfigSource`] for `path` by file name, or fails with
/// [`RunnerError::UnsupportedConfigVariant`] for `.ts`/`.mts`/`.cts`
/// names, or for `.mjs`/`.js`/`.cjs` names when `script-config` is off.
fn config_source_for(path: &Path) -> Result<Box<dyn ConfigSource>> {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let name = name.as_deref().unwrap_or("");
    if UNSUPPORTED_CONFIG_NAMES.iter().any(|n| *n == name)
        || name.ends_with(".ts")
        || name.ends_with(".mts")
        || name.ends_with(".cts")
    {
        return Err(RunnerError::UnsupportedConfigVariant {
            path: path.to_path_buf(),
        });
    }
    if name.ends_with(".json") {
        return Ok(Box::new(JsonConfigSource));
    }
    if name.ends_with(".mjs") || name.ends_with(".js") || name.ends_with(".cjs") {
        #[cfg(feature = "script-config")]
        {
            return Ok(Box::new(ScriptConfigSource));
        }
        #[cfg(not(feature = "script-config"))]
        {
            return Err(RunnerError::UnsupportedConfigVariant {
                path: path.to_path_buf(),
            });
        }
    }
    Err(RunnerError::UnsupportedConfigVariant {
        path: path.to_path_buf(),
    })
}

/// Loads a config value from disk without evaluating it as a domain type
/// yet, via whichever [`ConfigSource`] `path`'s name selects.
fn load_value(path: &Path) -> Result<Value> {
    config_source_for(path)?.load(path)
}

fn is_recognized_config_name(name: &str) -> bool {
    CONFIG_FILE_NAMES.iter().any(|n| *n == name)
}

fn is_unsupported_config_name(name: &str) -> bool {
    UNSUPPORTED_CONFIG_NAMES.iter().any(|n| *n == name)
        || name.ends_with(".ts")
        || name.ends_with(".mts")
        || name.ends_with(".cts")
}

fn find_recognized_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.exists())
}

/// The top-level runner configuration (spec §4.2's `RootConfig`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootConfig {
    /// Workspace root override, relative to the config file's directory.
    pub root: Option<String>,
    /// Glob-ignore patterns applied while expanding project entries.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Scope-wide defaults inherited by every nested entry.
    #[serde(default)]
    pub defaults: Defaults,
    /// The project entry tree. Absent ⇒ the config root is itself the
    /// sole implicit project.
    pub projects: Option<Vec<ConfigEntry>>,
}

/// Defaults inherited down the config tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    /// Extra command arguments applied to every project under this scope.
    #[serde(default)]
    pub args: Vec<String>,
}

/// One entry in a `projects` array: a bare glob/path string, or an object
/// with explicit overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConfigEntry {
    /// A glob pattern or literal path, relative to the enclosing scope.
    Path(String),
    /// An object entry with explicit name/root/config/args/ignore/nested
    /// projects.
    Object(ConfigEntryObject),
}

/// The object form of a [`ConfigEntry`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntryObject {
    /// Explicit project name, overriding the manifest name and directory
    /// basename.
    pub name: Option<String>,
    /// Scope root for this entry, relative to the parent scope.
    pub root: Option<String>,
    /// A tool-specific config file, or a nested runner config, pointer.
    pub config: Option<String>,
    /// Extra args for every project under this entry.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra glob-ignore patterns for this entry.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Nested project entries.
    pub projects: Option<Vec<ConfigEntry>>,
}

#[derive(Debug, Default)]
struct CollectContext {
    by_root: BTreeMap<PathBuf, MutableProject>,
    by_name: HashMap<String, PathBuf>,
    visited_configs: HashSet<PathBuf>,
}

fn merge_preserving_order(inherited: &[String], extra: &[String]) -> Vec<String> {
    let mut merged = inherited.to_vec();
    for arg in extra {
        if !merged.contains(arg) {
            merged.push(arg.clone());
        }
    }
    merged
}

fn add_project(
    ctx: &mut CollectContext,
    root: &Path,
    explicit_name: Option<String>,
    config_file: Option<PathBuf>,
    args: &[String],
    cache: &mut ManifestNameCache,
) -> Result<()> {
    let normalized_root = normalize(root, root);
    let manifest_info = manifest::read_package_info(&normalized_root, cache);

    if let Some(existing) = ctx.by_root.get_mut(&normalized_root) {
        existing.merge_args(args);
        if existing.config_file.is_none() {
            existing.config_file = config_file;
        }
        return Ok(());
    }

    let name = explicit_name
        .or_else(|| manifest_info.package_name.clone())
        .unwrap_or_else(|| {
            normalized_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    if let Some(existing_root) = ctx.by_name.get(&name) {
        if existing_root != &normalized_root {
            return Err(RunnerError::DuplicateProjectName {
                name,
                existing_root: existing_root.clone(),
                new_root: normalized_root,
            });
        }
    }

    ctx.by_name.insert(name.clone(), normalized_root.clone());
    ctx.by_root.insert(
        normalized_root.clone(),
        MutableProject {
            name,
            root: normalized_root,
            config_file,
            args: args.to_vec(),
            package_name: manifest_info.package_name,
            dependency_package_names: manifest_info.dependency_package_names,
        },
    );
    Ok(())
}

fn dispatch_path_kind(
    ctx: &mut CollectContext,
    path: &Path,
    scope_root: &Path,
    args: &[String],
    ignore: &[String],
    cache: &mut ManifestNameCache,
) -> Result<()> {
    if path.is_dir() {
        if let Some(config_file) = find_recognized_config_in_dir(path) {
            return descend_into_config(ctx, &config_file, args, ignore, cache);
        }
        return add_project(ctx, path, None, None, args, cache);
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if is_recognized_config_name(&file_name) {
        return descend_into_config(ctx, path, args, ignore, cache);
    }
    if is_unsupported_config_name(&file_name) {
        return Err(RunnerError::UnsupportedConfigVariant {
            path: path.to_path_buf(),
        });
    }
    if file_name == "package.json" {
        let dir = path.parent().unwrap_or(path);
        return add_project(ctx, dir, None, None, args, cache);
    }
    if tool_config_regex().is_match(&file_name) {
        let dir = path.parent().unwrap_or(path);
        return add_project(ctx, dir, None, Some(path.to_path_buf()), args, cache);
    }

    Err(RunnerError::UnsupportedProjectFile {
        path: path.to_path_buf(),
        scope_root: scope_root.to_path_buf(),
    })
}

fn descend_into_config(
    ctx: &mut CollectContext,
    config_path: &Path,
    inherited_args: &[String],
    inherited_ignore: &[String],
    cache: &mut ManifestNameCache,
) -> Result<()> {
    let normalized_config_path = normalize(config_path, config_path);
    if ctx.visited_configs.contains(&normalized_config_path) {
        return Ok(());
    }
    ctx.visited_configs.insert(normalized_config_path.clone());

    let value = load_value(&normalized_config_path)?;
    let config: RootConfig = serde_json::from_value(value).map_err(|error| {
        RunnerError::InvalidConfig {
            path: normalized_config_path.clone(),
            reason: error.to_string(),
        }
    })?;

    let config_dir = normalized_config_path
        .parent()
        .unwrap_or(&normalized_config_path)
        .to_path_buf();
    let new_scope_root = match &config.root {
        Some(root) => normalize(
            Path::new(&substitute_root_dir(root, &config_dir)),
            &config_dir,
        ),
        None => config_dir,
    };

    let merged_args = merge_preserving_order(inherited_args, &config.defaults.args);
    let merged_ignore = [inherited_ignore, &config.ignore].concat();

    match &config.projects {
        Some(entries) => collect_entries(
            ctx,
            entries,
            &new_scope_root,
            &merged_args,
            &merged_ignore,
            cache,
        ),
        None => add_project(ctx, &new_scope_root, None, None, &merged_args, cache),
    }
}

fn collect_entries(
    ctx: &mut CollectContext,
    entries: &[ConfigEntry],
    scope_root: &Path,
    inherited_args: &[String],
    inherited_ignore: &[String],
    cache: &mut ManifestNameCache,
) -> Result<()> {
    for entry in entries {
        match entry {
            ConfigEntry::Path(raw) => {
                let substituted = substitute_root_dir(raw, scope_root);
                if is_dynamic_pattern(&substituted) {
                    let matches = expand_glob(&substituted, scope_root, inherited_ignore)?;
                    for path in matches {
                        dispatch_path_kind(
                            ctx,
                            &path,
                            scope_root,
                            inherited_args,
                            inherited_ignore,
                            cache,
                        )?;
                    }
                } else {
                    let resolved = normalize(Path::new(&substituted), scope_root);
                    if !exists(&resolved) {
                        return Err(RunnerError::MissingProjectEntry {
                            entry: raw.clone(),
                            scope_root: scope_root.to_path_buf(),
                        });
                    }
                    dispatch_path_kind(
                        ctx,
                        &resolved,
                        scope_root,
                        inherited_args,
                        inherited_ignore,
                        cache,
                    )?;
                }
            }
            ConfigEntry::Object(object) => {
                let new_scope_root = match &object.root {
                    Some(root) => normalize(
                        Path::new(&substitute_root_dir(root, scope_root)),
                        scope_root,
                    ),
                    None => scope_root.to_path_buf(),
                };
                if let Some(root) = &object.root {
                    if !exists(&new_scope_root) {
                        return Err(RunnerError::MissingProjectEntry {
                            entry: root.clone(),
                            scope_root: scope_root.to_path_buf(),
                        });
                    }
                }
                let merged_args = merge_preserving_order(inherited_args, &object.args);
                let merged_ignore = [inherited_ignore, object.ignore.as_slice()].concat();

                if let Some(nested) = &object.projects {
                    collect_entries(
                        ctx,
                        nested,
                        &new_scope_root,
                        &merged_args,
                        &merged_ignore,
                        cache,
                    )?;
                } else if let Some(config_ref) = &object.config {
                    let substituted = substitute_root_dir(config_ref, &new_scope_root);
                    let file_name = Path::new(&substituted)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if is_recognized_config_name(&file_name) {
                        let resolved = normalize(Path::new(&substituted), &new_scope_root);
                        descend_into_config(ctx, &resolved, &merged_args, &merged_ignore, cache)?;
                    } else {
                        let config_file = normalize(Path::new(&substituted), &new_scope_root);
                        add_project(
                            ctx,
                            &new_scope_root,
                            object.name.clone(),
                            Some(config_file),
                            &merged_args,
                            cache,
                        )?;
                    }
                } else {
                    add_project(
                        ctx,
                        &new_scope_root,
                        object.name.clone(),
                        None,
                        &merged_args,
                        cache,
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Locates and parses the runner config, per §4.2's precedence rules.
pub fn load_config(
    root_dir: &Path,
    explicit_path: Option<&Path>,
) -> Result<(Option<PathBuf>, RootConfig)> {
    let resolved_path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => {
            if let Some(found) = find_recognized_config_in_dir(root_dir) {
                found
            } else if let Some(unsupported) = UNSUPPORTED_CONFIG_NAMES
                .iter()
                .map(|name| root_dir.join(name))
                .find(|candidate| candidate.exists())
            {
                return Err(RunnerError::UnsupportedConfigVariant { path: unsupported });
            } else {
                return Err(RunnerError::ConfigNotFound {
                    root: root_dir.to_path_buf(),
                });
            }
        }
    };

    let value = load_value(&resolved_path)?;
    let root_config: RootConfig =
        serde_json::from_value(value).map_err(|error| RunnerError::InvalidConfig {
            path: resolved_path.clone(),
            reason: error.to_string(),
        })?;
    Ok((Some(resolved_path), root_config))
}

/// Loads the config and walks its entry tree into a finalized, sorted
/// `Vec<Project>` (drives C2+C3+C4, per spec §4.4).
pub fn load_and_collect(
    root_dir: &Path,
    explicit_config_path: Option<&Path>,
) -> Result<(Option<PathBuf>, Vec<Project>)> {
    let (config_path, root_config) = load_config(root_dir, explicit_config_path)?;

    let scope_root = match &root_config.root {
        Some(root) => normalize(Path::new(&substitute_root_dir(root, root_dir)), root_dir),
        None => normalize(root_dir, root_dir),
    };

    let mut ctx = CollectContext::default();
    if let Some(path) = &config_path {
        ctx.visited_configs.insert(normalize(path, path));
    }
    let mut cache = ManifestNameCache::new();

    match &root_config.projects {
        Some(entries) => collect_entries(
            &mut ctx,
            entries,
            &scope_root,
            &root_config.defaults.args,
            &root_config.ignore,
            &mut cache,
        )?,
        None => add_project(
            &mut ctx,
            &scope_root,
            None,
            None,
            &root_config.defaults.args,
            &mut cache,
        )?,
    }

    let projects = project::finalize_projects(ctx.by_root)?;
    Ok((config_path, projects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_manifest(dir: &Path, name: &str, deps: &[(&str, &str)]) {
        let mut body = serde_json::Map::new();
        body.insert("name".into(), Value::String(name.to_string()));
        let mut deps_map = serde_json::Map::new();
        for (k, v) in deps {
            deps_map.insert((*k).to_string(), Value::String((*v).to_string()));
        }
        body.insert("dependencies".into(), Value::Object(deps_map));
        fs::write(
            dir.join("package.json"),
            serde_json::to_string(&Value::Object(body)).expect("serialize"),
        )
        .expect("write manifest");
    }

    #[test]
    fn two_package_chain_collects_both_projects() {
        let root = tempdir().expect("tempdir");
        let shared = root.path().join("packages/shared");
        let app = root.path().join("packages/app");
        fs::create_dir_all(&shared).expect("mkdir shared");
        fs::create_dir_all(&app).expect("mkdir app");
        write_manifest(&shared, "@s/shared", &[]);
        write_manifest(&app, "@s/app", &[("@s/shared", "workspace:*")]);

        fs::write(
            root.path().join("wiggum.config.json"),
            r#"{"projects": ["packages/*"]}"#,
        )
        .expect("write config");

        let (config_path, projects) =
            load_and_collect(root.path(), None).expect("load_and_collect");
        assert!(config_path.is_some());
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "@s/app");
        assert_eq!(projects[1].name, "@s/shared");
    }

    #[test]
    fn unsupported_variant_fails_fast() {
        let root = tempdir().expect("tempdir");
        fs::write(root.path().join("wiggum.config.ts"), "export default {}").expect("write");

        let result = load_and_collect(root.path(), None);
        assert!(matches!(
            result,
            Err(RunnerError::UnsupportedConfigVariant { .. })
        ));
    }

    #[test]
    fn missing_config_fails_fast() {
        let root = tempdir().expect("tempdir");
        let result = load_and_collect(root.path(), None);
        assert!(matches!(result, Err(RunnerError::ConfigNotFound { .. })));
    }

    #[test]
    fn missing_literal_entry_fails_fast() {
        let root = tempdir().expect("tempdir");
        fs::write(
            root.path().join("wiggum.config.json"),
            r#"{"projects": ["packages/missing"]}"#,
        )
        .expect("write config");

        let result = load_and_collect(root.path(), None);
        assert!(matches!(
            result,
            Err(RunnerError::MissingProjectEntry { .. })
        ));
    }

    #[test]
    fn missing_object_entry_root_fails_fast() {
        let root = tempdir().expect("tempdir");
        fs::write(
            root.path().join("wiggum.config.json"),
            r#"{"projects": [{"root": "packages/missing", "name": "ghost"}]}"#,
        )
        .expect("write config");

        let result = load_and_collect(root.path(), None);
        assert!(matches!(
            result,
            Err(RunnerError::MissingProjectEntry { .. })
        ));
    }

    #[test]
    fn duplicate_project_name_fails_fast() {
        let root = tempdir().expect("tempdir");
        let a = root.path().join("a");
        let b = root.path().join("b");
        fs::create_dir_all(&a).expect("mkdir a");
        fs::create_dir_all(&b).expect("mkdir b");
        write_manifest(&a, "same-name", &[]);
        write_manifest(&b, "same-name", &[]);

        fs::write(
            root.path().join("wiggum.config.json"),
            r#"{"projects": ["a", "b"]}"#,
        )
        .expect("write config");

        let result = load_and_collect(root.path(), None);
        assert!(matches!(
            result,
            Err(RunnerError::DuplicateProjectName { .. })
        ));
    }

    #[test]
    fn args_accumulate_outer_scope_first() {
        let root = tempdir().expect("tempdir");
        let app = root.path().join("app");
        fs::create_dir_all(&app).expect("mkdir app");
        write_manifest(&app, "@s/app", &[]);

        fs::write(
            root.path().join("wiggum.config.json"),
            r#"{"defaults": {"args": ["--outer"]}, "projects": [{"root": "app", "args": ["--inner"]}]}"#,
        )
        .expect("write config");

        let (_config_path, projects) =
            load_and_collect(root.path(), None).expect("load_and_collect");
        assert_eq!(projects[0].args, vec!["--outer".to_string(), "--inner".to_string()]);
    }
}
