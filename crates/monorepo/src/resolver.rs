//! Dependency resolver (C5): map manifest dependency target names to
//! in-workspace project names, and optionally scan source files for
//! additional inferred import edges. See spec §4.5.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::project::{self, Project};

const MAX_SCAN_BYTES: u64 = 1024 * 1024;

const SCAN_DIRS: [&str; 6] = ["src", "test", "tests", "spec", "specs", "__tests__"];
const SCAN_EXTENSIONS: [&str; 8] = ["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"];

/// Knobs controlling inferred-import scanning (spec §4.5).
#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Whether to scan source files for additional inferred edges.
    pub include_inferred_imports: bool,
    /// Cap on files scanned per project, applied after lexicographic sort.
    pub max_files_per_project: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            include_inferred_imports: true,
            max_files_per_project: 400,
        }
    }
}

/// Resolves manifest edges for every project, then — if enabled —
/// inferred import edges, mutating each `Project`'s `dependencies` and
/// `inferred_dependencies` in place.
pub fn resolve_dependencies(projects: &mut [Project], options: &ResolverOptions) {
    resolve_manifest_edges(projects);
    if options.include_inferred_imports {
        resolve_inferred_edges(projects, options.max_files_per_project);
    }
}

fn resolve_manifest_edges(projects: &mut [Project]) {
    let package_index = project::package_name_index(projects);
    for index in 0..projects.len() {
        let own_name = projects[index].name.clone();
        let mut dependencies = BTreeSet::new();
        for target in &projects[index].dependency_package_names {
            if let Some(project_name) = package_index.get(target) {
                if project_name != &own_name {
                    dependencies.insert(project_name.clone());
                }
            }
        }
        projects[index].dependencies = dependencies;
    }
}

fn resolve_inferred_edges(projects: &mut [Project], max_files_per_project: usize) {
    let package_index = project::package_name_index(projects);

    let inferred: Vec<BTreeSet<String>> = projects
        .iter()
        .map(|project| {
            scan_project_imports(project, &package_index, max_files_per_project)
        })
        .collect();

    for (project, edges) in projects.iter_mut().zip(inferred) {
        project.inferred_dependencies = edges;
    }
}

fn scan_project_imports(
    project: &Project,
    package_index: &std::collections::HashMap<String, String>,
    max_files_per_project: usize,
) -> BTreeSet<String> {
    let mut files = enumerate_source_files(&project.root);
    files.sort();
    let considered = files.len();
    files.truncate(max_files_per_project);
    log::debug!(
        "[runner] {} inferred-import scan: {} file(s) considered, capped to {}",
        project.name,
        considered,
        files.len()
    );

    let mut inferred = BTreeSet::new();
    for file in files {
        let Ok(metadata) = std::fs::metadata(&file) else {
            continue;
        };
        if metadata.len() > MAX_SCAN_BYTES {
            continue;
        }
        let Ok(contents) = std::fs::read_to_string(&file) else {
            continue;
        };

        for specifier in extract_import_specifiers(&contents) {
            if specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/') {
                continue;
            }
            let derived = derive_package_name(&specifier);
            let target_name = package_index
                .get(&specifier)
                .or_else(|| package_index.get(&derived));
            let Some(target_name) = target_name else {
                continue;
            };
            if target_name == &project.name {
                continue;
            }
            if project.dependencies.contains(target_name) {
                continue;
            }
            inferred.insert(target_name.clone());
        }
    }
    inferred
}

fn enumerate_source_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir_name in SCAN_DIRS {
        let dir = root.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).into_iter().filter_map(std::result::Result::ok) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path
                .components()
                .any(|component| component.as_os_str() == "node_modules" || component.as_os_str() == "dist")
            {
                continue;
            }
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if file_name.ends_with(".d.ts") {
                continue;
            }
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !SCAN_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files.dedup();
    files
}

/// Derives the package name a bare import specifier belongs to: the
/// first two `/`-separated segments for a scoped (`@scope/name`)
/// specifier, otherwise the first segment.
#[must_use]
pub fn derive_package_name(specifier: &str) -> String {
    if let Some(rest) = specifier.strip_prefix('@') {
        let mut parts = rest.splitn(2, '/');
        let scope = parts.next().unwrap_or("");
        match parts.next() {
            Some(name) if !name.is_empty() => {
                let name = name.split('/').next().unwrap_or(name);
                format!("@{scope}/{name}")
            }
            _ => format!("@{scope}"),
        }
    } else {
        specifier.split('/').next().unwrap_or(specifier).to_string()
    }
}

const COMMENT_GAP: &str = r"(?:\s|/\*(?s:.*?)\*/|//[^\n]*)*";

fn import_from_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r#"import\s+[^;'"\n]*?\bfrom\s*['"]([^'"]+)['"]"#).unwrap()
    })
}

fn bare_import_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r#"import\s*['"]([^'"]+)['"]"#).unwrap()
    })
}

fn export_from_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r#"export\s+[^;'"\n]*?\bfrom\s*['"]([^'"]+)['"]"#).unwrap()
    })
}

fn dynamic_call_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        let pattern = format!(
            r#"(?:import(?:\.meta\.resolve)?|require(?:\.resolve)?)\s*\(\s*{COMMENT_GAP}['"]([^'"]+)['"]"#
        );
        #[allow(clippy::unwrap_used)]
        Regex::new(&pattern).unwrap()
    })
}

/// Extracts import specifiers recognized by spec §4.5 item 4: static
/// `import`/`export ... from`, bare `import 'spec'`, `import(...)`,
/// `require(...)`, `require.resolve(...)`, and `import.meta.resolve(...)`
/// (the latter four tolerating comment gaps between `(` and the literal).
#[must_use]
pub fn extract_import_specifiers(source: &str) -> Vec<String> {
    let mut specifiers = Vec::new();
    for regex in [
        import_from_regex(),
        bare_import_regex(),
        export_from_regex(),
        dynamic_call_regex(),
    ] {
        for capture in regex.captures_iter(source) {
            if let Some(group) = capture.get(1) {
                specifiers.push(group.as_str().to_string());
            }
        }
    }
    specifiers
}
