//! Library collection.
//!
//! Walks a directory tree, drives the host parser once per file, lowers the
//! result, and keys it by dotted module path. Per-file failures are logged
//! and skipped; collection never aborts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::ast::Module;
use crate::config::Config;
use crate::lower::{LowerOptions, Translator};
use crate::span::{FileId, SourceRegistry};
use crate::thir::ThStmt;

/// Port to the external host parser: given a file's contents, produce the
/// position-annotated AST this crate lowers.
pub trait PyAstParser {
    fn parse(&self, path: &Path, file: FileId, source: &str) -> Result<Module>;
}

pub type ModuleMap = HashMap<String, ThStmt>;

/// Result of running the frontend over a configured project: the lowered
/// stub library, the lowered project tree, the entry module's qualified
/// name, and the path registry behind every source reference.
pub struct FrontendOutput {
    pub library: ModuleMap,
    pub project: ModuleMap,
    pub entry: String,
    pub sources: SourceRegistry,
}

/// Collects every lowered module under `root`, excluding the given venv
/// path, any directory containing `pyvenv.cfg`, non-Python files, and the
/// `LibCall.py` marker (it only names library primitives).
pub fn collect_dir(
    root: &Path,
    venv: Option<&Path>,
    parser: &dyn PyAstParser,
    options: LowerOptions,
    sources: &mut SourceRegistry,
) -> ModuleMap {
    let mut modules = HashMap::new();
    collect_into(root, root, venv, parser, options, sources, &mut modules);
    modules
}

fn collect_into(
    root: &Path,
    dir: &Path,
    venv: Option<&Path>,
    parser: &dyn PyAstParser,
    options: LowerOptions,
    sources: &mut SourceRegistry,
    modules: &mut ModuleMap,
) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!("skipping unreadable directory {}: {error}", dir.display());
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(error) => {
                warn!("skipping unreadable entry in {}: {error}", dir.display());
                None
            }
        })
        .collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            if venv.is_some_and(|venv| venv == path) {
                continue;
            }
            if path.join("pyvenv.cfg").exists() {
                continue;
            }
            collect_into(root, &path, venv, parser, options, sources, modules);
            continue;
        }

        if path.extension().and_then(|ext| ext.to_str()) != Some("py") {
            continue;
        }
        if path.file_name().and_then(|name| name.to_str()) == Some("LibCall.py") {
            continue;
        }
        let Some(qual) = qual_path_of(root, &path) else {
            warn!("skipping non-unicode path {}", path.display());
            continue;
        };

        match lower_file(&path, &qual, parser, options, sources) {
            Ok(stmt) => {
                modules.insert(qual, stmt);
            }
            Err(error) => warn!("skipping module {qual}: {error:#}"),
        }
    }
}

/// `pkg/data.py` becomes `pkg.data`; `pkg/__init__.py` stays `pkg.__init__`
/// (the resolver's `.__init__` probe performs the directory-name collapse).
fn qual_path_of(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        parts.push(component.as_os_str().to_str()?.to_string());
    }
    let last = parts.last_mut()?;
    *last = last.strip_suffix(".py")?.to_string();
    Some(parts.join("."))
}

fn lower_file(
    path: &Path,
    qual: &str,
    parser: &dyn PyAstParser,
    options: LowerOptions,
    sources: &mut SourceRegistry,
) -> Result<ThStmt> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let file = sources.intern(path.to_path_buf());
    let module = parser
        .parse(path, file, &source)
        .with_context(|| format!("Parsing {}", path.display()))?;
    let mut translator = Translator::new(options, qual);
    let lowered = translator
        .lower_module(&module)
        .with_context(|| format!("Lowering {}", path.display()))?;
    Ok(lowered)
}

/// Runs the whole frontend: validates the configuration, collects the stub
/// library and the entry script's directory, and designates the entry
/// module.
pub fn run_frontend(config: &Config, parser: &dyn PyAstParser) -> Result<FrontendOutput> {
    config.validate()?;
    let options = config.lower_options();
    let mut sources = SourceRegistry::new();

    let library = collect_dir(&config.pytea_lib_path, None, parser, options, &mut sources);

    let project_root = config
        .entry_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let project = collect_dir(project_root, None, parser, options, &mut sources);

    let entry = config
        .entry_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .context("entryPath has no file name")?
        .to_string();

    Ok(FrontendOutput {
        library,
        project,
        entry,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qual_paths_are_dotted_relative_paths() {
        let root = Path::new("/lib");
        assert_eq!(
            qual_path_of(root, Path::new("/lib/torch/nn/modules.py")),
            Some("torch.nn.modules".to_string())
        );
        assert_eq!(
            qual_path_of(root, Path::new("/lib/pkg/__init__.py")),
            Some("pkg.__init__".to_string())
        );
        assert_eq!(qual_path_of(root, Path::new("/lib/readme.txt")), None);
    }
}
