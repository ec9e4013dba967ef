use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use serde::Deserialize;

use pylower::ast::{Expr, ExprKind, Module, Stmt, StmtKind};
use pylower::collect::{self, PyAstParser};
use pylower::config::Config;
use pylower::lower::LowerOptions;
use pylower::resolve::resolve_module;
use pylower::span::{FileId, SourceRegistry};

#[derive(Debug, Deserialize)]
struct CaseSpec {
    entry: String,
    library_modules: Vec<String>,
    project_modules: Vec<String>,
}

fn load_case() -> Result<CaseSpec> {
    let raw = fs::read_to_string("tests/fixtures/case.yaml")?;
    Ok(serde_yaml::from_str(&raw)?)
}

fn load_config() -> Result<Config> {
    Config::from_json_file(Path::new("tests/fixtures/pylower.config.json"))
}

/// Stand-in for the out-of-scope host parser: every file becomes a module
/// assigning its own text to `marker`, so lowered output stays attributable
/// to the file it came from. `broken.py` fails, exercising the skip path.
struct StubParser;

impl PyAstParser for StubParser {
    fn parse(&self, path: &Path, _file: FileId, source: &str) -> Result<Module> {
        if path.file_name().and_then(|name| name.to_str()) == Some("broken.py") {
            bail!("stub parser rejects {}", path.display());
        }
        Ok(Module {
            body: vec![Stmt::new(StmtKind::Assign {
                targets: vec![Expr::new(ExprKind::Name("marker".to_string()))],
                value: Expr::new(ExprKind::Str(source.trim().to_string())),
            })],
        })
    }
}

fn module_names(map: &collect::ModuleMap) -> BTreeSet<String> {
    map.keys().cloned().collect()
}

#[test]
fn collects_library_and_project_trees() -> Result<()> {
    let spec = load_case()?;
    let output = collect::run_frontend(&load_config()?, &StubParser)?;

    assert_eq!(output.entry, spec.entry);
    assert_eq!(
        module_names(&output.library),
        spec.library_modules.iter().cloned().collect()
    );
    assert_eq!(
        module_names(&output.project),
        spec.project_modules.iter().cloned().collect()
    );
    Ok(())
}

#[test]
fn filtered_files_never_reach_the_maps() -> Result<()> {
    let output = collect::run_frontend(&load_config()?, &StubParser)?;

    // LibCall.py names library primitives and must not become a module.
    assert!(!output.library.contains_key("LibCall"));
    // Non-Python files, venv trees, and unparseable files are skipped.
    assert!(!output.project.contains_key("notes"));
    assert!(output.project.keys().all(|qual| !qual.contains("venv")));
    assert!(!output.project.contains_key("broken"));
    Ok(())
}

#[test]
fn entry_module_carries_its_own_lowered_body() -> Result<()> {
    let output = collect::run_frontend(&load_config()?, &StubParser)?;

    let entry = output
        .project
        .get(&output.entry)
        .expect("entry module must be collected");
    let rendered = entry.to_string();
    assert!(rendered.contains("let $module"));
    assert!(rendered.contains("entry marker"));
    // The stub module assigns a plain global, so it must be exported.
    assert!(rendered.contains("exportGlobal"));
    Ok(())
}

#[test]
fn resolver_prefers_project_over_library() -> Result<()> {
    let output = collect::run_frontend(&load_config()?, &StubParser)?;

    // `util` exists in both trees; the project copy wins.
    let resolved =
        resolve_module("util", &output.project, &output.library).expect("util resolves");
    assert!(!resolved.is_init);
    assert!(resolved.stmt.to_string().contains("project util marker"));

    // `torch` only exists as a library package, through its __init__ form.
    let resolved =
        resolve_module("torch", &output.project, &output.library).expect("torch resolves");
    assert!(resolved.is_init);
    assert!(resolved.stmt.to_string().contains("torch init marker"));

    assert!(resolve_module("ghost", &output.project, &output.library).is_none());
    Ok(())
}

#[test]
fn explicit_venv_path_is_excluded() {
    let mut sources = SourceRegistry::new();
    let root = Path::new("tests/fixtures/venvtest");

    let with_venv = collect::collect_dir(
        root,
        Some(Path::new("tests/fixtures/venvtest/fakeenv")),
        &StubParser,
        LowerOptions::default(),
        &mut sources,
    );
    assert_eq!(
        module_names(&with_venv),
        BTreeSet::from(["keep".to_string()])
    );

    let without_venv =
        collect::collect_dir(root, None, &StubParser, LowerOptions::default(), &mut sources);
    assert_eq!(
        module_names(&without_venv),
        BTreeSet::from(["fakeenv.skip".to_string(), "keep".to_string()])
    );
}

#[test]
fn source_registry_tracks_collected_files() -> Result<()> {
    let output = collect::run_frontend(&load_config()?, &StubParser)?;

    assert!(!output.sources.is_empty());
    let known: Vec<_> = (0..output.sources.len() as u32)
        .filter_map(|index| output.sources.path(FileId(index)))
        .collect();
    assert!(
        known
            .iter()
            .any(|path| path.ends_with(Path::new("project/main.py")))
    );
    Ok(())
}
