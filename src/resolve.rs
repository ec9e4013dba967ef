//! Module lookup for symbolic import.
//!
//! The backend resolves a qualified path against the two collected maps with
//! a fixed probe order; the project always shadows the bundled library.

use crate::collect::ModuleMap;
use crate::thir::ThStmt;

/// A resolved module plus whether it was found under its `.__init__` form
/// (the backend attaches `__path__` semantics to packages).
#[derive(Debug, Clone, Copy)]
pub struct ResolvedModule<'a> {
    pub stmt: &'a ThStmt,
    pub is_init: bool,
}

/// Probes, in order: project `q`, project `q.__init__`, library `q`,
/// library `q.__init__`. A miss is `None`, not an error.
pub fn resolve_module<'a>(
    qual: &str,
    project: &'a ModuleMap,
    library: &'a ModuleMap,
) -> Option<ResolvedModule<'a>> {
    let init_key = format!("{qual}.__init__");

    for map in [project, library] {
        if let Some(stmt) = map.get(qual) {
            return Some(ResolvedModule {
                stmt,
                is_init: false,
            });
        }
        if let Some(stmt) = map.get(&init_key) {
            return Some(ResolvedModule {
                stmt,
                is_init: true,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thir::ThExpr;

    fn marker(ident: &str) -> ThStmt {
        ThStmt::expr(ThExpr::name(ident, None), None)
    }

    fn map_of(entries: &[(&str, &str)]) -> ModuleMap {
        entries
            .iter()
            .map(|(qual, ident)| (qual.to_string(), marker(ident)))
            .collect()
    }

    #[test]
    fn project_shadows_library() {
        let project = map_of(&[("x", "from_project")]);
        let library = map_of(&[("x", "from_library")]);

        let resolved = resolve_module("x", &project, &library).expect("x resolves");
        assert_eq!(resolved.stmt, &marker("from_project"));
        assert!(!resolved.is_init);
    }

    #[test]
    fn packages_resolve_through_their_init_form() {
        let project = map_of(&[("pkg.__init__", "pkg_init")]);
        let library = map_of(&[]);

        let resolved = resolve_module("pkg", &project, &library).expect("pkg resolves");
        assert_eq!(resolved.stmt, &marker("pkg_init"));
        assert!(resolved.is_init);
    }

    #[test]
    fn plain_module_wins_over_init_form() {
        let project = map_of(&[("pkg", "plain"), ("pkg.__init__", "init")]);
        let library = map_of(&[]);

        let resolved = resolve_module("pkg", &project, &library).expect("pkg resolves");
        assert_eq!(resolved.stmt, &marker("plain"));
        assert!(!resolved.is_init);
    }

    #[test]
    fn library_init_is_the_last_probe() {
        let project = map_of(&[]);
        let library = map_of(&[("pkg.__init__", "lib_init")]);

        let resolved = resolve_module("pkg", &project, &library).expect("pkg resolves");
        assert_eq!(resolved.stmt, &marker("lib_init"));
        assert!(resolved.is_init);
    }

    #[test]
    fn miss_is_none_not_an_error() {
        let empty = ModuleMap::new();
        assert!(resolve_module("ghost", &empty, &empty).is_none());
    }
}
