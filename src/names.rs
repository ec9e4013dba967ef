//! Name-binding utilities shared by the translator and the backend's import
//! machinery: local-definition scans, import scans, qualified-path
//! resolution, attribute-path flattening, and operator mapping.

use std::collections::BTreeSet;

use crate::ast::{BinOp, DictEntry, Expr, ExprKind, Stmt, StmtKind, UnaryOp};
use crate::thir;

/// Identifiers a statement list will assign to, minus `excluded`.
///
/// Descends into control-flow suites but not into nested function or class
/// bodies (those introduce their own scopes). `global`/`nonlocal`
/// declarations remove names from the result.
pub fn extract_local_def(stmts: &[Stmt], excluded: &[String]) -> BTreeSet<String> {
    let mut defs = BTreeSet::new();
    let mut removed = BTreeSet::new();
    scan_block(stmts, &mut defs, &mut removed);
    for name in &removed {
        defs.remove(name);
    }
    for name in excluded {
        defs.remove(name);
    }
    defs
}

fn scan_block(stmts: &[Stmt], defs: &mut BTreeSet<String>, removed: &mut BTreeSet<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Assign { targets, .. } => {
                for target in targets {
                    collect_target_names(target, defs);
                }
            }
            StmtKind::AugAssign { target, .. } => {
                if let ExprKind::Name(name) = &target.kind {
                    defs.insert(name.clone());
                }
            }
            StmtKind::For {
                target,
                body,
                orelse,
                ..
            } => {
                collect_target_names(target, defs);
                scan_block(body, defs, removed);
                scan_block(orelse, defs, removed);
            }
            StmtKind::While { body, orelse, .. } | StmtKind::If { body, orelse, .. } => {
                scan_block(body, defs, removed);
                scan_block(orelse, defs, removed);
            }
            StmtKind::With { items, body } => {
                for item in items {
                    if let Some(target) = &item.target {
                        collect_target_names(target, defs);
                    }
                }
                scan_block(body, defs, removed);
            }
            StmtKind::FunctionDef(def) => {
                defs.insert(def.name.clone());
            }
            StmtKind::ClassDef(def) => {
                defs.insert(def.name.clone());
            }
            StmtKind::Global(names) | StmtKind::Nonlocal(names) => {
                removed.extend(names.iter().cloned());
            }
            _ => {}
        }
    }
}

fn collect_target_names(target: &Expr, defs: &mut BTreeSet<String>) {
    match &target.kind {
        ExprKind::Name(name) => {
            defs.insert(name.clone());
        }
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            for item in items {
                collect_target_names(item, defs);
            }
        }
        // Attribute and subscript stores do not bind local names.
        _ => {}
    }
}

/// Names already bound in this scope by single-name imports: `import x`,
/// `import a.b as y`, `from m import x [as y]`. Dotted no-alias imports and
/// `import *` bind nothing here.
pub fn extract_single_import(stmts: &[Stmt]) -> BTreeSet<String> {
    let mut bound = BTreeSet::new();
    scan_imports(stmts, &mut bound);
    bound
}

fn scan_imports(stmts: &[Stmt], bound: &mut BTreeSet<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Import { modules } => {
                for module in modules {
                    match &module.alias {
                        Some(alias) => {
                            bound.insert(alias.clone());
                        }
                        None if !module.qual_path.contains('.') => {
                            bound.insert(module.qual_path.clone());
                        }
                        None => {}
                    }
                }
            }
            StmtKind::ImportFrom {
                names: Some(names), ..
            } => {
                for name in names {
                    bound.insert(name.alias.clone().unwrap_or_else(|| name.name.clone()));
                }
            }
            StmtKind::For { body, orelse, .. }
            | StmtKind::While { body, orelse, .. }
            | StmtKind::If { body, orelse, .. } => {
                scan_imports(body, bound);
                scan_imports(orelse, bound);
            }
            StmtKind::With { body, .. } => scan_imports(body, bound),
            _ => {}
        }
    }
}

/// Resolves (possibly relative) dotted import syntax into the cumulative
/// prefix list the import machinery probes.
///
/// `scan_qual_path("a.b.c", None)` is `["a", "a.b", "a.b.c"]`. Leading dots
/// strip that many components from `current`'s prefix list and prepend the
/// remainder; without `current` the dots are kept verbatim on each element.
pub fn scan_qual_path(qual: &str, current: Option<&str>) -> Vec<String> {
    let dots = qual.chars().take_while(|ch| *ch == '.').count();
    let tail = &qual[dots..];

    let mut cumulative: Vec<String> = Vec::new();
    if !tail.is_empty() {
        for segment in tail.split('.') {
            let next = match cumulative.last() {
                Some(prev) => format!("{prev}.{segment}"),
                None => segment.to_string(),
            };
            cumulative.push(next);
        }
    }

    if dots == 0 {
        return cumulative;
    }

    match current {
        None => {
            let prefix = ".".repeat(dots);
            cumulative
                .into_iter()
                .map(|path| format!("{prefix}{path}"))
                .collect()
        }
        Some(current) => {
            let mut base = scan_qual_path(current, None);
            base.truncate(base.len().saturating_sub(dots));
            match base.last().cloned() {
                Some(prefix) => {
                    let mut resolved = base;
                    resolved.extend(cumulative.into_iter().map(|path| format!("{prefix}.{path}")));
                    resolved
                }
                // More dots than the current path has components; surface the
                // bare tail and let the resolver report the miss.
                None => cumulative,
            }
        }
    }
}

/// Flattens a `Name`/`MemberAccess` chain into its segments
/// (`LibCall.torch.matmul` becomes `["LibCall", "torch", "matmul"]`).
/// Returns `None` when any link is not an attribute access on a name.
pub fn attr_path(expr: &Expr) -> Option<Vec<&str>> {
    match &expr.kind {
        ExprKind::Name(name) => Some(vec![name.as_str()]),
        ExprKind::MemberAccess { base, member } => {
            let mut path = attr_path(base)?;
            path.push(member.as_str());
            Some(path)
        }
        _ => None,
    }
}

/// How a parser-level binary operator maps into the IR: directly, with
/// swapped operands (`>` is `<` flipped), or negated (`is not`, `not in`).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinOpMapping {
    Direct(thir::BinOp),
    Swapped(thir::BinOp),
    Negated(thir::BinOp),
}

pub fn map_bin_op(op: BinOp) -> BinOpMapping {
    use BinOpMapping::{Direct, Negated, Swapped};
    match op {
        BinOp::Add => Direct(thir::BinOp::Add),
        BinOp::Sub => Direct(thir::BinOp::Sub),
        BinOp::Mul => Direct(thir::BinOp::Mul),
        BinOp::Div => Direct(thir::BinOp::Div),
        BinOp::FloorDiv => Direct(thir::BinOp::FloorDiv),
        BinOp::Mod => Direct(thir::BinOp::Mod),
        BinOp::Pow => Direct(thir::BinOp::Pow),
        BinOp::And => Direct(thir::BinOp::And),
        BinOp::Or => Direct(thir::BinOp::Or),
        BinOp::Is => Direct(thir::BinOp::Is),
        BinOp::IsNot => Negated(thir::BinOp::Is),
        BinOp::In => Direct(thir::BinOp::In),
        BinOp::NotIn => Negated(thir::BinOp::In),
        BinOp::Lt => Direct(thir::BinOp::Lt),
        BinOp::Lte => Direct(thir::BinOp::Lte),
        BinOp::Gt => Swapped(thir::BinOp::Lt),
        BinOp::Gte => Swapped(thir::BinOp::Lte),
        BinOp::Eq => Direct(thir::BinOp::Eq),
        BinOp::Neq => Direct(thir::BinOp::Neq),
        BinOp::BitAnd => Direct(thir::BinOp::BitAnd),
        BinOp::BitOr => Direct(thir::BinOp::BitOr),
        BinOp::BitXor => Direct(thir::BinOp::BitXor),
        BinOp::LShift => Direct(thir::BinOp::LShift),
        BinOp::RShift => Direct(thir::BinOp::RShift),
    }
}

pub fn map_unary_op(op: UnaryOp) -> thir::UnaryOp {
    match op {
        UnaryOp::Neg => thir::UnaryOp::Neg,
        UnaryOp::Pos => thir::UnaryOp::Pos,
        UnaryOp::Not => thir::UnaryOp::Not,
        UnaryOp::Invert => thir::UnaryOp::Invert,
    }
}

/// True when an expression can appear on the left of a plain store.
pub fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Name(_) | ExprKind::MemberAccess { .. } | ExprKind::Index { .. }
    )
}

/// Walks a dict literal's entries, ignoring `**` expansions.
pub fn key_value_entries(entries: &[DictEntry]) -> impl Iterator<Item = (&Expr, &Expr)> {
    entries.iter().filter_map(|entry| match entry {
        DictEntry::KeyValue(key, value) => Some((key, value)),
        DictEntry::Expand(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ImportModule, ImportName, WithItem};

    fn name(ident: &str) -> Expr {
        Expr::new(ExprKind::Name(ident.to_string()))
    }

    fn assign(target: Expr, value: Expr) -> Stmt {
        Stmt::new(StmtKind::Assign {
            targets: vec![target],
            value,
        })
    }

    #[test]
    fn local_def_collects_assignment_and_declaration_targets() {
        let stmts = vec![
            assign(name("a"), name("b")),
            Stmt::new(StmtKind::AugAssign {
                target: name("total"),
                op: BinOp::Add,
                value: name("a"),
            }),
            Stmt::new(StmtKind::For {
                target: Expr::new(ExprKind::Tuple(vec![name("i"), name("j")])),
                iter: name("pairs"),
                body: vec![assign(name("inner"), name("i"))],
                orelse: vec![],
            }),
            Stmt::new(StmtKind::FunctionDef(crate::ast::FunctionDef {
                name: "helper".to_string(),
                params: vec![],
                body: vec![assign(name("hidden"), name("a"))],
            })),
            Stmt::new(StmtKind::With {
                items: vec![WithItem {
                    context: name("ctx"),
                    target: Some(name("handle")),
                }],
                body: vec![],
            }),
        ];

        let defs = extract_local_def(&stmts, &[]);
        let expected: Vec<&str> = vec!["a", "handle", "helper", "i", "inner", "j", "total"];
        assert_eq!(defs.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn local_def_honors_global_and_excluded() {
        let stmts = vec![
            Stmt::new(StmtKind::Global(vec!["counter".to_string()])),
            assign(name("counter"), name("x")),
            assign(name("param"), name("y")),
            assign(name("kept"), name("z")),
        ];

        let defs = extract_local_def(&stmts, &["param".to_string()]);
        assert_eq!(defs.iter().map(String::as_str).collect::<Vec<_>>(), vec!["kept"]);
    }

    #[test]
    fn single_import_collects_bound_names_only() {
        let stmts = vec![
            Stmt::new(StmtKind::Import {
                modules: vec![
                    ImportModule {
                        qual_path: "torch".to_string(),
                        alias: None,
                    },
                    ImportModule {
                        qual_path: "torch.nn".to_string(),
                        alias: None,
                    },
                    ImportModule {
                        qual_path: "numpy".to_string(),
                        alias: Some("np".to_string()),
                    },
                ],
            }),
            Stmt::new(StmtKind::ImportFrom {
                qual_path: "collections".to_string(),
                names: Some(vec![
                    ImportName {
                        name: "OrderedDict".to_string(),
                        alias: None,
                    },
                    ImportName {
                        name: "deque".to_string(),
                        alias: Some("dq".to_string()),
                    },
                ]),
            }),
            Stmt::new(StmtKind::ImportFrom {
                qual_path: "os".to_string(),
                names: None,
            }),
        ];

        let bound = extract_single_import(&stmts);
        assert_eq!(
            bound.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["OrderedDict", "dq", "np", "torch"]
        );
    }

    #[test]
    fn qual_path_without_dots_is_cumulative() {
        assert_eq!(
            scan_qual_path("a.b.c", None),
            vec!["a".to_string(), "a.b".to_string(), "a.b.c".to_string()]
        );
    }

    #[test]
    fn qual_path_relative_strips_current_components() {
        assert_eq!(
            scan_qual_path("..X", Some("p.q.r")),
            vec!["p".to_string(), "p.X".to_string()]
        );
        assert_eq!(
            scan_qual_path(".A.B", Some("C.D")),
            vec!["C".to_string(), "C.A".to_string(), "C.A.B".to_string()]
        );
        assert_eq!(
            scan_qual_path("..A", Some("C.D.E")),
            vec!["C".to_string(), "C.A".to_string()]
        );
    }

    #[test]
    fn qual_path_without_current_keeps_dots_verbatim() {
        assert_eq!(
            scan_qual_path("..pkg.mod", None),
            vec!["..pkg".to_string(), "..pkg.mod".to_string()]
        );
    }

    #[test]
    fn qual_path_overstripped_returns_bare_tail() {
        assert_eq!(scan_qual_path("...X", Some("a.b")), vec!["X".to_string()]);
    }

    #[test]
    fn attr_path_flattens_member_chains() {
        let expr = Expr::new(ExprKind::MemberAccess {
            base: Box::new(Expr::new(ExprKind::MemberAccess {
                base: Box::new(name("LibCall")),
                member: "torch".to_string(),
            })),
            member: "matmul".to_string(),
        });

        assert_eq!(attr_path(&expr), Some(vec!["LibCall", "torch", "matmul"]));

        let call = Expr::new(ExprKind::Call {
            callee: Box::new(name("f")),
            args: vec![],
        });
        assert_eq!(attr_path(&call), None);
    }

    #[test]
    fn comparison_normalization() {
        assert_eq!(map_bin_op(BinOp::Gt), BinOpMapping::Swapped(thir::BinOp::Lt));
        assert_eq!(
            map_bin_op(BinOp::Gte),
            BinOpMapping::Swapped(thir::BinOp::Lte)
        );
        assert_eq!(
            map_bin_op(BinOp::NotIn),
            BinOpMapping::Negated(thir::BinOp::In)
        );
        assert_eq!(map_bin_op(BinOp::Add), BinOpMapping::Direct(thir::BinOp::Add));
    }
}
