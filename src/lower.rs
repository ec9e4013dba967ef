//! AST → ThIR translator.
//!
//! One [`Translator`] per file. Dispatch is a pair of exhaustive matches
//! (`lower_stmt` / `lower_expr`); statement lists fold into right-associated
//! `Seq` chains, except that a function or class definition captures the
//! remaining statements as the continuation of its `FunDef` so the defined
//! name is bound exactly once. The translator is pure apart from a monotonic
//! counter minting `$Imm{n}` temporaries, which resets per translation.

use crate::ast::{
    ArgKind, Argument, CompKind, ConstantLit, Expr, ExprKind, ImportModule, ImportName, NumberLit,
    ParamKind, Stmt, StmtKind, WithItem,
};
use crate::names;
use crate::span::SourceRange;
use crate::thir::{LibCallKind, ThExpr, ThStmt, UnaryOp};

mod class_def;
mod error;

pub use error::LowerError;

/// Iteration budget substituted for `while` loops; the symbolic engine cannot
/// fix-point arbitrary loops, so they unroll against a bounded `range`.
pub const WHILE_UNROLL_BOUND: i64 = 300;

/// Configuration the translator consults while lowering. Passed in per run;
/// there is no process-global state.
#[derive(Debug, Clone, Copy)]
pub struct LowerOptions {
    pub ignore_assert: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            ignore_assert: true,
        }
    }
}

/// Per-file translator from the host parser's AST to ThIR.
pub struct Translator {
    options: LowerOptions,
    module_qual: String,
    imm_counter: u32,
}

/// A lowered function before it is tied to a name: parameter list in source
/// order, wrapped body, and the extra `setDefault` key-values (absent when a
/// plain alias suffices).
struct FunctionParts {
    params: Vec<String>,
    body: ThStmt,
    set_default: Option<Vec<(String, ThExpr)>>,
}

impl Translator {
    pub fn new(options: LowerOptions, module_qual: impl Into<String>) -> Self {
        Self {
            options,
            module_qual: module_qual.into(),
            imm_counter: 0,
        }
    }

    /// Qualified path of the module being translated (used to resolve
    /// relative imports).
    pub fn module_qual(&self) -> &str {
        &self.module_qual
    }

    /// Lowers a whole module: `Let("$module", locals( body ; exports ), Object())`.
    pub fn lower_module(&mut self, module: &crate::ast::Module) -> Result<ThStmt, LowerError> {
        self.imm_counter = 0;

        let body = self.lower_block(&module.body)?;
        let exports = self.export_pass(&module.body);
        let mut wrapped = if exports.is_empty() {
            body
        } else {
            ThStmt::seq(body, ThStmt::seq_all(exports))
        };

        // Module-level assignments need their bindings introduced, same as
        // function locals.
        let locals = names::extract_local_def(&module.body, &[]);
        for name in locals.iter().rev() {
            wrapped = ThStmt::let_in(name.clone(), wrapped, None, None);
        }

        Ok(ThStmt::let_in(
            "$module",
            wrapped,
            Some(ThExpr::object(None)),
            None,
        ))
    }

    /// `LibCall(exportGlobal, …)` for every module-scope name the backend's
    /// import machinery should see. Imported names, dunders, and the
    /// `LibCall` marker must not leak.
    fn export_pass(&mut self, stmts: &[Stmt]) -> Vec<ThStmt> {
        let locals = names::extract_local_def(stmts, &[]);
        let imported = names::extract_single_import(stmts);
        locals
            .iter()
            .filter(|name| !imported.contains(*name))
            .filter(|name| !name.starts_with("__"))
            .filter(|name| name.as_str() != "LibCall")
            .map(|name| {
                ThStmt::expr(
                    ThExpr::lib_call(
                        LibCallKind::ExportGlobal,
                        vec![
                            ("$module".to_string(), ThExpr::name("$module", None)),
                            (name.clone(), ThExpr::name(name.clone(), None)),
                        ],
                        None,
                    ),
                    None,
                )
            })
            .collect()
    }

    fn fresh_temp(&mut self) -> String {
        self.imm_counter += 1;
        format!("$Imm{}", self.imm_counter)
    }

    /// Folds a statement list into a right-associated `Seq`. Function and
    /// class definitions capture the remaining statements as their
    /// continuation instead of sitting next to them.
    fn lower_block(&mut self, stmts: &[Stmt]) -> Result<ThStmt, LowerError> {
        self.lower_block_from(stmts, 0)
    }

    fn lower_block_from(&mut self, stmts: &[Stmt], index: usize) -> Result<ThStmt, LowerError> {
        let Some(stmt) = stmts.get(index) else {
            return Ok(ThStmt::pass(None));
        };
        let has_rest = index + 1 < stmts.len();

        match &stmt.kind {
            StmtKind::FunctionDef(def) => {
                let parts = self.lower_function_parts(def)?;
                let rest = if has_rest {
                    Some(self.lower_block_from(stmts, index + 1)?)
                } else {
                    None
                };
                Ok(self.assemble_function(def, parts, stmt.range, rest))
            }
            StmtKind::ClassDef(def) => {
                let pieces = class_def::lower_class_pieces(self, def, stmt.range)?;
                let rest = if has_rest {
                    Some(self.lower_block_from(stmts, index + 1)?)
                } else {
                    None
                };
                Ok(pieces.assemble(rest))
            }
            _ => {
                let lowered = self.lower_stmt(stmt)?;
                if has_rest {
                    Ok(ThStmt::seq(lowered, self.lower_block_from(stmts, index + 1)?))
                } else {
                    Ok(lowered)
                }
            }
        }
    }

    /// Lowers parameters, defaults, and the suite of one function. Shared
    /// between plain functions and methods; the caller decides the `FunDef`
    /// name and the continuation.
    fn lower_function_parts(
        &mut self,
        def: &crate::ast::FunctionDef,
    ) -> Result<FunctionParts, LowerError> {
        let mut params = Vec::new();
        let mut defaults: Vec<(String, ThExpr)> = Vec::new();
        let mut vararg_name: Option<String> = None;
        let mut kwarg_name: Option<String> = None;
        let mut key_only = 0i64;
        let mut seen_vararg = false;

        for param in &def.params {
            match param.kind {
                ParamKind::Simple => {
                    params.push(param.name.clone());
                    if let Some(default) = &param.default {
                        defaults.push((param.name.clone(), self.lower_expr(default)?));
                    }
                    if seen_vararg {
                        key_only += 1;
                    }
                }
                ParamKind::VarArgList => {
                    seen_vararg = true;
                    // A bare `*` separator has no name and binds nothing.
                    if !param.name.is_empty() {
                        params.push(param.name.clone());
                        vararg_name = Some(param.name.clone());
                    }
                }
                ParamKind::VarArgDictionary => {
                    params.push(param.name.clone());
                    kwarg_name = Some(param.name.clone());
                }
            }
        }

        let suite = self.lower_block(&def.body)?;
        let mut body = ThStmt::seq(suite, ThStmt::return_value(ThExpr::none(None), None));

        let locals = names::extract_local_def(&def.body, &params);
        for name in locals.iter().rev() {
            body = ThStmt::let_in(name.clone(), body, None, None);
        }

        let needs_set_default =
            !defaults.is_empty() || vararg_name.is_some() || kwarg_name.is_some() || key_only > 0;
        let set_default = needs_set_default.then(|| {
            let mut kv = defaults;
            if let Some(name) = vararg_name {
                kv.push(("$varargsName".to_string(), ThExpr::str_const(name, None)));
            }
            if let Some(name) = kwarg_name {
                kv.push(("$kwargsName".to_string(), ThExpr::str_const(name, None)));
            }
            if key_only > 0 {
                kv.push(("$keyOnlyNum".to_string(), ThExpr::int(key_only, None)));
            }
            kv
        });

        Ok(FunctionParts {
            params,
            body,
            set_default,
        })
    }

    /// `def f(…)` becomes `FunDef("f$TMP$", …)` whose continuation assigns
    /// `f` either the alias or the `setDefault` wrapper.
    fn assemble_function(
        &mut self,
        def: &crate::ast::FunctionDef,
        parts: FunctionParts,
        range: Option<SourceRange>,
        rest: Option<ThStmt>,
    ) -> ThStmt {
        let tmp_name = format!("{}$TMP$", def.name);
        let rhs = match parts.set_default {
            Some(extra) => {
                let mut kv = vec![("$func".to_string(), ThExpr::name(tmp_name.clone(), None))];
                kv.extend(extra);
                ThExpr::lib_call(LibCallKind::SetDefault, kv, range)
            }
            None => ThExpr::name(tmp_name.clone(), None),
        };
        let assign = ThStmt::assign(ThExpr::name(def.name.clone(), None), rhs, range);
        let continuation = match rest {
            Some(rest) => ThStmt::seq(assign, rest),
            None => assign,
        };
        ThStmt::fun_def(tmp_name, parts.params, parts.body, continuation, range)
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<ThStmt, LowerError> {
        let range = stmt.range;
        match &stmt.kind {
            StmtKind::Pass => Ok(ThStmt::pass(range)),
            StmtKind::Expr(expr) => Ok(ThStmt::expr(self.lower_expr(expr)?, range)),
            StmtKind::Assign { targets, value } => self.lower_assign(targets, value, range),
            StmtKind::AugAssign { target, op, value } => {
                if !names::is_assignable(target) {
                    return Err(LowerError::InvalidAugAssignTarget {
                        range: target.range,
                    });
                }
                let lhs = self.lower_expr(target)?;
                let operand = self.lower_expr(target)?;
                let value = self.lower_expr(value)?;
                let combined = apply_bin_op(names::map_bin_op(*op), operand, value, range);
                Ok(ThStmt::assign(lhs, combined, range))
            }
            StmtKind::If { test, body, orelse } => Ok(ThStmt::if_then(
                self.lower_expr(test)?,
                self.lower_block(body)?,
                self.lower_block(orelse)?,
                range,
            )),
            // The `else` suite of a loop is not supported and is dropped.
            StmtKind::For {
                target, iter, body, ..
            } => self.lower_for(target, iter, body, range),
            StmtKind::While { test, body, .. } => {
                let temp = self.fresh_temp();
                let cond = self.lower_expr(test)?;
                let body = self.lower_block(body)?;
                let bound = ThExpr::call(
                    ThExpr::name("range", None),
                    vec![ThExpr::int(WHILE_UNROLL_BOUND, None)],
                    None,
                );
                Ok(ThStmt::for_in(
                    temp,
                    bound,
                    ThStmt::if_then(cond, body, ThStmt::break_stmt(None), None),
                    range,
                ))
            }
            StmtKind::Import { modules } => Ok(self.lower_import(modules, range)),
            StmtKind::ImportFrom { qual_path, names } => {
                Ok(self.lower_import_from(qual_path, names.as_deref(), range))
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(value) => self.lower_expr(value)?,
                    None => ThExpr::none(None),
                };
                Ok(ThStmt::return_value(value, range))
            }
            StmtKind::Break => Ok(ThStmt::break_stmt(range)),
            StmtKind::Continue => Ok(ThStmt::continue_stmt(range)),
            StmtKind::Raise(value) => {
                let value = match value {
                    Some(value) => self.lower_expr(value)?,
                    // A bare `raise` re-raise is not modeled.
                    None => ThExpr::call(ThExpr::name("RuntimeError", None), vec![], None),
                };
                Ok(ThStmt::expr(
                    ThExpr::lib_call(
                        LibCallKind::Raise,
                        vec![("value".to_string(), value)],
                        range,
                    ),
                    range,
                ))
            }
            StmtKind::Assert { test, msg } => {
                if self.options.ignore_assert {
                    return Ok(ThStmt::pass(range));
                }
                let cond = self.lower_expr(test)?;
                let mut args = Vec::new();
                if let Some(msg) = msg {
                    args.push(self.lower_expr(msg)?);
                }
                let exc = ThExpr::call(ThExpr::name("AssertionError", None), args, None);
                Ok(ThStmt::if_then(
                    cond,
                    ThStmt::pass(None),
                    ThStmt::expr(
                        ThExpr::lib_call(
                            LibCallKind::Raise,
                            vec![("value".to_string(), exc)],
                            None,
                        ),
                        None,
                    ),
                    range,
                ))
            }
            StmtKind::With { items, body } => self.lower_with(items, body, range),
            // Unsupported constructs lower to Pass, position preserved.
            StmtKind::Del(_) | StmtKind::Global(_) | StmtKind::Nonlocal(_) => {
                Ok(ThStmt::pass(range))
            }
            StmtKind::FunctionDef(_) | StmtKind::ClassDef(_) => {
                self.lower_block(std::slice::from_ref(stmt))
            }
        }
    }

    fn lower_assign(
        &mut self,
        targets: &[Expr],
        value: &Expr,
        range: Option<SourceRange>,
    ) -> Result<ThStmt, LowerError> {
        let value = self.lower_expr(value)?;
        match targets {
            [target] => self.lower_target_binding(target, value, range),
            _ => {
                // `a = b = e`: evaluate once, then bind each target from the
                // temporary through the same destructuring rule.
                let temp = self.fresh_temp();
                let mut assigns = Vec::with_capacity(targets.len());
                for target in targets {
                    let assigned =
                        self.lower_target_binding(target, ThExpr::name(temp.clone(), None), range)?;
                    assigns.push(assigned);
                }
                Ok(ThStmt::let_in(
                    temp,
                    ThStmt::seq_all(assigns),
                    Some(value),
                    range,
                ))
            }
        }
    }

    /// Binds one assignment target. Tuple/list targets destructure against a
    /// fresh temporary with indexed subscriptions, recursively.
    fn lower_target_binding(
        &mut self,
        target: &Expr,
        value: ThExpr,
        range: Option<SourceRange>,
    ) -> Result<ThStmt, LowerError> {
        match &target.kind {
            ExprKind::Name(_) | ExprKind::MemberAccess { .. } | ExprKind::Index { .. } => {
                let lhs = self.lower_expr(target)?;
                Ok(ThStmt::assign(lhs, value, range))
            }
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                let temp = self.fresh_temp();
                let mut assigns = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let element = ThExpr::subscr(
                        ThExpr::name(temp.clone(), None),
                        ThExpr::int(index as i64, None),
                        None,
                    );
                    assigns.push(self.lower_target_binding(item, element, item.range)?);
                }
                Ok(ThStmt::let_in(
                    temp,
                    ThStmt::seq_all(assigns),
                    Some(value),
                    range,
                ))
            }
            _ => Err(LowerError::InvalidAssignTarget {
                range: target.range,
            }),
        }
    }

    fn lower_for(
        &mut self,
        target: &Expr,
        iter: &Expr,
        body: &[Stmt],
        range: Option<SourceRange>,
    ) -> Result<ThStmt, LowerError> {
        let iter = self.lower_expr(iter)?;
        match &target.kind {
            ExprKind::Name(name) => Ok(ThStmt::for_in(
                name.clone(),
                iter,
                self.lower_block(body)?,
                range,
            )),
            ExprKind::Tuple(_)
            | ExprKind::List(_)
            | ExprKind::MemberAccess { .. }
            | ExprKind::Index { .. } => {
                let temp = self.fresh_temp();
                let bind =
                    self.lower_target_binding(target, ThExpr::name(temp.clone(), None), target.range)?;
                let body = self.lower_block(body)?;
                Ok(ThStmt::for_in(temp, iter, ThStmt::seq(bind, body), range))
            }
            _ => Err(LowerError::InvalidLoopTarget {
                range: target.range,
            }),
        }
    }

    fn lower_with(
        &mut self,
        items: &[WithItem],
        body: &[Stmt],
        range: Option<SourceRange>,
    ) -> Result<ThStmt, LowerError> {
        self.lower_with_from(items, 0, body, range)
    }

    /// `with e as t:` binds `t` to the context expression directly;
    /// `__enter__`/`__exit__` are not invoked.
    fn lower_with_from(
        &mut self,
        items: &[WithItem],
        index: usize,
        body: &[Stmt],
        range: Option<SourceRange>,
    ) -> Result<ThStmt, LowerError> {
        let Some(item) = items.get(index) else {
            return self.lower_block(body);
        };
        let context = self.lower_expr(&item.context)?;
        let head = match &item.target {
            Some(target) => self.lower_target_binding(target, context, range)?,
            None => ThStmt::expr(context, range),
        };
        let tail = self.lower_with_from(items, index + 1, body, range)?;
        Ok(ThStmt::seq(head, tail))
    }

    fn lower_import(&mut self, modules: &[ImportModule], range: Option<SourceRange>) -> ThStmt {
        let mut stmts = Vec::with_capacity(modules.len());
        for module in modules {
            // The LibCall pseudo-module is a syntactic marker, not a value.
            if module.qual_path.rsplit('.').next() == Some("LibCall") {
                stmts.push(ThStmt::pass(range));
                continue;
            }
            let stmt = match &module.alias {
                Some(alias) => ThStmt::expr(
                    ThExpr::lib_call(
                        LibCallKind::Import,
                        vec![
                            (
                                "qualPath".to_string(),
                                ThExpr::str_const(module.qual_path.clone(), None),
                            ),
                            ("assignTo".to_string(), ThExpr::str_const(alias.clone(), None)),
                        ],
                        range,
                    ),
                    range,
                ),
                None => ThStmt::expr(
                    ThExpr::lib_call(
                        LibCallKind::ImportQualified,
                        vec![(
                            "qualPath".to_string(),
                            ThExpr::str_const(module.qual_path.clone(), None),
                        )],
                        range,
                    ),
                    range,
                ),
            };
            stmts.push(stmt);
        }
        ThStmt::seq_all(stmts)
    }

    fn lower_import_from(
        &mut self,
        qual_path: &str,
        imported: Option<&[ImportName]>,
        range: Option<SourceRange>,
    ) -> ThStmt {
        // Relative dots resolve against the module being translated.
        let resolved = names::scan_qual_path(qual_path, Some(&self.module_qual))
            .last()
            .cloned()
            .unwrap_or_default();

        if resolved.rsplit('.').next() == Some("LibCall") {
            return ThStmt::pass(range);
        }

        match imported {
            None => ThStmt::expr(
                ThExpr::lib_call(
                    LibCallKind::Import,
                    vec![(
                        "qualPath".to_string(),
                        ThExpr::str_const(format!("{resolved}.*"), None),
                    )],
                    range,
                ),
                range,
            ),
            Some(names) => {
                let mut stmts = Vec::with_capacity(names.len());
                for name in names {
                    if name.name == "LibCall" {
                        stmts.push(ThStmt::pass(range));
                        continue;
                    }
                    let full = if resolved.is_empty() {
                        name.name.clone()
                    } else {
                        format!("{resolved}.{}", name.name)
                    };
                    let assign_to = name.alias.clone().unwrap_or_else(|| name.name.clone());
                    stmts.push(ThStmt::expr(
                        ThExpr::lib_call(
                            LibCallKind::Import,
                            vec![
                                ("qualPath".to_string(), ThExpr::str_const(full, None)),
                                ("assignTo".to_string(), ThExpr::str_const(assign_to, None)),
                            ],
                            range,
                        ),
                        range,
                    ));
                }
                ThStmt::seq_all(stmts)
            }
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<ThExpr, LowerError> {
        let range = expr.range;
        match &expr.kind {
            ExprKind::Name(name) => Ok(ThExpr::name(name.clone(), range)),
            ExprKind::Number(NumberLit::Int(value)) => Ok(ThExpr::int(*value, range)),
            ExprKind::Number(NumberLit::Float(value)) => Ok(ThExpr::float(*value, range)),
            ExprKind::Str(value) => Ok(ThExpr::str_const(value.clone(), range)),
            ExprKind::StringList(parts) => Ok(ThExpr::str_const(parts.concat(), range)),
            ExprKind::Constant(ConstantLit::True) => Ok(ThExpr::bool_const(true, range)),
            ExprKind::Constant(ConstantLit::False) => Ok(ThExpr::bool_const(false, range)),
            ExprKind::Constant(ConstantLit::None) => Ok(ThExpr::none(range)),
            ExprKind::Ellipsis => Ok(ThExpr::none(range)),
            ExprKind::Tuple(items) => {
                let items = items
                    .iter()
                    .map(|item| self.lower_expr(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ThExpr::tuple(items, range))
            }
            ExprKind::List(items) => {
                let mut kv = Vec::with_capacity(items.len());
                for item in items {
                    if matches!(item.kind, ExprKind::Comprehension(_)) {
                        continue;
                    }
                    let index = kv.len();
                    kv.push((format!("param${index}"), self.lower_expr(item)?));
                }
                Ok(ThExpr::lib_call(LibCallKind::GenList, kv, range))
            }
            ExprKind::Dict(entries) => {
                // `**` expansion entries are dropped; keys and values
                // alternate under param$i.
                let mut kv = Vec::new();
                for (key, value) in names::key_value_entries(entries) {
                    let index = kv.len();
                    kv.push((format!("param${index}"), self.lower_expr(key)?));
                    let index = kv.len();
                    kv.push((format!("param${index}"), self.lower_expr(value)?));
                }
                Ok(ThExpr::lib_call(LibCallKind::GenDict, kv, range))
            }
            ExprKind::Comprehension(kind) => {
                let lib = match kind {
                    CompKind::Dict => LibCallKind::GenDict,
                    _ => LibCallKind::GenList,
                };
                Ok(ThExpr::lib_call(lib, vec![], range))
            }
            ExprKind::Index { base, index } => Ok(ThExpr::subscr(
                self.lower_expr(base)?,
                self.lower_expr(index)?,
                range,
            )),
            ExprKind::Slice { start, stop, step } => {
                let mut args = Vec::with_capacity(3);
                for bound in [start, stop, step] {
                    args.push(match bound {
                        Some(bound) => self.lower_expr(bound)?,
                        None => ThExpr::none(None),
                    });
                }
                Ok(ThExpr::call(ThExpr::name("slice", None), args, range))
            }
            ExprKind::MemberAccess { base, member } => Ok(ThExpr::attr(
                self.lower_expr(base)?,
                member.clone(),
                range,
            )),
            ExprKind::Call { callee, args } => self.lower_call(callee, args, range),
            ExprKind::BinOp { op, left, right } => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                Ok(apply_bin_op(names::map_bin_op(*op), left, right, range))
            }
            ExprKind::UnaryOp { op, operand } => Ok(ThExpr::unary_op(
                names::map_unary_op(*op),
                self.lower_expr(operand)?,
                range,
            )),
            ExprKind::Ternary { test, then, orelse } => {
                // No conditional expression in the IR; encode through the
                // and/or chain (mis-models a falsy `then`, accepted).
                let test = self.lower_expr(test)?;
                let then = self.lower_expr(then)?;
                let orelse = self.lower_expr(orelse)?;
                Ok(ThExpr::bin_op(
                    crate::thir::BinOp::Or,
                    ThExpr::bin_op(crate::thir::BinOp::And, test, then, None),
                    orelse,
                    range,
                ))
            }
        }
    }

    fn lower_call(
        &mut self,
        callee: &Expr,
        args: &[Argument],
        range: Option<SourceRange>,
    ) -> Result<ThExpr, LowerError> {
        if let ExprKind::Name(name) = &callee.kind
            && name == "super"
        {
            return self.lower_super(args, range);
        }

        if let Some(path) = names::attr_path(callee)
            && path.first() == Some(&"LibCall")
            && path.len() >= 2
        {
            return self.lower_explicit_call(&path[1..], args, range);
        }

        let positional_only = args
            .iter()
            .all(|arg| matches!(arg.kind, ArgKind::Positional));
        let callee = self.lower_expr(callee)?;

        if positional_only {
            let args = args
                .iter()
                .map(|arg| self.lower_expr(&arg.value))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ThExpr::call(callee, args, range))
        } else {
            let mut kv = vec![("$func".to_string(), callee)];
            kv.extend(self.lower_call_kv_args(args)?);
            Ok(ThExpr::lib_call(LibCallKind::CallKv, kv, range))
        }
    }

    fn lower_call_kv_args(
        &mut self,
        args: &[Argument],
    ) -> Result<Vec<(String, ThExpr)>, LowerError> {
        let mut kv = Vec::with_capacity(args.len());
        let mut positional = 0usize;
        for arg in args {
            let value = self.lower_expr(&arg.value)?;
            match &arg.kind {
                ArgKind::Positional => {
                    kv.push((format!("param${positional}"), value));
                    positional += 1;
                }
                ArgKind::Keyword(key) => kv.push((key.clone(), value)),
                ArgKind::UnpackList => kv.push(("$varargs".to_string(), value)),
                ArgKind::UnpackDict => kv.push(("$kwargs".to_string(), value)),
            }
        }
        Ok(kv)
    }

    /// `super()`, `super(cls)`, `super(cls, obj)`; missing arguments default
    /// to the `__class__`/`__self__` bindings the method wrapper introduces.
    fn lower_super(
        &mut self,
        args: &[Argument],
        range: Option<SourceRange>,
    ) -> Result<ThExpr, LowerError> {
        let mut positional = Vec::new();
        for arg in args {
            if matches!(arg.kind, ArgKind::Positional) {
                positional.push(self.lower_expr(&arg.value)?);
            }
        }
        let mut positional = positional.into_iter();
        let base = positional
            .next()
            .unwrap_or_else(|| ThExpr::name("__class__", None));
        let receiver = positional
            .next()
            .unwrap_or_else(|| ThExpr::name("__self__", None));
        Ok(ThExpr::lib_call(
            LibCallKind::Super,
            vec![
                ("baseClass".to_string(), base),
                ("self".to_string(), receiver),
            ],
            range,
        ))
    }

    /// `LibCall.<path>(…)` call sites. `getAttr`, `DEBUG`, and `objectClass`
    /// select their own kinds; anything else is an `explicit` call with the
    /// remaining path as `$func`.
    fn lower_explicit_call(
        &mut self,
        path: &[&str],
        args: &[Argument],
        range: Option<SourceRange>,
    ) -> Result<ThExpr, LowerError> {
        let joined = path.join(".");
        let kind = match joined.as_str() {
            "getAttr" => LibCallKind::GetAttr,
            "DEBUG" => LibCallKind::Debug,
            "objectClass" => LibCallKind::ObjectClass,
            _ => LibCallKind::Explicit,
        };
        let mut kv = Vec::new();
        if kind == LibCallKind::Explicit {
            kv.push(("$func".to_string(), ThExpr::str_const(joined, None)));
        }
        kv.extend(self.lower_call_kv_args(args)?);
        Ok(ThExpr::lib_call(kind, kv, range))
    }
}

fn apply_bin_op(
    mapping: names::BinOpMapping,
    left: ThExpr,
    right: ThExpr,
    range: Option<SourceRange>,
) -> ThExpr {
    match mapping {
        names::BinOpMapping::Direct(op) => ThExpr::bin_op(op, left, right, range),
        names::BinOpMapping::Swapped(op) => ThExpr::bin_op(op, right, left, range),
        names::BinOpMapping::Negated(op) => {
            ThExpr::unary_op(UnaryOp::Not, ThExpr::bin_op(op, left, right, None), range)
        }
    }
}
