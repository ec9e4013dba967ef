//! ThIR: the statement/expression IR the symbolic backend consumes.
//!
//! Two closed sums, [`ThStmt`] and [`ThExpr`]. Constructors are total, values
//! are immutable, and each node owns its children exclusively. Structural
//! equality ignores source references (two lowerings of the same tree compare
//! equal even when their position info differs), which the [`SourceTag`]
//! wrapper encodes once instead of a hand-written `PartialEq` per variant.

use std::fmt;

use crate::span::SourceRange;

/// Source annotation that is invisible to structural equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceTag(pub Option<SourceRange>);

impl PartialEq for SourceTag {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl From<Option<SourceRange>> for SourceTag {
    fn from(range: Option<SourceRange>) -> Self {
        SourceTag(range)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThStmt {
    Pass {
        source: SourceTag,
    },
    Expr {
        expr: ThExpr,
        source: SourceTag,
    },
    Seq {
        first: Box<ThStmt>,
        second: Box<ThStmt>,
        source: SourceTag,
    },
    /// Pure store; `target` must be a left-expression (Name, Attr, Subscr).
    Assign {
        target: ThExpr,
        value: ThExpr,
        source: SourceTag,
    },
    If {
        cond: ThExpr,
        then: Box<ThStmt>,
        orelse: Box<ThStmt>,
        source: SourceTag,
    },
    /// Binds `ident` in `body` while iterating `iter`.
    ForIn {
        ident: String,
        iter: ThExpr,
        body: Box<ThStmt>,
        source: SourceTag,
    },
    Break {
        source: SourceTag,
    },
    Continue {
        source: SourceTag,
    },
    Return {
        value: ThExpr,
        source: SourceTag,
    },
    /// Introduces `ident` in the scope of `body`; an absent `init` leaves the
    /// binding uninitialized (reads before assignment are a backend error).
    Let {
        ident: String,
        body: Box<ThStmt>,
        init: Option<ThExpr>,
        source: SourceTag,
    },
    /// Defines `ident` as a function value; `rest` is the continuation in
    /// which `ident` is bound.
    FunDef {
        ident: String,
        params: Vec<String>,
        body: Box<ThStmt>,
        rest: Box<ThStmt>,
        source: SourceTag,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThExpr {
    Const {
        value: ConstValue,
        source: SourceTag,
    },
    /// Fresh empty record.
    Object {
        source: SourceTag,
    },
    Tuple {
        items: Vec<ThExpr>,
        source: SourceTag,
    },
    Name {
        ident: String,
        source: SourceTag,
    },
    Attr {
        base: Box<ThExpr>,
        name: String,
        source: SourceTag,
    },
    Subscr {
        base: Box<ThExpr>,
        index: Box<ThExpr>,
        source: SourceTag,
    },
    /// Positional-only call; anything richer goes through `LibCall(callKV)`.
    Call {
        callee: Box<ThExpr>,
        args: Vec<ThExpr>,
        source: SourceTag,
    },
    /// The universal escape hatch; keys are significant per kind.
    LibCall {
        kind: LibCallKind,
        args: Vec<(String, ThExpr)>,
        source: SourceTag,
    },
    BinOp {
        op: BinOp,
        left: Box<ThExpr>,
        right: Box<ThExpr>,
        source: SourceTag,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<ThExpr>,
        source: SourceTag,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
}

/// Closed enumeration of backend-defined library operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibCallKind {
    Import,
    ImportQualified,
    Super,
    SetDefault,
    CallKv,
    GetAttr,
    ExportGlobal,
    GenList,
    GenDict,
    Raise,
    Explicit,
    ObjectClass,
    Debug,
}

impl LibCallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibCallKind::Import => "import",
            LibCallKind::ImportQualified => "importQualified",
            LibCallKind::Super => "super",
            LibCallKind::SetDefault => "setDefault",
            LibCallKind::CallKv => "callKV",
            LibCallKind::GetAttr => "getAttr",
            LibCallKind::ExportGlobal => "exportGlobal",
            LibCallKind::GenList => "genList",
            LibCallKind::GenDict => "genDict",
            LibCallKind::Raise => "raise",
            LibCallKind::Explicit => "explicit",
            LibCallKind::ObjectClass => "objectClass",
            LibCallKind::Debug => "DEBUG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    And,
    Or,
    Is,
    In,
    Lt,
    Lte,
    Eq,
    Neq,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl BinOp {
    fn token(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Is => "is",
            BinOp::In => "in",
            BinOp::Lt => "<",
            BinOp::Lte => "<=",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Invert,
    Pos,
}

impl UnaryOp {
    fn token(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not ",
            UnaryOp::Invert => "~",
            UnaryOp::Pos => "+",
        }
    }
}

impl ThStmt {
    pub fn pass(source: Option<SourceRange>) -> Self {
        ThStmt::Pass {
            source: source.into(),
        }
    }

    pub fn expr(expr: ThExpr, source: Option<SourceRange>) -> Self {
        ThStmt::Expr {
            expr,
            source: source.into(),
        }
    }

    pub fn seq(first: ThStmt, second: ThStmt) -> Self {
        ThStmt::Seq {
            first: Box::new(first),
            second: Box::new(second),
            source: SourceTag::default(),
        }
    }

    /// Right-associated fold of a statement sequence; empty folds to `Pass`.
    pub fn seq_all(stmts: Vec<ThStmt>) -> Self {
        let mut iter = stmts.into_iter().rev();
        let Some(last) = iter.next() else {
            return ThStmt::pass(None);
        };
        iter.fold(last, |acc, stmt| ThStmt::seq(stmt, acc))
    }

    pub fn assign(target: ThExpr, value: ThExpr, source: Option<SourceRange>) -> Self {
        ThStmt::Assign {
            target,
            value,
            source: source.into(),
        }
    }

    pub fn if_then(cond: ThExpr, then: ThStmt, orelse: ThStmt, source: Option<SourceRange>) -> Self {
        ThStmt::If {
            cond,
            then: Box::new(then),
            orelse: Box::new(orelse),
            source: source.into(),
        }
    }

    pub fn for_in(
        ident: impl Into<String>,
        iter: ThExpr,
        body: ThStmt,
        source: Option<SourceRange>,
    ) -> Self {
        ThStmt::ForIn {
            ident: ident.into(),
            iter,
            body: Box::new(body),
            source: source.into(),
        }
    }

    pub fn break_stmt(source: Option<SourceRange>) -> Self {
        ThStmt::Break {
            source: source.into(),
        }
    }

    pub fn continue_stmt(source: Option<SourceRange>) -> Self {
        ThStmt::Continue {
            source: source.into(),
        }
    }

    pub fn return_value(value: ThExpr, source: Option<SourceRange>) -> Self {
        ThStmt::Return {
            value,
            source: source.into(),
        }
    }

    pub fn let_in(
        ident: impl Into<String>,
        body: ThStmt,
        init: Option<ThExpr>,
        source: Option<SourceRange>,
    ) -> Self {
        ThStmt::Let {
            ident: ident.into(),
            body: Box::new(body),
            init,
            source: source.into(),
        }
    }

    pub fn fun_def(
        ident: impl Into<String>,
        params: Vec<String>,
        body: ThStmt,
        rest: ThStmt,
        source: Option<SourceRange>,
    ) -> Self {
        ThStmt::FunDef {
            ident: ident.into(),
            params,
            body: Box::new(body),
            rest: Box::new(rest),
            source: source.into(),
        }
    }
}

impl ThExpr {
    pub fn int(value: i64, source: Option<SourceRange>) -> Self {
        ThExpr::Const {
            value: ConstValue::Int(value),
            source: source.into(),
        }
    }

    pub fn float(value: f64, source: Option<SourceRange>) -> Self {
        ThExpr::Const {
            value: ConstValue::Float(value),
            source: source.into(),
        }
    }

    pub fn bool_const(value: bool, source: Option<SourceRange>) -> Self {
        ThExpr::Const {
            value: ConstValue::Bool(value),
            source: source.into(),
        }
    }

    pub fn str_const(value: impl Into<String>, source: Option<SourceRange>) -> Self {
        ThExpr::Const {
            value: ConstValue::Str(value.into()),
            source: source.into(),
        }
    }

    pub fn none(source: Option<SourceRange>) -> Self {
        ThExpr::Const {
            value: ConstValue::None,
            source: source.into(),
        }
    }

    pub fn object(source: Option<SourceRange>) -> Self {
        ThExpr::Object {
            source: source.into(),
        }
    }

    pub fn tuple(items: Vec<ThExpr>, source: Option<SourceRange>) -> Self {
        ThExpr::Tuple {
            items,
            source: source.into(),
        }
    }

    pub fn name(ident: impl Into<String>, source: Option<SourceRange>) -> Self {
        ThExpr::Name {
            ident: ident.into(),
            source: source.into(),
        }
    }

    pub fn attr(base: ThExpr, name: impl Into<String>, source: Option<SourceRange>) -> Self {
        ThExpr::Attr {
            base: Box::new(base),
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn subscr(base: ThExpr, index: ThExpr, source: Option<SourceRange>) -> Self {
        ThExpr::Subscr {
            base: Box::new(base),
            index: Box::new(index),
            source: source.into(),
        }
    }

    pub fn call(callee: ThExpr, args: Vec<ThExpr>, source: Option<SourceRange>) -> Self {
        ThExpr::Call {
            callee: Box::new(callee),
            args,
            source: source.into(),
        }
    }

    pub fn lib_call(
        kind: LibCallKind,
        args: Vec<(String, ThExpr)>,
        source: Option<SourceRange>,
    ) -> Self {
        ThExpr::LibCall {
            kind,
            args,
            source: source.into(),
        }
    }

    pub fn bin_op(op: BinOp, left: ThExpr, right: ThExpr, source: Option<SourceRange>) -> Self {
        ThExpr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            source: source.into(),
        }
    }

    pub fn unary_op(op: UnaryOp, operand: ThExpr, source: Option<SourceRange>) -> Self {
        ThExpr::UnaryOp {
            op,
            operand: Box::new(operand),
            source: source.into(),
        }
    }

    /// True for the left-expressible forms (`Name`, `Attr`, `Subscr`).
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self,
            ThExpr::Name { .. } | ThExpr::Attr { .. } | ThExpr::Subscr { .. }
        )
    }

    pub fn source(&self) -> Option<SourceRange> {
        match self {
            ThExpr::Const { source, .. }
            | ThExpr::Object { source }
            | ThExpr::Tuple { source, .. }
            | ThExpr::Name { source, .. }
            | ThExpr::Attr { source, .. }
            | ThExpr::Subscr { source, .. }
            | ThExpr::Call { source, .. }
            | ThExpr::LibCall { source, .. }
            | ThExpr::BinOp { source, .. }
            | ThExpr::UnaryOp { source, .. } => source.0,
        }
    }
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("    ")?;
    }
    Ok(())
}

fn fmt_stmt(stmt: &ThStmt, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    match stmt {
        ThStmt::Pass { .. } => {
            indent(f, depth)?;
            writeln!(f, "pass")
        }
        ThStmt::Expr { expr, .. } => {
            indent(f, depth)?;
            writeln!(f, "{expr}")
        }
        ThStmt::Seq { first, second, .. } => {
            fmt_stmt(first, f, depth)?;
            fmt_stmt(second, f, depth)
        }
        ThStmt::Assign { target, value, .. } => {
            indent(f, depth)?;
            writeln!(f, "{target} = {value}")
        }
        ThStmt::If {
            cond, then, orelse, ..
        } => {
            indent(f, depth)?;
            writeln!(f, "if {cond}:")?;
            fmt_stmt(then, f, depth + 1)?;
            indent(f, depth)?;
            writeln!(f, "else:")?;
            fmt_stmt(orelse, f, depth + 1)
        }
        ThStmt::ForIn {
            ident, iter, body, ..
        } => {
            indent(f, depth)?;
            writeln!(f, "for {ident} in {iter}:")?;
            fmt_stmt(body, f, depth + 1)
        }
        ThStmt::Break { .. } => {
            indent(f, depth)?;
            writeln!(f, "break")
        }
        ThStmt::Continue { .. } => {
            indent(f, depth)?;
            writeln!(f, "continue")
        }
        ThStmt::Return { value, .. } => {
            indent(f, depth)?;
            writeln!(f, "return {value}")
        }
        ThStmt::Let {
            ident, body, init, ..
        } => {
            indent(f, depth)?;
            match init {
                Some(init) => writeln!(f, "let {ident} = {init}")?,
                None => writeln!(f, "let {ident}")?,
            }
            fmt_stmt(body, f, depth)
        }
        ThStmt::FunDef {
            ident,
            params,
            body,
            rest,
            ..
        } => {
            indent(f, depth)?;
            writeln!(f, "def {ident}({}):", params.join(", "))?;
            fmt_stmt(body, f, depth + 1)?;
            fmt_stmt(rest, f, depth)
        }
    }
}

impl fmt::Display for ThStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_stmt(self, f, 0)
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(value) => write!(f, "{value}"),
            ConstValue::Float(value) => write!(f, "{value}"),
            ConstValue::Bool(true) => f.write_str("True"),
            ConstValue::Bool(false) => f.write_str("False"),
            ConstValue::Str(value) => write!(f, "{value:?}"),
            ConstValue::None => f.write_str("None"),
        }
    }
}

impl fmt::Display for ThExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThExpr::Const { value, .. } => write!(f, "{value}"),
            ThExpr::Object { .. } => f.write_str("object()"),
            ThExpr::Tuple { items, .. } => {
                f.write_str("(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            ThExpr::Name { ident, .. } => f.write_str(ident),
            ThExpr::Attr { base, name, .. } => write!(f, "{base}.{name}"),
            ThExpr::Subscr { base, index, .. } => write!(f, "{base}[{index}]"),
            ThExpr::Call { callee, args, .. } => {
                write!(f, "{callee}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            ThExpr::LibCall { kind, args, .. } => {
                write!(f, "LibCall.{}(", kind.as_str())?;
                for (index, (key, value)) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str(")")
            }
            ThExpr::BinOp {
                op, left, right, ..
            } => write!(f, "({left} {} {right})", op.token()),
            ThExpr::UnaryOp { op, operand, .. } => write!(f, "({}{operand})", op.token()),
        }
    }
}
