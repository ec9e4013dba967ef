//! Input syntax tree produced by the host Python parser.
//!
//! The parser itself lives outside this crate (see [`crate::collect::PyAstParser`]);
//! this module only fixes the node shapes the translator dispatches on. Every
//! node carries an optional byte range so lowered IR can point back into the
//! original buffer. Nodes synthesized by the frontend carry no range.

use crate::span::SourceRange;

#[derive(Debug, PartialEq, Clone)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: Option<SourceRange>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self { kind, range: None }
    }

    pub fn with_range(kind: StmtKind, range: SourceRange) -> Self {
        Self {
            kind,
            range: Some(range),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum StmtKind {
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    /// `a = e`, or the chained `a = b = e` with several targets.
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    /// `import a.b [as x], c [as y]`
    Import {
        modules: Vec<ImportModule>,
    },
    /// `from [dots]m import x [as y], …` — `names: None` encodes `import *`.
    ImportFrom {
        qual_path: String,
        names: Option<Vec<ImportName>>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Pass,
    Raise(Option<Expr>),
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
    },
    Del(Vec<Expr>),
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    Expr(Expr),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ImportModule {
    /// Dotted module path, e.g. `"torch.nn"`.
    pub qual_path: String,
    pub alias: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    /// Empty for the bare `*` keyword-only separator.
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Expr>,
}

impl Parameter {
    pub fn simple(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Simple,
            default: None,
        }
    }

    pub fn with_default(name: &str, default: Expr) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Simple,
            default: Some(default),
        }
    }

    pub fn vararg(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::VarArgList,
            default: None,
        }
    }

    pub fn kwarg(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::VarArgDictionary,
            default: None,
        }
    }
}

/// Parameter category reported by the host parser.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParamKind {
    Simple,
    VarArgList,
    VarArgDictionary,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: Option<SourceRange>,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self { kind, range: None }
    }

    pub fn with_range(kind: ExprKind, range: SourceRange) -> Self {
        Self {
            kind,
            range: Some(range),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExprKind {
    Name(String),
    Number(NumberLit),
    Str(String),
    /// Adjacent string literals (`"a" "b"`), concatenated at lowering.
    StringList(Vec<String>),
    Constant(ConstantLit),
    Ellipsis,
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Dict(Vec<DictEntry>),
    /// List/set/dict/generator comprehension; kept opaque, dropped at lowering.
    Comprehension(CompKind),
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    MemberAccess {
        base: Box<Expr>,
        member: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Ternary {
        test: Box<Expr>,
        then: Box<Expr>,
        orelse: Box<Expr>,
    },
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum NumberLit {
    Int(i64),
    Float(f64),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConstantLit {
    True,
    False,
    None,
}

#[derive(Debug, PartialEq, Clone)]
pub enum DictEntry {
    KeyValue(Expr, Expr),
    /// `{**other}` expansion entry.
    Expand(Expr),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompKind {
    List,
    Set,
    Dict,
    Generator,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Argument {
    pub value: Expr,
    pub kind: ArgKind,
}

impl Argument {
    pub fn positional(value: Expr) -> Self {
        Self {
            value,
            kind: ArgKind::Positional,
        }
    }

    pub fn keyword(name: &str, value: Expr) -> Self {
        Self {
            value,
            kind: ArgKind::Keyword(name.to_string()),
        }
    }

    pub fn unpack_list(value: Expr) -> Self {
        Self {
            value,
            kind: ArgKind::UnpackList,
        }
    }

    pub fn unpack_dict(value: Expr) -> Self {
        Self {
            value,
            kind: ArgKind::UnpackDict,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ArgKind {
    Positional,
    Keyword(String),
    /// `*args` at a call site.
    UnpackList,
    /// `**kwargs` at a call site.
    UnpackDict,
}

/// Binary operators as the host parser reports them. `Gt`/`Gte`/`IsNot`/`NotIn`
/// have no IR counterpart; `names::map_bin_op` normalizes them away.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
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
    IsNot,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    Invert,
}
