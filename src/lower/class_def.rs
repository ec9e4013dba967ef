//! Class desugaring.
//!
//! A class lowers to an object-building block: allocate the class record,
//! store class attributes, emit methods as `FunDef`s bound onto the record,
//! then synthesize `__new__` and `__call__` so instantiation and instance
//! dispatch work through ordinary calls plus the `__mro__` scan.

use crate::ast::{
    Argument, ClassDef, Expr, ExprKind, FunctionDef, Parameter, Stmt, StmtKind,
};
use crate::span::SourceRange;
use crate::thir::{LibCallKind, ThExpr, ThStmt};

use super::{LowerError, Translator};

/// One emission of the class block, in order. Plain statements chain with
/// `Seq`; functions nest everything after them into their continuation.
enum Piece {
    Plain(ThStmt),
    Fun {
        name: String,
        params: Vec<String>,
        body: ThStmt,
        assign: ThStmt,
        range: Option<SourceRange>,
    },
}

pub(super) struct ClassPieces {
    pieces: Vec<Piece>,
}

impl ClassPieces {
    /// Folds the emission list into one statement, threading `rest` (the
    /// statements following the class in its block) through the innermost
    /// continuation.
    pub(super) fn assemble(self, rest: Option<ThStmt>) -> ThStmt {
        let mut acc = rest;
        for piece in self.pieces.into_iter().rev() {
            acc = Some(match piece {
                Piece::Plain(stmt) => match acc {
                    Some(tail) => ThStmt::seq(stmt, tail),
                    None => stmt,
                },
                Piece::Fun {
                    name,
                    params,
                    body,
                    assign,
                    range,
                } => {
                    let continuation = match acc {
                        Some(tail) => ThStmt::seq(assign, tail),
                        None => assign,
                    };
                    ThStmt::fun_def(name, params, body, continuation, range)
                }
            });
        }
        acc.unwrap_or_else(|| ThStmt::pass(None))
    }
}

pub(super) fn lower_class_pieces(
    translator: &mut Translator,
    class: &ClassDef,
    range: Option<SourceRange>,
) -> Result<ClassPieces, LowerError> {
    let class_name = class.name.as_str();
    let mut pieces = Vec::new();

    pieces.push(Piece::Plain(ThStmt::assign(
        ThExpr::name(class_name, None),
        ThExpr::object(None),
        range,
    )));

    // Class attributes first: plain single-name assignments store onto the
    // class record; every other non-definition statement is unsupported at
    // class level and drops to Pass.
    for stmt in &class.body {
        match &stmt.kind {
            StmtKind::FunctionDef(_) | StmtKind::Pass => {}
            StmtKind::Assign { targets, value } => match targets.as_slice() {
                [Expr {
                    kind: ExprKind::Name(attr),
                    ..
                }] => {
                    let value = translator.lower_expr(value)?;
                    pieces.push(Piece::Plain(ThStmt::assign(
                        ThExpr::attr(ThExpr::name(class_name, None), attr.clone(), None),
                        value,
                        stmt.range,
                    )));
                }
                _ => pieces.push(Piece::Plain(ThStmt::pass(stmt.range))),
            },
            _ => pieces.push(Piece::Plain(ThStmt::pass(stmt.range))),
        }
    }

    let user_init = class.body.iter().find_map(|stmt| match &stmt.kind {
        StmtKind::FunctionDef(def) if def.name == "__init__" => Some(def),
        _ => None,
    });
    let has_call = class.body.iter().any(|stmt| {
        matches!(&stmt.kind, StmtKind::FunctionDef(def) if def.name == "__call__")
    });

    // `__init__` is emitted even when the user did not write one; the
    // synthetic default delegates to the base class.
    match user_init {
        Some(def) => pieces.push(lower_method(translator, class_name, def, "__init__")?),
        None => {
            let default_init = default_init_def();
            pieces.push(lower_method(translator, class_name, &default_init, "__init__")?);
        }
    }

    for stmt in &class.body {
        let StmtKind::FunctionDef(def) = &stmt.kind else {
            continue;
        };
        match def.name.as_str() {
            "__init__" | "__new__" => {}
            // Instances dispatch `__call__` through the trampoline installed
            // by `__new__`, so the method itself moves aside.
            "__call__" => pieces.push(lower_method(translator, class_name, def, "self$call")?),
            _ => pieces.push(lower_method(translator, class_name, def, &def.name)?),
        }
    }

    pieces.push(synth_new(class_name, has_call));
    pieces.push(synth_call(class_name, user_init));

    // Linear MRO, no C3: (C, B1, ..., object).
    let mut mro_items = vec![ThExpr::name(class_name, None)];
    for base in &class.bases {
        mro_items.push(translator.lower_expr(base)?);
    }
    let last_is_object = class
        .bases
        .last()
        .is_some_and(|base| matches!(&base.kind, ExprKind::Name(name) if name == "object"));
    if !last_is_object {
        mro_items.push(ThExpr::name("object", None));
    }
    pieces.push(Piece::Plain(ThStmt::assign(
        ThExpr::attr(ThExpr::name(class_name, None), "__mro__", None),
        ThExpr::tuple(mro_items, None),
        range,
    )));
    pieces.push(Piece::Plain(ThStmt::assign(
        ThExpr::attr(ThExpr::name(class_name, None), "__name__", None),
        ThExpr::str_const(class_name, None),
        range,
    )));

    Ok(ClassPieces { pieces })
}

/// Lowers one method: the shared function machinery, wrapped so `super()`
/// can read `__class__` and `__self__`, bound onto the class under
/// `attr_name` in the continuation.
fn lower_method(
    translator: &mut Translator,
    class_name: &str,
    def: &FunctionDef,
    attr_name: &str,
) -> Result<Piece, LowerError> {
    let parts = translator.lower_function_parts(def)?;

    let mut body = parts.body;
    if let Some(first_param) = parts.params.first().cloned() {
        body = ThStmt::let_in(
            "__self__",
            body,
            Some(ThExpr::name(first_param, None)),
            None,
        );
    }
    body = ThStmt::let_in("__class__", body, Some(ThExpr::name(class_name, None)), None);

    let fun_name = format!("{class_name}${attr_name}");
    let bound = match parts.set_default {
        Some(extra) => {
            let mut kv = vec![("$func".to_string(), ThExpr::name(fun_name.clone(), None))];
            kv.extend(extra);
            ThExpr::lib_call(LibCallKind::SetDefault, kv, None)
        }
        None => ThExpr::name(fun_name.clone(), None),
    };
    let assign = ThStmt::assign(
        ThExpr::attr(ThExpr::name(class_name, None), attr_name, None),
        bound,
        None,
    );

    Ok(Piece::Fun {
        name: fun_name,
        params: parts.params,
        body,
        assign,
        range: None,
    })
}

/// `def __init__(self, *args, **kwargs): super().__init__(*args, **kwargs)`
fn default_init_def() -> FunctionDef {
    let super_call = Expr::new(ExprKind::Call {
        callee: Box::new(Expr::new(ExprKind::Name("super".to_string()))),
        args: vec![],
    });
    let delegate = Expr::new(ExprKind::Call {
        callee: Box::new(Expr::new(ExprKind::MemberAccess {
            base: Box::new(super_call),
            member: "__init__".to_string(),
        })),
        args: vec![
            Argument::unpack_list(Expr::new(ExprKind::Name("args".to_string()))),
            Argument::unpack_dict(Expr::new(ExprKind::Name("kwargs".to_string()))),
        ],
    });
    FunctionDef {
        name: "__init__".to_string(),
        params: vec![
            Parameter::simple("self"),
            Parameter::vararg("args"),
            Parameter::kwarg("kwargs"),
        ],
        body: vec![Stmt::new(StmtKind::Expr(delegate))],
    }
}

/// `C$__new__(cls)`: allocate through `super().__new__(C)`, self-identify by
/// address, and install the `__call__` trampoline when the class defines one.
fn synth_new(class_name: &str, has_call: bool) -> Piece {
    let fun_name = format!("{class_name}$__new__");

    let super_call = ThExpr::lib_call(
        LibCallKind::Super,
        vec![
            ("baseClass".to_string(), ThExpr::name("__class__", None)),
            ("self".to_string(), ThExpr::name("__self__", None)),
        ],
        None,
    );
    let alloc = ThExpr::call(
        ThExpr::attr(super_call, "__new__", None),
        vec![ThExpr::name(class_name, None)],
        None,
    );

    // Objects self-identify by address.
    let addr_assign = ThStmt::assign(
        ThExpr::attr(ThExpr::name("self", None), "$addr", None),
        ThExpr::name("self", None),
        None,
    );
    let return_self = ThStmt::return_value(ThExpr::name("self", None), None);

    let tail = if has_call {
        let forward = ThStmt::return_value(
            ThExpr::lib_call(
                LibCallKind::CallKv,
                vec![
                    (
                        "$func".to_string(),
                        ThExpr::attr(ThExpr::name("self", None), "self$call", None),
                    ),
                    ("$varargs".to_string(), ThExpr::name("args", None)),
                    ("$kwargs".to_string(), ThExpr::name("kwargs", None)),
                ],
                None,
            ),
            None,
        );
        let install = ThStmt::assign(
            ThExpr::attr(ThExpr::name("self", None), "__call__", None),
            ThExpr::lib_call(
                LibCallKind::SetDefault,
                vec![
                    ("$func".to_string(), ThExpr::name("__call__$TMP$", None)),
                    ("$varargsName".to_string(), ThExpr::str_const("args", None)),
                    ("$kwargsName".to_string(), ThExpr::str_const("kwargs", None)),
                ],
                None,
            ),
            None,
        );
        ThStmt::fun_def(
            "__call__$TMP$",
            vec!["args".to_string(), "kwargs".to_string()],
            forward,
            ThStmt::seq(install, return_self),
            None,
        )
    } else {
        return_self
    };

    let body = ThStmt::let_in("self", ThStmt::seq(addr_assign, tail), Some(alloc), None);
    let body = ThStmt::let_in("__self__", body, Some(ThExpr::name("cls", None)), None);
    let body = ThStmt::let_in(
        "__class__",
        body,
        Some(ThExpr::name(class_name, None)),
        None,
    );

    let assign = ThStmt::assign(
        ThExpr::attr(ThExpr::name(class_name, None), "__new__", None),
        ThExpr::name(fun_name.clone(), None),
        None,
    );

    Piece::Fun {
        name: fun_name,
        params: vec!["cls".to_string()],
        body,
        assign,
        range: None,
    }
}

/// `C$__call__`: allocate, copy the MRO onto the instance, run `__init__`,
/// return the instance. Inherits `__init__`'s exact parameter names when
/// they are simple positionals with no defaults, so `C(1, 2)` stays a direct
/// `Call`; otherwise takes `(*args, **kwargs)` and dispatches through
/// `callKV`.
fn synth_call(class_name: &str, user_init: Option<&FunctionDef>) -> Piece {
    let fun_name = format!("{class_name}$__call__");

    let simple_params = user_init.and_then(|init| {
        let all_simple = init.params.iter().all(|param| {
            matches!(param.kind, crate::ast::ParamKind::Simple) && param.default.is_none()
        });
        all_simple.then(|| {
            init.params
                .iter()
                .skip(1)
                .map(|param| param.name.clone())
                .collect::<Vec<_>>()
        })
    });

    let alloc = ThExpr::call(
        ThExpr::attr(ThExpr::name(class_name, None), "__new__", None),
        vec![ThExpr::name(class_name, None)],
        None,
    );
    let mro_copy = ThStmt::assign(
        ThExpr::attr(ThExpr::name("self", None), "__mro__", None),
        ThExpr::attr(ThExpr::name(class_name, None), "__mro__", None),
        None,
    );
    let return_self = ThStmt::return_value(ThExpr::name("self", None), None);

    let (params, init_call, bound) = match simple_params {
        Some(param_names) => {
            let mut args = vec![ThExpr::name("self", None)];
            args.extend(param_names.iter().map(|name| ThExpr::name(name.clone(), None)));
            let init_call = ThStmt::expr(
                ThExpr::call(
                    ThExpr::attr(ThExpr::name(class_name, None), "__init__", None),
                    args,
                    None,
                ),
                None,
            );
            let bound = ThExpr::name(fun_name.clone(), None);
            (param_names, init_call, bound)
        }
        None => {
            let init_call = ThStmt::expr(
                ThExpr::lib_call(
                    LibCallKind::CallKv,
                    vec![
                        (
                            "$func".to_string(),
                            ThExpr::attr(ThExpr::name(class_name, None), "__init__", None),
                        ),
                        ("param$0".to_string(), ThExpr::name("self", None)),
                        ("$varargs".to_string(), ThExpr::name("args", None)),
                        ("$kwargs".to_string(), ThExpr::name("kwargs", None)),
                    ],
                    None,
                ),
                None,
            );
            let bound = ThExpr::lib_call(
                LibCallKind::SetDefault,
                vec![
                    ("$func".to_string(), ThExpr::name(fun_name.clone(), None)),
                    ("$varargsName".to_string(), ThExpr::str_const("args", None)),
                    ("$kwargsName".to_string(), ThExpr::str_const("kwargs", None)),
                ],
                None,
            );
            (
                vec!["args".to_string(), "kwargs".to_string()],
                init_call,
                bound,
            )
        }
    };

    let body = ThStmt::let_in(
        "self",
        ThStmt::seq(mro_copy, ThStmt::seq(init_call, return_self)),
        Some(alloc),
        None,
    );

    let assign = ThStmt::assign(
        ThExpr::attr(ThExpr::name(class_name, None), "__call__", None),
        bound,
        None,
    );

    Piece::Fun {
        name: fun_name,
        params,
        body,
        assign,
        range: None,
    }
}
