// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use chumsky::prelude::*;
use chumsky::{extra, pratt};

use crate::ast::*;
use crate::diag::Diagnostic;
use crate::lexer::{Token, TokenKind};
use crate::token::Tok;

pub type ParseError<'src> = chumsky::error::Rich<'src, Tok>;
pub type PExtra<'src> = extra::Err<ParseError<'src>>;

/// Parse a lexed token stream into a `Program`.
///
/// Syntax errors are accumulated rather than fatal: a malformed class is
/// skipped up to the next `class` keyword and the classes after it are
/// still parsed. `None` is returned only when no program shape could be
/// recovered at all.
pub fn parse_program(tokens: &[Token]) -> (Option<Program>, Vec<Diagnostic>) {
    let mut kinds = Vec::with_capacity(tokens.len());
    let mut positions = Vec::with_capacity(tokens.len());
    let mut diags = Vec::new();

    for tok in tokens {
        match &tok.kind {
            TokenKind::Tok(k) => {
                kinds.push(k.clone());
                positions.push((tok.line, tok.column));
            }
            // An error token is a hard stop: nothing after it can be trusted.
            TokenKind::Error(msg) => {
                diags.push(Diagnostic::new(format!(
                    "cannot parse past lexical error at line {}, column {}: {msg}",
                    tok.line, tok.column
                )));
                break;
            }
            TokenKind::Eof => break,
        }
    }

    let (out, errs) = program_parser().parse(kinds.as_slice()).into_output_errors();

    for e in &errs {
        let at = e.span().start;
        let loc = positions
            .get(at.min(positions.len().saturating_sub(1)))
            .map(|(l, c)| format!(" at line {l}, column {c}"))
            .unwrap_or_default();
        diags.push(Diagnostic::new(format!("{e}{loc}")));
    }

    let program = out.map(|classes| Program {
        classes: classes.into_iter().flatten().collect(),
    });
    (program, diags)
}

fn program_parser<'src>() -> impl Parser<'src, &'src [Tok], Vec<Option<Class>>, PExtra<'src>> {
    // Resynchronize at the next `class` keyword so one bad class does not
    // take the rest of the program with it.
    let skip_class = just(Tok::KwClass)
        .ignore_then(any().and_is(just(Tok::KwClass).not()).repeated())
        .map(|_| None);

    class_parser()
        .then_ignore(just(Tok::Semi))
        .map(Some)
        .recover_with(via_parser(skip_class))
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
}

fn class_parser<'src>() -> impl Parser<'src, &'src [Tok], Class, PExtra<'src>> {
    just(Tok::KwClass)
        .ignore_then(type_id())
        .then(just(Tok::KwInherits).ignore_then(type_id()).or_not())
        .then(
            just(Tok::LBrace)
                .ignore_then(
                    feature_parser()
                        .then_ignore(just(Tok::Semi))
                        .repeated()
                        .collect::<Vec<_>>(),
                )
                .then_ignore(just(Tok::RBrace)),
        )
        .map(|((name, parent), features)| Class {
            name,
            parent,
            features,
        })
}

fn feature_parser<'src>() -> impl Parser<'src, &'src [Tok], Feature, PExtra<'src>> {
    let method = obj_id()
        .then(
            just(Tok::LParen)
                .ignore_then(
                    formal_parser()
                        .separated_by(just(Tok::Comma))
                        .collect::<Vec<_>>(),
                )
                .then_ignore(just(Tok::RParen)),
        )
        .then_ignore(just(Tok::Colon))
        .then(type_id())
        .then(
            just(Tok::LBrace)
                .ignore_then(expr_parser())
                // tolerate `{ e; }`: a stray terminator before the closing
                // brace is common in teaching material
                .then_ignore(just(Tok::Semi).or_not())
                .then_ignore(just(Tok::RBrace)),
        )
        .map(|(((name, formals), ret_type), body)| Feature::Method {
            name,
            formals,
            ret_type,
            body,
        });

    let attr = obj_id()
        .then_ignore(just(Tok::Colon))
        .then(type_id())
        .then(just(Tok::Assign).ignore_then(expr_parser()).or_not())
        .map(|((name, ty), init)| Feature::Attr { name, ty, init });

    method.or(attr)
}

fn formal_parser<'src>() -> impl Parser<'src, &'src [Tok], Formal, PExtra<'src>> {
    obj_id()
        .then_ignore(just(Tok::Colon))
        .then(type_id())
        .map(|(name, ty)| Formal { name, ty })
}

fn type_id<'src>() -> impl Parser<'src, &'src [Tok], String, PExtra<'src>> {
    select! { Tok::TypeId(s) => s }.or(just(Tok::SelfType).to("SELF_TYPE".to_string()))
}

fn obj_id<'src>() -> impl Parser<'src, &'src [Tok], String, PExtra<'src>> {
    select! { Tok::ObjId(s) => s }
}

fn literal<'src>() -> impl Parser<'src, &'src [Tok], Expr, PExtra<'src>> {
    select! {
        Tok::Int(n) => Expr::Int(n),
        Tok::Str(s) => Expr::Str(s),
        Tok::KwTrue => Expr::Bool(true),
        Tok::KwFalse => Expr::Bool(false),
    }
}

pub fn expr_parser<'src>() -> impl Parser<'src, &'src [Tok], Expr, PExtra<'src>> {
    recursive(|expr| {
        let paren = just(Tok::LParen)
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::RParen))
            .map(|e| Expr::Paren(Box::new(e)));

        // Assignment sits at the bottom of the precedence ladder: its
        // right-hand side swallows a full expression. `self` is accepted
        // as a target here so the analyzer can reject it with a proper
        // message instead of a parse error.
        let assign = obj_id()
            .or(just(Tok::SelfId).to("self".to_string()))
            .then_ignore(just(Tok::Assign))
            .then(expr.clone())
            .map(|(name, e)| Expr::Assign {
                name,
                expr: Box::new(e),
            });

        let self_id = just(Tok::SelfId).to(Expr::Self_);
        let id = obj_id().map(Expr::Id);

        let block = just(Tok::LBrace)
            .ignore_then(
                expr.clone()
                    .then_ignore(just(Tok::Semi))
                    .repeated()
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(Tok::RBrace))
            .map(Expr::Block);

        let if_ = just(Tok::KwIf)
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::KwThen))
            .then(expr.clone())
            .then_ignore(just(Tok::KwElse))
            .then(expr.clone())
            .then_ignore(just(Tok::KwFi))
            .map(|((cond, then_), else_)| Expr::If {
                cond: Box::new(cond),
                then_: Box::new(then_),
                else_: Box::new(else_),
            });

        let while_ = just(Tok::KwWhile)
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::KwLoop))
            .then(expr.clone())
            .then_ignore(just(Tok::KwPool))
            .map(|(cond, body)| Expr::While {
                cond: Box::new(cond),
                body: Box::new(body),
            });

        let let_binding = obj_id()
            .then_ignore(just(Tok::Colon))
            .then(type_id())
            .then(just(Tok::Assign).ignore_then(expr.clone()).or_not())
            .map(|((name, ty), init)| LetBinding { name, ty, init });

        let let_ = just(Tok::KwLet)
            .ignore_then(
                let_binding
                    .separated_by(just(Tok::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(Tok::KwIn))
            .then(expr.clone())
            .map(|(bindings, body)| Expr::Let {
                bindings,
                body: Box::new(body),
            });

        let case_arm = obj_id()
            .then_ignore(just(Tok::Colon))
            .then(type_id())
            .then_ignore(just(Tok::Darrow))
            .then(expr.clone())
            .then_ignore(just(Tok::Semi))
            .map(|((name, ty), expr)| CaseArm { name, ty, expr });

        let case_ = just(Tok::KwCase)
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::KwOf))
            .then(case_arm.repeated().at_least(1).collect::<Vec<_>>())
            .then_ignore(just(Tok::KwEsac))
            .map(|(e, arms)| Expr::Case {
                expr: Box::new(e),
                arms,
            });

        let new_ = just(Tok::KwNew).ignore_then(type_id()).map(Expr::New);

        let atom = choice((
            if_,
            while_,
            let_,
            case_,
            block,
            new_,
            assign,
            paren,
            literal(),
            self_id,
            id,
        ));

        // args: ( [expr (, expr)*]? )
        let args = just(Tok::LParen)
            .ignore_then(expr.clone().separated_by(just(Tok::Comma)).collect::<Vec<_>>())
            .then_ignore(just(Tok::RParen));

        // Implicit-self dispatch: id(args) => self.id(args)
        let implicit_call = obj_id().then(args.clone()).map(|(name, args)| Expr::Dispatch {
            recv: Box::new(Expr::Self_),
            static_type: None,
            method: name,
            args,
        });
        let primary = implicit_call.or(atom);

        // recv [@TYPE] . id(args), left-folded for chained calls
        let dispatch_step = just(Tok::At)
            .ignore_then(type_id())
            .or_not()
            .then_ignore(just(Tok::Dot))
            .then(obj_id())
            .then(args)
            .map(|((static_ty, method), args)| (static_ty, method, args));

        let postfix = primary
            .then(dispatch_step.repeated().collect::<Vec<_>>())
            .map(|(base, steps)| {
                steps
                    .into_iter()
                    .fold(base, |recv, (static_type, method, args)| Expr::Dispatch {
                        recv: Box::new(recv),
                        static_type,
                        method,
                        args,
                    })
            });

        // Binding powers, loosest to tightest: equality, relational, sum,
        // product, unary prefix. Dispatch is handled above as a postfix fold.
        let pratt_expr = postfix.pratt((
            pratt::infix(pratt::left(1), just(Tok::Eq), |lhs, _, rhs, _| Expr::Bin {
                op: BinOp::Eq,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            pratt::infix(pratt::left(2), just(Tok::Lt), |lhs, _, rhs, _| Expr::Bin {
                op: BinOp::Lt,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            pratt::infix(pratt::left(2), just(Tok::Le), |lhs, _, rhs, _| Expr::Bin {
                op: BinOp::Le,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            pratt::infix(pratt::left(3), just(Tok::Plus), |lhs, _, rhs, _| Expr::Bin {
                op: BinOp::Add,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            pratt::infix(pratt::left(3), just(Tok::Minus), |lhs, _, rhs, _| Expr::Bin {
                op: BinOp::Sub,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            pratt::infix(pratt::left(4), just(Tok::Star), |lhs, _, rhs, _| Expr::Bin {
                op: BinOp::Mul,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            pratt::infix(pratt::left(4), just(Tok::Slash), |lhs, _, rhs, _| Expr::Bin {
                op: BinOp::Div,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
            pratt::prefix(5, just(Tok::Tilde), |_, rhs, _| Expr::Neg(Box::new(rhs))),
            pratt::prefix(5, just(Tok::KwIsVoid), |_, rhs, _| {
                Expr::IsVoid(Box::new(rhs))
            }),
            pratt::prefix(5, just(Tok::KwNot), |_, rhs, _| Expr::Not(Box::new(rhs))),
        ));

        pratt_expr.boxed()
    })
}
