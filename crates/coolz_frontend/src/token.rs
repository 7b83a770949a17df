// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::fmt;

use logos::{FilterResult, Logos};

/// Token kinds produced by the logos state machine.
///
/// Keyword matching is case-insensitive and wins over identifier
/// classification; logos resolves the overlap by pattern priority, and
/// longest-match keeps `classes` an object identifier rather than `class`.
#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(error = String)]
#[logos(skip r"[ \t\r\n\f\v]+")]
#[logos(skip r"--[^\n]*")]
pub enum Tok {
    // Keywords
    #[regex(r"(?i:class)")]
    KwClass,
    #[regex(r"(?i:inherits)")]
    KwInherits,
    #[regex(r"(?i:if)")]
    KwIf,
    #[regex(r"(?i:then)")]
    KwThen,
    #[regex(r"(?i:else)")]
    KwElse,
    #[regex(r"(?i:fi)")]
    KwFi,
    #[regex(r"(?i:while)")]
    KwWhile,
    #[regex(r"(?i:loop)")]
    KwLoop,
    #[regex(r"(?i:pool)")]
    KwPool,
    #[regex(r"(?i:let)")]
    KwLet,
    #[regex(r"(?i:in)")]
    KwIn,
    #[regex(r"(?i:case)")]
    KwCase,
    #[regex(r"(?i:of)")]
    KwOf,
    #[regex(r"(?i:esac)")]
    KwEsac,
    #[regex(r"(?i:new)")]
    KwNew,
    #[regex(r"(?i:isvoid)")]
    KwIsVoid,
    #[regex(r"(?i:not)")]
    KwNot,

    #[regex(r"(?i:true)")]
    KwTrue,
    #[regex(r"(?i:false)")]
    KwFalse,

    // Special identifiers
    #[token("self")]
    SelfId,
    #[token("SELF_TYPE")]
    SelfType,

    // Symbols / operators
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("@")]
    At,

    #[token("<-")]
    Assign,
    #[token("=>")]
    Darrow,
    #[token("<=")]
    Le,
    #[token("<")]
    Lt,
    #[token("=")]
    Eq,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    #[token("~")]
    Tilde,

    // Nested (* ... *) block comments are consumed here so that spans stay
    // accurate for everything after them. The variant itself is never emitted.
    #[token("(*", block_comment)]
    BlockComment,

    // Literals
    #[regex(r"[0-9]+", int_literal)]
    Int(i64),

    #[regex(r#""([^"\\\n]|\\[\s\S])*""#, unescape_string)]
    #[regex(r#""([^"\\\n]|\\[\s\S])*"#, unterminated_string)]
    Str(String),

    // Identifiers
    #[regex(r"[A-Z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    TypeId(String),

    #[regex(r"[a-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    ObjId(String),
}

fn int_literal(lex: &mut logos::Lexer<Tok>) -> Result<i64, String> {
    lex.slice()
        .parse::<i64>()
        .map_err(|_| format!("integer constant out of range: {}", lex.slice()))
}

/// Merge escape sequences in a terminated string literal. An unknown escape
/// passes the escaped character through literally.
fn unescape_string(lex: &mut logos::Lexer<Tok>) -> String {
    let raw = lex.slice();
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('b') => out.push('\u{0008}'),
                Some('t') => out.push('\t'),
                Some('n') => out.push('\n'),
                Some('f') => out.push('\u{000C}'),
                Some('0') => out.push('\0'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => out.push(other),
                None => break,
            }
        } else {
            out.push(c);
        }
    }
    out
}

// A string that reaches EOF or a bare newline before its closing quote.
fn unterminated_string(_lex: &mut logos::Lexer<Tok>) -> Result<String, String> {
    Err("unterminated string constant".to_string())
}

fn block_comment(lex: &mut logos::Lexer<Tok>) -> FilterResult<(), String> {
    let rem = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0usize;

    while i < rem.len() {
        if rem[i] == b'(' && rem.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if rem[i] == b'*' && rem.get(i + 1) == Some(&b')') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return FilterResult::Skip;
            }
        } else {
            i += 1;
        }
    }

    lex.bump(rem.len());
    FilterResult::Error("unterminated block comment".to_string())
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::KwClass => write!(f, "CLASS"),
            Tok::KwInherits => write!(f, "INHERITS"),
            Tok::KwIf => write!(f, "IF"),
            Tok::KwThen => write!(f, "THEN"),
            Tok::KwElse => write!(f, "ELSE"),
            Tok::KwFi => write!(f, "FI"),
            Tok::KwWhile => write!(f, "WHILE"),
            Tok::KwLoop => write!(f, "LOOP"),
            Tok::KwPool => write!(f, "POOL"),
            Tok::KwLet => write!(f, "LET"),
            Tok::KwIn => write!(f, "IN"),
            Tok::KwCase => write!(f, "CASE"),
            Tok::KwOf => write!(f, "OF"),
            Tok::KwEsac => write!(f, "ESAC"),
            Tok::KwNew => write!(f, "NEW"),
            Tok::KwIsVoid => write!(f, "ISVOID"),
            Tok::KwNot => write!(f, "NOT"),
            Tok::KwTrue | Tok::KwFalse => write!(f, "BOOL_CONST"),
            Tok::SelfId => write!(f, "SELF"),
            Tok::SelfType => write!(f, "SELF_TYPE"),
            Tok::LBrace => write!(f, "'{{'"),
            Tok::RBrace => write!(f, "'}}'"),
            Tok::LParen => write!(f, "'('"),
            Tok::RParen => write!(f, "')'"),
            Tok::Colon => write!(f, "':'"),
            Tok::Semi => write!(f, "';'"),
            Tok::Comma => write!(f, "','"),
            Tok::Dot => write!(f, "'.'"),
            Tok::At => write!(f, "'@'"),
            Tok::Assign => write!(f, "'<-'"),
            Tok::Darrow => write!(f, "'=>'"),
            Tok::Le => write!(f, "'<='"),
            Tok::Lt => write!(f, "'<'"),
            Tok::Eq => write!(f, "'='"),
            Tok::Plus => write!(f, "'+'"),
            Tok::Minus => write!(f, "'-'"),
            Tok::Star => write!(f, "'*'"),
            Tok::Slash => write!(f, "'/'"),
            Tok::Tilde => write!(f, "'~'"),
            Tok::BlockComment => write!(f, "COMMENT"),
            Tok::Int(n) => write!(f, "INT_CONST({n})"),
            Tok::Str(s) => write!(f, "STR_CONST({s:?})"),
            Tok::TypeId(s) => write!(f, "TYPEID({s})"),
            Tok::ObjId(s) => write!(f, "OBJECTID({s})"),
        }
    }
}
