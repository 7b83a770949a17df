// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use logos::Logos;

use crate::diag::Diagnostic;
use crate::token::Tok;

/// What a [`Token`] carries besides its position.
///
/// Malformed input becomes an `Error` token with a message instead of
/// aborting the scan, and the stream ends with `Eof` repeated on every
/// subsequent [`Lexer::next_token`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Tok(Tok),
    Error(String),
    Eof,
}

/// One lexed token with its raw source text and 1-based position.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

/// Pull-based lexer over an in-memory source string.
pub struct Lexer<'src> {
    src: &'src str,
    inner: logos::SpannedIter<'src, Tok>,
    line_starts: Vec<usize>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            src,
            inner: Tok::lexer(src).spanned(),
            line_starts,
        }
    }

    fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&s| s <= offset);
        let col = offset - self.line_starts[line - 1] + 1;
        (line as u32, col as u32)
    }

    /// Consume and return exactly one token.
    pub fn next_token(&mut self) -> Token {
        match self.inner.next() {
            None => {
                let (line, column) = self.line_col(self.src.len());
                Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    line,
                    column,
                }
            }
            Some((res, span)) => {
                let (line, column) = self.line_col(span.start);
                let text = self.src[span].to_string();
                let kind = match res {
                    Ok(tok) => TokenKind::Tok(tok),
                    Err(msg) if msg.is_empty() => {
                        TokenKind::Error(format!("unrecognized character: {text}"))
                    }
                    Err(msg) => TokenKind::Error(msg),
                };
                Token {
                    kind,
                    text,
                    line,
                    column,
                }
            }
        }
    }
}

/// Lex a whole source unit, collecting error tokens as diagnostics.
///
/// The returned vector always ends with a single `Eof` token.
pub fn lex(src: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lx = Lexer::new(src);
    let mut tokens = Vec::new();
    let mut diags = Vec::new();

    loop {
        let tok = lx.next_token();
        if let TokenKind::Error(msg) = &tok.kind {
            diags.push(Diagnostic::new(format!(
                "lexical error at line {}, column {}: {msg}",
                tok.line, tok.column
            )));
        }
        let done = matches!(tok.kind, TokenKind::Eof);
        tokens.push(tok);
        if done {
            break;
        }
    }

    (tokens, diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn token_sequence_for_minimal_class() {
        assert_eq!(
            kinds("class Main {};"),
            vec![
                TokenKind::Tok(Tok::KwClass),
                TokenKind::Tok(Tok::TypeId("Main".to_string())),
                TokenKind::Tok(Tok::LBrace),
                TokenKind::Tok(Tok::RBrace),
                TokenKind::Tok(Tok::Semi),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let toks = kinds("ClAsS Main InHeRiTs IO { x : Bool <- tRuE; y : Bool <- False; };");
        assert!(toks.contains(&TokenKind::Tok(Tok::KwClass)));
        assert!(toks.contains(&TokenKind::Tok(Tok::KwInherits)));
        assert!(toks.contains(&TokenKind::Tok(Tok::KwTrue)));
        assert!(toks.contains(&TokenKind::Tok(Tok::KwFalse)));
    }

    #[test]
    fn keyword_prefix_is_still_an_identifier() {
        assert_eq!(
            kinds("classes")[0],
            TokenKind::Tok(Tok::ObjId("classes".to_string()))
        );
    }

    #[test]
    fn string_escapes_are_merged() {
        let toks = kinds(r#""a\tb\nc\\d\"e\0f\qg""#);
        assert_eq!(
            toks[0],
            TokenKind::Tok(Tok::Str("a\tb\nc\\d\"e\0fqg".to_string()))
        );
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let (tokens, diags) = lex("x <- \"oops\ny");
        assert!(tokens
            .iter()
            .any(|t| matches!(&t.kind, TokenKind::Error(m) if m.contains("unterminated string"))));
        assert_eq!(diags.len(), 1);
        // lexing continues past the bad literal
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Tok(Tok::ObjId("y".to_string()))));
    }

    #[test]
    fn unrecognized_character_is_an_error_token() {
        let (tokens, diags) = lex("class ? Main");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].msg.contains("unrecognized character: ?"));
        // the scan keeps going past the bad character
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Tok(Tok::TypeId("Main".to_string()))));
    }

    #[test]
    fn comments_are_folded() {
        let toks = kinds("class Main { -- hi\n (* a (* b *) c *) x : Int; };");
        assert!(toks.contains(&TokenKind::Tok(Tok::ObjId("x".to_string()))));
        assert!(!toks.iter().any(|t| matches!(t, TokenKind::Error(_))));
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let (_, diags) = lex("class Main {}; (* never closed");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].msg.contains("unterminated block comment"));
    }

    #[test]
    fn integer_out_of_range_is_an_error_token() {
        let (tokens, diags) = lex("x <- 99999999999999999999999;");
        assert!(tokens
            .iter()
            .any(|t| matches!(&t.kind, TokenKind::Error(m) if m.contains("out of range"))));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn positions_are_one_based_lines_and_columns() {
        let (tokens, _) = lex("class Main {\n  x : Int;\n};");
        let x = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Tok(Tok::ObjId("x".to_string())))
            .unwrap();
        assert_eq!((x.line, x.column), (2, 3));
    }

    #[test]
    fn eof_repeats() {
        let mut lx = Lexer::new(";");
        assert_eq!(lx.next_token().kind, TokenKind::Tok(Tok::Semi));
        assert_eq!(lx.next_token().kind, TokenKind::Eof);
        assert_eq!(lx.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn two_char_operators_win_over_one_char() {
        assert_eq!(
            kinds("< <- <= = =>")
                .into_iter()
                .take(5)
                .collect::<Vec<_>>(),
            vec![
                TokenKind::Tok(Tok::Lt),
                TokenKind::Tok(Tok::Assign),
                TokenKind::Tok(Tok::Le),
                TokenKind::Tok(Tok::Eq),
                TokenKind::Tok(Tok::Darrow),
            ]
        );
    }
}
