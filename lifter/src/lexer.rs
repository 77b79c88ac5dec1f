// Lexer for C-family source lines.
//
// A deliberately shallow token scanner: it knows about the tokens the lift
// needs to see (`case`, `default`, identifiers, colons, braces) and about the
// constructs that can hide them (comments, string and character literals).
// Everything else is reported as stray text. Uses the `logos` crate for
// DFA-based lexing.
//
// Preconditions: input is valid UTF-8.
// Postconditions: every byte of the input is covered by a token, a stray span,
//                 or skipped whitespace.
// Failure modes: none; unknown characters become stray spans.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Result of lexing: tokens plus spans of text the lexer has no token for.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub stray: Vec<Span>,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("case")]
    Case,
    #[token("default")]
    Default,

    #[token("::")]
    PathSep,
    #[token(":")]
    Colon,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLit,

    // Keywords win over identifiers of the same length, so `case` is Case
    // and `cases` is Ident.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl Token {
    pub fn is_comment(self) -> bool {
        matches!(self, Token::LineComment | Token::BlockComment)
    }

    /// Tokens whose text is opaque to a brace counter.
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            Token::LineComment | Token::BlockComment | Token::StringLit | Token::CharLit
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Case => write!(f, "case"),
            Token::Default => write!(f, "default"),
            Token::PathSep => write!(f, "::"),
            Token::Colon => write!(f, ":"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LineComment => write!(f, "<line comment>"),
            Token::BlockComment => write!(f, "<block comment>"),
            Token::StringLit => write!(f, "<string>"),
            Token::CharLit => write!(f, "<char>"),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Public API ──

/// Lex a source fragment into tokens and stray spans.
pub fn lex(source: &str) -> LexResult {
    let mut tokens = Vec::new();
    let mut stray = Vec::new();

    for (result, range) in Token::lexer(source).spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => stray.push(span),
        }
    }

    LexResult { tokens, stray }
}

/// True when the fragment holds anything besides whitespace and comments.
pub fn is_code(source: &str) -> bool {
    let result = lex(source);
    !result.stray.is_empty() || result.tokens.iter().any(|(t, _)| !t.is_comment())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(source).tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn case_label() {
        assert_eq!(
            kinds("case OP_ADD:"),
            vec![Token::Case, Token::Ident, Token::Colon]
        );
    }

    #[test]
    fn keyword_vs_ident() {
        assert_eq!(kinds("cases defaults"), vec![Token::Ident, Token::Ident]);
    }

    #[test]
    fn path_separator_is_not_a_colon() {
        assert_eq!(
            kinds("std::cerr"),
            vec![Token::Ident, Token::PathSep, Token::Ident]
        );
    }

    #[test]
    fn comments_swallow_braces() {
        assert_eq!(kinds("// } {"), vec![Token::LineComment]);
        assert_eq!(kinds("/* { */ }"), vec![Token::BlockComment, Token::RBrace]);
    }

    #[test]
    fn block_comment_spans_lines() {
        assert_eq!(kinds("/* a\n } \n*/"), vec![Token::BlockComment]);
    }

    #[test]
    fn literals_swallow_braces() {
        assert_eq!(kinds(r#""{" '}'"#), vec![Token::StringLit, Token::CharLit]);
        assert_eq!(kinds(r#""a\"}""#), vec![Token::StringLit]);
    }

    #[test]
    fn punctuation_is_stray() {
        let result = lex("a = b + 1;");
        assert_eq!(result.tokens.len(), 2);
        assert!(!result.stray.is_empty());
    }

    #[test]
    fn is_code_ignores_comments_and_blanks() {
        assert!(!is_code("   \n"));
        assert!(!is_code("  // note\n"));
        assert!(!is_code("  /* note */ // more\n"));
        assert!(is_code("  break;\n"));
        assert!(is_code("  }\n"));
    }

    #[test]
    fn spans_index_source() {
        let src = "case OP_X:";
        let result = lex(src);
        let (_, span) = result.tokens[1];
        assert_eq!(&src[span.start..span.end], "OP_X");
    }
}
