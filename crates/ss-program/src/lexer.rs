//! Lexer for the compiled instruction-stream format.

use logos::Logos;
use std::fmt;

/// Token type for the compiled StoryScript stream.
///
/// The grammar is line-oriented: newlines separate statements, so `Newline`
/// is a real token rather than skipped whitespace. Command names and label
/// identifiers are both `Token::Word`; the loader tells them apart from
/// position.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// Left bracket `[`.
    LBracket,
    /// Right bracket `]`.
    RBracket,
    /// Comma separator `,`.
    Comma,
    /// Colon `:` (label declarations and `value:label` pairs).
    Colon,
    /// Branch-target arrow `->`.
    Arrow,
    /// Newline character (statement separator).
    Newline,
    /// Double-quoted string literal.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Bare word (command name, label, or variable reference).
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Arrow => write!(f, "->"),
            Token::Newline => write!(f, "newline"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Int(n) => write!(f, "{n}"),
            Token::Word(w) => write!(f, "{w}"),
        }
    }
}

/// Internal logos token — borrows from source to avoid allocations during
/// lexing. Converted to owned `Token` after lexing.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\r]+")]
enum RawToken {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("->")]
    Arrow,

    #[token("\n")]
    Newline,

    #[regex(r#""[^"\n]*""#)]
    Str,

    #[regex(r"-?[0-9]+")]
    Int,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Word,
}

/// A lexer error with source location.
#[derive(Debug, Clone)]
pub struct LexError {
    /// Byte range of the erroneous input in the source.
    pub span: std::ops::Range<usize>,
    /// Human-readable description of the lexer error.
    pub message: String,
}

/// Lex stream text into a sequence of `(Token, Span)` pairs.
///
/// Returns the token stream and any lexer errors. Lexing continues past
/// errors to collect as many tokens as possible; the loader reports the
/// first error and aborts the load.
pub fn lex(source: &str) -> (Vec<(Token, std::ops::Range<usize>)>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(raw) => {
                let token = match raw {
                    RawToken::LParen => Token::LParen,
                    RawToken::RParen => Token::RParen,
                    RawToken::LBracket => Token::LBracket,
                    RawToken::RBracket => Token::RBracket,
                    RawToken::Comma => Token::Comma,
                    RawToken::Colon => Token::Colon,
                    RawToken::Arrow => Token::Arrow,
                    RawToken::Newline => Token::Newline,
                    RawToken::Str => {
                        let slice = lexer.slice();
                        Token::Str(slice[1..slice.len() - 1].to_string())
                    }
                    RawToken::Int => match lexer.slice().parse::<i64>() {
                        Ok(n) => Token::Int(n),
                        Err(_) => {
                            errors.push(LexError {
                                span: span.clone(),
                                message: format!("invalid integer literal: {}", lexer.slice()),
                            });
                            continue;
                        }
                    },
                    RawToken::Word => Token::Word(lexer.slice().to_string()),
                };
                tokens.push((token, span));
            }
            Err(()) => {
                errors.push(LexError {
                    span: span.clone(),
                    message: format!("unexpected character: {:?}", &source[span.clone()]),
                });
            }
        }
    }

    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_instruction_line() {
        let (tokens, errors) = lex("narrate(\"Hello\")");
        assert!(errors.is_empty(), "errors: {errors:?}");

        let rendered: Vec<_> = tokens.iter().map(|(t, _)| format!("{t}")).collect();
        assert_eq!(rendered, vec!["narrate", "(", "\"Hello\"", ")"]);
    }

    #[test]
    fn lex_label_declaration() {
        let (tokens, errors) = lex("start:");
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 2);
        assert!(matches!(&tokens[0].0, Token::Word(w) if w == "start"));
        assert!(matches!(&tokens[1].0, Token::Colon));
    }

    #[test]
    fn lex_branch_arrow() {
        let (tokens, errors) = lex("choice(\"A\", \"B\") -> [la, lb]");
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|(t, _)| matches!(t, Token::Arrow)));
        assert!(tokens.iter().any(|(t, _)| matches!(t, Token::LBracket)));
    }

    #[test]
    fn lex_negative_integer() {
        let (tokens, errors) = lex("assign(x, -12)");
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|(t, _)| matches!(t, Token::Int(-12))));
    }

    #[test]
    fn lex_newlines_are_tokens() {
        let (tokens, errors) = lex("end()\nstart:");
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|(t, _)| matches!(t, Token::Newline)));
    }

    #[test]
    fn lex_unexpected_character() {
        let (_, errors) = lex("narrate(@)");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unexpected character"));
    }

    #[test]
    fn lex_preserves_spans() {
        let (tokens, _) = lex("goto done");
        assert_eq!(tokens[0].1, 0..4);
        assert_eq!(tokens[1].1, 5..9);
    }

    #[test]
    fn lex_unterminated_string_is_error() {
        let (_, errors) = lex("narrate(\"oops)");
        assert!(!errors.is_empty());
    }
}
