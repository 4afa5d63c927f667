use std::fmt;

use logos::Logos;
use tracing::debug;

use crate::diagnostic::Diagnostics;
use crate::source::{LineIndex, Span};

#[cfg(test)]
pub mod test;

fn parse_float(lex: &mut logos::Lexer<Token>) -> Option<f32> {
    lex.slice().trim_end_matches('f').parse::<f32>().ok()
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \n\r\t\f]+")] // whitespace
#[logos(skip r"//[^\n]*")] // line comments
#[derive(Clone)]
pub enum Token {
    #[regex(r"true|false", |lex| lex.slice().parse::<bool>().ok())]
    Bool(bool),

    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?f?", parse_float)]
    #[regex(r"[0-9]+([eE][+-]?[0-9]+f?|f)", parse_float)]
    Float(f32),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i32>().ok(), priority = 3)]
    Int(i32),

    #[regex(r"[0-9]+u", |lex| lex.slice().trim_end_matches('u').parse::<u32>().ok())]
    Uint(u32),

    #[regex(r#""[^"\n]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    String(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("~")]
    Tilde,

    #[token("&")]
    And,

    #[token("&&")]
    AndAnd,

    #[token("|")]
    Or,

    #[token("||")]
    OrOr,

    #[token("^")]
    Xor,

    #[token("<<")]
    ShiftLeft,

    #[token(">>")]
    ShiftRight,

    #[token("==")]
    EqualEqual,

    #[token("!=")]
    NotEqual,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("<=")]
    LessEqual,

    #[token(">=")]
    GreaterEqual,

    #[token("=")]
    Equal,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("::")]
    Namespace,

    #[token(".")]
    Period,

    #[token("->")]
    Arrow,

    #[token("@")]
    Attr,

    #[token("_", priority = 3)]
    Underscore,

    #[token("var")]
    KeywordVar,

    #[token("const")]
    KeywordConst,

    #[token("fn")]
    KeywordFn,

    #[token("return")]
    KeywordReturn,

    #[token("if")]
    KeywordIf,

    #[token("else")]
    KeywordElse,

    #[token("loop")]
    KeywordLoop,

    #[token("continuing")]
    KeywordContinuing,

    #[token("break")]
    KeywordBreak,

    #[token("continue")]
    KeywordContinue,

    #[token("discard")]
    KeywordDiscard,

    #[token("type")]
    KeywordType,

    #[token("import")]
    KeywordImport,

    #[token("as")]
    KeywordAs,

    #[token("entry_point")]
    KeywordEntryPoint,

    #[token("diagnostic")]
    KeywordDiagnostic,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Bool(b) => return write!(f, "{}", b),
            Token::Float(v) => return write!(f, "{}", v),
            Token::Int(v) => return write!(f, "{}", v),
            Token::Uint(v) => return write!(f, "{}u", v),
            Token::String(s) => return write!(f, "\"{}\"", s),
            Token::Ident(s) => return write!(f, "{}", s),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::And => "&",
            Token::AndAnd => "&&",
            Token::Or => "|",
            Token::OrOr => "||",
            Token::Xor => "^",
            Token::ShiftLeft => "<<",
            Token::ShiftRight => ">>",
            Token::EqualEqual => "==",
            Token::NotEqual => "!=",
            Token::Less => "<",
            Token::Greater => ">",
            Token::LessEqual => "<=",
            Token::GreaterEqual => ">=",
            Token::Equal => "=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Namespace => "::",
            Token::Period => ".",
            Token::Arrow => "->",
            Token::Attr => "@",
            Token::Underscore => "_",
            Token::KeywordVar => "var",
            Token::KeywordConst => "const",
            Token::KeywordFn => "fn",
            Token::KeywordReturn => "return",
            Token::KeywordIf => "if",
            Token::KeywordElse => "else",
            Token::KeywordLoop => "loop",
            Token::KeywordContinuing => "continuing",
            Token::KeywordBreak => "break",
            Token::KeywordContinue => "continue",
            Token::KeywordDiscard => "discard",
            Token::KeywordType => "type",
            Token::KeywordImport => "import",
            Token::KeywordAs => "as",
            Token::KeywordEntryPoint => "entry_point",
            Token::KeywordDiagnostic => "diagnostic",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexes `source` completely. Unrecognized input is reported and skipped.
pub fn tokenize(source: &str) -> (Vec<SpannedToken>, Diagnostics) {
    let index = LineIndex::new(source);
    let mut tokens = vec![];
    let mut diagnostics = Diagnostics::new();

    for (token, range) in Token::lexer(source).spanned() {
        let span = index.span(source, range.clone());
        match token {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => diagnostics.add_error(
                span,
                format!("invalid character sequence '{}'", &source[range]),
            ),
        }
    }

    debug!(tokens = tokens.len(), "lexed source");
    (tokens, diagnostics)
}

/// Position just past the last byte of `source`, used for end-of-input errors.
pub fn end_of_input(source: &str) -> Span {
    let index = LineIndex::new(source);
    index.span(source, source.len()..source.len())
}
