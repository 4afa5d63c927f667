use super::*;
use logos::Logos;

#[test]
fn test_basic_tokens() {
    let input = "
    var<private> a : vec3<f32> = vec3<f32>(1.0, 2.5f, 3.);
    ";
    let mut lexer = Token::lexer(input);

    assert_eq!(lexer.next(), Some(Ok(Token::KeywordVar)));
    assert_eq!(lexer.next(), Some(Ok(Token::Less)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("private".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Greater)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("a".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Colon)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("vec3".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Less)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("f32".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Greater)));
    assert_eq!(lexer.next(), Some(Ok(Token::Equal)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("vec3".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Less)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("f32".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Greater)));
    assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
    assert_eq!(lexer.next(), Some(Ok(Token::Float(1.0))));
    assert_eq!(lexer.next(), Some(Ok(Token::Comma)));
    assert_eq!(lexer.next(), Some(Ok(Token::Float(2.5))));
    assert_eq!(lexer.next(), Some(Ok(Token::Comma)));
    assert_eq!(lexer.next(), Some(Ok(Token::Float(3.0))));
    assert_eq!(lexer.next(), Some(Ok(Token::RParen)));
    assert_eq!(lexer.next(), Some(Ok(Token::Semicolon)));
    assert_eq!(lexer.next(), None);
}

#[test]
fn test_numeric_literals() {
    let mut lexer = Token::lexer("2 7u 1e3 4f");
    assert_eq!(lexer.next(), Some(Ok(Token::Int(2))));
    assert_eq!(lexer.next(), Some(Ok(Token::Uint(7))));
    assert_eq!(lexer.next(), Some(Ok(Token::Float(1000.0))));
    assert_eq!(lexer.next(), Some(Ok(Token::Float(4.0))));
}

#[test]
fn test_operators_take_longest_match() {
    let mut lexer = Token::lexer("a || true && b >> c -> std::glsl");
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("a".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::OrOr)));
    assert_eq!(lexer.next(), Some(Ok(Token::Bool(true))));
    assert_eq!(lexer.next(), Some(Ok(Token::AndAnd)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("b".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::ShiftRight)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("c".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Arrow)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("std".to_string()))));
    assert_eq!(lexer.next(), Some(Ok(Token::Namespace)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ident("glsl".to_string()))));
}

#[test]
fn test_comments_are_skipped() {
    let mut lexer = Token::lexer("discard; // trailing\n_ = a;");
    assert_eq!(lexer.next(), Some(Ok(Token::KeywordDiscard)));
    assert_eq!(lexer.next(), Some(Ok(Token::Semicolon)));
    assert_eq!(lexer.next(), Some(Ok(Token::Underscore)));
    assert_eq!(lexer.next(), Some(Ok(Token::Equal)));
}

#[test]
fn test_tokenize_positions_and_errors() {
    let (tokens, diagnostics) = tokenize("true || if\n  $ a");
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[2].token, Token::KeywordIf);
    assert_eq!(tokens[2].span.begin.line, 1);
    assert_eq!(tokens[2].span.begin.column, 9);
    assert_eq!(tokens[3].span.begin.line, 2);
    assert_eq!(tokens[3].span.begin.column, 5);

    assert!(diagnostics.has_error());
    assert_eq!(diagnostics.error(), "2:3: invalid character sequence '$'");
}
