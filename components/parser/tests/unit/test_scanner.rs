use parser::{Scanner, TokenKind};

#[test]
fn test_scan_statement() {
    let tokens: Vec<_> = Scanner::new("print a.b(1, \"s\");").collect();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Print,
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::String,
            TokenKind::RightParen,
            TokenKind::Semicolon,
        ]
    );
    assert_eq!(tokens[7].lexeme, "\"s\"");
}

#[test]
fn test_reserved_words_without_syntax() {
    let kinds: Vec<_> = Scanner::new("this super").map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::This, TokenKind::Super]);
}

#[test]
fn test_line_tracking() {
    let lines: Vec<_> = Scanner::new("a\nb\n\nc").map(|t| t.line).collect();
    assert_eq!(lines, vec![1, 2, 4]);
}
