use bytes::Bytes;
use folio_core::PdfError;
use folio_core::io::{Buffer, LogicalStream};
use folio_core::parser::{Lexer, Token, TokenType};

fn collect_tokens(data: &'static [u8]) -> Vec<Token> {
    let mut lexer = Lexer::new(Buffer::new(data));
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next_token() {
        let (_, token) = result.expect("tokenize");
        tokens.push(token);
    }
    tokens
}

fn keyword(k: &str) -> Token {
    Token::Keyword(k.into())
}

#[test]
fn test_lexer_basic_tokens() {
    let tokens = collect_tokens(b"BT /F1 12 Tf (Hello) Tj ET");

    assert_eq!(
        tokens,
        vec![
            keyword("BT"),
            Token::Name("F1".to_string()),
            Token::Int(12),
            keyword("Tf"),
            Token::String(b"Hello".to_vec()),
            keyword("Tj"),
            keyword("ET"),
        ]
    );
}

#[test]
fn test_lexer_hex_string_whitespace() {
    let tokens = collect_tokens(b"<48 65 6C 6C 6F> Tj");
    assert_eq!(
        tokens,
        vec![Token::HexString(b"Hello".to_vec()), keyword("Tj")]
    );
}

#[test]
fn test_lexer_hex_string_odd_digits_pads_low_nibble() {
    let tokens = collect_tokens(b"<4F3> Tj");
    assert_eq!(tokens, vec![Token::HexString(vec![0x4f, 0x30]), keyword("Tj")]);
}

#[test]
fn test_lexer_name_hex_escape() {
    assert_eq!(
        collect_tokens(b"/foo#5fbar"),
        vec![Token::Name("foo_bar".to_string())]
    );
}

#[test]
fn test_lexer_skips_comments() {
    assert_eq!(collect_tokens(b"% comment\nBT"), vec![keyword("BT")]);
}

#[test]
fn test_lexer_delimiters_and_numbers() {
    let tokens = collect_tokens(b"<< /A [1 2.5 -3 .25] >>");
    assert_eq!(
        tokens,
        vec![
            Token::DictStart,
            Token::Name("A".to_string()),
            Token::ArrayStart,
            Token::Int(1),
            Token::Real(2.5),
            Token::Int(-3),
            Token::Real(0.25),
            Token::ArrayEnd,
            Token::DictEnd,
        ]
    );
}

#[test]
fn test_lexer_literal_string_escapes() {
    assert_eq!(
        collect_tokens(b"(a\\(b\\)\\n\\101)"),
        vec![Token::String(b"a(b)\nA".to_vec())]
    );
    assert_eq!(
        collect_tokens(b"(a(b)c)"),
        vec![Token::String(b"a(b)c".to_vec())]
    );
    assert_eq!(
        collect_tokens(b"(line\\\ncontinued)"),
        vec![Token::String(b"linecontinued".to_vec())]
    );
}

#[test]
fn test_lexer_constants() {
    assert_eq!(
        collect_tokens(b"true false null"),
        vec![Token::Bool(true), Token::Bool(false), Token::Null]
    );
}

#[test]
fn test_lexer_token_types() {
    let types: Vec<TokenType> = collect_tokens(b"1 <00> re [")
        .iter()
        .map(Token::token_type)
        .collect();
    assert_eq!(
        types,
        vec![
            TokenType::Literal,
            TokenType::Hex,
            TokenType::Keyword,
            TokenType::Delimiter
        ]
    );
}

#[test]
fn test_lexer_stray_delimiters_are_errors() {
    let cases: [&'static [u8]; 4] = [b") x", b"{", b"}", b"> x"];
    for data in cases {
        let mut lexer = Lexer::new(Buffer::new(data));
        let result = lexer.next_token().expect("token");
        assert!(
            matches!(result, Err(PdfError::TokenError { pos: 0, .. })),
            "{data:?}"
        );
    }
}

#[test]
fn test_lexer_unterminated_string() {
    let mut lexer = Lexer::new(Buffer::new(&b"(abc"[..]));
    assert!(matches!(
        lexer.next_token(),
        Some(Err(PdfError::UnexpectedEof))
    ));
}

#[test]
fn test_lexer_reports_token_positions() {
    let mut lexer = Lexer::new(Buffer::new(&b"BT  /F1"[..]));
    assert_eq!(lexer.next_token().unwrap().unwrap().0, 0);
    assert_eq!(lexer.next_token().unwrap().unwrap().0, 4);
    assert!(lexer.next_token().is_none());
}

#[test]
fn test_lexer_has_more_skips_trailing_comments() {
    let mut lexer = Lexer::new(Buffer::new(&b"q  % trailing\n "[..]));
    assert!(lexer.has_more());
    lexer.next_token().unwrap().unwrap();
    assert!(!lexer.has_more());
}

#[test]
fn test_lexer_tokens_straddle_bodies() {
    let bodies = ["/Fo", "nt 1", "2 T", "f"]
        .iter()
        .map(|&part| Bytes::from_static(part.as_bytes()))
        .collect();
    let mut lexer = Lexer::new(LogicalStream::new(bodies));
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next_token() {
        tokens.push(result.unwrap().1);
    }
    assert_eq!(
        tokens,
        vec![Token::Name("Font".to_string()), Token::Int(12), keyword("Tf")]
    );
}
