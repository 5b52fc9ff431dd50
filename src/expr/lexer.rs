//! Lexer for test expressions using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Comparison operators (longer patterns first)
    #[token("===")]
    StrictEqual,
    #[token("!==")]
    StrictNotEqual,
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessOrEqual,
    #[token(">=")]
    GreaterOrEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,

    // Logical operators
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,

    // Keyword literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,

    /// `{{ path }}` reference into the production data
    #[regex(r"\{\{[^}]*\}\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 2].trim().to_string()
    })]
    Placeholder(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice()))]
    String(String),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

/// Strip the surrounding quotes and resolve backslash escapes
fn unquote(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Tokenize an expression. Fails with the span of the first input that is
/// not part of the expression language.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, Span> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| tok.map(|t| (t, span.clone())).map_err(|_| span))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            tokens("=== !== == != <= >= < >"),
            vec![
                Token::StrictEqual,
                Token::StrictNotEqual,
                Token::Equal,
                Token::NotEqual,
                Token::LessOrEqual,
                Token::GreaterOrEqual,
                Token::Less,
                Token::Greater,
            ]
        );
    }

    #[test]
    fn test_placeholder_and_literals() {
        assert_eq!(
            tokens("{{ user.age }} >= 18 && 'a\\'b' != \"c\""),
            vec![
                Token::Placeholder("user.age".to_string()),
                Token::GreaterOrEqual,
                Token::Number(18.0),
                Token::And,
                Token::String("a'b".to_string()),
                Token::NotEqual,
                Token::String("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_quoted_placeholder_is_a_string() {
        assert_eq!(
            tokens("'{{kind}}'"),
            vec![Token::String("{{kind}}".to_string())]
        );
    }

    #[test]
    fn test_keywords_and_negative_numbers() {
        assert_eq!(
            tokens("!(true || null) == -1.5"),
            vec![
                Token::Not,
                Token::ParenOpen,
                Token::True,
                Token::Or,
                Token::Null,
                Token::ParenClose,
                Token::Equal,
                Token::Number(-1.5),
            ]
        );
    }

    #[test]
    fn test_identifiers_are_rejected() {
        assert_eq!(lex("alert(1)").map_err(|span| span.start), Err(0));
    }

    #[test]
    fn test_single_ampersand_is_rejected() {
        assert!(lex("true & false").is_err());
    }
}
