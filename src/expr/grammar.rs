//! Parser implementation using chumsky

use chumsky::error::RichPattern;
use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::ast::{BinaryOp, Expr};
use super::lexer::{lex, Span, Token};

/// Syntax error in a test expression, before it is tied to a template
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
    pub expected: Vec<String>,
}

/// Parse a test expression into its syntax tree
pub fn parse(input: &str) -> Result<Expr, SyntaxError> {
    let len = input.len();

    let tokens = lex(input).map_err(|span| SyntaxError {
        message: format!("unexpected input '{}'", &input[span.clone()]),
        span,
        expected: Vec::new(),
    })?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    expr_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => SyntaxError::from(err),
            None => SyntaxError {
                span: 0..len,
                message: "invalid expression".to_string(),
                expected: Vec::new(),
            },
        })
}

fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let expr = recursive(|expr| {
        let literal = select! {
            Token::Number(n) => Expr::Number(n),
            Token::String(s) => Expr::Text(s),
            Token::Placeholder(p) => Expr::Reference(p),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Null => Expr::Null,
            Token::Undefined => Expr::Null,
        }
        .labelled("value");

        let atom = literal.or(expr.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)));

        let unary = just(Token::Not)
            .repeated()
            .foldr(atom, |_, operand| Expr::Not(Box::new(operand)));

        let comparison_op = select! {
            Token::StrictEqual => BinaryOp::StrictEqual,
            Token::StrictNotEqual => BinaryOp::StrictNotEqual,
            Token::Equal => BinaryOp::Equal,
            Token::NotEqual => BinaryOp::NotEqual,
            Token::Less => BinaryOp::Less,
            Token::LessOrEqual => BinaryOp::LessOrEqual,
            Token::Greater => BinaryOp::Greater,
            Token::GreaterOrEqual => BinaryOp::GreaterOrEqual,
        };

        let comparison = unary.clone().foldl(
            comparison_op.then(unary).repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        );

        let conjunction = comparison.clone().foldl(
            just(Token::And)
                .to(BinaryOp::And)
                .then(comparison)
                .repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        );

        conjunction
            .clone()
            .foldl(
                just(Token::Or).to(BinaryOp::Or).then(conjunction).repeated(),
                |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
            )
            .boxed()
    });

    expr.then_ignore(end())
}

impl<'a> From<Rich<'a, Token>> for SyntaxError {
    fn from(err: Rich<'a, Token>) -> Self {
        let message = match err.found() {
            Some(tok) => format!("unexpected {}", format_token(tok)),
            None => "unexpected end of expression".to_string(),
        };

        let expected = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of expression".to_string()),
                _ => None,
            })
            .collect();

        // end-of-input spans can come out reversed after trailing whitespace
        let span = err.span().into_range();
        SyntaxError {
            span: span.start.min(span.end)..span.start.max(span.end),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Placeholder(p) => format!("placeholder '{{{{{}}}}}'", p),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Number(n) => format!("number {}", n),
        Token::True => "'true'".to_string(),
        Token::False => "'false'".to_string(),
        Token::Null => "'null'".to_string(),
        Token::Undefined => "'undefined'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Not => "'!'".to_string(),
        Token::And => "'&&'".to_string(),
        Token::Or => "'||'".to_string(),
        Token::StrictEqual => "'==='".to_string(),
        Token::StrictNotEqual => "'!=='".to_string(),
        Token::Equal => "'=='".to_string(),
        Token::NotEqual => "'!='".to_string(),
        Token::Less => "'<'".to_string(),
        Token::LessOrEqual => "'<='".to_string(),
        Token::Greater => "'>'".to_string(),
        Token::GreaterOrEqual => "'>='".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(path: &str) -> Expr {
        Expr::Reference(path.to_string())
    }

    #[test]
    fn test_parse_comparison() {
        let expr = parse("{{age}} >= 18").expect("Should parse");
        assert_eq!(
            expr,
            Expr::binary(BinaryOp::GreaterOrEqual, reference("age"), Expr::Number(18.0))
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("true || false && false").expect("Should parse");
        assert_eq!(
            expr,
            Expr::binary(
                BinaryOp::Or,
                Expr::Bool(true),
                Expr::binary(BinaryOp::And, Expr::Bool(false), Expr::Bool(false)),
            )
        );
    }

    #[test]
    fn test_comparison_binds_tighter_than_and() {
        let expr = parse("{{a}} == 1 && {{b}} != 'x'").expect("Should parse");
        match expr {
            Expr::Binary { op, lhs, rhs } => {
                assert_eq!(op, BinaryOp::And);
                assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Equal, .. }));
                assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::NotEqual, .. }));
            }
            other => panic!("Expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_and_negation() {
        let expr = parse("!(true || {{x}})").expect("Should parse");
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::binary(
                BinaryOp::Or,
                Expr::Bool(true),
                reference("x"),
            )))
        );
    }

    #[test]
    fn test_double_negation() {
        let expr = parse("!!{{x}}").expect("Should parse");
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::Not(Box::new(reference("x")))))
        );
    }

    #[test]
    fn test_missing_operand_error() {
        let err = parse("{{a}} ==").expect_err("Should fail");
        assert_eq!(err.message, "unexpected end of expression");
    }

    #[test]
    fn test_unbalanced_parenthesis_error() {
        assert!(parse("(true").is_err());
        assert!(parse("true)").is_err());
    }

    #[test]
    fn test_unknown_input_error() {
        let err = parse("{{a}} = 1").expect_err("Should fail");
        assert_eq!(err.span.start, 6);
        assert!(err.message.contains('='));
    }

    #[test]
    fn test_empty_expression_error() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }
}
