//! Test expressions for `if` directives
//!
//! A closed boolean language over data references: comparisons, `&&`,
//! `||`, `!`, parentheses, and string/number/boolean/null literals.
//! `{{ path }}` placeholders resolve against the production data; nothing
//! in an expression can run code.
//!
//! ```text
//! {{user.age}} >= 18 && '{{user.role}}' != 'guest'
//! ```

pub mod ast;
mod eval;
mod grammar;
pub mod lexer;

pub use ast::{BinaryOp, Expr};
pub use grammar::SyntaxError;

use crate::data::{Data, Value};
use crate::error::ExpressionError;

/// A parsed test expression together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct TestExpression {
    source: String,
    expr: Expr,
}

impl TestExpression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let expr = grammar::parse(source).map_err(|e| ExpressionError::syntax(source, e))?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Value of the expression for the given data
    pub fn value(&self, data: &Data) -> Value {
        eval::eval(&self.expr, data)
    }

    /// Whether the expression holds for the given data.
    ///
    /// Only a boolean `true` holds; a bare reference to a truthy number or
    /// string does not.
    pub fn evaluate(&self, data: &Data) -> bool {
        matches!(self.value(data), Value::Bool(true))
    }
}

/// Parse and evaluate a test expression in one step
pub fn evaluate(expression: &str, data: &Data) -> Result<bool, ExpressionError> {
    Ok(TestExpression::parse(expression)?.evaluate(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_true_and_false() {
        let data = Data::new().with("n", 2);
        assert_eq!(evaluate("{{n}} == 2", &data).ok(), Some(true));
        assert_eq!(evaluate("{{n}} != 2", &data).ok(), Some(false));
    }

    #[test]
    fn test_evaluate_malformed_keeps_expression_text() {
        let err = evaluate("{{n}} == == 2", &Data::new()).expect_err("Should fail");
        assert_eq!(err.expression, "{{n}} == == 2");
        assert!(err.to_string().contains("{{n}} == == 2"));
    }

    #[test]
    fn test_only_boolean_true_holds() {
        let data = Data::new()
            .with("flag", true)
            .with("count", 3)
            .with("text", "false");
        assert_eq!(evaluate("{{flag}}", &data).ok(), Some(true));
        assert_eq!(evaluate("{{count}}", &data).ok(), Some(false));
        assert_eq!(evaluate("{{text}}", &data).ok(), Some(false));
        assert_eq!(evaluate("!!{{count}}", &data).ok(), Some(true));
    }

    #[test]
    fn test_parsed_expression_is_reusable() {
        let test = TestExpression::parse("{{x}} > 1").expect("Should parse");
        assert!(test.evaluate(&Data::new().with("x", 5)));
        assert!(!test.evaluate(&Data::new().with("x", 0)));
        assert_eq!(test.source(), "{{x}} > 1");
    }
}
