//! Built-in Tools
//!
//! Small general-purpose tools that are always safe to expose.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{ChatError, Result};
use crate::tool::{ParameterSchema, Tool, ToolSchema};

/// DateTime tool - returns current time
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "datetime".into(),
            description: "Get the current date and time (UTC)".into(),
            parameters: vec![
                ParameterSchema::new("format", "string", "Output format: 'iso', 'human', or 'unix'")
                    .one_of(vec![json!("iso"), json!("human"), json!("unix")]),
            ],
        }
    }

    async fn execute(&self, arguments: &Value) -> Result<Value> {
        let format = arguments
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or("human");

        let now = chrono::Utc::now();

        let value = match format {
            "iso" => json!(now.to_rfc3339()),
            "unix" => json!(now.timestamp()),
            "human" => json!(now.format("%A, %B %d, %Y at %H:%M:%S UTC").to_string()),
            other => {
                return Err(ChatError::ToolValidation(format!("Unknown format: {other}")));
            }
        };

        Ok(json!({ "datetime": value }))
    }
}

/// Calculator tool - evaluates arithmetic expressions
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "calculate".into(),
            description: "Evaluate an arithmetic expression with + - * / ^ and parentheses".into(),
            parameters: vec![
                ParameterSchema::new(
                    "expression",
                    "string",
                    "Expression to evaluate (e.g., '2 + 2', '(3 - 1) * 4')",
                )
                .required(),
            ],
        }
    }

    async fn execute(&self, arguments: &Value) -> Result<Value> {
        let expr = arguments
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ChatError::ToolValidation("expression must be a string".into()))?;

        let result = evaluate(expr).map_err(ChatError::ToolExecution)?;
        Ok(json!({ "expression": expr, "result": result }))
    }
}

/// Longest expression the calculator accepts, in bytes
pub const MAX_EXPRESSION_LEN: usize = 4096;

/// Deepest nesting of parentheses, unary minus and `^` chains
pub const MAX_NESTING_DEPTH: usize = 64;

/// Evaluate an arithmetic expression.
///
/// Grammar: `expr = term (('+'|'-') term)*`, `term = power (('*'|'/') power)*`,
/// `power = unary ('^' power)?`, `unary = '-' unary | atom`.
pub fn evaluate(expr: &str) -> std::result::Result<f64, String> {
    if expr.len() > MAX_EXPRESSION_LEN {
        return Err(format!("Expression longer than {MAX_EXPRESSION_LEN} bytes"));
    }
    let tokens: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    if tokens.is_empty() {
        return Err("Empty expression".into());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        return Err(format!("Unexpected '{c}' at position {}", parser.pos));
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err("Result is not a finite number".into())
    }
}

struct Parser {
    tokens: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`]
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<f64, String>,
    ) -> std::result::Result<f64, String> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err("Expression nested too deeply".into());
        }
        self.depth += 1;
        let value = f(self);
        self.depth -= 1;
        value
    }

    fn expr(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.power()?;
        loop {
            if self.eat('*') {
                value *= self.power()?;
            } else if self.eat('/') {
                let divisor = self.power()?;
                if divisor == 0.0 {
                    return Err("Division by zero".into());
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    fn power(&mut self) -> std::result::Result<f64, String> {
        let base = self.unary()?;
        if self.eat('^') {
            // right-associative
            let exponent = self.nested(Self::power)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> std::result::Result<f64, String> {
        if self.eat('-') {
            return Ok(-self.nested(Self::unary)?);
        }
        self.atom()
    }

    fn atom(&mut self) -> std::result::Result<f64, String> {
        if self.eat('(') {
            let value = self.nested(Self::expr)?;
            if !self.eat(')') {
                return Err("Missing closing parenthesis".into());
            }
            return Ok(value);
        }

        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => format!("Unexpected '{c}' at position {start}"),
                None => "Unexpected end of expression".into(),
            });
        }
        let literal: String = self.tokens[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|e| format!("Invalid number '{literal}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ToolExecutor, ToolRegistry};

    fn approx(expr: &str, expected: f64) {
        let got = evaluate(expr).unwrap();
        assert!((got - expected).abs() < 1e-9, "{expr} = {got}, expected {expected}");
    }

    #[test]
    fn test_calculator() {
        approx("2 + 2", 4.0);
        approx("10 * 5", 50.0);
        approx("(2 + 3) * 4", 20.0);
        approx("2 ^ 8", 256.0);
        approx("2 ^ 3 ^ 2", 512.0);
        approx("10 - 4 - 3", 3.0);
        approx("-3 * -(2 + 1)", 9.0);
        approx("7 / 2", 3.5);
    }

    #[test]
    fn test_calculator_errors() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("2 + x").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        approx(&nested(MAX_NESTING_DEPTH), 1.0);
        assert_eq!(
            evaluate(&nested(MAX_NESTING_DEPTH + 1)).unwrap_err(),
            "Expression nested too deeply"
        );
        assert!(evaluate(&format!("{}1", "-".repeat(1_000))).is_err());
        assert!(evaluate(&format!("{}2", "2^".repeat(1_000))).is_err());
    }

    #[tokio::test]
    async fn test_deep_expression_is_a_tool_error() {
        let mut registry = ToolRegistry::new();
        registry.register(CalculatorTool);

        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = registry
            .execute_tool("calculate", &json!({ "expression": deep }))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ToolExecution(_)));

        let nested = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
        let err = registry
            .execute_tool("calculate", &json!({ "expression": nested }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::ToolExecution(ref m) if m == "Expression nested too deeply"
        ));
    }

    #[tokio::test]
    async fn test_builtins_in_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(DateTimeTool);
        registry.register(CalculatorTool);

        assert_eq!(registry.names(), vec!["calculate", "datetime"]);

        let out = registry
            .execute_tool("calculate", &json!({"expression": "6 * 7"}))
            .await
            .unwrap();
        assert_eq!(out["result"], 42.0);

        let unix = registry
            .execute_tool("datetime", &json!({"format": "unix"}))
            .await
            .unwrap();
        assert!(unix["datetime"].as_i64().unwrap() > 0);
    }
}
