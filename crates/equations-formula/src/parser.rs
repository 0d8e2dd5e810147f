//! Equation parser
//!
//! A recursive descent parser with operator precedence. Types are checked
//! while parsing: every [`Node`] comes back annotated with the kind it
//! produces, and references to unknown variables or functions, or calls
//! whose arguments do not fit, are rejected here.

use crate::ast::{BinaryOperator, Expr, Node, StaticKind, UnaryOperator};
use crate::error::{ArgMismatch, CompileError, CompileResult};
use crate::functions::{Function, FunctionRegistry};
use equations_core::{coerce, Kind, Value};
use std::collections::HashMap;

/// Declared kind of every variable an equation may reference
pub type VariableTypes = HashMap<String, Kind>;

/// Deepest expression tree the parser builds. Parentheses, function calls,
/// unary signs and every chained binary operator each add a level.
pub const MAX_NESTING: usize = 256;

/// Parse an equation into a typed AST
///
/// # Example
/// ```rust
/// use equations_formula::{builtin_registry, parse_equation, VariableTypes};
/// use equations_core::Kind;
///
/// let mut types = VariableTypes::new();
/// types.insert("x".to_string(), Kind::Float);
///
/// let ast = parse_equation("=1+2", &types, builtin_registry()).unwrap();
/// let ast = parse_equation("=SUM(${x}, 3)", &types, builtin_registry()).unwrap();
/// let ast = parse_equation("=IF($x>0,\"Yes\",\"No\")", &types, builtin_registry()).unwrap();
/// ```
pub fn parse_equation(
    text: &str,
    var_types: &VariableTypes,
    registry: &FunctionRegistry,
) -> CompileResult<Node> {
    let mut parser = EquationParser {
        input: text,
        pos: 0,
        current_token: Token::Eof,
        token_start: 0,
        depth: 0,
        var_types,
        registry,
    };

    // Equation must start with '='
    parser.skip_whitespace();
    if parser.peek_char() != Some('=') {
        return Err(CompileError::new(
            "Equation must start with '='",
            parser.pos,
        ));
    }
    parser.advance();
    parser.advance_token()?;

    let node = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current_token != Token::Eof {
        return Err(CompileError::new(
            format!(
                "Unexpected {} after expression",
                parser.current_token.describe()
            ),
            parser.token_start,
        ));
    }

    Ok(node)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),

    // References
    Variable {
        name: String,
        default: Option<String>,
    },
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::String(s) => format!("string {s:?}"),
            Token::Boolean(true) => "TRUE".to_string(),
            Token::Boolean(false) => "FALSE".to_string(),
            Token::Variable { name, .. } => format!("variable ${{{name}}}"),
            Token::Identifier(name) => format!("identifier {name}"),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::Ampersand => "'&'".to_string(),
            Token::Equal => "'='".to_string(),
            Token::NotEqual => "'<>'".to_string(),
            Token::LessThan => "'<'".to_string(),
            Token::LessEqual => "'<='".to_string(),
            Token::GreaterThan => "'>'".to_string(),
            Token::GreaterEqual => "'>='".to_string(),
            Token::Comma => "','".to_string(),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Eof => "end of equation".to_string(),
        }
    }
}

/// Equation parser
struct EquationParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    /// Byte offset of `current_token`
    token_start: usize,
    /// Current nesting of the tree being built
    depth: usize,
    var_types: &'a VariableTypes,
    registry: &'a FunctionRegistry,
}

impl<'a> EquationParser<'a> {
    // === Token scanning ===

    fn advance_token(&mut self) -> CompileResult<()> {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> CompileResult<Token> {
        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '&' => Some(Token::Ampersand),
            '=' => Some(Token::Equal),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::NotEqual);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            }
            return Ok(Token::GreaterThan);
        }

        if c == '"' {
            return self.scan_string();
        }

        if c == '$' {
            return self.scan_variable();
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(CompileError::new(
            format!("Unexpected character '{c}'"),
            self.pos,
        ))
    }

    fn scan_string(&mut self) -> CompileResult<Token> {
        let start = self.pos;
        self.advance(); // opening quote

        let mut s = String::new();
        loop {
            let Some(c) = self.peek_char() else {
                return Err(CompileError::new("Unterminated string", start));
            };
            match c {
                '"' => {
                    self.advance();
                    return Ok(Token::String(s));
                }
                '\\' => {
                    let escape_at = self.pos;
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(other) => {
                            return Err(CompileError::new(
                                format!("Invalid escape sequence '\\{other}'"),
                                escape_at,
                            ))
                        }
                        None => return Err(CompileError::new("Unterminated string", start)),
                    };
                    s.push(escaped);
                    self.advance();
                }
                _ => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    /// `${name}`, `${name:default}` or `$name`
    fn scan_variable(&mut self) -> CompileResult<Token> {
        let start = self.pos;
        self.advance(); // '$'

        if self.peek_char() != Some('{') {
            let name_start = self.pos;
            while self
                .peek_char()
                .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
            {
                self.advance();
            }
            if self.pos == name_start {
                return Err(CompileError::new(
                    "Expected a variable name after '$'",
                    start,
                ));
            }
            return Ok(Token::Variable {
                name: self.input[name_start..self.pos].to_string(),
                default: None,
            });
        }
        self.advance(); // '{'

        // A backslash escapes the next character in both parts
        let mut name = String::new();
        let mut default: Option<String> = None;
        loop {
            let Some(c) = self.peek_char() else {
                return Err(CompileError::new("Unterminated variable reference", start));
            };
            self.advance();
            let c = match c {
                '}' => break,
                ':' if default.is_none() => {
                    default = Some(String::new());
                    continue;
                }
                '\\' => match self.peek_char() {
                    Some(escaped) => {
                        self.advance();
                        escaped
                    }
                    None => {
                        return Err(CompileError::new(
                            "Unterminated variable reference",
                            start,
                        ))
                    }
                },
                other => other,
            };
            match default.as_mut() {
                Some(default) => default.push(c),
                None => name.push(c),
            }
        }

        if name.is_empty() {
            return Err(CompileError::new("Empty variable name", start));
        }
        Ok(Token::Variable { name, default })
    }

    fn scan_number(&mut self) -> CompileResult<Token> {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            if !self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                return Err(CompileError::new(
                    format!("Invalid number '{}'", &self.input[start..self.pos]),
                    start,
                ));
            }
            self.skip_digits();
        }

        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Token::Number)
            .ok_or_else(|| CompileError::new(format!("Invalid number '{text}'"), start))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Boolean literals, unless followed by '(' (then it's a function call)
        if self.peek_char() != Some('(') {
            if text.eq_ignore_ascii_case("TRUE") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Token::Boolean(false);
            }
        }

        Token::Identifier(text.to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Take the current token and its offset, scanning the next one
    fn consume(&mut self) -> CompileResult<(Token, usize)> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        let offset = self.token_start;
        self.advance_token()?;
        Ok((token, offset))
    }

    fn expect(&mut self, expected: &Token) -> CompileResult<()> {
        if &self.current_token == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(CompileError::new(
                format!(
                    "Expected {}, found {}",
                    expected.describe(),
                    self.current_token.describe()
                ),
                self.token_start,
            ))
        }
    }

    // === Nesting ===

    fn enter(&mut self, offset: usize) -> CompileResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(CompileError::new("Equation is nested too deeply", offset));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^ (right associative)
    // 6. Unary: +, -
    // 7. Primary: literals, variables, function calls, parentheses

    fn parse_expression(&mut self) -> CompileResult<Node> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> CompileResult<Node> {
        let mut left = self.parse_concatenation()?;
        let mut levels = 0;

        loop {
            let op = match self.current_token {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            let (_, offset) = self.consume()?;
            self.enter(offset)?;
            levels += 1;
            let right = self.parse_concatenation()?;
            left = binary(op, left, right, offset)?;
        }

        self.leave(levels);
        Ok(left)
    }

    fn parse_concatenation(&mut self) -> CompileResult<Node> {
        let mut left = self.parse_additive()?;
        let mut levels = 0;

        while self.current_token == Token::Ampersand {
            let (_, offset) = self.consume()?;
            self.enter(offset)?;
            levels += 1;
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right, offset)?;
        }

        self.leave(levels);
        Ok(left)
    }

    fn parse_additive(&mut self) -> CompileResult<Node> {
        let mut left = self.parse_multiplicative()?;
        let mut levels = 0;

        loop {
            let op = match self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            let (_, offset) = self.consume()?;
            self.enter(offset)?;
            levels += 1;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, offset)?;
        }

        self.leave(levels);
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> CompileResult<Node> {
        let mut left = self.parse_exponent()?;
        let mut levels = 0;

        loop {
            let op = match self.current_token {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            let (_, offset) = self.consume()?;
            self.enter(offset)?;
            levels += 1;
            let right = self.parse_exponent()?;
            left = binary(op, left, right, offset)?;
        }

        self.leave(levels);
        Ok(left)
    }

    fn parse_exponent(&mut self) -> CompileResult<Node> {
        let left = self.parse_unary()?;

        if self.current_token == Token::Caret {
            let (_, offset) = self.consume()?;
            self.enter(offset)?;
            let right = self.parse_exponent()?; // Right associative
            self.leave(1);
            return binary(BinaryOperator::Power, left, right, offset);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> CompileResult<Node> {
        let op = match self.current_token {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_primary(),
        };

        let (_, offset) = self.consume()?;
        self.enter(offset)?;
        let operand = self.parse_unary()?;
        self.leave(1);
        check_arithmetic(op.symbol(), &operand)?;
        Ok(Node::new(
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            offset,
            Kind::Float.into(),
        ))
    }

    fn parse_primary(&mut self) -> CompileResult<Node> {
        let (token, offset) = match self.current_token {
            // Don't scan past the end
            Token::Eof => {
                return Err(CompileError::new(
                    "Unexpected end of equation",
                    self.token_start,
                ))
            }
            _ => self.consume()?,
        };

        match token {
            Token::Number(n) => Ok(Node::new(Expr::Number(n), offset, Kind::Float.into())),

            Token::String(s) => Ok(Node::new(Expr::String(s), offset, Kind::String.into())),

            Token::Boolean(b) => Ok(Node::new(Expr::Boolean(b), offset, Kind::Boolean.into())),

            Token::Variable { name, default } => self.variable(name, default, offset),

            Token::LeftParen => {
                self.enter(offset)?;
                let node = self.parse_expression()?;
                self.leave(1);
                self.expect(&Token::RightParen)?;
                Ok(node)
            }

            Token::Identifier(name) => {
                if self.current_token == Token::LeftParen {
                    self.parse_function_call(name, offset)
                } else {
                    Err(CompileError::new(
                        format!("Unknown identifier {name}"),
                        offset,
                    ))
                }
            }

            other => Err(CompileError::new(
                format!("Unexpected {}", other.describe()),
                offset,
            )),
        }
    }

    fn variable(&self, name: String, default: Option<String>, offset: usize) -> CompileResult<Node> {
        let kind = *self.var_types.get(&name).ok_or_else(|| {
            CompileError::new(format!("Unknown variable reference \"${{{name}}}\""), offset)
        })?;

        let default = match default {
            None => None,
            Some(_) if kind.is_list() => {
                return Err(CompileError::new(
                    format!("Variable ${{{name}}} is a {kind} and cannot have a default"),
                    offset,
                ))
            }
            Some(text) => Some(parse_default(&text, kind).ok_or_else(|| {
                CompileError::new(
                    format!("Invalid default \"{text}\" for ${{{name}}} of type {kind}"),
                    offset,
                )
            })?),
        };

        Ok(Node::new(
            Expr::Variable {
                name,
                kind,
                default,
            },
            offset,
            kind.into(),
        ))
    }

    fn parse_function_call(&mut self, name: String, offset: usize) -> CompileResult<Node> {
        let registry = self.registry;
        let function = registry
            .lookup(&name)
            .ok_or_else(|| CompileError::new(format!("Unknown function {name}"), offset))?;
        self.expect(&Token::LeftParen)?;
        self.enter(offset)?;

        let mut args = Vec::new();

        // Parse arguments
        if self.current_token != Token::RightParen {
            args.push(self.parse_expression()?);

            while self.current_token == Token::Comma {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }

        self.leave(1);
        self.expect(&Token::RightParen)?;

        let kinds: Vec<StaticKind> = args.iter().map(|arg| arg.kind).collect();
        let kind = function
            .check_args(&kinds)
            .map_err(|mismatch| call_error(function, &mismatch, offset, &args))?;

        Ok(Node::new(
            Expr::Call {
                name: name.to_uppercase(),
                args,
            },
            offset,
            kind,
        ))
    }
}

/// Build a typed binary node
fn binary(op: BinaryOperator, left: Node, right: Node, offset: usize) -> CompileResult<Node> {
    let kind = if op.is_arithmetic() {
        check_arithmetic(op.symbol(), &left)?;
        check_arithmetic(op.symbol(), &right)?;
        Kind::Float
    } else {
        check_scalar(op.symbol(), &left)?;
        check_scalar(op.symbol(), &right)?;
        if op == BinaryOperator::Concat {
            Kind::String
        } else {
            Kind::Boolean
        }
    };

    Ok(Node::new(
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        offset,
        kind.into(),
    ))
}

fn check_arithmetic(symbol: &str, operand: &Node) -> CompileResult<()> {
    match operand.kind {
        StaticKind::Dynamic => Ok(()),
        StaticKind::Known(Kind::Float | Kind::Integer | Kind::Boolean) => Ok(()),
        StaticKind::Known(kind) => Err(CompileError::new(
            format!("Operator {symbol} cannot be applied to a {kind}"),
            operand.offset,
        )),
    }
}

fn check_scalar(symbol: &str, operand: &Node) -> CompileResult<()> {
    if operand.kind.is_list() {
        return Err(CompileError::new(
            format!("Operator {symbol} cannot be applied to a {}", operand.kind),
            operand.offset,
        ));
    }
    Ok(())
}

/// Compile error for a call whose arguments do not fit
fn call_error(
    function: &dyn Function,
    mismatch: &ArgMismatch,
    name_offset: usize,
    args: &[Node],
) -> CompileError {
    let offset = match mismatch {
        ArgMismatch::WrongKind { ordinal, .. } => args.get(ordinal - 1).map(|arg| arg.offset),
        ArgMismatch::TooMany { max, .. } => args.get(*max).map(|arg| arg.offset),
        ArgMismatch::TooFew { .. } => None,
    };
    CompileError::new(
        crate::functions::mismatch_message(function, mismatch),
        offset.unwrap_or(name_offset),
    )
}

/// Parse a default per the variable's declared scalar kind
fn parse_default(text: &str, kind: Kind) -> Option<Value> {
    match kind {
        Kind::Float => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Float),
        Kind::Integer => text.trim().parse::<i64>().ok().map(Value::Integer),
        Kind::Boolean => coerce::to_boolean(&Value::string(text.trim()))
            .ok()
            .map(Value::Boolean),
        Kind::String => Some(Value::string(text)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::builtin_registry;
    use pretty_assertions::assert_eq;

    fn types() -> VariableTypes {
        let mut types = VariableTypes::new();
        types.insert("x".into(), Kind::Float);
        types.insert("n".into(), Kind::Integer);
        types.insert("s".into(), Kind::String);
        types.insert("b".into(), Kind::Boolean);
        types.insert("list".into(), Kind::FloatList);
        types.insert("a:b}".into(), Kind::Float);
        types
    }

    fn parse(text: &str) -> CompileResult<Node> {
        parse_equation(text, &types(), builtin_registry())
    }

    fn parse_err(text: &str) -> CompileError {
        parse(text).unwrap_err()
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse("=42").unwrap().expr, Expr::Number(42.0));
        assert_eq!(parse("=3.14").unwrap().expr, Expr::Number(3.14));
        assert_eq!(parse("=1e10").unwrap().expr, Expr::Number(1e10));
        assert_eq!(parse("=.5E-1").unwrap().expr, Expr::Number(0.05));
        assert_eq!(parse("=true").unwrap().expr, Expr::Boolean(true));

        let node = parse("=\"say \\\"hi\\\"\\n\"").unwrap();
        assert_eq!(node.expr, Expr::String("say \"hi\"\n".into()));
        assert_eq!(node.kind, StaticKind::Known(Kind::String));
    }

    #[test]
    fn test_parse_precedence() {
        let node = parse("=1+2*3").unwrap();
        let Expr::Binary { op, left, right } = node.expr else {
            panic!("Expected Binary");
        };
        assert_eq!(op, BinaryOperator::Add);
        assert_eq!(left.expr, Expr::Number(1.0));
        assert!(matches!(
            right.expr,
            Expr::Binary {
                op: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_power_is_right_associative() {
        let node = parse("=2^3^4").unwrap();
        let Expr::Binary { op, left, right } = node.expr else {
            panic!("Expected Binary");
        };
        assert_eq!(op, BinaryOperator::Power);
        assert_eq!(left.expr, Expr::Number(2.0));
        assert!(matches!(
            right.expr,
            Expr::Binary {
                op: BinaryOperator::Power,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        let node = parse("=-2^2").unwrap();
        let Expr::Binary { op, left, .. } = node.expr else {
            panic!("Expected Binary");
        };
        assert_eq!(op, BinaryOperator::Power);
        assert!(matches!(
            left.expr,
            Expr::Unary {
                op: UnaryOperator::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_comparison_and_concat_kinds() {
        assert_eq!(parse("=1<2").unwrap().kind, Kind::Boolean.into());
        assert_eq!(parse("=\"a\"&1").unwrap().kind, Kind::String.into());
        assert_eq!(parse("=TRUE+1").unwrap().kind, Kind::Float.into());
        // & binds tighter than comparison
        let node = parse("=\"a\"&\"b\"=\"ab\"").unwrap();
        assert!(matches!(
            node.expr,
            Expr::Binary {
                op: BinaryOperator::Equal,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_variables() {
        let node = parse("=${x}").unwrap();
        assert_eq!(node.kind, Kind::Float.into());
        assert_eq!(
            node.expr,
            Expr::Variable {
                name: "x".into(),
                kind: Kind::Float,
                default: None
            }
        );

        let node = parse("=$n + 1").unwrap();
        assert!(matches!(node.expr, Expr::Binary { .. }));

        let node = parse("=${n:12}").unwrap();
        assert_eq!(
            node.expr,
            Expr::Variable {
                name: "n".into(),
                kind: Kind::Integer,
                default: Some(Value::Integer(12))
            }
        );

        let node = parse("=${a\\:b\\}:2.5}").unwrap();
        assert_eq!(
            node.expr,
            Expr::Variable {
                name: "a:b}".into(),
                kind: Kind::Float,
                default: Some(Value::Float(2.5))
            }
        );

        let node = parse("=${s:hello: world}").unwrap();
        assert_eq!(
            node.expr,
            Expr::Variable {
                name: "s".into(),
                kind: Kind::String,
                default: Some(Value::string("hello: world"))
            }
        );
    }

    #[test]
    fn test_variable_errors() {
        let err = parse_err("=1 + ${nope}");
        assert_eq!(err.message, "Unknown variable reference \"${nope}\"");
        assert_eq!(err.offset, 5);

        let err = parse_err("=${list:1}");
        assert_eq!(err.offset, 1);
        assert!(err.message.contains("cannot have a default"));

        let err = parse_err("=${n:1.5}");
        assert!(err.message.starts_with("Invalid default"));

        let err = parse_err("=${b:maybe}");
        assert!(err.message.starts_with("Invalid default"));

        assert_eq!(parse_err("=${x").message, "Unterminated variable reference");
        assert_eq!(parse_err("=${}").message, "Empty variable name");
        assert_eq!(parse_err("=$ + 1").offset, 1);
    }

    #[test]
    fn test_parse_function_call() {
        let node = parse("=sum(1, ${list}, $n)").unwrap();
        let Expr::Call { name, args } = node.expr else {
            panic!("Expected Call");
        };
        assert_eq!(name, "SUM");
        assert_eq!(args.len(), 3);
        assert_eq!(node.kind, Kind::Float.into());

        let node = parse("=FIRST(${list})").unwrap();
        assert_eq!(node.kind, Kind::Float.into());

        let node = parse("=IF($b, 1, \"no\")").unwrap();
        assert_eq!(node.kind, StaticKind::Dynamic);

        // Dynamic results are accepted anywhere
        assert!(parse("=IF($b, 1, \"no\") + 1").is_ok());

        let node = parse("=PI()").unwrap();
        assert_eq!(node.kind, Kind::Float.into());
    }

    #[test]
    fn test_call_errors_name_the_argument() {
        let err = parse_err("=MID(\"abc\", 1, ${list})");
        assert!(err.message.starts_with("Argument 3 of MID"), "{}", err.message);
        assert_eq!(err.offset, 15);

        let err = parse_err("=NOPE(1)");
        assert_eq!(err.message, "Unknown function NOPE");
        assert_eq!(err.offset, 1);

        let err = parse_err("=MID(\"abc\", 1)");
        assert!(err.message.contains("at least 3"), "{}", err.message);
        assert_eq!(err.offset, 1);

        let err = parse_err("=ABS(1, 2)");
        assert!(err.message.contains("at most 1"), "{}", err.message);
        assert_eq!(err.offset, 8);
    }

    #[test]
    fn test_operator_type_errors() {
        let err = parse_err("=1 + \"a\"");
        assert_eq!(err.offset, 5);
        assert!(err.message.contains("String"));

        let err = parse_err("=-${list}");
        assert_eq!(err.offset, 2);

        let err = parse_err("=${list} = 1");
        assert_eq!(err.offset, 1);

        assert!(parse_err("=${list} & \"x\"").message.contains("List"));
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_err("1+2");
        assert_eq!(err.message, "Equation must start with '='");

        let err = parse_err("=1 2");
        assert_eq!(err.offset, 3);

        let err = parse_err("=\"abc");
        assert_eq!(err.message, "Unterminated string");
        assert_eq!(err.offset, 1);

        let err = parse_err("=(1+2");
        assert_eq!(err.offset, 5);

        let err = parse_err("=1 # 2");
        assert_eq!(err.message, "Unexpected character '#'");
        assert_eq!(err.offset, 3);

        assert_eq!(parse_err("=").message, "Unexpected end of equation");
        assert!(parse_err("=1e+").message.starts_with("Invalid number"));
        assert_eq!(parse_err("=foo").message, "Unknown identifier foo");
    }

    #[test]
    fn test_offsets_are_byte_offsets() {
        let err = parse_err("  =\"é\" + ${nope}");
        // leading spaces (2) + '=' (1) + "\"é\"" (4 bytes) + " + " (3)
        assert_eq!(err.offset, 10);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |open: &str, close: &str, n: usize| {
            format!("={}1{}", open.repeat(n), close.repeat(n))
        };

        assert!(parse(&nested("(", ")", MAX_NESTING)).is_ok());

        let err = parse_err(&nested("(", ")", 10_000));
        assert_eq!(err.message, "Equation is nested too deeply");
        assert_eq!(err.offset, MAX_NESTING + 1);

        let err = parse_err(&nested("-", "", 10_000));
        assert_eq!(err.message, "Equation is nested too deeply");
        assert_eq!(err.offset, MAX_NESTING + 1);

        let err = parse_err(&nested("ABS(", ")", 10_000));
        assert_eq!(err.offset, 1 + 4 * MAX_NESTING);

        // Chained operators deepen the tree too
        let err = parse_err(&format!("=1{}", "+1".repeat(10_000)));
        assert_eq!(err.offset, 2 + 2 * MAX_NESTING);
        let err = parse_err(&format!("=2{}", "^2".repeat(10_000)));
        assert_eq!(err.offset, 2 + 2 * MAX_NESTING);
    }
}
