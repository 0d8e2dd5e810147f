//! Equation Abstract Syntax Tree types
//!
//! Every [`Node`] carries the byte offset it was parsed from and the kind
//! the parser resolved for it.

use equations_core::{Kind, KindSet, Value};
use std::fmt;

/// Kind of an expression as far as it is known before running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticKind {
    /// Always produces a value of this kind
    Known(Kind),
    /// Depends on argument values; checked when the equation runs.
    /// A function declaring this return kind is polymorphic.
    Dynamic,
}

impl StaticKind {
    /// The concrete kind, if known
    pub fn known(self) -> Option<Kind> {
        match self {
            StaticKind::Known(kind) => Some(kind),
            StaticKind::Dynamic => None,
        }
    }

    /// Check if this is known to be a list
    pub fn is_list(self) -> bool {
        self.known().map_or(false, Kind::is_list)
    }

    /// Check if a value of this kind may be passed where `accepts` is
    /// expected. Dynamic kinds are accepted everywhere.
    pub fn accepted_by(self, accepts: KindSet) -> bool {
        match self {
            StaticKind::Known(kind) => accepts.accepts(kind),
            StaticKind::Dynamic => true,
        }
    }
}

impl From<Kind> for StaticKind {
    fn from(kind: Kind) -> Self {
        StaticKind::Known(kind)
    }
}

impl fmt::Display for StaticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticKind::Known(kind) => write!(f, "{kind}"),
            StaticKind::Dynamic => f.write_str("Dynamic"),
        }
    }
}

/// A typed, located expression
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub expr: Expr,
    /// Byte offset into the equation text
    pub offset: usize,
    pub kind: StaticKind,
}

impl Node {
    pub fn new(expr: Expr, offset: usize, kind: StaticKind) -> Self {
        Self { expr, offset, kind }
    }
}

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),

    // === References ===
    /// `${name}` or `${name:default}`
    Variable {
        name: String,
        kind: Kind,
        default: Option<Value>,
    },

    // === Operators ===
    Unary {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },

    // === Function call ===
    /// `name` is uppercase
    Call { name: String, args: Vec<Node> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Text
    Concat,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Power
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Negate => "-",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
