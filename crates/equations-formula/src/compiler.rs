//! Equation compiler
//!
//! Lowers the typed AST into a linear stack program. Operands are emitted
//! before their operator (post-order), so the interpreter never looks
//! ahead.

use crate::ast::{BinaryOperator, Expr, Node, StaticKind, UnaryOperator};
use crate::error::{CompileError, CompileResult};
use crate::functions::{builtin_registry, FunctionRegistry};
use crate::parser::{parse_equation, VariableTypes};
use equations_core::{Kind, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One step of a compiled equation
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Push a constant
    PushLiteral(Value),
    /// Push the bound value of a variable (or its default)
    LoadVariable { name: String, kind: Kind },
    /// Pop one operand, push the result
    Unary(UnaryOperator),
    /// Pop two operands (right on top), push the result
    Binary(BinaryOperator),
    /// Pop `arity` arguments, push the function result
    Call { name: String, arity: usize },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushLiteral(Value::String(s)) => write!(f, "PUSH {s:?}"),
            Instruction::PushLiteral(value) => write!(f, "PUSH {value}"),
            Instruction::LoadVariable { name, kind } => write!(f, "LOAD ${{{name}}} : {kind}"),
            Instruction::Unary(op) => write!(f, "UNARY {op}"),
            Instruction::Binary(op) => write!(f, "BINARY {op}"),
            Instruction::Call { name, arity } => write!(f, "CALL {name}/{arity}"),
        }
    }
}

/// An instruction and the byte offset it was compiled from
#[derive(Debug, Clone, PartialEq)]
pub struct CodeUnit {
    pub instruction: Instruction,
    pub offset: usize,
}

/// A compiled equation
///
/// Immutable once built. Share it freely (e.g. behind an `Arc`) and run it
/// any number of times with an [`Interpreter`](crate::Interpreter).
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    text: String,
    variables: Vec<String>,
    variable_kinds: BTreeMap<String, Kind>,
    defaults: BTreeMap<String, Value>,
    code: Vec<CodeUnit>,
    result_kind: StaticKind,
}

impl Equation {
    /// The source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Referenced variables, in order of first occurrence
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Declared kind of a referenced variable
    pub fn variable_kind(&self, name: &str) -> Option<Kind> {
        self.variable_kinds.get(name).copied()
    }

    /// Default for a variable, if the equation gives one
    pub fn default_value(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    pub fn code(&self) -> &[CodeUnit] {
        &self.code
    }

    /// Kind of the result; `Dynamic` if only known when run
    pub fn result_kind(&self) -> StaticKind {
        self.result_kind
    }

    /// Check that every referenced variable still has the kind it was
    /// compiled against
    pub fn matches_types(&self, var_types: &VariableTypes) -> bool {
        self.variable_kinds
            .iter()
            .all(|(name, kind)| var_types.get(name) == Some(kind))
    }

    /// Human-readable instruction listing, one line per instruction
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (index, unit) in self.code.iter().enumerate() {
            out.push_str(&format!(
                "{index:>4}  @{:<4} {}\n",
                unit.offset, unit.instruction
            ));
        }
        out
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compile against the built-in registry
///
/// # Example
/// ```rust
/// use equations_formula::{compile, VariableTypes};
///
/// let equation = compile("=2^3^4 - 0.0002", &VariableTypes::new()).unwrap();
/// assert_eq!(equation.code().len(), 7);
/// ```
pub fn compile(text: &str, var_types: &VariableTypes) -> CompileResult<Equation> {
    Compiler::new(builtin_registry()).compile(text, var_types)
}

/// Compiles equation text against a function registry
pub struct Compiler<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Parse, type-check and lower `text`
    ///
    /// Either the whole equation compiles or nothing is produced.
    pub fn compile(&self, text: &str, var_types: &VariableTypes) -> CompileResult<Equation> {
        let root = parse_equation(text, var_types, self.registry)?;

        let mut codegen = CodeGen::default();
        codegen.node(&root)?;

        let equation = Equation {
            text: text.to_string(),
            variables: codegen.variables,
            variable_kinds: codegen.variable_kinds,
            defaults: codegen.defaults,
            code: codegen.code,
            result_kind: root.kind,
        };
        tracing::debug!(
            equation = text,
            instructions = equation.code.len(),
            result = %equation.result_kind,
            "Compiled equation"
        );
        Ok(equation)
    }
}

#[derive(Default)]
struct CodeGen {
    code: Vec<CodeUnit>,
    variables: Vec<String>,
    variable_kinds: BTreeMap<String, Kind>,
    defaults: BTreeMap<String, Value>,
}

impl CodeGen {
    fn emit(&mut self, instruction: Instruction, offset: usize) {
        self.code.push(CodeUnit {
            instruction,
            offset,
        });
    }

    fn node(&mut self, node: &Node) -> CompileResult<()> {
        match &node.expr {
            Expr::Number(n) => self.emit(Instruction::PushLiteral(Value::Float(*n)), node.offset),
            Expr::String(s) => self.emit(
                Instruction::PushLiteral(Value::String(s.clone())),
                node.offset,
            ),
            Expr::Boolean(b) => {
                self.emit(Instruction::PushLiteral(Value::Boolean(*b)), node.offset)
            }
            Expr::Variable {
                name,
                kind,
                default,
            } => {
                self.reference(name, *kind, default.as_ref(), node.offset)?;
                self.emit(
                    Instruction::LoadVariable {
                        name: name.clone(),
                        kind: *kind,
                    },
                    node.offset,
                );
            }
            Expr::Unary { op, operand } => {
                self.node(operand)?;
                self.emit(Instruction::Unary(*op), node.offset);
            }
            Expr::Binary { op, left, right } => {
                self.node(left)?;
                self.node(right)?;
                self.emit(Instruction::Binary(*op), node.offset);
            }
            Expr::Call { name, args } => {
                for arg in args {
                    self.node(arg)?;
                }
                self.emit(
                    Instruction::Call {
                        name: name.clone(),
                        arity: args.len(),
                    },
                    node.offset,
                );
            }
        }
        Ok(())
    }

    /// Record a variable reference and its default
    fn reference(
        &mut self,
        name: &str,
        kind: Kind,
        default: Option<&Value>,
        offset: usize,
    ) -> CompileResult<()> {
        if !self.variable_kinds.contains_key(name) {
            self.variables.push(name.to_string());
            self.variable_kinds.insert(name.to_string(), kind);
        }

        if let Some(default) = default {
            match self.defaults.get(name) {
                Some(existing) if existing != default => {
                    return Err(CompileError::new(
                        format!(
                            "Conflicting defaults for ${{{name}}}: {existing} and {default}"
                        ),
                        offset,
                    ));
                }
                Some(_) => {}
                None => {
                    self.defaults.insert(name.to_string(), default.clone());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types() -> VariableTypes {
        let mut types = VariableTypes::new();
        types.insert("a".into(), Kind::Float);
        types.insert("b".into(), Kind::Integer);
        types.insert("s".into(), Kind::String);
        types
    }

    fn instructions(equation: &Equation) -> Vec<Instruction> {
        equation
            .code()
            .iter()
            .map(|unit| unit.instruction.clone())
            .collect()
    }

    #[test]
    fn test_post_order_code() {
        let equation = compile("=1 + 2 * $a", &types()).unwrap();
        assert_eq!(
            instructions(&equation),
            vec![
                Instruction::PushLiteral(Value::Float(1.0)),
                Instruction::PushLiteral(Value::Float(2.0)),
                Instruction::LoadVariable {
                    name: "a".into(),
                    kind: Kind::Float
                },
                Instruction::Binary(BinaryOperator::Multiply),
                Instruction::Binary(BinaryOperator::Add),
            ]
        );
        assert_eq!(equation.result_kind(), Kind::Float.into());
    }

    #[test]
    fn test_offsets_follow_source() {
        let equation = compile("=MID($s, 1, 2)", &types()).unwrap();
        let offsets: Vec<usize> = equation.code().iter().map(|unit| unit.offset).collect();
        assert_eq!(offsets, vec![5, 9, 12, 1]);
        assert_eq!(
            equation.code()[3].instruction,
            Instruction::Call {
                name: "MID".into(),
                arity: 3
            }
        );
    }

    #[test]
    fn test_variables_in_first_occurrence_order() {
        let equation = compile("=$b + $a + ${b} + ${a:1.5}", &types()).unwrap();
        assert_eq!(equation.variables(), &["b".to_string(), "a".to_string()]);
        assert_eq!(equation.variable_kind("b"), Some(Kind::Integer));
        assert_eq!(equation.default_value("a"), Some(&Value::Float(1.5)));
        assert_eq!(equation.default_value("b"), None);
    }

    #[test]
    fn test_conflicting_defaults() {
        let err = compile("=${a:1} + ${a:2}", &types()).unwrap_err();
        assert_eq!(err.offset, 10);
        assert!(err.message.starts_with("Conflicting defaults"));

        // Repeating the same default is fine
        assert!(compile("=${a:1} + ${a:1.0}", &types()).is_ok());
    }

    #[test]
    fn test_parser_error_surfaces_verbatim() {
        let err = compile("=1 + ${missing}", &types()).unwrap_err();
        assert_eq!(
            err,
            CompileError::new("Unknown variable reference \"${missing}\"", 5)
        );
    }

    #[test]
    fn test_dynamic_result_kind() {
        let equation = compile("=IF($a > 0, 1, \"none\")", &types()).unwrap();
        assert_eq!(equation.result_kind(), StaticKind::Dynamic);
    }

    #[test]
    fn test_matches_types() {
        let equation = compile("=$a + 1", &types()).unwrap();
        assert!(equation.matches_types(&types()));

        let mut changed = types();
        changed.insert("a".into(), Kind::Integer);
        assert!(!equation.matches_types(&changed));

        // Unreferenced variables don't matter
        let mut other = types();
        other.insert("s".into(), Kind::Boolean);
        assert!(equation.matches_types(&other));
    }

    #[test]
    fn test_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Equation>();
        assert_send_sync::<FunctionRegistry>();
        assert_send_sync::<Compiler<'static>>();

        let equation = std::sync::Arc::new(compile("=$a * 2", &types()).unwrap());
        let handle = {
            let equation = std::sync::Arc::clone(&equation);
            std::thread::spawn(move || equation.variables().to_vec())
        };
        assert_eq!(handle.join().unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_disassemble() {
        let equation = compile("=\"x\" & $b", &types()).unwrap();
        assert_eq!(
            equation.disassemble(),
            "   0  @1    PUSH \"x\"\n   1  @7    LOAD ${b} : Integer\n   2  @5    BINARY &\n"
        );
    }
}
