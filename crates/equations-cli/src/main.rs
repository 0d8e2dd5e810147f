//! Equations CLI - compile, inspect and evaluate equations

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use equations::prelude::*;
use equations::{builtin_registry, coerce, compile, evaluate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "eqn")]
#[command(author, version, about = "Compile and evaluate typed equations")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an equation and print its value
    Eval {
        /// Equation text, e.g. "=1 + ${x}"
        formula: String,

        #[command(flatten)]
        vars: VarArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compile an equation and show its result kind, variables and code
    Check {
        /// Equation text
        formula: String,

        #[command(flatten)]
        vars: VarArgs,
    },

    /// List the built-in functions
    Functions,
}

#[derive(clap::Args)]
struct VarArgs {
    /// Declare and bind a variable (name:kind=value). List values are
    /// comma-separated.
    #[arg(long = "var", value_name = "NAME:KIND=VALUE")]
    vars: Vec<String>,

    /// Declare a variable without binding it (name:kind)
    #[arg(long = "unset", value_name = "NAME:KIND")]
    unset: Vec<String>,

    /// JSON file of bindings: {"name": {"kind": "Float", "value": 1.5}}
    #[arg(long, value_name = "FILE")]
    bindings: Option<PathBuf>,
}

/// One entry of a bindings file
#[derive(Debug, Deserialize)]
struct BindingEntry {
    kind: Kind,
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    equation: &'a str,
    kind: Kind,
    value: &'a Value,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Eval {
            formula,
            vars,
            json,
        } => eval(&formula, &vars, json),
        Commands::Check { formula, vars } => check(&formula, &vars),
        Commands::Functions => list_functions(),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

fn eval(formula: &str, vars: &VarArgs, json: bool) -> Result<()> {
    let (types, bindings) = collect_variables(vars)?;
    let equation = compile(formula, &types).map_err(|err| report(formula, err.offset, &err))?;
    let value = evaluate(&equation, &bindings).map_err(|err| match err.offset() {
        Some(offset) => report(formula, offset, &err),
        None => anyhow::Error::new(err),
    })?;

    if json {
        let result = JsonResult {
            equation: formula,
            kind: value.kind(),
            value: &value,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        println!("{}", coerce::scalar_text(&value));
    }
    Ok(())
}

fn check(formula: &str, vars: &VarArgs) -> Result<()> {
    let (types, _) = collect_variables(vars)?;
    let equation = compile(formula, &types).map_err(|err| report(formula, err.offset, &err))?;

    println!("Equation: {}", equation);
    println!("Result:   {}", equation.result_kind());
    if equation.variables().is_empty() {
        println!("Variables: none");
    } else {
        println!("Variables:");
        for name in equation.variables() {
            let kind = equation
                .variable_kind(name)
                .map_or_else(|| "?".to_string(), |kind| kind.to_string());
            match equation.default_value(name) {
                Some(default) => println!("  ${{{name}}} : {kind} (default {default})"),
                None => println!("  ${{{name}}} : {kind}"),
            }
        }
    }
    println!();
    print!("{}", equation.disassemble());
    Ok(())
}

fn list_functions() -> Result<()> {
    for function in builtin_registry().iter() {
        println!("{:<40} {}", function.usage(), function.summary());
    }
    Ok(())
}

/// Point at the failing construct under the equation text
fn report(formula: &str, offset: usize, err: &dyn std::fmt::Display) -> anyhow::Error {
    let column = formula
        .get(..offset)
        .map_or(offset, |prefix| prefix.chars().count());
    anyhow::anyhow!("{err}\n  {formula}\n  {:>width$}", "^", width = column + 1)
}

fn collect_variables(args: &VarArgs) -> Result<(VariableTypes, RuntimeBinding)> {
    let mut types = VariableTypes::new();
    let mut bindings = RuntimeBinding::new();

    if let Some(path) = &args.bindings {
        for (name, entry) in read_bindings_file(path)? {
            types.insert(name.clone(), entry.kind);
            match entry.value {
                Some(value) => {
                    let value = convert(&value, entry.kind)
                        .with_context(|| format!("Invalid value for '{name}' in bindings file"))?;
                    bindings.set(name, value);
                }
                None => bindings.unset(name),
            }
        }
    }

    for spec in &args.vars {
        let (decl, raw) = spec
            .split_once('=')
            .with_context(|| format!("Expected NAME:KIND=VALUE, got '{spec}'"))?;
        let (name, kind) = parse_declaration(decl)?;
        let value = parse_value(raw, kind)
            .with_context(|| format!("Invalid value for '{name}'"))?;
        types.insert(name.clone(), kind);
        bindings.set(name, value);
    }

    for decl in &args.unset {
        let (name, kind) = parse_declaration(decl)?;
        types.insert(name.clone(), kind);
        bindings.unset(name);
    }

    Ok((types, bindings))
}

fn read_bindings_file(path: &Path) -> Result<BTreeMap<String, BindingEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Split `name:kind`
fn parse_declaration(decl: &str) -> Result<(String, Kind)> {
    let (name, kind) = decl
        .split_once(':')
        .with_context(|| format!("Expected NAME:KIND, got '{decl}'"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Empty variable name in '{decl}'");
    }
    let kind = Kind::from_name(kind.trim())
        .with_context(|| format!("Unknown kind '{}' for '{name}'", kind.trim()))?;
    Ok((name.to_string(), kind))
}

/// Parse command-line text as a value of `kind`
fn parse_value(raw: &str, kind: Kind) -> Result<Value> {
    if kind.is_list() {
        let items: Vec<Value> = if raw.trim().is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(|item| Value::string(item.trim())).collect()
        };
        return Ok(coerce::flatten(&items, kind)?.into());
    }
    convert(&Value::string(raw), kind)
}

/// Convert a loosely typed value to exactly `kind`
fn convert(value: &Value, kind: Kind) -> Result<Value> {
    if kind.is_list() {
        if !value.is_list() {
            bail!("expected a {kind}, got {}", value.kind());
        }
        return Ok(coerce::flatten(std::slice::from_ref(value), kind)?.into());
    }
    Ok(coerce::coerce_scalar(value, kind)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_declaration() {
        assert_eq!(
            parse_declaration("x:float").unwrap(),
            ("x".to_string(), Kind::Float)
        );
        assert_eq!(
            parse_declaration(" names : string_list ").unwrap(),
            ("names".to_string(), Kind::StringList)
        );
        assert!(parse_declaration("x").is_err());
        assert!(parse_declaration(":float").is_err());
        assert!(parse_declaration("x:matrix").is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("2.5", Kind::Float).unwrap(), Value::Float(2.5));
        assert_eq!(parse_value("7", Kind::Integer).unwrap(), Value::Integer(7));
        assert_eq!(parse_value("true", Kind::Boolean).unwrap(), Value::Boolean(true));
        assert_eq!(parse_value("a b", Kind::String).unwrap(), Value::string("a b"));
        assert_eq!(
            parse_value("1, 2,3", Kind::IntegerList).unwrap(),
            Value::from(vec![1_i64, 2, 3])
        );
        assert_eq!(
            parse_value("", Kind::FloatList).unwrap(),
            Value::List(List::Float(vec![]))
        );
        assert!(parse_value("abc", Kind::Float).is_err());
    }

    #[test]
    fn test_bindings_file_entries() {
        let entries: BTreeMap<String, BindingEntry> = serde_json::from_str(
            r#"{
                "n": {"kind": "Integer", "value": 3},
                "xs": {"kind": "IntegerList", "value": [1, 2]},
                "s": {"kind": "String"}
            }"#,
        )
        .unwrap();

        let n = &entries["n"];
        assert_eq!(convert(n.value.as_ref().unwrap(), n.kind).unwrap(), Value::Integer(3));

        let xs = &entries["xs"];
        assert_eq!(
            convert(xs.value.as_ref().unwrap(), xs.kind).unwrap(),
            Value::from(vec![1_i64, 2])
        );

        assert_eq!(entries["s"].kind, Kind::String);
        assert!(entries["s"].value.is_none());
    }

    #[test]
    fn test_collect_variables() {
        let args = VarArgs {
            vars: vec!["x:float=1.5".into(), "s:string=a=b".into()],
            unset: vec!["y:int".into()],
            bindings: None,
        };
        let (types, bindings) = collect_variables(&args).unwrap();
        assert_eq!(types.get("y"), Some(&Kind::Integer));
        assert_eq!(bindings.get("x"), Some(&Value::Float(1.5)));
        assert_eq!(bindings.get("s"), Some(&Value::string("a=b")));
        assert!(!bindings.is_defined("y"));
    }

    #[test]
    fn test_report_points_at_offset() {
        let err = report("=1 + $x", 5, &"Undefined variable: ${x}");
        assert_eq!(
            err.to_string(),
            "Undefined variable: ${x}\n  =1 + $x\n       ^"
        );
    }
}
