//! Function contract, registry and built-in functions

pub mod list;
pub mod logical;
pub mod math;
pub mod statistical;
pub mod text;

use crate::ast::StaticKind;
use crate::error::{ArgMismatch, FunctionError, FunctionResult, RegistryError};
use ahash::AHashMap;
use equations_core::{coerce, Kind, KindSet, Value};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// A single number (Booleans count as 1/0)
pub const NUMBER: KindSet = KindSet::NUMERIC.union(KindSet::BOOLEAN);

/// Numbers and numeric lists, for functions that flatten their arguments
pub const NUMBERS: KindSet = NUMBER.union(KindSet::NUMERIC_LIST);

/// Formal parameter of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDescriptor {
    pub name: &'static str,
    /// Kinds an actual argument may have
    pub accepts: KindSet,
    pub optional: bool,
    /// May consume a run of consecutive arguments
    pub repeated: bool,
}

impl ArgDescriptor {
    /// A required, single argument
    pub fn new(name: &'static str, accepts: KindSet) -> Self {
        Self {
            name,
            accepts,
            optional: false,
            repeated: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// A callable built-in
///
/// Only [`name`](Function::name), [`summary`](Function::summary),
/// [`args`](Function::args), [`return_kind`](Function::return_kind) and
/// [`evaluate`](Function::evaluate) are required. Polymorphic functions
/// return [`StaticKind::Dynamic`] from `return_kind` and override
/// [`resolve_return_kind`](Function::resolve_return_kind).
pub trait Function: Send + Sync {
    /// Uppercase name
    fn name(&self) -> &str;

    /// One-line description
    fn summary(&self) -> &str;

    /// Formal parameters, in order
    fn args(&self) -> &[ArgDescriptor];

    /// Declared return kind
    fn return_kind(&self) -> StaticKind;

    /// Return kind for arguments already known to match
    fn resolve_return_kind(&self, _arg_kinds: &[StaticKind]) -> StaticKind {
        self.return_kind()
    }

    /// Usage string, e.g. `ROUND(number, [digits])`
    fn usage(&self) -> String {
        usage(self.name(), self.args())
    }

    /// Match actual argument kinds against the descriptors
    fn check_args(&self, arg_kinds: &[StaticKind]) -> Result<StaticKind, ArgMismatch> {
        match_args(self.args(), arg_kinds)?;
        Ok(self.resolve_return_kind(arg_kinds))
    }

    /// Return kind for these argument kinds, or `None` on mismatch
    fn validate(&self, arg_kinds: &[StaticKind]) -> Option<StaticKind> {
        self.check_args(arg_kinds).ok()
    }

    /// Compute the result. Arguments have already been validated.
    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value>;
}

/// Build a usage string from a name and descriptors
pub fn usage(name: &str, args: &[ArgDescriptor]) -> String {
    let params: Vec<String> = args
        .iter()
        .map(|arg| {
            let mut param = arg.name.to_string();
            if arg.repeated {
                param.push_str("...");
            }
            if arg.optional {
                param = format!("[{param}]");
            }
            param
        })
        .collect();
    format!("{}({})", name, params.join(", "))
}

/// Check the descriptor invariants: no required argument after an optional
/// one, unique names
pub fn check_descriptors(args: &[ArgDescriptor]) -> Result<(), String> {
    let mut seen_optional = false;
    let mut names = HashSet::new();
    for arg in args {
        if !names.insert(arg.name) {
            return Err(format!("duplicate argument name \"{}\"", arg.name));
        }
        if arg.optional {
            seen_optional = true;
        } else if seen_optional {
            return Err(format!(
                "required argument \"{}\" follows an optional one",
                arg.name
            ));
        }
    }
    Ok(())
}

/// Walk the descriptors left to right, consuming actual arguments
///
/// A repeated descriptor takes every following argument it accepts, but
/// leaves enough arguments for the required descriptors after it. An
/// optional one is skipped when the next argument is missing or not
/// accepted.
pub fn match_args(
    descriptors: &[ArgDescriptor],
    kinds: &[StaticKind],
) -> Result<(), ArgMismatch> {
    let required = descriptors.iter().filter(|d| !d.optional).count();
    let missing = |index: usize| match kinds.get(index) {
        Some(found) => ArgMismatch::WrongKind {
            ordinal: index + 1,
            found: *found,
        },
        None => ArgMismatch::TooFew {
            expected: required,
            actual: kinds.len(),
        },
    };

    let mut next = 0;
    for (position, descriptor) in descriptors.iter().enumerate() {
        let accepted = |i: usize| {
            kinds
                .get(i)
                .map_or(false, |kind| kind.accepted_by(descriptor.accepts))
        };

        if descriptor.repeated {
            let reserved = descriptors[position + 1..]
                .iter()
                .filter(|d| !d.optional)
                .count();
            let start = next;
            while kinds.len() - next > reserved && accepted(next) {
                next += 1;
            }
            if next == start && !descriptor.optional {
                if accepted(next) {
                    return Err(ArgMismatch::TooFew {
                        expected: required,
                        actual: kinds.len(),
                    });
                }
                return Err(missing(next));
            }
        } else if accepted(next) {
            next += 1;
        } else if !descriptor.optional {
            return Err(missing(next));
        }
    }

    if next < kinds.len() {
        let unbounded = descriptors.iter().any(|d| d.repeated);
        if !unbounded && kinds.len() > descriptors.len() {
            return Err(ArgMismatch::TooMany {
                max: descriptors.len(),
                actual: kinds.len(),
            });
        }
        return Err(missing(next));
    }
    Ok(())
}

/// User-facing description of an argument mismatch, with the usage string
pub fn mismatch_message(function: &dyn Function, mismatch: &ArgMismatch) -> String {
    let name = function.name().to_uppercase();
    let usage = function.usage();
    match mismatch {
        ArgMismatch::WrongKind { ordinal, found } => {
            format!("Argument {ordinal} of {name} has the wrong type ({found}); usage: {usage}")
        }
        ArgMismatch::TooFew { expected, actual } => format!(
            "{name} expects at least {expected} argument(s) but got {actual}; usage: {usage}"
        ),
        ArgMismatch::TooMany { max, actual } => format!(
            "{name} expects at most {max} argument(s) but got {actual}; usage: {usage}"
        ),
    }
}

/// Function implementation signature
pub type FunctionImpl = fn(&[Value]) -> FunctionResult<Value>;

/// Return kind resolver for polymorphic built-ins
pub type ReturnResolver = fn(&[StaticKind]) -> StaticKind;

/// Built-in function definition
pub struct Builtin {
    /// Function name (uppercase)
    pub name: &'static str,
    pub summary: &'static str,
    pub args: Vec<ArgDescriptor>,
    pub returns: StaticKind,
    /// Resolves `Dynamic` returns from argument kinds
    pub resolve: Option<ReturnResolver>,
    pub implementation: FunctionImpl,
}

impl Function for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn summary(&self) -> &str {
        self.summary
    }

    fn args(&self) -> &[ArgDescriptor] {
        &self.args
    }

    fn return_kind(&self) -> StaticKind {
        self.returns
    }

    fn resolve_return_kind(&self, arg_kinds: &[StaticKind]) -> StaticKind {
        match self.resolve {
            Some(resolve) => resolve(arg_kinds),
            None => self.returns,
        }
    }

    fn evaluate(&self, args: &[Value]) -> FunctionResult<Value> {
        (self.implementation)(args)
    }
}

/// Function registry, keyed by uppercase name
#[derive(Default)]
pub struct FunctionRegistry {
    functions: AHashMap<String, Box<dyn Function>>,
}

static BUILTINS: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::with_builtins);

/// The process-wide registry of built-in functions
///
/// Initialised on first use and read-only afterwards.
pub fn builtin_registry() -> &'static FunctionRegistry {
    &BUILTINS
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new registry with all built-in functions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_text_functions();
        registry.register_logical_functions();
        registry.register_list_functions();

        registry
    }

    /// Look up a function by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<&dyn Function> {
        self.functions
            .get(&name.to_uppercase())
            .map(|function| function.as_ref())
    }

    /// Register a function, returning the one it replaces
    pub fn register(
        &mut self,
        function: Box<dyn Function>,
    ) -> Result<Option<Box<dyn Function>>, RegistryError> {
        let key = function.name().to_uppercase();
        check_descriptors(function.args()).map_err(|message| RegistryError::InvalidSignature {
            function: key.clone(),
            message,
        })?;

        let replaced = self.functions.insert(key, function);
        if let Some(previous) = &replaced {
            tracing::warn!("Replaced previously registered function {}", previous.name());
        }
        Ok(replaced)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered functions, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &dyn Function> + '_ {
        self.names()
            .into_iter()
            .filter_map(move |name| self.lookup(name))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register_builtin(&mut self, def: Builtin) {
        if let Err(err) = self.register(Box::new(def)) {
            tracing::error!("Skipping built-in: {err}");
        }
    }

    fn register_math_functions(&mut self) {
        // ABS
        self.register_builtin(Builtin {
            name: "ABS",
            summary: "Returns the absolute value of a number.",
            args: vec![ArgDescriptor::new("number", NUMBER)],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_abs,
        });

        // EXP
        self.register_builtin(Builtin {
            name: "EXP",
            summary: "Returns e raised to the power of a number.",
            args: vec![ArgDescriptor::new("number", NUMBER)],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_exp,
        });

        // LN
        self.register_builtin(Builtin {
            name: "LN",
            summary: "Returns the natural logarithm of a positive number.",
            args: vec![ArgDescriptor::new("number", NUMBER)],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_ln,
        });

        // LOG
        self.register_builtin(Builtin {
            name: "LOG",
            summary: "Returns the logarithm of a number to a base (default 10).",
            args: vec![
                ArgDescriptor::new("number", NUMBER),
                ArgDescriptor::new("base", NUMBER).optional(),
            ],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_log,
        });

        // MOD
        self.register_builtin(Builtin {
            name: "MOD",
            summary: "Returns the remainder after division; the sign follows the divisor.",
            args: vec![
                ArgDescriptor::new("dividend", NUMBER),
                ArgDescriptor::new("divisor", NUMBER),
            ],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_mod,
        });

        // PI
        self.register_builtin(Builtin {
            name: "PI",
            summary: "Returns the constant pi.",
            args: vec![],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_pi,
        });

        // PRODUCT
        self.register_builtin(Builtin {
            name: "PRODUCT",
            summary: "Returns the product of numbers and numeric lists.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_product,
        });

        // ROUND
        self.register_builtin(Builtin {
            name: "ROUND",
            summary: "Rounds a number to a number of decimal places, halves away from zero.",
            args: vec![
                ArgDescriptor::new("number", NUMBER),
                ArgDescriptor::new("digits", NUMBER).optional(),
            ],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_round,
        });

        // SIGN
        self.register_builtin(Builtin {
            name: "SIGN",
            summary: "Returns -1, 0 or 1 depending on the sign of a number.",
            args: vec![ArgDescriptor::new("number", NUMBER)],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_sign,
        });

        // SQRT
        self.register_builtin(Builtin {
            name: "SQRT",
            summary: "Returns the square root of a non-negative number.",
            args: vec![ArgDescriptor::new("number", NUMBER)],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_sqrt,
        });

        // SUM
        self.register_builtin(Builtin {
            name: "SUM",
            summary: "Returns the sum of numbers and numeric lists.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_sum,
        });

        // TRUNC
        self.register_builtin(Builtin {
            name: "TRUNC",
            summary: "Truncates a number towards zero.",
            args: vec![ArgDescriptor::new("number", NUMBER)],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_trunc,
        });
    }

    fn register_statistical_functions(&mut self) {
        // AVERAGE
        self.register_builtin(Builtin {
            name: "AVERAGE",
            summary: "Returns the arithmetic mean of numbers and numeric lists.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: statistical::fn_average,
        });

        // COUNT
        self.register_builtin(Builtin {
            name: "COUNT",
            summary: "Returns how many numbers there are in numbers and numeric lists.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Integer.into(),
            resolve: None,
            implementation: statistical::fn_count,
        });

        // MAX
        self.register_builtin(Builtin {
            name: "MAX",
            summary: "Returns the largest of numbers and numeric lists.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: statistical::fn_max,
        });

        // MEDIAN
        self.register_builtin(Builtin {
            name: "MEDIAN",
            summary: "Returns the median of numbers and numeric lists.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: statistical::fn_median,
        });

        // MIN
        self.register_builtin(Builtin {
            name: "MIN",
            summary: "Returns the smallest of numbers and numeric lists.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: statistical::fn_min,
        });

        // STDEV
        self.register_builtin(Builtin {
            name: "STDEV",
            summary: "Returns the sample standard deviation.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: statistical::fn_stdev,
        });

        // VAR
        self.register_builtin(Builtin {
            name: "VAR",
            summary: "Returns the sample variance.",
            args: vec![ArgDescriptor::new("numbers", NUMBERS).repeated()],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: statistical::fn_var,
        });
    }

    fn register_text_functions(&mut self) {
        // CONCATENATE
        self.register_builtin(Builtin {
            name: "CONCATENATE",
            summary: "Joins the text of several values.",
            args: vec![ArgDescriptor::new("values", KindSet::SCALAR).repeated()],
            returns: Kind::String.into(),
            resolve: None,
            implementation: text::fn_concatenate,
        });

        // LEFT
        self.register_builtin(Builtin {
            name: "LEFT",
            summary: "Returns the first characters of a text (default 1).",
            args: vec![
                ArgDescriptor::new("text", KindSet::SCALAR),
                ArgDescriptor::new("count", NUMBER).optional(),
            ],
            returns: Kind::String.into(),
            resolve: None,
            implementation: text::fn_left,
        });

        // LEN
        self.register_builtin(Builtin {
            name: "LEN",
            summary: "Returns the number of characters in a text.",
            args: vec![ArgDescriptor::new("text", KindSet::SCALAR)],
            returns: Kind::Integer.into(),
            resolve: None,
            implementation: text::fn_len,
        });

        // LOWER
        self.register_builtin(Builtin {
            name: "LOWER",
            summary: "Converts a text to lowercase.",
            args: vec![ArgDescriptor::new("text", KindSet::SCALAR)],
            returns: Kind::String.into(),
            resolve: None,
            implementation: text::fn_lower,
        });

        // MID
        self.register_builtin(Builtin {
            name: "MID",
            summary: "Returns count characters of a text starting at a 1-based position.",
            args: vec![
                ArgDescriptor::new("text", KindSet::SCALAR),
                ArgDescriptor::new("start", NUMBER),
                ArgDescriptor::new("count", NUMBER),
            ],
            returns: Kind::String.into(),
            resolve: None,
            implementation: text::fn_mid,
        });

        // RIGHT
        self.register_builtin(Builtin {
            name: "RIGHT",
            summary: "Returns the last characters of a text (default 1).",
            args: vec![
                ArgDescriptor::new("text", KindSet::SCALAR),
                ArgDescriptor::new("count", NUMBER).optional(),
            ],
            returns: Kind::String.into(),
            resolve: None,
            implementation: text::fn_right,
        });

        // SUBSTITUTE
        self.register_builtin(Builtin {
            name: "SUBSTITUTE",
            summary: "Replaces occurrences of a text (or only the nth one) with another.",
            args: vec![
                ArgDescriptor::new("text", KindSet::SCALAR),
                ArgDescriptor::new("old", KindSet::SCALAR),
                ArgDescriptor::new("new", KindSet::SCALAR),
                ArgDescriptor::new("instance", NUMBER).optional(),
            ],
            returns: Kind::String.into(),
            resolve: None,
            implementation: text::fn_substitute,
        });

        // UPPER
        self.register_builtin(Builtin {
            name: "UPPER",
            summary: "Converts a text to uppercase.",
            args: vec![ArgDescriptor::new("text", KindSet::SCALAR)],
            returns: Kind::String.into(),
            resolve: None,
            implementation: text::fn_upper,
        });

        // VALUE
        self.register_builtin(Builtin {
            name: "VALUE",
            summary: "Converts a text to a number.",
            args: vec![ArgDescriptor::new("text", KindSet::SCALAR)],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: text::fn_value,
        });
    }

    fn register_logical_functions(&mut self) {
        let conditions = KindSet::NUMERIC
            | KindSet::BOOLEAN
            | KindSet::NUMERIC_LIST
            | KindSet::BOOLEAN_LIST;

        // AND
        self.register_builtin(Builtin {
            name: "AND",
            summary: "Returns TRUE if every condition is true.",
            args: vec![ArgDescriptor::new("conditions", conditions).repeated()],
            returns: Kind::Boolean.into(),
            resolve: None,
            implementation: logical::fn_and,
        });

        // IF
        self.register_builtin(Builtin {
            name: "IF",
            summary: "Returns one of two values depending on a condition.",
            args: vec![
                ArgDescriptor::new("condition", KindSet::SCALAR),
                ArgDescriptor::new("if_true", KindSet::ANY),
                ArgDescriptor::new("if_false", KindSet::ANY),
            ],
            returns: StaticKind::Dynamic,
            resolve: Some(logical::resolve_if),
            implementation: logical::fn_if,
        });

        // NOT
        self.register_builtin(Builtin {
            name: "NOT",
            summary: "Reverses a condition.",
            args: vec![ArgDescriptor::new("condition", KindSet::SCALAR)],
            returns: Kind::Boolean.into(),
            resolve: None,
            implementation: logical::fn_not,
        });

        // OR
        self.register_builtin(Builtin {
            name: "OR",
            summary: "Returns TRUE if any condition is true.",
            args: vec![ArgDescriptor::new("conditions", conditions).repeated()],
            returns: Kind::Boolean.into(),
            resolve: None,
            implementation: logical::fn_or,
        });
    }

    fn register_list_functions(&mut self) {
        // BLIST
        self.register_builtin(Builtin {
            name: "BLIST",
            summary: "Builds a list of booleans from values and lists.",
            args: vec![ArgDescriptor::new("values", KindSet::ANY)
                .optional()
                .repeated()],
            returns: Kind::BooleanList.into(),
            resolve: None,
            implementation: list::fn_blist,
        });

        // FIRST
        self.register_builtin(Builtin {
            name: "FIRST",
            summary: "Returns the first element of a list.",
            args: vec![ArgDescriptor::new("list", KindSet::LIST)],
            returns: StaticKind::Dynamic,
            resolve: Some(list::resolve_element),
            implementation: list::fn_first,
        });

        // FLIST
        self.register_builtin(Builtin {
            name: "FLIST",
            summary: "Builds a list of floating point numbers from values and lists.",
            args: vec![ArgDescriptor::new("values", KindSet::ANY)
                .optional()
                .repeated()],
            returns: Kind::FloatList.into(),
            resolve: None,
            implementation: list::fn_flist,
        });

        // ILIST
        self.register_builtin(Builtin {
            name: "ILIST",
            summary: "Builds a list of integers from values and lists.",
            args: vec![ArgDescriptor::new("values", KindSet::ANY)
                .optional()
                .repeated()],
            returns: Kind::IntegerList.into(),
            resolve: None,
            implementation: list::fn_ilist,
        });

        // LAST
        self.register_builtin(Builtin {
            name: "LAST",
            summary: "Returns the last element of a list.",
            args: vec![ArgDescriptor::new("list", KindSet::LIST)],
            returns: StaticKind::Dynamic,
            resolve: Some(list::resolve_element),
            implementation: list::fn_last,
        });

        // LISTTOSTRING
        self.register_builtin(Builtin {
            name: "LISTTOSTRING",
            summary: "Joins the elements of a list with a separator.",
            args: vec![
                ArgDescriptor::new("list", KindSet::LIST),
                ArgDescriptor::new("separator", KindSet::SCALAR),
            ],
            returns: Kind::String.into(),
            resolve: None,
            implementation: list::fn_list_to_string,
        });

        // NTH
        self.register_builtin(Builtin {
            name: "NTH",
            summary: "Returns the element at a 1-based position of a list.",
            args: vec![
                ArgDescriptor::new("list", KindSet::LIST),
                ArgDescriptor::new("position", NUMBER),
            ],
            returns: StaticKind::Dynamic,
            resolve: Some(list::resolve_element),
            implementation: list::fn_nth,
        });

        // SLIST
        self.register_builtin(Builtin {
            name: "SLIST",
            summary: "Builds a list of strings from values and lists.",
            args: vec![ArgDescriptor::new("values", KindSet::ANY)
                .optional()
                .repeated()],
            returns: Kind::StringList.into(),
            resolve: None,
            implementation: list::fn_slist,
        });
    }
}

// === Argument helpers for function bodies ===

/// Argument at zero-based `index` as a float
pub(crate) fn arg_float(args: &[Value], index: usize) -> FunctionResult<f64> {
    let value = arg(args, index)?;
    coerce::to_float(value).map_err(|source| FunctionError::Conversion {
        ordinal: index + 1,
        source,
    })
}

/// Argument at zero-based `index` as an integer (half to even)
pub(crate) fn arg_integer(args: &[Value], index: usize) -> FunctionResult<i64> {
    let value = arg(args, index)?;
    coerce::to_integer(value).map_err(|source| FunctionError::Conversion {
        ordinal: index + 1,
        source,
    })
}

/// Argument at zero-based `index` as text
pub(crate) fn arg_text(args: &[Value], index: usize) -> FunctionResult<String> {
    let value = arg(args, index)?;
    coerce::to_text(value).map_err(|source| FunctionError::Conversion {
        ordinal: index + 1,
        source,
    })
}

/// Argument at zero-based `index` as a boolean
pub(crate) fn arg_boolean(args: &[Value], index: usize) -> FunctionResult<bool> {
    let value = arg(args, index)?;
    coerce::to_boolean(value).map_err(|source| FunctionError::Conversion {
        ordinal: index + 1,
        source,
    })
}

pub(crate) fn arg(args: &[Value], index: usize) -> FunctionResult<&Value> {
    args.get(index)
        .ok_or_else(|| FunctionError::argument(index + 1, "missing argument"))
}

/// Wrap a float result, rejecting NaN and infinities
pub(crate) fn finite(value: f64, what: &str) -> FunctionResult<Value> {
    if value.is_finite() {
        Ok(Value::Float(value))
    } else {
        Err(FunctionError::arithmetic(format!("{what} is not a finite number")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(list: &[Kind]) -> Vec<StaticKind> {
        list.iter().map(|k| StaticKind::Known(*k)).collect()
    }

    #[test]
    fn test_usage_marks_optional_and_repeated() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(
            registry.lookup("ROUND").unwrap().usage(),
            "ROUND(number, [digits])"
        );
        assert_eq!(registry.lookup("sum").unwrap().usage(), "SUM(numbers...)");
        assert_eq!(registry.lookup("FList").unwrap().usage(), "FLIST([values...])");
        assert_eq!(registry.lookup("PI").unwrap().usage(), "PI()");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = builtin_registry();
        assert!(registry.lookup("mid").is_some());
        assert!(registry.lookup("Mid").is_some());
        assert!(registry.lookup("NOPE").is_none());
    }

    #[test]
    fn test_all_builtins_register() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(registry.len(), 40);
        let names = registry.names();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_match_args_fixed() {
        let args = vec![
            ArgDescriptor::new("text", KindSet::STRING),
            ArgDescriptor::new("count", KindSet::NUMERIC).optional(),
        ];
        assert_eq!(match_args(&args, &kinds(&[Kind::String])), Ok(()));
        assert_eq!(
            match_args(&args, &kinds(&[Kind::String, Kind::Integer])),
            Ok(())
        );
        assert_eq!(
            match_args(&args, &[]),
            Err(ArgMismatch::TooFew {
                expected: 1,
                actual: 0
            })
        );
        assert_eq!(
            match_args(&args, &kinds(&[Kind::String, Kind::String])),
            Err(ArgMismatch::WrongKind {
                ordinal: 2,
                found: StaticKind::Known(Kind::String)
            })
        );
        assert_eq!(
            match_args(&args, &kinds(&[Kind::String, Kind::Float, Kind::Float])),
            Err(ArgMismatch::TooMany { max: 2, actual: 3 })
        );
        assert_eq!(
            match_args(&args, &kinds(&[Kind::Boolean])),
            Err(ArgMismatch::WrongKind {
                ordinal: 1,
                found: StaticKind::Known(Kind::Boolean)
            })
        );
    }

    #[test]
    fn test_match_args_repeated() {
        let args = vec![ArgDescriptor::new("numbers", NUMBERS).repeated()];
        assert_eq!(
            match_args(
                &args,
                &kinds(&[Kind::Float, Kind::Integer, Kind::IntegerList])
            ),
            Ok(())
        );
        assert_eq!(
            match_args(&args, &kinds(&[Kind::Float, Kind::String])),
            Err(ArgMismatch::WrongKind {
                ordinal: 2,
                found: StaticKind::Known(Kind::String)
            })
        );
        assert!(matches!(
            match_args(&args, &[]),
            Err(ArgMismatch::TooFew { .. })
        ));
    }

    #[test]
    fn test_match_args_repeated_then_required() {
        let args = vec![
            ArgDescriptor::new("numbers", KindSet::NUMERIC).repeated(),
            ArgDescriptor::new("factor", KindSet::NUMERIC),
        ];
        assert_eq!(match_args(&args, &kinds(&[Kind::Float; 3])), Ok(()));
        assert_eq!(match_args(&args, &kinds(&[Kind::Float; 2])), Ok(()));
        assert_eq!(
            match_args(&args, &kinds(&[Kind::Float])),
            Err(ArgMismatch::TooFew {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            match_args(&args, &kinds(&[Kind::Float, Kind::String])),
            Err(ArgMismatch::WrongKind {
                ordinal: 2,
                found: StaticKind::Known(Kind::String)
            })
        );

        let scaled = Builtin {
            name: "SCALED",
            summary: "",
            args,
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_pi,
        };
        assert_eq!(
            scaled.validate(&kinds(&[Kind::Float, Kind::Integer, Kind::Float])),
            Some(StaticKind::Known(Kind::Float))
        );
    }

    #[test]
    fn test_dynamic_arguments_match_anything() {
        let args = vec![ArgDescriptor::new("number", NUMBER)];
        assert_eq!(match_args(&args, &[StaticKind::Dynamic]), Ok(()));
    }

    #[test]
    fn test_check_descriptors() {
        let bad = vec![
            ArgDescriptor::new("a", KindSet::ANY).optional(),
            ArgDescriptor::new("b", KindSet::ANY),
        ];
        assert!(check_descriptors(&bad).is_err());

        let dup = vec![
            ArgDescriptor::new("a", KindSet::ANY),
            ArgDescriptor::new("a", KindSet::ANY),
        ];
        assert!(check_descriptors(&dup).is_err());
    }

    #[test]
    fn test_register_rejects_bad_signature() {
        let mut registry = FunctionRegistry::new();
        let result = registry.register(Box::new(Builtin {
            name: "BROKEN",
            summary: "",
            args: vec![
                ArgDescriptor::new("a", KindSet::ANY).optional(),
                ArgDescriptor::new("b", KindSet::ANY),
            ],
            returns: Kind::Float.into(),
            resolve: None,
            implementation: math::fn_pi,
        }));
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FunctionRegistry::with_builtins();
        let replaced = registry
            .register(Box::new(Builtin {
                name: "pi",
                summary: "Not quite pi.",
                args: vec![],
                returns: Kind::Float.into(),
                resolve: None,
                implementation: |_| Ok(Value::Float(3.0)),
            }))
            .unwrap();
        assert!(replaced.is_some());
        let pi = registry.lookup("PI").unwrap();
        assert_eq!(pi.evaluate(&[]).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn test_validate_resolves_polymorphic_return() {
        let registry = builtin_registry();
        let first = registry.lookup("FIRST").unwrap();
        assert_eq!(first.return_kind(), StaticKind::Dynamic);
        assert_eq!(
            first.validate(&kinds(&[Kind::StringList])),
            Some(StaticKind::Known(Kind::String))
        );
        assert_eq!(first.validate(&kinds(&[Kind::String])), None);
    }
}
