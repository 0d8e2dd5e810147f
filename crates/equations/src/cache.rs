//! Compiled equation cache
//!
//! Compiling is far more expensive than running, and callers tend to
//! evaluate the same few formulas over and over with fresh bindings. The
//! cache keys compiled [`Equation`]s by their text and hands out shared
//! `Arc`s.
//!
//! # Example
//!
//! ```rust
//! use equations::prelude::*;
//!
//! let cache = EquationCache::new(CacheOptions::default());
//! let mut types = VariableTypes::new();
//! types.insert("x".to_string(), Kind::Float);
//!
//! for x in [1.0, 2.0, 3.0] {
//!     let bindings = RuntimeBinding::new().with("x", x);
//!     let value = cache.evaluate("=$x * 2", &types, &bindings).unwrap();
//!     assert_eq!(value, Value::Float(x * 2.0));
//! }
//!
//! let stats = cache.stats();
//! assert_eq!(stats.misses, 1);
//! assert_eq!(stats.hits, 2);
//! ```

use crate::Result;
use ahash::AHashMap;
use equations_core::Value;
use equations_formula::{
    builtin_registry, CompileResult, Compiler, Equation, FunctionRegistry, Interpreter,
    RuntimeBinding, VariableTypes,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Options for the equation cache
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Maximum number of equations kept (default: 256). The oldest entry
    /// is evicted first; 0 disables caching.
    pub capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Counters since the cache was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compile a new entry
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries compiled again because a variable changed kind
    pub recompilations: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    recompilations: AtomicU64,
}

#[derive(Default)]
struct Entries {
    equations: AHashMap<String, Arc<Equation>>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

/// Thread-safe cache of compiled equations keyed by text
pub struct EquationCache<'r> {
    options: CacheOptions,
    registry: &'r FunctionRegistry,
    entries: RwLock<Entries>,
    counters: Counters,
}

impl EquationCache<'static> {
    /// Create a cache compiling against the built-in functions
    pub fn new(options: CacheOptions) -> Self {
        Self::with_registry(options, builtin_registry())
    }
}

impl<'r> EquationCache<'r> {
    /// Create a cache compiling and evaluating against `registry`
    pub fn with_registry(options: CacheOptions, registry: &'r FunctionRegistry) -> Self {
        Self {
            options,
            registry,
            entries: RwLock::new(Entries::default()),
            counters: Counters::default(),
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// The compiled equation for `text`
    ///
    /// A cached equation is reused only if every variable it references
    /// still has the same kind in `var_types`; otherwise it is compiled
    /// again and replaces the stale entry.
    pub fn get_or_compile(
        &self,
        text: &str,
        var_types: &VariableTypes,
    ) -> CompileResult<Arc<Equation>> {
        let stale = match self.read().equations.get(text) {
            Some(equation) if equation.matches_types(var_types) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(equation = text, "Equation cache hit");
                return Ok(Arc::clone(equation));
            }
            Some(_) => true,
            None => false,
        };

        if stale {
            self.counters.recompilations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(equation = text, "Variable kinds changed, recompiling");
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(equation = text, "Equation cache miss");
        }

        let equation = Arc::new(Compiler::new(self.registry).compile(text, var_types)?);
        if self.options.capacity > 0 {
            self.insert(text, Arc::clone(&equation));
        }
        Ok(equation)
    }

    /// Compile (or reuse) `text` and evaluate it with `bindings`
    pub fn evaluate(
        &self,
        text: &str,
        var_types: &VariableTypes,
        bindings: &RuntimeBinding,
    ) -> Result<Value> {
        let equation = self.get_or_compile(text, var_types)?;
        Ok(Interpreter::new(self.registry).run(&equation, bindings)?)
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            recompilations: self.counters.recompilations.load(Ordering::Relaxed),
        }
    }

    /// Number of cached equations
    pub fn len(&self) -> usize {
        self.read().equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached equation. Counters are kept.
    pub fn clear(&self) {
        let mut entries = self.write();
        entries.equations.clear();
        entries.order.clear();
    }

    fn insert(&self, text: &str, equation: Arc<Equation>) {
        let mut entries = self.write();
        if entries
            .equations
            .insert(text.to_string(), equation)
            .is_some()
        {
            // Replaced a stale entry; its position is unchanged
            return;
        }
        entries.order.push_back(text.to_string());

        while entries.order.len() > self.options.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.equations.remove(&oldest);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(equation = %oldest, "Evicted equation");
        }
    }

    // Writers never leave `Entries` half-updated, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EquationCache<'static> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}
