//! Modules - caller-supplied accumulators folded over accepted tokens
//!
//! A module receives its previous value (`None` before the first accepted
//! token), the folded token and the token's start offset, and returns the
//! new value. Modules are registered under a name and invoked in
//! registration order for every accepted token.
//!
//! ```rust
//! use tagscan::{from_fn, scan, Config};
//!
//! let config = Config::default().with_module(
//!     "count",
//!     from_fn(|count: Option<u64>, _token: &str, _position: usize| count.unwrap_or(0) + 1),
//! );
//! let result = scan("word and another word", &config).unwrap();
//! assert_eq!(result.module("count"), Some(&serde_json::json!(4)));
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// An accumulator threaded across all accepted tokens of one scan
pub trait Module {
    /// Running value; serialized into the scan result when the scan ends
    type Value: Serialize;

    fn accumulate(
        &self,
        previous: Option<Self::Value>,
        token: &str,
        position: usize,
    ) -> anyhow::Result<Self::Value>;
}

/// Module backed by an infallible closure, see [`from_fn`]
pub struct FnModule<F, V> {
    f: F,
    _value: PhantomData<fn() -> V>,
}

/// Wrap an infallible closure `(previous, token, position) -> value` as a module
pub fn from_fn<V, F>(f: F) -> FnModule<F, V>
where
    V: Serialize,
    F: Fn(Option<V>, &str, usize) -> V,
{
    FnModule {
        f,
        _value: PhantomData,
    }
}

impl<F, V> Module for FnModule<F, V>
where
    V: Serialize,
    F: Fn(Option<V>, &str, usize) -> V,
{
    type Value = V;

    fn accumulate(&self, previous: Option<V>, token: &str, position: usize) -> anyhow::Result<V> {
        Ok((self.f)(previous, token, position))
    }
}

/// Module backed by a fallible closure, see [`try_from_fn`]
pub struct TryFnModule<F, V> {
    f: F,
    _value: PhantomData<fn() -> V>,
}

/// Wrap a fallible closure as a module. An error aborts the scan.
pub fn try_from_fn<V, F>(f: F) -> TryFnModule<F, V>
where
    V: Serialize,
    F: Fn(Option<V>, &str, usize) -> anyhow::Result<V>,
{
    TryFnModule {
        f,
        _value: PhantomData,
    }
}

impl<F, V> Module for TryFnModule<F, V>
where
    V: Serialize,
    F: Fn(Option<V>, &str, usize) -> anyhow::Result<V>,
{
    type Value = V;

    fn accumulate(&self, previous: Option<V>, token: &str, position: usize) -> anyhow::Result<V> {
        (self.f)(previous, token, position)
    }
}

/// Type-erased module, so modules with different value types share one registry
trait ErasedModule {
    fn begin(&self) -> Box<dyn ModuleRun + '_>;
}

/// Per-scan state of one module
pub(crate) trait ModuleRun {
    fn step(&mut self, token: &str, position: usize) -> anyhow::Result<()>;
    fn finish(self: Box<Self>) -> serde_json::Result<Value>;
}

struct Run<'a, M: Module> {
    module: &'a M,
    value: Option<M::Value>,
}

impl<M: Module + 'static> ErasedModule for M {
    fn begin(&self) -> Box<dyn ModuleRun + '_> {
        Box::new(Run {
            module: self,
            value: None,
        })
    }
}

impl<M: Module> ModuleRun for Run<'_, M> {
    fn step(&mut self, token: &str, position: usize) -> anyhow::Result<()> {
        let previous = self.value.take();
        self.value = Some(self.module.accumulate(previous, token, position)?);
        Ok(())
    }

    fn finish(self: Box<Self>) -> serde_json::Result<Value> {
        // None serializes as null, the "no value yet" sentinel
        serde_json::to_value(&self.value)
    }
}

/// Ordered association list of named modules
///
/// Iteration follows registration order. Registering an existing name
/// replaces its module in place.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: Vec<(String, Box<dyn ErasedModule>)>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M>(&mut self, name: impl Into<String>, module: M)
    where
        M: Module + 'static,
    {
        let name = name.into();
        let module: Box<dyn ErasedModule> = Box::new(module);
        match self.entries.iter().position(|(existing, _)| *existing == name) {
            Some(index) => self.entries[index].1 = module,
            None => self.entries.push((name, module)),
        }
    }

    /// Module names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh per-scan state for every module, in registration order
    pub(crate) fn begin(&self) -> Vec<(&str, Box<dyn ModuleRun + '_>)> {
        self.entries
            .iter()
            .map(|(name, module)| (name.as_str(), module.begin()))
            .collect()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in modules
// ---------------------------------------------------------------------------

/// Names accepted by [`register_builtin`]
pub const BUILTIN_MODULES: &[&str] = &["count", "first", "last", "longest", "positions", "chars"];

/// A token together with its start offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAt {
    pub token: String,
    pub position: usize,
}

/// Register the built-in module `builtin` under `name`
///
/// Returns `false` if no built-in of that name exists.
pub fn register_builtin(registry: &mut ModuleRegistry, name: &str, builtin: &str) -> bool {
    match builtin {
        "count" => registry.register(
            name,
            from_fn(|count: Option<u64>, _: &str, _: usize| count.map_or(1, |c| c + 1)),
        ),
        "first" => registry.register(
            name,
            from_fn(|first: Option<TokenAt>, token: &str, position: usize| {
                first.unwrap_or_else(|| TokenAt {
                    token: token.to_string(),
                    position,
                })
            }),
        ),
        "last" => registry.register(
            name,
            from_fn(|_: Option<TokenAt>, token: &str, position: usize| TokenAt {
                token: token.to_string(),
                position,
            }),
        ),
        "longest" => registry.register(
            name,
            from_fn(|longest: Option<String>, token: &str, _: usize| match longest {
                Some(current) if current.chars().count() >= token.chars().count() => current,
                _ => token.to_string(),
            }),
        ),
        "positions" => registry.register(
            name,
            from_fn(|positions: Option<Vec<usize>>, _: &str, position: usize| {
                let mut positions = positions.unwrap_or_default();
                positions.push(position);
                positions
            }),
        ),
        "chars" => registry.register(
            name,
            from_fn(|total: Option<usize>, token: &str, _: usize| {
                total.unwrap_or(0) + token.chars().count()
            }),
        ),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_all(registry: &ModuleRegistry, tokens: &[(&str, usize)]) -> Vec<(String, Value)> {
        let mut runs = registry.begin();
        for (token, position) in tokens {
            for (_, run) in runs.iter_mut() {
                run.step(token, *position).unwrap();
            }
        }
        runs.into_iter()
            .map(|(name, run)| (name.to_string(), run.finish().unwrap()))
            .collect()
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let mut registry = ModuleRegistry::new();
        registry.register("zeta", from_fn(|_: Option<u8>, _: &str, _: usize| 1u8));
        registry.register("alpha", from_fn(|_: Option<u8>, _: &str, _: usize| 2u8));
        registry.register("mid", from_fn(|_: Option<u8>, _: &str, _: usize| 3u8));

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let mut registry = ModuleRegistry::new();
        registry.register("a", from_fn(|_: Option<u8>, _: &str, _: usize| 1u8));
        registry.register("b", from_fn(|_: Option<u8>, _: &str, _: usize| 2u8));
        registry.register("a", from_fn(|_: Option<u8>, _: &str, _: usize| 9u8));

        assert_eq!(registry.len(), 2);
        let values = run_all(&registry, &[("xx", 0)]);
        assert_eq!(values[0], ("a".to_string(), Value::from(9)));
        assert_eq!(values[1], ("b".to_string(), Value::from(2)));
    }

    #[test]
    fn test_untouched_module_is_null() {
        let mut registry = ModuleRegistry::new();
        register_builtin(&mut registry, "count", "count");
        let values = run_all(&registry, &[]);
        assert_eq!(values[0].1, Value::Null);
    }

    #[test]
    fn test_builtins() {
        let mut registry = ModuleRegistry::new();
        for builtin in BUILTIN_MODULES {
            assert!(register_builtin(&mut registry, builtin, builtin));
        }
        assert!(!register_builtin(&mut registry, "x", "median"));

        let values = run_all(&registry, &[("word", 0), ("another", 9), ("thing", 17)]);
        let get = |name: &str| {
            values
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("count"), serde_json::json!(3));
        assert_eq!(get("first"), serde_json::json!({"token": "word", "position": 0}));
        assert_eq!(get("last"), serde_json::json!({"token": "thing", "position": 17}));
        assert_eq!(get("longest"), serde_json::json!("another"));
        assert_eq!(get("positions"), serde_json::json!([0, 9, 17]));
        assert_eq!(get("chars"), serde_json::json!(16));
    }

    #[test]
    fn test_longest_keeps_first_on_tie() {
        let mut registry = ModuleRegistry::new();
        register_builtin(&mut registry, "longest", "longest");
        let values = run_all(&registry, &[("abc", 0), ("xyz", 4)]);
        assert_eq!(values[0].1, serde_json::json!("abc"));
    }

    #[test]
    fn test_fallible_module_error_surfaces() {
        let mut registry = ModuleRegistry::new();
        registry.register(
            "picky",
            try_from_fn(|_: Option<u8>, token: &str, _: usize| {
                anyhow::ensure!(token != "bad", "refusing token {}", token);
                Ok(1u8)
            }),
        );

        let mut runs = registry.begin();
        assert!(runs[0].1.step("good", 0).is_ok());
        let err = runs[0].1.step("bad", 5).unwrap_err();
        assert!(err.to_string().contains("refusing token bad"));
    }
}
