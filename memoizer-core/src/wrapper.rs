//! Synthesis of the cache-backed wrapper definition
//!
//! The wrapper takes over the original name and forwards every call through a
//! proxy returned by the memoize adapter. The proxy lives in a function-local
//! `static`, which C++ initializes exactly once, lazily on the first call, and
//! safely when several threads make that first call concurrently. It then
//! lives until program exit.

use crate::descriptor::Parameter;

/// Default name of the adapter callable the generated code relies on
pub const DEFAULT_ADAPTER: &str = "memoize";

/// Name of the function-local static holding the cache-backed callable
pub const PROXY_NAME: &str = "proxy";

/// Builds wrapper definitions that call one adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperSynthesizer {
    adapter: String,
}

impl Default for WrapperSynthesizer {
    fn default() -> Self {
        WrapperSynthesizer::new(DEFAULT_ADAPTER)
    }
}

impl WrapperSynthesizer {
    pub fn new(adapter: impl Into<String>) -> Self {
        WrapperSynthesizer {
            adapter: adapter.into(),
        }
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// First parameter whose name the wrapper body could not tolerate
    ///
    /// A parameter named like the proxy is redeclared by it, and a parameter
    /// named like the adapter's leading segment hides the adapter. A rooted
    /// adapter (`::cache::memoize`) is looked up globally and cannot be hidden.
    pub fn shadowed_parameter<'p>(&self, parameters: &'p [Parameter]) -> Option<&'p Parameter> {
        let adapter_head = (!self.adapter.starts_with("::"))
            .then(|| self.adapter.split("::").next())
            .flatten();
        parameters
            .iter()
            .find(|p| p.name == PROXY_NAME || Some(p.name.as_str()) == adapter_head)
    }

    /// Full wrapper definition, without leading or trailing blank lines
    ///
    /// ```text
    /// int f(int x) {
    /// static const auto proxy = memoize(f__original__);
    /// return proxy(x);
    /// }
    /// ```
    pub fn synthesize(&self, prototype: &str, mangled_name: &str, parameters: &[Parameter]) -> String {
        let arguments = argument_list(parameters);
        let mut definition = String::with_capacity(
            prototype.len() + mangled_name.len() + arguments.len() + self.adapter.len() + 64,
        );

        definition.push_str(prototype);
        definition.push_str(" {\nstatic const auto ");
        definition.push_str(PROXY_NAME);
        definition.push_str(" = ");
        definition.push_str(&self.adapter);
        definition.push('(');
        definition.push_str(mangled_name);
        definition.push_str(");\nreturn ");
        definition.push_str(PROXY_NAME);
        definition.push('(');
        definition.push_str(&arguments);
        definition.push_str(");\n}");

        definition
    }
}

/// Parameter names in declared order, joined by `", "`
pub fn argument_list(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
