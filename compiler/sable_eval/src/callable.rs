//! Mixin and function definitions.
//!
//! The binding value for the `mixin` and `function` namespaces. A callable
//! closes over its *defining* environment: free names in the body resolve
//! lexically when it is invoked later, never at the call site.

// Rc: callable bodies are shared between the namespace table and any
// pending invocations.
#![expect(
    clippy::disallowed_types,
    reason = "Rc shares callable bodies between bindings and invocations"
)]

use std::fmt;
use std::rc::Rc;

use sable_ir::{Block, Name};

use crate::environment::Environment;

/// Whether a callable is a mixin or a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallableKind {
    /// Invoked with `@include`, emits statements.
    Mixin,
    /// Invoked from script expressions, returns a value.
    Function,
}

impl CallableKind {
    /// Human-readable label for diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            CallableKind::Mixin => "mixin",
            CallableKind::Function => "function",
        }
    }
}

/// A user-defined mixin or function.
///
/// Holding the defining environment extends that node's lifetime past the
/// control-flow frame that created it. When a callable is stored in a scope
/// it closes over, the handles form a reference cycle; the whole graph
/// belongs to one compile pass and is dropped with it.
#[derive(Clone)]
pub struct Callable {
    name: Name,
    params: Vec<Name>,
    body: Rc<Block>,
    environment: Environment,
    kind: CallableKind,
    has_content: bool,
}

impl Callable {
    /// Define a callable closing over `environment`.
    pub fn new(
        name: Name,
        params: Vec<Name>,
        body: Rc<Block>,
        environment: Environment,
        kind: CallableKind,
    ) -> Self {
        Callable {
            name,
            params,
            body,
            environment,
            kind,
            has_content: false,
        }
    }

    /// Mark the callable as accepting a `@content` block.
    pub fn accepting_content(mut self) -> Self {
        self.has_content = true;
        self
    }

    /// The callable's declared name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Declared parameter names, in order.
    pub fn params(&self) -> &[Name] {
        &self.params
    }

    /// The body block.
    pub fn body(&self) -> &Rc<Block> {
        &self.body
    }

    /// The defining environment (lexical closure).
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Mixin or function.
    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    /// Whether invocations may pass a `@content` block.
    pub fn has_content(&self) -> bool {
        self.has_content
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params.len())
            .field("has_content", &self.has_content)
            .finish_non_exhaustive()
    }
}
