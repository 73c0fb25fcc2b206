//! Environment graph for the Sable evaluator.
//!
//! Scoping here is two-dimensional. `parent` links follow the lexical
//! nesting of the stylesheet and always form a tree rooted at the global
//! scope; `caller` and `content` cross-links follow the dynamic structure of
//! mixin and function invocations. Namespace lookups and writes walk the
//! lexical chain only; dynamic context (`caller`, `content`, `selector`)
//! resolves through both dimensions.
//!
//! Nodes are cheap shared handles. A node stays alive as long as anything
//! reaches it: a child scope, a captured `@content` pairing, or a callable's
//! closure — a scope routinely outlives the control-flow frame that created
//! it.

// Rc is the intentional implementation detail of Environment handles
#![expect(
    clippy::disallowed_types,
    reason = "Rc is the implementation of Environment handles"
)]

use rustc_hash::FxHashMap;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use sable_ir::{Block, Name, Selector, SharedInterner};

use crate::callable::Callable;
use crate::options::Options;
use crate::stack::SharedStack;
use crate::value::Value;

/// Per-namespace binding table on a single node.
///
/// Absent until the first local write; once created, the map is only ever
/// mutated in place, never replaced.
#[derive(Debug)]
struct Scope<T> {
    map: RefCell<Option<FxHashMap<Name, T>>>,
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Scope {
            map: RefCell::new(None),
        }
    }
}

impl<T: Clone> Scope<T> {
    fn get(&self, name: Name) -> Option<T> {
        self.map
            .borrow()
            .as_ref()
            .and_then(|map| map.get(&name).cloned())
    }

    /// Overwrite in place if the table already binds `name`; hand the value
    /// back otherwise.
    fn try_set(&self, name: Name, value: T) -> Result<(), T> {
        let mut map = self.map.borrow_mut();
        match map.as_mut().and_then(|map| map.get_mut(&name)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(value),
        }
    }

    /// Bind `name` locally, creating the table on first use.
    fn set(&self, name: Name, value: T) {
        self.map
            .borrow_mut()
            .get_or_insert_with(FxHashMap::default)
            .insert(name, value);
    }
}

/// Identity of one binding namespace.
///
/// The chain-walking lookup/write machinery is written once, generically,
/// and instantiated for the three namespaces below.
trait NamespaceDef {
    /// What a binding in this namespace holds.
    type Binding: Clone;
    /// Label for trace events.
    const LABEL: &'static str;
    /// This namespace's table on a node.
    fn scope(node: &EnvNode) -> &Scope<Self::Binding>;
}

struct Vars;

impl NamespaceDef for Vars {
    type Binding = Value;
    const LABEL: &'static str = "variable";
    fn scope(node: &EnvNode) -> &Scope<Value> {
        &node.vars
    }
}

struct Mixins;

impl NamespaceDef for Mixins {
    type Binding = Rc<Callable>;
    const LABEL: &'static str = "mixin";
    fn scope(node: &EnvNode) -> &Scope<Rc<Callable>> {
        &node.mixins
    }
}

struct Functions;

impl NamespaceDef for Functions {
    type Binding = Rc<Callable>;
    const LABEL: &'static str = "function";
    fn scope(node: &EnvNode) -> &Scope<Rc<Callable>> {
        &node.functions
    }
}

/// A captured `@content` block paired with the environment that defined it.
///
/// The block is evaluated later in the *defining* environment's context,
/// not wherever the mixin body happens to invoke it.
#[derive(Clone)]
pub struct Content {
    block: Rc<Block>,
    env: Environment,
}

impl Content {
    /// Capture `block` together with its defining environment.
    pub fn new(block: Rc<Block>, env: Environment) -> Self {
        Content { block, env }
    }

    /// The captured block.
    pub fn block(&self) -> &Rc<Block> {
        &self.block
    }

    /// The environment the block was written in.
    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Content")
            .field("stmts", &self.block.len())
            .finish_non_exhaustive()
    }
}

struct EnvNode {
    /// Lexical parent; `None` only for the root.
    parent: Option<Environment>,
    options: Rc<Options>,
    interner: SharedInterner,
    vars: Scope<Value>,
    mixins: Scope<Rc<Callable>>,
    functions: Scope<Rc<Callable>>,
    caller: RefCell<Option<Environment>>,
    content: RefCell<Option<Content>>,
    selector: RefCell<Option<Rc<Selector>>>,
    no_selector: Cell<bool>,
    /// Memoized root of the chain. Never populated on the root itself.
    root: OnceCell<Environment>,
    /// The per-compile call stack; owned by the root only.
    stack: Option<SharedStack>,
}

/// Shared handle to one scope node in the environment graph.
///
/// Cloning is cheap and yields a handle to the same node; use
/// [`Environment::ptr_eq`] for node identity.
#[derive(Clone)]
pub struct Environment(Rc<EnvNode>);

impl Environment {
    /// Create a scope node.
    ///
    /// `options` falls back to the parent's bag, then to the default
    /// configuration. A root node (no parent) also creates the interner and
    /// the shared call stack for the compile pass.
    pub fn new(parent: Option<&Environment>, options: Option<Rc<Options>>) -> Environment {
        match parent {
            Some(parent) => Self::build(Some(parent), options, parent.0.interner.clone(), None),
            None => Self::build(None, options, SharedInterner::new(), Some(SharedStack::new())),
        }
    }

    /// Root environment for a compile pass.
    pub fn root(options: Option<Rc<Options>>) -> Environment {
        Self::new(None, options)
    }

    /// Root environment sharing an interner already used by the front end.
    pub fn root_with_interner(
        options: Option<Rc<Options>>,
        interner: SharedInterner,
    ) -> Environment {
        Self::build(None, options, interner, Some(SharedStack::new()))
    }

    /// Child scope inheriting this node's options.
    pub fn child(&self) -> Environment {
        Environment::new(Some(self), None)
    }

    fn build(
        parent: Option<&Environment>,
        options: Option<Rc<Options>>,
        interner: SharedInterner,
        stack: Option<SharedStack>,
    ) -> Environment {
        let options = options.unwrap_or_else(|| match parent {
            Some(parent) => Rc::clone(&parent.0.options),
            None => Rc::new(Options::default()),
        });
        Environment(Rc::new(EnvNode {
            parent: parent.cloned(),
            options,
            interner,
            vars: Scope::default(),
            mixins: Scope::default(),
            functions: Scope::default(),
            caller: RefCell::new(None),
            content: RefCell::new(None),
            selector: RefCell::new(None),
            no_selector: Cell::new(false),
            root: OnceCell::new(),
            stack,
        }))
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The lexical parent, if any.
    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// Whether this node is the root of its chain.
    pub fn is_global(&self) -> bool {
        self.0.parent.is_none()
    }

    /// The configuration bag for this compile pass.
    pub fn options(&self) -> &Rc<Options> {
        &self.0.options
    }

    /// The interner shared across the compile pass.
    pub fn interner(&self) -> &SharedInterner {
        &self.0.interner
    }

    /// The root node of this chain.
    ///
    /// Memoized on first request. The root answers for itself without
    /// touching the cache, so the memo never holds a self-referential
    /// handle.
    pub fn global(&self) -> Environment {
        if let Some(parent) = &self.0.parent {
            return self.0.root.get_or_init(|| parent.global()).clone();
        }
        self.clone()
    }

    /// The shared call stack for this compile pass.
    ///
    /// Created once by the root constructor; every node in a chain returns
    /// the identical handle.
    pub fn stack(&self) -> SharedStack {
        if let Some(stack) = &self.0.stack {
            return stack.clone();
        }
        self.global().stack()
    }

    // Dynamic invocation context

    /// The environment active at the call site of the innermost enclosing
    /// mixin or function invocation.
    ///
    /// A node without its own caller forwards the nearest ancestor's, so
    /// plain nested blocks inside a mixin body share the body's caller.
    pub fn caller(&self) -> Option<Environment> {
        if let Some(caller) = self.0.caller.borrow().as_ref() {
            return Some(caller.clone());
        }
        self.0.parent.as_ref().and_then(Environment::caller)
    }

    /// Record the call-site environment on this node.
    pub fn set_caller(&self, caller: Environment) {
        *self.0.caller.borrow_mut() = Some(caller);
    }

    /// The `@content` block passed to the innermost enclosing mixin
    /// invocation, resolved like [`Environment::caller`].
    pub fn content(&self) -> Option<Content> {
        if let Some(content) = self.0.content.borrow().as_ref() {
            return Some(content.clone());
        }
        self.0.parent.as_ref().and_then(Environment::content)
    }

    /// Record a captured content block on this node.
    pub fn set_content(&self, content: Content) {
        *self.0.content.borrow_mut() = Some(content);
    }

    /// The currently active resolved selector.
    ///
    /// Resolution order: a [`Environment::set_no_selector`] override on this
    /// node wins, then this node's own selector, then the caller's, then the
    /// lexical parent's.
    pub fn selector(&self) -> Option<Rc<Selector>> {
        if self.0.no_selector.get() {
            return None;
        }
        if let Some(selector) = self.0.selector.borrow().as_ref() {
            return Some(selector.clone());
        }
        if let Some(selector) = self.caller().and_then(|caller| caller.selector()) {
            return Some(selector);
        }
        self.0.parent.as_ref().and_then(Environment::selector)
    }

    /// Set the active selector, clearing any `set_no_selector` override.
    pub fn set_selector(&self, selector: impl Into<Rc<Selector>>) {
        *self.0.selector.borrow_mut() = Some(selector.into());
        self.0.no_selector.set(false);
    }

    /// Declare that no selector is active here, whatever the caller or the
    /// parent say. Sticky until a later [`Environment::set_selector`] on
    /// this same node; never inherited.
    pub fn set_no_selector(&self) {
        *self.0.selector.borrow_mut() = None;
        self.0.no_selector.set(true);
    }

    // Namespaces

    /// Look up a variable. `None` is a normal outcome; the evaluator decides
    /// whether it is an undefined-variable error.
    pub fn var(&self, name: &str) -> Option<Value> {
        self.read::<Vars>(name)
    }

    /// Reassign the nearest existing `$name` binding, or define it here.
    pub fn set_var(&self, name: &str, value: Value) {
        self.write::<Vars>(name, value);
    }

    /// Define `$name` in this scope, shadowing any outer binding.
    pub fn set_local_var(&self, name: &str, value: Value) {
        self.write_local::<Vars>(name, value);
    }

    /// Define `$name` on the root scope (`!global` assignment).
    pub fn set_global_var(&self, name: &str, value: Value) {
        self.global().write_local::<Vars>(name, value);
    }

    /// Look up a mixin.
    pub fn mixin(&self, name: &str) -> Option<Rc<Callable>> {
        self.read::<Mixins>(name)
    }

    /// Reassign the nearest existing mixin binding, or define it here.
    pub fn set_mixin(&self, name: &str, mixin: Rc<Callable>) {
        self.write::<Mixins>(name, mixin);
    }

    /// Define a mixin in this scope, shadowing any outer binding.
    pub fn set_local_mixin(&self, name: &str, mixin: Rc<Callable>) {
        self.write_local::<Mixins>(name, mixin);
    }

    /// Look up a function.
    pub fn function(&self, name: &str) -> Option<Rc<Callable>> {
        self.read::<Functions>(name)
    }

    /// Reassign the nearest existing function binding, or define it here.
    pub fn set_function(&self, name: &str, function: Rc<Callable>) {
        self.write::<Functions>(name, function);
    }

    /// Define a function in this scope, shadowing any outer binding.
    pub fn set_local_function(&self, name: &str, function: Rc<Callable>) {
        self.write_local::<Functions>(name, function);
    }

    // Generic chain machinery

    /// Normalize an identifier and intern its canonical spelling.
    ///
    /// Underscores and hyphens are interchangeable in Sable identifiers;
    /// the hyphenated spelling is what gets interned, so every spelling of a
    /// name addresses the same binding.
    fn normalize(&self, name: &str) -> Name {
        if name.contains('_') {
            self.0.interner.intern_owned(name.replace('_', "-"))
        } else {
            self.0.interner.intern(name)
        }
    }

    fn read<N: NamespaceDef>(&self, name: &str) -> Option<N::Binding> {
        let name = self.normalize(name);
        let mut env = self.clone();
        loop {
            if let Some(value) = N::scope(&env.0).get(name) {
                return Some(value);
            }
            let parent = env.0.parent.clone()?;
            env = parent;
        }
    }

    /// Reassign the nearest existing binding, or define locally on this
    /// node (not the root) when no owner exists anywhere in the chain.
    #[tracing::instrument(level = "trace", skip(self, value), fields(namespace = N::LABEL))]
    fn write<N: NamespaceDef>(&self, name: &str, value: N::Binding) {
        let name = self.normalize(name);
        if let Err(value) = self.try_write::<N>(name, value) {
            tracing::trace!("no existing binding in chain, defining locally");
            N::scope(&self.0).set(name, value);
        }
    }

    /// Overwrite the binding on the nearest chain node whose local table
    /// already contains `name`. Hands the value back if no node does.
    fn try_write<N: NamespaceDef>(&self, name: Name, value: N::Binding) -> Result<(), N::Binding> {
        let mut env = self.clone();
        let mut value = value;
        loop {
            value = match N::scope(&env.0).try_set(name, value) {
                Ok(()) => return Ok(()),
                Err(value) => value,
            };
            match env.0.parent.clone() {
                Some(parent) => env = parent,
                None => return Err(value),
            }
        }
    }

    /// Define in this node's local table, shadowing any ancestor binding.
    fn write_local<N: NamespaceDef>(&self, name: &str, value: N::Binding) {
        let name = self.normalize(name);
        N::scope(&self.0).set(name, value);
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("global", &self.is_global())
            .field("no_selector", &self.0.no_selector.get())
            .finish_non_exhaustive()
    }
}

/// Read-only view over an [`Environment`].
///
/// Exposes the node's read contract; no write methods exist on this type,
/// so misuse is a compile error rather than a runtime condition. `caller`
/// and `content` results are wrapped read-only and memoized: repeated calls
/// return the identical wrapper, which callers may compare with
/// [`ReadOnlyEnvironment::ptr_eq`].
#[derive(Clone)]
pub struct ReadOnlyEnvironment(Rc<ReadOnlyNode>);

struct ReadOnlyNode {
    env: Environment,
    caller: OnceCell<Option<ReadOnlyEnvironment>>,
    content: OnceCell<Option<ReadOnlyContent>>,
}

/// A content capture as seen through a read-only view.
#[derive(Clone)]
pub struct ReadOnlyContent {
    block: Rc<Block>,
    env: ReadOnlyEnvironment,
}

impl ReadOnlyContent {
    /// The captured block.
    pub fn block(&self) -> &Rc<Block> {
        &self.block
    }

    /// The defining environment, wrapped read-only.
    pub fn env(&self) -> &ReadOnlyEnvironment {
        &self.env
    }
}

impl ReadOnlyEnvironment {
    /// Wrap a node read-only. The view shares the node's options bag.
    pub fn new(env: Environment) -> Self {
        ReadOnlyEnvironment(Rc::new(ReadOnlyNode {
            env,
            caller: OnceCell::new(),
            content: OnceCell::new(),
        }))
    }

    /// The wrapped node.
    pub fn base(&self) -> &Environment {
        &self.0.env
    }

    /// Whether two views are the same wrapper object.
    pub fn ptr_eq(&self, other: &ReadOnlyEnvironment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The caller resolved through the base chain, wrapped read-only.
    ///
    /// Memoized: the base resolution runs once and every later call returns
    /// the identical wrapper.
    pub fn caller(&self) -> Option<ReadOnlyEnvironment> {
        self.0
            .caller
            .get_or_init(|| self.0.env.caller().map(ReadOnlyEnvironment::new))
            .clone()
    }

    /// The content capture resolved through the base chain, its defining
    /// environment wrapped read-only. Memoized like
    /// [`ReadOnlyEnvironment::caller`].
    pub fn content(&self) -> Option<ReadOnlyContent> {
        self.0
            .content
            .get_or_init(|| {
                self.0.env.content().map(|content| ReadOnlyContent {
                    block: Rc::clone(content.block()),
                    env: ReadOnlyEnvironment::new(content.env().clone()),
                })
            })
            .clone()
    }

    // Read-through accessors

    /// Look up a variable on the wrapped node.
    pub fn var(&self, name: &str) -> Option<Value> {
        self.0.env.var(name)
    }

    /// Look up a mixin on the wrapped node.
    pub fn mixin(&self, name: &str) -> Option<Rc<Callable>> {
        self.0.env.mixin(name)
    }

    /// Look up a function on the wrapped node.
    pub fn function(&self, name: &str) -> Option<Rc<Callable>> {
        self.0.env.function(name)
    }

    /// The wrapped node's resolved selector.
    pub fn selector(&self) -> Option<Rc<Selector>> {
        self.0.env.selector()
    }

    /// The wrapped node's options bag.
    pub fn options(&self) -> &Rc<Options> {
        self.0.env.options()
    }

    /// The wrapped node's root.
    pub fn global(&self) -> Environment {
        self.0.env.global()
    }

    /// The wrapped node's call stack.
    pub fn stack(&self) -> SharedStack {
        self.0.env.stack()
    }
}

impl fmt::Debug for ReadOnlyEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyEnvironment")
            .field("env", &self.0.env)
            .finish_non_exhaustive()
    }
}
