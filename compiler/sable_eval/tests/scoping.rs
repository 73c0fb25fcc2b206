//! End-to-end scoping scenarios, driven the way the tree visitor drives the
//! environment graph during a real compile.

// Rc: tests build the same shared handles the evaluator builds.
#![expect(
    clippy::disallowed_types,
    reason = "tests construct the shared handles the evaluator constructs"
)]

use std::rc::Rc;

use sable_eval::{
    Callable, CallableKind, Content, Environment, ReadOnlyEnvironment, Value,
};
use sable_ir::{Block, Selector};

/// A mixin invocation as the visitor performs it: the body scope is a child
/// of the *defining* environment, the call site becomes its `caller`, and
/// any content block is captured with the call-site environment.
fn invoke_mixin(mixin: &Rc<Callable>, call_site: &Environment, content: Option<Content>) -> Environment {
    let body_env = mixin.environment().child();
    body_env.set_caller(call_site.clone());
    if let Some(content) = content {
        body_env.set_content(content);
    }
    body_env
}

#[test]
fn mixin_body_sees_call_site_selector_from_nested_blocks() {
    let root = Environment::root(None);

    // @mixin button defined at the top level
    let name = root.interner().intern("button");
    let button = Rc::new(Callable::new(
        name,
        vec![],
        Rc::new(Block::default()),
        root.clone(),
        CallableKind::Mixin,
    ));
    root.set_mixin("button", Rc::clone(&button));

    // .card { @include button; }
    let rule_env = root.child();
    rule_env.set_selector(Rc::new(Selector::simple(".card")));

    let found = rule_env.mixin("button");
    assert!(found.is_some_and(|m| Rc::ptr_eq(&m, &button)));

    let body_env = invoke_mixin(&button, &rule_env, None);

    // An @if block nested inside the mixin body still resolves the
    // call site's selector through the caller link.
    let if_env = body_env.child();
    assert_eq!(
        if_env.selector().map(|s| s.to_string()),
        Some(".card".to_owned())
    );
}

#[test]
fn content_block_evaluates_against_its_defining_scope() {
    let root = Environment::root(None);
    root.set_var("base-color", Value::ident("navy"));

    let name = root.interner().intern("media-small");
    let media_small = Rc::new(
        Callable::new(
            name,
            vec![],
            Rc::new(Block::default()),
            root.clone(),
            CallableKind::Mixin,
        )
        .accepting_content(),
    );
    root.set_mixin("media-small", Rc::clone(&media_small));

    // .nav { @include media-small { color: $base-color; } }
    let rule_env = root.child();
    rule_env.set_local_var("base-color", Value::ident("teal"));

    let captured = Content::new(Rc::new(Block::default()), rule_env.clone());
    let body_env = invoke_mixin(&media_small, &rule_env, Some(captured));

    // @content inside the body: the capture's own environment wins, so the
    // rule's local shadow is what the block sees.
    let content = body_env.content();
    assert!(content.is_some());
    if let Some(content) = content {
        assert!(content.env().ptr_eq(&rule_env));
        assert_eq!(content.env().var("base-color"), Some(Value::ident("teal")));
    }

    // The defining scope outlives the @include: dropping the rule handle
    // leaves the capture resolvable.
    drop(rule_env);
    if let Some(content) = body_env.content() {
        assert_eq!(content.env().var("base-color"), Some(Value::ident("teal")));
    }
}

#[test]
fn variable_assignment_deep_in_nesting_updates_the_global_binding() {
    let root = Environment::root(None);
    root.set_var("counter", Value::number(0.0));

    // .a { .b { .c { $counter: $counter + 1 } } }
    let a = root.child();
    let b = a.child();
    let c = b.child();
    c.set_var("counter", Value::number(1.0));

    assert_eq!(root.var("counter"), Some(Value::number(1.0)));

    // Every node of the chain shares the root's stack for backtraces
    let stack = c.stack();
    assert!(stack.ptr_eq(&root.stack()));
    let depth = stack.with_mixin(Some(Rc::from("screen.sable")), 3, "button", || stack.depth());
    assert_eq!(depth, 1);
    assert_eq!(stack.depth(), 0);
}

#[test]
fn function_evaluation_gets_an_identity_stable_read_only_caller() {
    let root = Environment::root(None);
    let call_site = root.child();
    call_site.set_selector(Rc::new(Selector::simple("a:hover")));

    let name = root.interner().intern("shade");
    let shade = Rc::new(Callable::new(
        name,
        vec![root.interner().intern("color")],
        Rc::new(Block::default()),
        root.clone(),
        CallableKind::Function,
    ));
    root.set_function("shade", shade);

    let body_env = root.child();
    body_env.set_caller(call_site.clone());

    // Script built-ins like selector() see the environment read-only.
    let view = ReadOnlyEnvironment::new(body_env);
    let first = view.caller();
    let second = view.caller();
    match (first, second) {
        (Some(first), Some(second)) => {
            assert!(first.ptr_eq(&second));
            assert!(first.base().ptr_eq(&call_site));
            assert_eq!(
                first.selector().map(|s| s.to_string()),
                Some("a:hover".to_owned())
            );
        }
        _ => panic!("read-only caller should resolve"),
    }
}
