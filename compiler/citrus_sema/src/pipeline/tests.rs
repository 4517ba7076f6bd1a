#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use citrus_ast::{BinaryOp, NodeKind, NodeState};
use citrus_diagnostic::SemaError;
use citrus_ir::IrBuilder;
use citrus_types::Idx;
use pretty_assertions::assert_eq;

use super::common_type;
use crate::test_helpers::AstBuilder;
use crate::SemaOptions;

fn messages(errors: &[SemaError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

/// Two functions, each returning an undeclared name.
fn two_undefined() -> AstBuilder {
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let ret_a = b.ret(Some(a));
    b.function("f", &[], "int32", vec![ret_a]);
    let c = b.ident("c");
    let ret_c = b.ret(Some(c));
    b.function("g", &[], "int32", vec![ret_c]);
    b
}

// === Error reporting ===

#[test]
fn undefined_symbol() {
    let mut b = AstBuilder::new();
    let missing = b.call_named("nowhere", vec![]);
    b.function("f", &[], "void", vec![missing]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(messages(&errors), vec!["undefined symbol `nowhere`".to_owned()]);
    assert_eq!(errors[0].error_code(), "E3003");
}

#[test]
fn independent_errors_are_batched() {
    let mut module = two_undefined().finish();
    let errors = module.resolve().unwrap_err();
    assert_eq!(
        messages(&errors),
        vec![
            "undefined symbol `a`".to_owned(),
            "undefined symbol `c`".to_owned()
        ]
    );
    assert_eq!(module.errors().len(), 2);
}

#[test]
fn without_batching_the_first_error_stops_resolution() {
    let options = SemaOptions {
        batch_errors: false,
        ..SemaOptions::default()
    };
    let mut module = two_undefined().finish_with(options);
    let errors = module.resolve().unwrap_err();
    assert_eq!(messages(&errors), vec!["undefined symbol `a`".to_owned()]);
}

#[test]
fn dependents_of_a_failed_node_stay_silent() {
    let mut b = AstBuilder::new();
    let missing = b.ident("missing");
    let x = b.var("x", None, Some(missing));
    let x_ref = b.ident("x");
    let y = b.var("y", None, Some(x_ref));
    b.function("f", &[], "void", vec![x, y]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(module.ast.state(x), NodeState::Failed);
    assert_eq!(module.ast.state(y), NodeState::Failed);
}

#[test]
fn dependency_cycle_is_fatal() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let a = b.var("a", Some("int32"), Some(one));
    let two = b.int(2);
    let c = b.var("c", Some("int32"), Some(two));
    b.function("f", &[], "void", vec![a, c]);
    b.ast.add_dependency(a, c).unwrap();
    b.ast.add_dependency(c, a).unwrap();
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_fatal());
    assert!(errors[0].to_string().contains("dependency cycle"), "{errors:?}");
}

#[test]
fn rerunning_resolve_reports_nothing_new() {
    let mut module = two_undefined().finish();
    assert_eq!(module.resolve().unwrap_err().len(), 2);
    module.resolve().unwrap();
    assert_eq!(module.errors().len(), 2);

    let mut backend = IrBuilder::new();
    let errors = module.compile(&mut backend).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(backend.finish().functions.is_empty());
}

#[test]
fn calls_depend_on_their_callee_before_resolution() {
    let mut b = AstBuilder::new();
    b.function("g", &[("a", "int32")], "void", vec![]);
    let missing = b.ident("missing");
    let call = b.call_named("g", vec![missing]);
    b.function("f", &[], "void", vec![call]);
    let mut module = b.finish();

    let NodeKind::Call { callee, .. } = *module.ast.kind(call) else {
        panic!("not a call");
    };
    // The argument fails first, so the callee is never looked up.
    module.resolve().unwrap_err();
    assert_eq!(module.ast.dependencies(call), &[callee]);
    assert_eq!(module.ast.state(callee), NodeState::DependenciesFound);
}

// === Statement checks ===

#[test]
fn loop_condition_must_be_bool() {
    let mut b = AstBuilder::new();
    let cond = b.int(1);
    let lp = b.loop_(vec![], Some(cond), None, vec![], false);
    b.function("f", &[], "void", vec![lp]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(
        messages(&errors),
        vec!["condition of loop is int32, expected bool".to_owned()]
    );
}

#[test]
fn break_outside_of_a_loop() {
    let mut b = AstBuilder::new();
    let brk = b.brk();
    b.function("f", &[], "void", vec![brk]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(
        matches!(&errors[0], SemaError::Code { message, .. } if message.ends_with("outside of a loop"))
    );
}

#[test]
fn break_inside_a_loop_is_accepted() {
    let mut b = AstBuilder::new();
    let brk = b.brk();
    let inner = b.block(vec![brk]);
    let cond = b.boolean(true);
    let lp = b.loop_(vec![], Some(cond), None, vec![inner], false);
    b.function("f", &[], "void", vec![lp]);
    let mut module = b.finish();

    module.resolve().unwrap();
}

#[test]
fn assigning_to_a_literal_is_rejected() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let assign = b.binary(BinaryOp::Assign, one, two);
    b.function("f", &[], "void", vec![assign]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert!(
        matches!(&errors[0], SemaError::Code { message, .. } if message.starts_with("can not assign to")),
        "{errors:?}"
    );
}

#[test]
fn return_value_from_void_function() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let ret = b.ret(Some(one));
    b.function("f", &[], "void", vec![ret]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(
        messages(&errors),
        vec!["can not return a value from a function returning void".to_owned()]
    );
}

#[test]
fn call_arity_mismatch() {
    let mut b = AstBuilder::new();
    b.function("g", &[("a", "int32")], "void", vec![]);
    let one = b.int(1);
    let two = b.int(2);
    let call = b.call_named("g", vec![one, two]);
    b.function("f", &[], "void", vec![call]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(messages(&errors), vec!["expected 1 argument, got 2".to_owned()]);
}

// === Class model ===

#[test]
fn classes_get_a_default_constructor() {
    let mut b = AstBuilder::new();
    let class = b.class("Empty", &[]);
    let mut module = b.finish();
    module.resolve().unwrap();

    let ctors: Vec<_> = module
        .ast
        .children(class)
        .iter()
        .copied()
        .filter(|&c| matches!(module.ast.kind(c), NodeKind::Constructor { method: None, .. }))
        .collect();
    assert_eq!(ctors.len(), 1);
}

#[test]
fn constructor_methods_replace_the_default() {
    let mut b = AstBuilder::new();
    let class = b.class("Point", &[]);
    b.member_var(class, "x", "int32", false);
    let method = b.method(class, "Point", &[("x", "int32")], "void", vec![]);
    let mut module = b.finish();
    module.resolve().unwrap();

    let ctors: Vec<_> = module
        .ast
        .children(class)
        .iter()
        .filter_map(|&c| match module.ast.kind(c) {
            NodeKind::Constructor { method, .. } => Some(*method),
            _ => None,
        })
        .collect();
    assert_eq!(ctors, vec![Some(method)]);
    // `this` is injected ahead of the declared parameter.
    let decl = module.ast.kind(method).fn_decl().unwrap();
    assert_eq!(decl.params.len(), 2);
    assert_eq!(module.ast.name(decl.params[0]), Some("this"));
}

// === Phases ===

#[test]
fn resolve_is_idempotent() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let ret = b.ret(Some(one));
    let f = b.function("f", &[], "int32", vec![ret]);
    let mut module = b.finish();

    module.resolve().unwrap();
    let sig = module.ty(f);
    module.resolve().unwrap();
    assert_eq!(module.ty(f), sig);
    assert_eq!(module.ast.state(f), NodeState::Resolved);
}

#[test]
fn build_skips_uninstantiated_templates() {
    let mut b = AstBuilder::new();
    let x = b.ident("x");
    let ret = b.ret(Some(x));
    let id = b.generic_function("id", &["T"], &[("x", "T")], "T", vec![ret]);
    b.function("main", &[], "void", vec![]);
    let mut module = b.finish();

    let mut backend = IrBuilder::new();
    module.compile(&mut backend).unwrap();
    let ir = backend.finish();
    assert!(ir.function("main").is_some());
    assert!(ir.functions.iter().all(|f| !f.symbol.contains("id")));
    assert_ne!(module.ast.state(id), NodeState::Built);
}

#[test]
fn top_level_variable_is_fatal_at_build() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let global = b.var("counter", Some("int32"), Some(one));
    b.top_level(global);
    let mut module = b.finish();

    module.resolve().unwrap();
    let mut backend = IrBuilder::new();
    let errors = module.compile(&mut backend).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(
        matches!(&errors[0], SemaError::Fatal { message } if message.contains("`counter`")),
        "{errors:?}"
    );
}

// === Operand types ===

#[test]
fn common_type_widens_and_prefers_floating_point() {
    let mut pool = citrus_types::Pool::new();
    let int8 = pool.int(8, true);
    assert_eq!(common_type(&mut pool, int8, Idx::INT32), Some(Idx::INT32));
    assert_eq!(common_type(&mut pool, Idx::INT32, Idx::DOUBLE), Some(Idx::DOUBLE));
    assert_eq!(common_type(&mut pool, Idx::BOOL, Idx::INT32), Some(Idx::INT32));
    let ptr = pool.pointer_to(Idx::INT32);
    assert_eq!(common_type(&mut pool, ptr, Idx::INT32), None);
}
