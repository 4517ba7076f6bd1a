#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use citrus_ast::{BinaryOp, NodeKind, NodeState};
use citrus_diagnostic::SemaError;
use citrus_ir::IrBuilder;
use citrus_types::{Idx, Pool};
use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;

use super::unify;
use crate::test_helpers::AstBuilder;

/// `id<T>(x: T) -> T { return x; }`
fn identity(b: &mut AstBuilder) -> citrus_ast::NodeId {
    let x = b.ident("x");
    let ret = b.ret(Some(x));
    b.generic_function("id", &["T"], &[("x", "T")], "T", vec![ret])
}

/// `class Box<T> { value: T; Box(v: T) { this.value = v; } }`
fn boxed(b: &mut AstBuilder) -> citrus_ast::NodeId {
    let class = b.class("Box", &["T"]);
    b.member_var(class, "value", "T", false);
    let this = b.ident("this");
    let field = b.member(this, "value");
    let v = b.ident("v");
    let store = b.binary(BinaryOp::Assign, field, v);
    b.method(class, "Box", &[("v", "T")], "void", vec![store]);
    class
}

// === Function templates ===

#[test]
fn one_instance_per_distinct_type_argument() {
    let mut b = AstBuilder::new();
    let id = identity(&mut b);
    let one = b.int(1);
    let first = b.call_named("id", vec![one]);
    let half = b.float(2.5);
    let second = b.call_named("id", vec![half]);
    let three = b.int(3);
    let third = b.call_named("id", vec![three]);
    b.function("f", &[], "void", vec![first, second, third]);
    let mut module = b.finish();

    let mut backend = IrBuilder::new();
    module.compile(&mut backend).unwrap();

    assert_eq!(module.instance_count(id), 2);
    assert_eq!(module.ty(first), Some(Idx::INT32));
    assert_eq!(module.ty(second), Some(Idx::DOUBLE));
    for clone in module.instances_of(id) {
        assert_eq!(module.ast.state(clone), NodeState::Built);
        assert_eq!(module.ast.kind(clone).generics().unwrap().instance_of, Some(id));
    }
    assert_eq!(module.copy_depth(), 0);

    let ir = backend.finish();
    let instances = ir
        .functions
        .iter()
        .filter(|f| f.symbol.starts_with("_C2id"))
        .count();
    assert_eq!(instances, 2);
}

#[test]
fn clones_are_attached_after_their_template() {
    let mut b = AstBuilder::new();
    let id = identity(&mut b);
    let mut module = b.finish();

    let clone = module.create_instance(id, &[Idx::INT64]).unwrap();
    let root = module.ast.parent(id).unwrap();
    assert_eq!(module.ast.parent(clone), Some(root));
    assert_eq!(
        module.ast.index_in_parent(clone),
        module.ast.index_in_parent(id).map(|i| i + 1)
    );
}

#[test]
fn create_instance_is_cached() {
    let mut b = AstBuilder::new();
    let id = identity(&mut b);
    let mut module = b.finish();

    let first = module.create_instance(id, &[Idx::INT32]).unwrap();
    let again = module.create_instance(id, &[Idx::INT32]).unwrap();
    let other = module.create_instance(id, &[Idx::DOUBLE]).unwrap();
    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(module.instances_of(id), vec![first, other]);
    assert_eq!(module.copy_depth(), 0);

    module.resolve().unwrap();
    assert_eq!(module.instance_count(id), 2);
}

#[test]
fn create_instance_checks_arity_and_genericity() {
    let mut b = AstBuilder::new();
    let id = identity(&mut b);
    let plain = b.function("plain", &[], "void", vec![]);
    let mut module = b.finish();

    let err = module.create_instance(id, &[Idx::INT32, Idx::BOOL]).unwrap_err();
    assert!(err.to_string().contains("expects 1 type argument, got 2"), "{err}");
    let err = module.create_instance(plain, &[Idx::INT32]).unwrap_err();
    assert!(err.to_string().ends_with("is not generic"), "{err}");
    assert_eq!(module.instance_count(id), 0);
    assert_eq!(module.copy_depth(), 0);
}

#[test]
fn clone_annotations_are_substituted() {
    let mut b = AstBuilder::new();
    let id = identity(&mut b);
    let mut module = b.finish();

    let clone = module.create_instance(id, &[Idx::UINT8]).unwrap();
    module.resolve().unwrap();
    let sig = module.ty(clone).unwrap();
    assert_eq!(module.pool.get_string(sig), "(uint8) -> uint8");
}

#[test]
fn uninferable_parameter_is_reported() {
    let mut b = AstBuilder::new();
    b.generic_function("make", &["T"], &[], "T", vec![]);
    let call = b.call_named("make", vec![]);
    b.function("f", &[], "void", vec![call]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(
        matches!(&errors[0], SemaError::Code { message, .. } if message.starts_with("can not infer type parameter `T`")),
        "{errors:?}"
    );
}

// === Class templates ===

#[test]
fn generic_class_constructor_specializes_the_class() {
    let mut b = AstBuilder::new();
    let class = boxed(&mut b);
    let one = b.int(1);
    let make = b.ctor_call("Box", vec![one]);
    let var = b.var("b", None, Some(make));
    b.function("f", &[], "void", vec![var]);
    let mut module = b.finish();

    let mut backend = IrBuilder::new();
    module.compile(&mut backend).unwrap();

    assert_eq!(module.instance_count(class), 1);
    let clone = module.instances_of(class)[0];
    assert_eq!(module.ast.name(clone), Some("Box<int32>"));
    let ty = module.ty(make).unwrap();
    assert_eq!(module.pool.get_string(ty), "Box<int32>*");

    let NodeKind::CtorCall {
        target: Some(ctor), ..
    } = *module.ast.kind(make)
    else {
        panic!("constructor call was not bound");
    };
    assert_eq!(module.ast.parent(ctor), Some(clone));
    assert_eq!(module.copy_depth(), 0);

    let ir = backend.finish();
    assert!(
        ir.functions.iter().any(|f| f.symbol.starts_with("_C14Box<int32>.new")),
        "{:?}",
        ir.functions.iter().map(|f| &f.symbol).collect::<Vec<_>>()
    );
}

#[test]
fn generic_class_constructor_is_reused() {
    let mut b = AstBuilder::new();
    let class = boxed(&mut b);
    let one = b.int(1);
    let first = b.ctor_call("Box", vec![one]);
    let two = b.int(2);
    let second = b.ctor_call("Box", vec![two]);
    b.function("f", &[], "void", vec![first, second]);
    let mut module = b.finish();

    module.resolve().unwrap();
    assert_eq!(module.instance_count(class), 1);
    assert_eq!(module.ty(first), module.ty(second));
}

#[test]
fn generic_class_without_constructor_method_is_fatal() {
    let mut b = AstBuilder::new();
    let class = b.class("Cell", &["T"]);
    b.member_var(class, "value", "T", false);
    let make = b.ctor_call("Cell", vec![]);
    b.function("f", &[], "void", vec![make]);
    let mut module = b.finish();

    let errors = module.resolve().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_fatal());
    assert!(errors[0].to_string().contains("can't use a default constructor"));
}

#[test]
fn generic_method_of_a_generic_class_specializes_class_first() {
    let mut b = AstBuilder::new();
    let class = boxed(&mut b);
    let u = b.ident("u");
    let ret = b.ret(Some(u));
    let pick = b.generic_method(class, "pick", &["U"], &[("u", "U")], "U", vec![ret]);

    let one = b.int(1);
    let make = b.ctor_call("Box", vec![one]);
    let bx = b.var("bx", None, Some(make));
    let bx_ref = b.ident("bx");
    let member = b.member(bx_ref, "pick");
    let half = b.float(1.5);
    let call = b.call(member, vec![half]);
    b.function("f", &[], "void", vec![bx, call]);
    let mut module = b.finish();

    let mut backend = IrBuilder::new();
    module.compile(&mut backend).unwrap();
    assert_eq!(module.ty(call), Some(Idx::DOUBLE));

    let boxed_int = module.instances_of(class)[0];
    assert_eq!(module.ast.name(boxed_int), Some("Box<int32>"));
    let cloned_pick = module
        .ast
        .children(boxed_int)
        .iter()
        .copied()
        .find(|&m| {
            module.ast.name(m) == Some("pick")
                && module.ast.kind(m).generics().unwrap().is_template()
        })
        .unwrap();
    assert_eq!(module.instance_count(cloned_pick), 1);
    assert_eq!(module.instance_count(pick), 0);

    let NodeKind::Member {
        target: Some(target),
        ..
    } = *module.ast.kind(member)
    else {
        panic!("method was not bound");
    };
    assert_eq!(module.ast.parent(target), Some(boxed_int));
    assert_eq!(module.copy_depth(), 0);
}

// === Matching ===

#[test]
fn unify_binds_owned_variables() {
    let mut pool = Pool::new();
    let t = pool.type_var("T", 7);
    let t_ptr = pool.pointer_to(t);
    let pattern = pool.function(&[t_ptr, t], t, false);
    let int_ptr = pool.pointer_to(Idx::INT32);
    let actual = pool.function(&[int_ptr, Idx::INT32], Idx::INFER, false);

    let mut bindings = FxHashMap::default();
    assert!(unify(&pool, pattern, actual, 7, &mut bindings));
    assert_eq!(bindings.get(&t), Some(&Idx::INT32));
}

#[test]
fn unify_rejects_conflicting_bindings() {
    let mut pool = Pool::new();
    let t = pool.type_var("T", 7);
    let pattern = pool.function(&[t, t], Idx::VOID, false);
    let actual = pool.function(&[Idx::INT32, Idx::DOUBLE], Idx::INFER, false);

    let mut bindings = FxHashMap::default();
    assert!(!unify(&pool, pattern, actual, 7, &mut bindings));
}

#[test]
fn unify_ignores_foreign_variables_and_decays_arrays() {
    let mut pool = Pool::new();
    let t = pool.type_var("T", 7);
    let u = pool.type_var("U", 9);
    let t_ptr = pool.pointer_to(t);
    let pattern = pool.function(&[u, t_ptr], Idx::VOID, false);
    let bytes = pool.array(Idx::INT8, 4);
    let actual = pool.function(&[Idx::DOUBLE, bytes], Idx::INFER, false);

    let mut bindings = FxHashMap::default();
    assert!(unify(&pool, pattern, actual, 7, &mut bindings));
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings.get(&t), Some(&Idx::INT8));
}

#[test]
fn unify_checks_arity() {
    let mut pool = Pool::new();
    let t = pool.type_var("T", 1);
    let fixed = pool.function(&[t], t, false);
    let variadic = pool.function(&[t], t, true);
    let two = pool.function(&[Idx::INT32, Idx::INT32], Idx::INFER, false);

    let mut bindings = FxHashMap::default();
    assert!(!unify(&pool, fixed, two, 1, &mut bindings));
    bindings.clear();
    assert!(unify(&pool, variadic, two, 1, &mut bindings));
}
