use citrus_types::{CastOp, Idx, Pool};
use pretty_assertions::assert_eq;

use super::*;

fn sig(symbol: &str, params: Vec<Idx>, ret: Idx) -> FunctionSig {
    FunctionSig {
        symbol: symbol.to_owned(),
        params,
        ret,
        variadic: false,
    }
}

#[test]
fn declare_is_idempotent_per_symbol() {
    let mut builder = IrBuilder::new();
    let a = builder.declare_function(sig("f", vec![], Idx::VOID));
    let b = builder.declare_function(sig("f", vec![], Idx::VOID));
    let c = builder.declare_function(sig("g", vec![], Idx::VOID));
    assert_eq!(a, b);
    assert_ne!(a, c);

    let module = builder.finish();
    assert_eq!(module.functions.len(), 2);
    assert!(module.functions[0].is_declaration());
}

#[test]
fn params_take_first_values() {
    let mut builder = IrBuilder::new();
    let f = builder.declare_function(sig("add", vec![Idx::INT32, Idx::INT32], Idx::INT32));
    builder.begin_function(f);
    let entry = builder.create_block("entry", None);
    builder.position_at(entry);
    let (a, b) = (builder.param(0), builder.param(1));
    let sum = builder.binary(BinOp::Add, Idx::INT32, a, b);
    builder.ret(Some(sum));
    builder.end_function();

    assert_eq!((a.raw(), b.raw(), sum.raw()), (0, 1, 2));
    let module = builder.finish();
    let func = &module.functions[0];
    assert_eq!(func.params, vec![(a, Idx::INT32), (b, Idx::INT32)]);
    assert_eq!(
        func.blocks[0].terminator,
        Terminator::Ret { value: Some(sum) }
    );
}

#[test]
fn before_anchor_controls_layout() {
    let mut builder = IrBuilder::new();
    let f = builder.declare_function(sig("f", vec![], Idx::VOID));
    builder.begin_function(f);
    let entry = builder.create_block("entry", None);
    let exit = builder.create_block("exit", None);
    let body = builder.create_block("body", Some(exit));
    let after = builder.create_block("after", Some(exit));

    builder.position_at(entry);
    builder.br(body);
    builder.position_at(body);
    builder.br(after);
    builder.position_at(after);
    builder.br(exit);
    builder.position_at(exit);
    builder.ret(None);
    builder.end_function();

    let module = builder.finish();
    let names: Vec<_> = module.functions[0]
        .blocks
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(names, vec!["entry", "body", "after", "exit"]);
}

#[test]
fn is_terminated_tracks_current_block() {
    let mut builder = IrBuilder::new();
    let f = builder.declare_function(sig("f", vec![], Idx::VOID));
    builder.begin_function(f);
    let entry = builder.create_block("entry", None);
    let next = builder.create_block("next", None);
    builder.position_at(entry);
    assert!(!builder.is_terminated());
    builder.br(next);
    assert!(builder.is_terminated());
    builder.position_at(next);
    assert!(!builder.is_terminated());
    assert_eq!(builder.current_block(), next);
}

#[test]
fn unterminated_blocks_become_unreachable() {
    let mut builder = IrBuilder::new();
    let f = builder.declare_function(sig("f", vec![], Idx::VOID));
    builder.begin_function(f);
    let entry = builder.create_block("entry", None);
    builder.position_at(entry);
    builder.const_bool(true);
    builder.end_function();

    let module = builder.finish();
    assert_eq!(module.functions[0].blocks[0].terminator, Terminator::Unreachable);
}

#[test]
fn dump_prints_blocks_and_instructions() {
    let mut pool = Pool::new();
    let ptr = pool.pointer_to(Idx::INT32);
    let mut builder = IrBuilder::new();
    builder.declare_function(FunctionSig {
        symbol: "printf".into(),
        params: vec![ptr],
        ret: Idx::INT32,
        variadic: true,
    });
    let main = builder.declare_function(sig("main", vec![], Idx::INT32));
    builder.begin_function(main);
    let entry = builder.create_block("entry", None);
    builder.position_at(entry);
    let slot = builder.alloca(Idx::INT8);
    let small = builder.load(Idx::INT8, slot);
    let wide = builder.cast(CastOp::SExt, small, Idx::INT32);
    builder.ret(Some(wide));
    builder.end_function();

    let text = builder.finish().dump(&pool);
    assert_eq!(
        text,
        "declare int32 @printf(int32* %0, ...)\n\
         \n\
         define int32 @main() {\n\
         entry:\n  \
         %0 = alloca int8\n  \
         %1 = load int8, %0\n  \
         %2 = sext %1 to int32\n  \
         ret %2\n\
         }\n"
    );
}
