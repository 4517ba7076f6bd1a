//! One-way matching of a generic signature against a concrete shape.

use citrus_types::{Idx, Pool, TypeData};
use rustc_hash::FxHashMap;

/// Match `pattern` against `actual`, binding type variables declared by
/// `owner`.
///
/// `Infer` in `actual` matches anything, and so does a pattern without
/// variables. Variables of other owners are left alone, which lets a
/// class's parameters be inferred from a method signature that also
/// mentions the method's own. A pointer parameter accepts an array of the
/// same element type.
pub(crate) fn unify(
    pool: &Pool,
    pattern: Idx,
    actual: Idx,
    owner: u32,
    bindings: &mut FxHashMap<Idx, Idx>,
) -> bool {
    if pattern == actual || actual == Idx::INFER {
        return true;
    }
    // Concrete parts are checked by argument conversion, not here.
    if !pool.is_generic(pattern) {
        return true;
    }

    match (pool.data(pattern), pool.data(actual)) {
        (TypeData::Var { owner: var_owner, .. }, _) => {
            if *var_owner != owner {
                return true;
            }
            match bindings.get(&pattern) {
                Some(&bound) => bound == actual,
                None => {
                    bindings.insert(pattern, actual);
                    true
                }
            }
        }
        (TypeData::Pointer(p), TypeData::Pointer(a))
        | (TypeData::Pointer(p), TypeData::Array { elem: a, .. }) => {
            unify(pool, *p, *a, owner, bindings)
        }
        (TypeData::Array { elem: p, len: pl }, TypeData::Array { elem: a, len: al }) => {
            pl == al && unify(pool, *p, *a, owner, bindings)
        }
        (
            TypeData::Function {
                params: pp,
                ret: pr,
                variadic,
            },
            TypeData::Function {
                params: ap, ret: ar, ..
            },
        ) => {
            let arity_ok = if *variadic {
                ap.len() >= pp.len()
            } else {
                ap.len() == pp.len()
            };
            arity_ok
                && pp
                    .iter()
                    .zip(ap.iter())
                    .all(|(&p, &a)| unify(pool, p, a, owner, bindings))
                && unify(pool, *pr, *ar, owner, bindings)
        }
        _ => false,
    }
}
