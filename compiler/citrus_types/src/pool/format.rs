//! Signature encoding and human-readable display of types.
//!
//! Signatures are compact, prefix-free strings used both as the interning
//! key and as the type component of mangled symbol names:
//!
//! | Type            | Signature                |
//! |-----------------|--------------------------|
//! | `void`          | `v`                      |
//! | `bool`          | `b`                      |
//! | `int32`         | `i32`                    |
//! | `uint8`         | `u8`                     |
//! | `float`         | `f`                      |
//! | `double`        | `d`                      |
//! | `T*`            | `P` + sig(T)             |
//! | `T[n]`          | `A` + n + `_` + sig(T)   |
//! | `(A, B...) -> R`| `F2` + sig(A) + sig(B) + `V` + `R` + sig(R) |
//! | class `Foo`     | `N3Foo_` + decl          |
//! | type var `T`    | `T1T_` + owner           |
//! | `const X`       | `k` + sig(X)             |

use std::fmt::Write;

use crate::{Idx, Pool, TypeData};

impl Pool {
    /// Build the canonical signature of a not-yet-interned type.
    pub(super) fn encode_signature(&self, data: &TypeData, is_const: bool) -> String {
        let mut out = String::with_capacity(8);
        if is_const {
            out.push('k');
        }
        match data {
            TypeData::Void => out.push('v'),
            TypeData::Bool => out.push('b'),
            TypeData::Int { width, signed } => {
                let _ = write!(out, "{}{width}", if *signed { 'i' } else { 'u' });
            }
            TypeData::Float { width: 32 } => out.push('f'),
            TypeData::Float { width: 64 } => out.push('d'),
            TypeData::Float { width } => {
                let _ = write!(out, "g{width}");
            }
            TypeData::Pointer(inner) => {
                out.push('P');
                out.push_str(self.signature(*inner));
            }
            TypeData::Array { elem, len } => {
                let _ = write!(out, "A{len}_");
                out.push_str(self.signature(*elem));
            }
            TypeData::Function {
                params,
                ret,
                variadic,
            } => {
                let _ = write!(out, "F{}", params.len());
                for &param in params {
                    out.push_str(self.signature(param));
                }
                if *variadic {
                    out.push('V');
                }
                out.push('R');
                out.push_str(self.signature(*ret));
            }
            TypeData::Named { name, decl } => {
                let _ = write!(out, "N{}{name}_{decl}", name.len());
            }
            TypeData::Var { name, owner } => {
                let _ = write!(out, "T{}{name}_{owner}", name.len());
            }
            TypeData::Infer => out.push('?'),
        }
        out
    }

    /// Human-readable form of a type, as it would appear in source.
    pub fn get_string(&self, idx: Idx) -> String {
        let mut out = String::new();
        self.write_type(&mut out, idx);
        out
    }

    fn write_type(&self, out: &mut String, idx: Idx) {
        if idx.is_none() {
            out.push_str("<none>");
            return;
        }
        if self.is_const(idx) {
            out.push_str("const ");
        }
        match self.data(idx) {
            TypeData::Void => out.push_str("void"),
            TypeData::Bool => out.push_str("bool"),
            TypeData::Int { width, signed } => {
                let _ = write!(out, "{}int{width}", if *signed { "" } else { "u" });
            }
            TypeData::Float { width: 32 } => out.push_str("float"),
            TypeData::Float { width: 64 } => out.push_str("double"),
            TypeData::Float { width } => {
                let _ = write!(out, "float{width}");
            }
            TypeData::Pointer(inner) => {
                self.write_type(out, *inner);
                out.push('*');
            }
            TypeData::Array { elem, len } => {
                self.write_type(out, *elem);
                let _ = write!(out, "[{len}]");
            }
            TypeData::Function {
                params,
                ret,
                variadic,
            } => {
                out.push('(');
                for (i, &param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, param);
                }
                if *variadic {
                    if !params.is_empty() {
                        out.push_str(", ");
                    }
                    out.push_str("...");
                }
                out.push_str(") -> ");
                self.write_type(out, *ret);
            }
            TypeData::Named { name, .. } | TypeData::Var { name, .. } => out.push_str(name),
            TypeData::Infer => out.push_str("var"),
        }
    }
}
