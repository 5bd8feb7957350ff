//! Typed value model (spec.md §4.6 / C6).
//!
//! `original_source/circuit/encode.go` builds this tree at runtime via Go
//! reflection over struct tags (`toDict`, `toString`, `toArray`,
//! `encodeInterface`). Rust has no equivalent reflection story for this —
//! and wouldn't want one, since it would trade compile-time field-name
//! checking for a stringly-typed runtime walk — so each schema type in
//! [`crate::schema`] instead implements [`Encodable`] directly: a short,
//! hand-written method that builds the same [`Value`] tree the Go reflector
//! would have, but checked by the compiler (the Design Notes' "re-architect
//! as compile-time derivation").

#![forbid(unsafe_code)]

use crate::cs::ConstraintSystem;
use crate::error::SchemaError;
use crate::varstring::VarString;

/// A typed value, mirroring the four shapes `original_source/circuit/
/// encode.go` round-trips through `interface{}`.
pub enum Value<V> {
    /// A field element understood as a bounded non-negative integer.
    Integer(V),
    /// A fixed-capacity [`VarString`].
    Str(VarString<V>),
    /// A fixed-length, ordered list of values (capacity baked into the
    /// schema, not the value — unlike `VarString`, arrays don't carry their
    /// own length prefix; callers mask empty slots via [`is_empty`]).
    Array(Vec<Value<V>>),
    /// An ordered list of `(key, value)` pairs. Key order is fixed by the
    /// schema (Go's reflection walked struct fields in declaration order;
    /// here the schema's `Encodable` impl lists them explicitly), not
    /// sorted at encode time.
    Dict(Vec<(VarString<V>, Value<V>)>),
}

/// Implemented by every schema type that can be turned into a [`Value`]
/// tree for [`crate::encoder::encode_value`].
pub trait Encodable<C: ConstraintSystem> {
    fn to_value(&self, cs: &mut C) -> Result<Value<C::Var>, SchemaError>;
}

/// `IsEmpty`: `1` iff `v` carries no real content — an [`Integer`](Value::Integer)
/// equal to zero, a zero-length string, or a composite whose *head* member
/// (the schema's designated marker field, e.g. `Publication.Title` or
/// `CovidTest.Result` in `original_source/circuit/encode.go`) is itself
/// empty. Used to decide whether a padded array slot (e.g. an unused
/// publication or vaccine-dose entry) should be skipped by policy gadgets
/// that only want to look at real entries.
///
/// Matches `encode.go`'s per-type `IsEmpty` exactly: it is never the
/// conjunction of every member, only the head field's emptiness.
pub fn is_empty<C: ConstraintSystem>(cs: &mut C, v: &Value<C::Var>) -> C::Var {
    match v {
        Value::Integer(x) => cs.is_zero(x),
        Value::Str(s) => cs.is_zero(&s[0]),
        Value::Array(items) => match items.first() {
            Some(head) => is_empty(cs, head),
            None => cs.one(),
        },
        Value::Dict(pairs) => match pairs.first() {
            Some((_, head)) => is_empty(cs, head),
            None => cs.one(),
        },
    }
}
