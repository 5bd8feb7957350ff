//! Canonical encoding (spec.md §4.7 / C7).
//!
//! Turns a [`Value`] tree into one canonical byte stream, represented as a
//! [`VarString`], via [`crate::varstring::batch_merge`]. The byte stream is
//! the plaintext that [`crate::cipher::encrypt_record`] seals, so two
//! records that encode to different streams are provably different
//! ciphertexts — which is the whole reason this crate bothers with a
//! canonical encoder rather than comparing structured values directly.
//!
//! Punctuation mirrors JSON (`[`, `,`, `]`, `{`, `:`, `}`) purely so the
//! encoding is visually recognizable and field boundaries are unambiguous;
//! nothing downstream parses it back.

#![forbid(unsafe_code)]

use crate::cs::ConstraintSystem;
use crate::error::CsError;
use crate::gadgets::{is_less, is_not_dummy};
use crate::util::pow10_f;
use crate::value::Value;
use crate::varstring::{self, VarString};
use crate::F;

/// Digit capacity for any encoded integer — enough for a `u64` (max
/// `18446744073709551615`, 20 digits) with one digit of headroom.
pub const MAX_DIGIT: usize = 20;

fn punct<C: ConstraintSystem>(cs: &mut C, ch: u8) -> VarString<C::Var> {
    vec![cs.constant(F::from(1u64)), cs.constant(F::from(ch as u64))]
}

/// `encodeNumber`: hint the decimal digits of `v`, range-check each digit,
/// reconstruct `v` from the digits it claims (via a multiplexed power-of-ten
/// table, since the number of real digits — and hence each digit's
/// positional weight — is itself a witness value, not known at circuit-build
/// time), and return the ASCII rendering as a `VarString`.
pub fn encode_number<C: ConstraintSystem>(cs: &mut C, v: &C::Var) -> Result<VarString<C::Var>, CsError> {
    use crate::hints::HintId;
    let maxd = cs.constant(F::from(MAX_DIGIT as u64));
    let out = cs.hint(HintId::Decimal, &[maxd, v.clone()])?;
    let len = out[0].clone();
    let digits = &out[1..];

    let nine = cs.constant(F::from(9u64));
    let one = cs.one();
    for d in digits {
        let le9 = crate::gadgets::is_less_or_equal(cs, d, &nine);
        cs.assert_eq(&le9, &one, "encode_number: digit out of range")?;
    }

    let pow10: Vec<C::Var> = (0..MAX_DIGIT).map(|k| cs.constant(pow10_f(k))).collect();
    let one_v = cs.one();
    let mut acc = cs.zero();
    for (i, d) in digits.iter().enumerate() {
        let ic = cs.constant(F::from(i as u64));
        let valid = is_less(cs, &ic, &len);
        let len_minus_1 = cs.sub(&len, &one_v);
        let idx = cs.sub(&len_minus_1, &ic);
        let w = crate::gadgets::multiplexer(cs, &pow10, &idx)?;
        let w_valid = cs.mul(&valid, &w);
        let term = cs.mul(d, &w_valid);
        acc = cs.add(&acc, &term);
    }
    cs.assert_eq(&acc, v, "encode_number: digit reconstruction")?;

    let zero_byte = cs.constant(F::from(b'0' as u64));
    let dummy = cs.constant(F::from(crate::DUMMY));
    let mut ascii = Vec::with_capacity(MAX_DIGIT + 1);
    ascii.push(len.clone());
    for (i, d) in digits.iter().enumerate() {
        let ic = cs.constant(F::from(i as u64));
        let valid = is_less(cs, &ic, &len);
        let byte = cs.add(&zero_byte, d);
        ascii.push(cs.select(&valid, &byte, &dummy));
    }
    Ok(ascii)
}

/// `encodeString`: a `VarString` already is its own canonical encoding, so
/// this only re-validates the two structural invariants before handing the
/// buffer onward.
pub fn encode_string<C: ConstraintSystem>(cs: &mut C, s: &VarString<C::Var>) -> Result<VarString<C::Var>, CsError> {
    varstring::legitimacy_check(cs, s)?;
    varstring::range_check_string(cs, s)?;
    Ok(s.clone())
}

/// `encodeInterface`: dispatch on the value's shape.
pub fn encode_value<C: ConstraintSystem>(cs: &mut C, v: &Value<C::Var>) -> Result<VarString<C::Var>, CsError> {
    match v {
        Value::Integer(x) => encode_number(cs, x),
        Value::Str(s) => encode_string(cs, s),
        Value::Array(items) => encode_array(cs, items),
        Value::Dict(pairs) => encode_dict(cs, pairs),
    }
}

/// Zero the length and DUMMY-fill every byte of `seg` when `is_empty` is
/// `1`, leaving it untouched otherwise — the per-segment erasure
/// `encodeArray` applies in `original_source/circuit/encode.go` so that
/// [`varstring::batch_merge`] drops the segment's contribution entirely.
fn mask_segment<C: ConstraintSystem>(cs: &mut C, seg: &mut VarString<C::Var>, is_empty: &C::Var) {
    let zero = cs.zero();
    seg[0] = cs.select(is_empty, &zero, &seg[0]);
    let dummy = cs.constant(F::from(crate::DUMMY));
    for b in seg.iter_mut().skip(1) {
        *b = cs.select(is_empty, &dummy, b);
    }
}

/// `encodeArray`: `[` + comma-separated element encodings + `]`. An empty
/// element (per [`crate::value::is_empty`]) has every segment it emitted —
/// including its leading comma, if any — masked to length-0/all-DUMMY via
/// [`mask_segment`], so the merge erases it rather than leaving a visible
/// `null`-like placeholder.
pub fn encode_array<C: ConstraintSystem>(cs: &mut C, items: &[Value<C::Var>]) -> Result<VarString<C::Var>, CsError> {
    let empties: Vec<C::Var> = items.iter().map(|item| crate::value::is_empty(cs, item)).collect();
    encode_array_with_emptiness(cs, items, &empties)
}

/// Same as [`encode_array`], but takes each element's emptiness flag rather
/// than deriving it from [`crate::value::is_empty`]'s head-element rule.
/// Needed by element types whose emptiness marker isn't their first field —
/// `CovidTest.IsEmpty` reads `Result`, the *second* declared field, in
/// `original_source/circuit/encode.go` — so the convention [`crate::value::is_empty`]
/// encodes can't be reused unmodified for that array.
pub fn encode_array_with_emptiness<C: ConstraintSystem>(
    cs: &mut C,
    items: &[Value<C::Var>],
    empties: &[C::Var],
) -> Result<VarString<C::Var>, CsError> {
    debug_assert_eq!(items.len(), empties.len());
    let open = punct(cs, b'[');
    let close = punct(cs, b']');
    let comma = punct(cs, b',');

    let mut parts = vec![open];
    for (i, (item, empty)) in items.iter().zip(empties.iter()).enumerate() {
        let mut elem_parts = Vec::new();
        if i > 0 {
            elem_parts.push(comma.clone());
        }
        elem_parts.push(encode_value(cs, item)?);
        for seg in &mut elem_parts {
            mask_segment(cs, seg, empty);
        }
        parts.extend(elem_parts);
    }
    parts.push(close);
    varstring::batch_merge(cs, &parts)
}

/// `encodeDict`: `{` + comma-separated `key:value` pairs, in the order
/// `pairs` lists them (the schema's field declaration order, standing in
/// for Go's reflected struct field order) + `}`.
pub fn encode_dict<C: ConstraintSystem>(cs: &mut C, pairs: &[(VarString<C::Var>, Value<C::Var>)]) -> Result<VarString<C::Var>, CsError> {
    let open = punct(cs, b'{');
    let close = punct(cs, b'}');
    let comma = punct(cs, b',');
    let colon = punct(cs, b':');

    let mut parts = vec![open];
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            parts.push(comma.clone());
        }
        parts.push(encode_string(cs, key)?);
        parts.push(colon.clone());
        parts.push(encode_value(cs, value)?);
    }
    parts.push(close);
    varstring::batch_merge(cs, &parts)
}

/// A count of the real (non-dummy) entries in a fixed-capacity array of
/// integers — used by [`crate::policy`] gadgets that must distinguish real
/// history entries from padding without re-deriving [`crate::value::is_empty`]
/// for every call site.
pub fn count_real<C: ConstraintSystem>(cs: &mut C, items: &[C::Var]) -> C::Var {
    let mut acc = cs.zero();
    for item in items {
        let nd = is_not_dummy(cs, item);
        acc = cs.add(&acc, &nd);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::NativeCs;
    use crate::varstring::to_varstring;

    #[test]
    fn encode_number_round_trips_small_and_large_values() {
        let mut cs = NativeCs;
        for v in [0u64, 7, 42, 1000, 123456789] {
            let x = cs.constant(F::from(v));
            let out = encode_number(&mut cs, &x).unwrap();
            let s = v.to_string();
            assert_eq!(out[0], F::from(s.len() as u64));
            for (i, b) in s.bytes().enumerate() {
                assert_eq!(out[i + 1], F::from(b as u64));
            }
        }
    }

    #[test]
    fn encode_string_passes_through_well_formed_varstring() {
        let mut cs = NativeCs;
        let s = to_varstring(&mut cs, "hello", 8).unwrap();
        let out = encode_string(&mut cs, &s).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn encode_array_joins_with_commas_and_brackets() {
        let mut cs = NativeCs;
        let a = cs.constant(F::from(1u64));
        let b = cs.constant(F::from(2u64));
        let arr = vec![Value::Integer(a), Value::Integer(b)];
        let out = encode_array(&mut cs, &arr).unwrap();
        assert_eq!(out[1], F::from(b'[' as u64));
        assert_eq!(out[2], F::from(b'1' as u64));
        assert_eq!(out[3], F::from(b',' as u64));
        assert_eq!(out[4], F::from(b'2' as u64));
        assert_eq!(out[5], F::from(b']' as u64));
    }

    #[test]
    fn count_real_ignores_dummy_entries() {
        let mut cs = NativeCs;
        let dummy = cs.constant(F::from(crate::DUMMY));
        let items: Vec<F> = vec![cs.constant(F::from(1u64)), dummy, cs.constant(F::from(3u64))];
        assert_eq!(count_real(&mut cs, &items), F::from(2u64));
    }

    #[test]
    fn encode_array_erases_empty_trailing_elements() {
        let mut cs = NativeCs;
        let a = cs.constant(F::from(1u64));
        let zero = cs.constant(F::from(0u64));
        let arr = vec![Value::Integer(a), Value::Integer(zero)];
        let out = encode_array(&mut cs, &arr).unwrap();
        // Only "[1]" survives: the empty second element and its comma are
        // masked to length 0 before the batch_merge, so the merge drops them.
        assert_eq!(out[0], F::from(3u64));
        assert_eq!(out[1], F::from(b'[' as u64));
        assert_eq!(out[2], F::from(b'1' as u64));
        assert_eq!(out[3], F::from(b']' as u64));
    }
}
