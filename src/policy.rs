//! Policy predicates (spec.md §4.9 / C9).
//!
//! Generic gadgets shared by both the PhD and Covid edit/validate circuits
//! in [`crate::schema`]: an append-only history check, inclusive range
//! checks, set membership, a time-window check, and an ASCII character-class
//! format check. None of these know anything about PhD profiles or Covid
//! records — they operate purely on [`Value`] trees and raw field elements,
//! mirroring `original_source/circuit/compare.go`.

#![forbid(unsafe_code)]

use crate::cs::ConstraintSystem;
use crate::error::CsError;
use crate::gadgets::{is_equal, is_less_or_equal};
use crate::value::{is_empty, Value};
use crate::varstring::VarString;
use crate::F;

/// `isEqualInterface`: structural equality over two [`Value`] trees of the
/// same shape. Mismatched shapes (which a well-typed schema never produces)
/// are treated as unequal rather than a panic.
pub fn value_equal<C: ConstraintSystem>(cs: &mut C, a: &Value<C::Var>, b: &Value<C::Var>) -> C::Var {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => is_equal(cs, x, y),
        (Value::Str(x), Value::Str(y)) => {
            let mut acc = is_equal(cs, &x[0], &y[0]);
            for (xi, yi) in x.iter().zip(y.iter()).skip(1) {
                let e = is_equal(cs, xi, yi);
                acc = cs.mul(&acc, &e);
            }
            acc
        }
        (Value::Array(xs), Value::Array(ys)) => {
            let mut acc = cs.one();
            for (xi, yi) in xs.iter().zip(ys.iter()) {
                let e = value_equal(cs, xi, yi);
                acc = cs.mul(&acc, &e);
            }
            acc
        }
        (Value::Dict(xs), Value::Dict(ys)) => {
            let mut acc = cs.one();
            for ((_, xv), (_, yv)) in xs.iter().zip(ys.iter()) {
                let e = value_equal(cs, xv, yv);
                acc = cs.mul(&acc, &e);
            }
            acc
        }
        _ => cs.zero(),
    }
}

/// `checkAppendOnlyPhd` / `checkAppendOnlyCovid` (`compare.go:7-34`): there is
/// an index `k` such that `new[0..k] == old[0..k]` exactly, and every
/// position from `k` onward is empty in *both* `old` and `new` — i.e. `new`
/// is `old` with at most one trailing run of entries written at the first
/// position where the two histories diverge, never two or more independent
/// appends in the same edit.
///
/// This is a stateful left-to-right walk, not an independent per-position
/// check: `pre_equal` is the AND-accumulated "still an exact prefix match"
/// flag, `not_equal` flips on (and latches) the iteration *after* the first
/// mismatch, and `post_equal` — from that point on — AND-accumulates
/// "both sides empty here". The position of the mismatch itself is
/// unconstrained by `post_equal` (that's the newly written entry); every
/// position strictly after it must be empty on both sides, which is what
/// rules out appending more than one entry in a single edit.
///
/// Takes each entry's emptiness flag rather than deriving it internally,
/// since some element types' emptiness marker isn't their first field (e.g.
/// `CovidTest.IsEmpty` reads `Result`, not the head `TestDate` —
/// `original_source/circuit/encode.go`) — callers compute `old_empty`/
/// `new_empty` with whatever rule the element type actually uses.
pub fn append_only<C: ConstraintSystem>(
    cs: &mut C,
    old: &[Value<C::Var>],
    new: &[Value<C::Var>],
    old_empty: &[C::Var],
    new_empty: &[C::Var],
) -> Result<(), CsError> {
    if old.len() != new.len() || old.len() != old_empty.len() || old.len() != new_empty.len() {
        return Err(CsError::AssertionFailed {
            lhs: format!("{}", old.len()),
            rhs: format!("{}/{}/{}", new.len(), old_empty.len(), new_empty.len()),
            context: "append_only: old/new/emptiness length mismatch",
        });
    }
    let mut pre_equal = cs.one();
    let mut not_equal = cs.zero();
    let mut post_equal = cs.one();
    let zero = cs.zero();
    let one = cs.one();

    for (((o, n), oe), ne) in old.iter().zip(new.iter()).zip(old_empty.iter()).zip(new_empty.iter()) {
        let check_none = cs.and(oe, ne);
        let and_checknone_post = cs.and(&check_none, &post_equal);
        post_equal = cs.select(&not_equal, &and_checknone_post, &post_equal);

        let eq = value_equal(cs, o, n);
        pre_equal = cs.and(&pre_equal, &eq);

        not_equal = cs.select(&pre_equal, &zero, &one);
    }

    cs.assert_eq(&post_equal, &one, "append_only: history was not extended by a single trailing run")
}

/// `checkWithinRange`: `lo <= v <= hi`.
pub fn within_range<C: ConstraintSystem>(cs: &mut C, v: &C::Var, lo: &C::Var, hi: &C::Var) -> Result<(), CsError> {
    let one = cs.one();
    let ge = is_less_or_equal(cs, lo, v);
    cs.assert_eq(&ge, &one, "within_range: value below the lower bound")?;
    let le = is_less_or_equal(cs, v, hi);
    cs.assert_eq(&le, &one, "within_range: value above the upper bound")
}

/// `checkOneOfSet`: `v` matches exactly one element of `set` — an
/// arithmetic sum of per-element equality indicators, asserted to equal
/// `1`. This is stricter than a boolean OR over the matches: if `set`
/// contains a duplicate value, `v` matching that value would sum to `2` and
/// be rejected. Callers are responsible for passing duplicate-free sets
/// (spec.md §9's first Open Question keeps this precondition rather than
/// normalizing to OR, matching the original's arithmetic-sum construction).
pub fn one_of_set<C: ConstraintSystem>(cs: &mut C, v: &C::Var, set: &[C::Var]) -> Result<(), CsError> {
    let mut sum = cs.zero();
    for candidate in set {
        let e = is_equal(cs, v, candidate);
        sum = cs.add(&sum, &e);
    }
    let one = cs.one();
    cs.assert_eq(&sum, &one, "one_of_set: value does not match exactly one set element")
}

/// An inclusive `[start, end]` time window, both endpoints Unix seconds.
#[derive(Debug, Clone)]
pub struct TimeRange<V> {
    pub start: V,
    pub end: V,
}

/// `checkTimeInRange`: `range.start < range.end`, *and* `range.start +
/// min_window < range.end` (`original_source/circuit/compare.go`'s
/// `checkTimeInRange`, both conjuncts strict). The second conjunct implies
/// the first only when `min_window >= 0` — callers must only ever construct
/// a `min_window` that is itself non-negative (spec.md §9's second Open
/// Question: `PolicyLimits` carries this as a documented precondition on
/// its window constants rather than the gadget re-deriving `window >= 0`
/// from scratch, since `min_window` is always a compile-time constant here,
/// never a witness value). Both checks are asserted as written, not
/// collapsed into one.
pub fn time_in_range<C: ConstraintSystem>(cs: &mut C, range: &TimeRange<C::Var>, min_window: &C::Var) -> Result<(), CsError> {
    let one = cs.one();
    let starts_before_ends = crate::gadgets::is_less(cs, &range.start, &range.end);
    cs.assert_eq(&starts_before_ends, &one, "time_in_range: start must precede end")?;
    let deadline = cs.add(&range.start, min_window);
    let spans_window = crate::gadgets::is_less(cs, &deadline, &range.end);
    cs.assert_eq(&spans_window, &one, "time_in_range: range shorter than the required window")
}

/// Character classes recognized by [`format`]'s template codes (spec.md
/// §4.9/§6): `1` upper, `2` lower, `3` digit, `4` one of 15 punctuation
/// characters (`!`..`/`, ASCII 33..=47). Unlike [`TimeRange`]'s endpoints,
/// the template itself is a circuit input in `original_source/circuit/
/// types.go` (`PolicyLimits.Format []frontend.Variable`) — a schema picks
/// per-position classes at witness-build time, not circuit-compile time —
/// so [`format`] takes the template as `&[C::Var]`. This enum is only a
/// native-side convenience for building that witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Upper = 1,
    Lower = 2,
    Digit = 3,
    Punct = 4,
}

impl CharClass {
    /// The template code this class is encoded as (spec.md §2: "character
    /// class codes {1,2,3,4}").
    pub fn code(self) -> u64 {
        self as u64
    }
}

fn in_ascii_range<C: ConstraintSystem>(cs: &mut C, byte: &C::Var, lo: u8, hi: u8) -> C::Var {
    let lo_c = cs.constant(F::from(lo as u64));
    let hi_c = cs.constant(F::from(hi as u64));
    let ge = is_less_or_equal(cs, &lo_c, byte);
    let le = is_less_or_equal(cs, byte, &hi_c);
    cs.and(&ge, &le)
}

/// `checkFormat`: for each position `i`, the template-selected character
/// class must match `s[i+1]` — `template[i] == 1` picks the `A`-`Z` check,
/// `2` picks `a`-`z`, `3` picks `0`-`9`, `4` picks the punctuation range —
/// and every position's check is conjoined (`original_source/circuit/
/// compare.go`'s `checkFormat`). `template.len()` must equal the number of
/// real (non-dummy) positions checked; callers pass the schema's fixed
/// format-template length.
pub fn format<C: ConstraintSystem>(cs: &mut C, template: &[C::Var], s: &VarString<C::Var>) -> Result<(), CsError> {
    let one = cs.one();
    for (i, code) in template.iter().enumerate() {
        let byte = &s[i + 1];
        let upper = in_ascii_range(cs, byte, b'A', b'Z');
        let lower = in_ascii_range(cs, byte, b'a', b'z');
        let digit = in_ascii_range(cs, byte, b'0', b'9');
        let punct = in_ascii_range(cs, byte, 33, 47);

        let c_upper = cs.constant(F::from(CharClass::Upper.code()));
        let c_lower = cs.constant(F::from(CharClass::Lower.code()));
        let c_digit = cs.constant(F::from(CharClass::Digit.code()));
        let c_punct = cs.constant(F::from(CharClass::Punct.code()));

        let sel_upper = cs.mul(&is_equal(cs, code, &c_upper), &upper);
        let sel_lower = cs.mul(&is_equal(cs, code, &c_lower), &lower);
        let sel_digit = cs.mul(&is_equal(cs, code, &c_digit), &digit);
        let sel_punct = cs.mul(&is_equal(cs, code, &c_punct), &punct);

        let ab = cs.add(&sel_upper, &sel_lower);
        let cd = cs.add(&sel_digit, &sel_punct);
        let matched = cs.add(&ab, &cd);
        cs.assert_eq(&matched, &one, "format: character doesn't match its template class")?;
    }
    Ok(())
}
