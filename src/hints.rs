//! Hint providers (spec.md §4.3 / C3).
//!
//! Hints are prover-side, deterministic, referentially transparent functions
//! of their declared inputs (spec.md §5): `decimal`, `idiv`, `bits`,
//! `merge`, `batchMerge` in `original_source/circuit/hint.go`. The verifier
//! never evaluates them; it only checks the constraints the gadgets in
//! [`crate::gadgets`] and [`crate::varstring`] build around their outputs.
//!
//! [`crate::cs::NativeCs`] invokes these directly, converting between `F`
//! and [`BigUint`] at the boundary. A real R1CS/Plonkish backend would
//! instead register them with its witness solver (`hint.Register` in the
//! original) — the packing conventions documented per function are exactly
//! what such a backend would need to replicate.

#![forbid(unsafe_code)]

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::DUMMY;

/// Identifies which deterministic hint function [`crate::cs::ConstraintSystem::hint`]
/// should invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintId {
    /// Decimal digit split (`getDecimal`).
    Decimal,
    /// Integer division with remainder (`idiv`).
    IDiv,
    /// Low-`n`-bit decomposition (`NBits`).
    Bits,
    /// Two-string merge (`mergeHint`).
    Merge,
    /// Batched k-string merge (`batchMergeHint`).
    BatchMerge,
}

/// `decimal(max_digit, x)`.
///
/// Returns `max_digit + 1` values: `[len, d_1, …, d_{max_digit}]`, where
/// `d_1` is the most significant digit of `x`'s base-10 representation and
/// every position past `len` is zero. `len` is always at least `1` (the
/// decimal rendering of zero is the single digit `"0"`).
pub fn decimal(max_digit: usize, x: &BigUint) -> Result<Vec<BigUint>, &'static str> {
    let s = x.to_str_radix(10);
    let digits: Vec<u8> = s.bytes().map(|b| b - b'0').collect();
    if digits.len() > max_digit {
        return Err("decimal: value needs more digits than max_digit allows");
    }
    let mut out = Vec::with_capacity(max_digit + 1);
    out.push(BigUint::from(digits.len()));
    out.extend(digits.iter().map(|d| BigUint::from(*d)));
    out.extend(std::iter::repeat(BigUint::from(0u8)).take(max_digit - digits.len()));
    Ok(out)
}

/// `idiv(a, b) -> (q, r)` with `a = q*b + r`, `0 <= r < b` for `b != 0`.
///
/// Special-cased for `b = 0` (matching `circuit/hint.go`'s `idiv`): if `a` is
/// also zero the pair `(1, 0)` is returned (an arbitrary but deterministic
/// placeholder — nothing downstream relies on `q` when `b = 0`), otherwise
/// `(0, a)`.
pub fn idiv(a: &BigUint, b: &BigUint) -> (BigUint, BigUint) {
    use num_traits::Zero;
    if b.is_zero() {
        if a.is_zero() {
            (BigUint::from(1u8), BigUint::zero())
        } else {
            (BigUint::zero(), a.clone())
        }
    } else {
        (a / b, a % b)
    }
}

/// `bits(n, v)`: the low `n` bits of `v`, least-significant first.
pub fn bits(n: usize, v: &BigUint) -> Vec<u8> {
    let mut d = v.to_radix_le(2);
    d.resize(n, 0);
    d
}

/// `merge(a, b)`: concatenate two fixed-capacity `VarString` buffers.
///
/// `a = [a_len, a_payload(N1 slots)]`, `b = [b_len, b_payload(N2 slots)]`.
/// Returns `N1 + N2 + 1` values: `[a_len + b_len, a_payload[..a_len],
/// b_payload[..b_len], DUMMY...]`.
pub fn merge(a: &[BigUint], b: &[BigUint]) -> Vec<BigUint> {
    let n1 = a.len() - 1;
    let n2 = b.len() - 1;
    let a_len = a[0].to_usize().expect("VarString length fits in usize");
    let b_len = b[0].to_usize().expect("VarString length fits in usize");
    let mut out = vec![BigUint::from(DUMMY); n1 + n2 + 1];
    out[0] = BigUint::from(a_len + b_len);
    out[1..1 + a_len].clone_from_slice(&a[1..1 + a_len]);
    out[1 + a_len..1 + a_len + b_len].clone_from_slice(&b[1..1 + b_len]);
    out
}

/// `batchMerge(strings)`: concatenate `k` fixed-capacity `VarString` buffers
/// in order. Each `strings[i] = [len_i, payload_i(cap_i slots)]`. Returns
/// `sum(cap_i) + 1` values analogous to [`merge`].
pub fn batch_merge(strings: &[Vec<BigUint>]) -> Vec<BigUint> {
    let total_capacity: usize = strings.iter().map(|s| s.len() - 1).sum();
    let mut out = vec![BigUint::from(DUMMY); total_capacity + 1];
    let mut cur = 0usize;
    for s in strings {
        let len = s[0].to_usize().expect("VarString length fits in usize");
        out[1 + cur..1 + cur + len].clone_from_slice(&s[1..1 + len]);
        cur += len;
    }
    out[0] = BigUint::from(cur);
    out
}
