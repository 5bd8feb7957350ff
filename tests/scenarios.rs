//! End-to-end scenarios (spec.md §8's "Concrete end-to-end scenarios"),
//! wired through the full PhD reference schema rather than a single gadget
//! in isolation. Scenario 1 (MiMC native/circuit parity) and scenario 6
//! (dummy-masked trailing ciphertext blocks) are exercised as unit tests
//! closer to the code they cover (`src/mimc.rs`, `src/cipher.rs`); this file
//! covers the scenarios that only make sense once a whole record is on the
//! table: key commitment, edit compliance (accept and its rejection
//! variants), and the append-only violation.

use zk_record_policy::cipher;
use zk_record_policy::cs::{ConstraintSystem, NativeCs};
use zk_record_policy::encoder;
use zk_record_policy::policy::TimeRange;
use zk_record_policy::schema::phd::{self, PhDProfile, PhdLimit, Publication};
use zk_record_policy::value::Encodable;
use zk_record_policy::varstring::to_varstring;
use zk_record_policy::F;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("zk_record_policy=debug").try_init();
}

fn publication(cs: &mut NativeCs, title: &str, year: u64) -> Publication<F> {
    Publication { title: to_varstring(cs, title, phd::TITLE_LEN).unwrap(), year: cs.constant(F::from(year)) }
}

fn empty_publication(cs: &mut NativeCs) -> Publication<F> {
    publication(cs, "", 0)
}

fn padded_publications(cs: &mut NativeCs, real: Vec<Publication<F>>) -> Vec<Publication<F>> {
    let mut out = real;
    while out.len() < phd::MAX_PUBLICATIONS {
        out.push(empty_publication(cs));
    }
    out
}

fn profile(cs: &mut NativeCs, status: &str, program_year: u64, student_id: &str, publications: Vec<Publication<F>>, start: u64, end: u64) -> PhDProfile<F> {
    PhDProfile {
        status: to_varstring(cs, status, phd::STATUS_LEN).unwrap(),
        program_year: cs.constant(F::from(program_year)),
        student_id: to_varstring(cs, student_id, phd::STUDENT_ID_LEN).unwrap(),
        publications: padded_publications(cs, publications),
        duration: TimeRange { start: cs.constant(F::from(start)), end: cs.constant(F::from(end)) },
    }
}

/// `PhdLimit` shared by every scenario below: status one of the four real
/// values, program year in `[0, 10]`, `StudentID` of shape
/// `[Upper, Upper, Upper, Digit, Digit]`, and a minimum 3-year program.
fn limit(cs: &mut NativeCs) -> PhdLimit<F> {
    use zk_record_policy::policy::CharClass;
    PhdLimit {
        status_set: [
            to_varstring(cs, "Approved", phd::STATUS_LEN).unwrap(),
            to_varstring(cs, "Ongoing", phd::STATUS_LEN).unwrap(),
            to_varstring(cs, "Graduated", phd::STATUS_LEN).unwrap(),
            to_varstring(cs, "Failed", phd::STATUS_LEN).unwrap(),
        ],
        year_range: (cs.constant(F::from(0u64)), cs.constant(F::from(10u64))),
        format: [CharClass::Upper, CharClass::Upper, CharClass::Upper, CharClass::Digit, CharClass::Digit]
            .iter()
            .map(|c| cs.constant(F::from(c.code())))
            .collect(),
        time_min_range_years: cs.constant(F::from(3u64)),
    }
}

const KEY_BYTES: &[u8] = b"0123456789abcdef01234567"; // 24 bytes, fits one MiMC block.
const PROGRAM_START: u64 = 1_700_000_000;
const PROGRAM_END: u64 = PROGRAM_START + 3 * 31_536_000 + 1_000; // strictly more than 3 years.

fn encrypt(cs: &mut NativeCs, p: &PhDProfile<F>, key: &F) -> Vec<F> {
    let key_var = cs.constant(*key);
    let value = Encodable::<NativeCs>::to_value(p, cs).unwrap();
    let encoded = encoder::encode_value(cs, &value).unwrap();
    cipher::encrypt_record(cs, &key_var, &encoded)
}

/// Scenario 2: a key committed via `CommitKey` and checked via
/// `assert_key_commitment` accepts; a mismatched key is rejected.
#[test]
fn scenario_2_key_commitment() {
    init_tracing();
    let mut cs = NativeCs;
    let key = cipher::key_field(KEY_BYTES).unwrap();
    let committed = cipher::commit_key(KEY_BYTES).unwrap();

    let key_var = cs.constant(key);
    let committed_var = cs.constant(committed);
    zk_record_policy::schema::assert_key_commitment(&mut cs, &committed_var, &key_var).unwrap();

    let wrong_key = cipher::key_field(b"a-completely-different-key").unwrap();
    let wrong_key_var = cs.constant(wrong_key);
    assert!(zk_record_policy::schema::assert_key_commitment(&mut cs, &committed_var, &wrong_key_var).is_err());
}

/// Scenario 3: appending a publication, keeping every policy-governed field
/// in range, accepts; `edit_check` verifies policy compliance *and*
/// ciphertext/commitment agreement together.
#[test]
fn scenario_3_edit_compliance_accepts() {
    init_tracing();
    let mut cs = NativeCs;
    let key = cipher::key_field(KEY_BYTES).unwrap();
    let committed = cipher::commit_key(KEY_BYTES).unwrap();

    let old = profile(&mut cs, "Ongoing", 2, "ABC12", vec![publication(&mut cs, "T1", 2019)], PROGRAM_START, PROGRAM_END);
    let new = profile(
        &mut cs,
        "Ongoing",
        2,
        "ABC12",
        vec![publication(&mut cs, "T1", 2019), publication(&mut cs, "T2", 2022)],
        PROGRAM_START,
        PROGRAM_END,
    );
    let limit = limit(&mut cs);

    let old_cipher = encrypt(&mut cs, &old, &key);
    let new_cipher = encrypt(&mut cs, &new, &key);

    let key_var = cs.constant(key);
    let committed_var = cs.constant(committed);
    phd::edit_check(&mut cs, &old, &new, &limit, &old_cipher, &new_cipher, &committed_var, &key_var).unwrap();
}

/// Scenario 3's rejection half: removing a publication, mutating an existing
/// one, or picking a status outside the allowed set all cause `edit_check`
/// to fail.
#[test]
fn scenario_3_edit_compliance_rejects_variants() {
    init_tracing();
    let mut cs = NativeCs;
    let key = cipher::key_field(KEY_BYTES).unwrap();
    let committed = cipher::commit_key(KEY_BYTES).unwrap();
    let limit = limit(&mut cs);
    let key_var = cs.constant(key);
    let committed_var = cs.constant(committed);

    // Two entries on record, so a divergence anywhere before the tail still
    // has real content after it — `append_only`'s `postEqual` walk only
    // rejects when something *after* the first mismatch fails to be empty on
    // both sides, so a one-entry history can't exercise these rejections.
    let old = profile(
        &mut cs,
        "Ongoing",
        2,
        "ABC12",
        vec![publication(&mut cs, "T1", 2019), publication(&mut cs, "T2", 2020)],
        PROGRAM_START,
        PROGRAM_END,
    );
    let old_cipher = encrypt(&mut cs, &old, &key);

    // Dropping the first entry and shifting T2 forward: position 0 diverges
    // (T1 vs T2), and position 1 then disagrees on emptiness (T2 vs empty).
    let dropped = profile(&mut cs, "Ongoing", 2, "ABC12", vec![publication(&mut cs, "T2", 2020)], PROGRAM_START, PROGRAM_END);
    let dropped_cipher = encrypt(&mut cs, &dropped, &key);
    assert!(phd::edit_check(&mut cs, &old, &dropped, &limit, &old_cipher, &dropped_cipher, &committed_var, &key_var).is_err());

    // Mutating (T1, 2019) into (T1, 2020) while T2 stays put: the divergence
    // at position 0 requires position 1 empty on both sides, but it's real.
    let mutated = profile(
        &mut cs,
        "Ongoing",
        2,
        "ABC12",
        vec![publication(&mut cs, "T1", 2020), publication(&mut cs, "T2", 2020)],
        PROGRAM_START,
        PROGRAM_END,
    );
    let mutated_cipher = encrypt(&mut cs, &mutated, &key);
    assert!(phd::edit_check(&mut cs, &old, &mutated, &limit, &old_cipher, &mutated_cipher, &committed_var, &key_var).is_err());

    // A status outside {Approved, Ongoing, Graduated, Failed}.
    let withdrawn = profile(
        &mut cs,
        "Withdrawn",
        2,
        "ABC12",
        vec![publication(&mut cs, "T1", 2019), publication(&mut cs, "T2", 2020)],
        PROGRAM_START,
        PROGRAM_END,
    );
    let withdrawn_cipher = encrypt(&mut cs, &withdrawn, &key);
    assert!(phd::edit_check(&mut cs, &old, &withdrawn, &limit, &old_cipher, &withdrawn_cipher, &committed_var, &key_var).is_err());
}

/// Scenario 5: dropping the first entry of `newPublications` and shifting
/// the second forward rather than appending — position 0 diverges (T1 vs
/// T2), so position 1 must be empty on both sides, but T2 is still real
/// there, so `append_only` rejects regardless of what else in the edit is
/// otherwise compliant.
#[test]
fn scenario_5_append_only_violation() {
    init_tracing();
    let mut cs = NativeCs;
    let limit = limit(&mut cs);

    let old = profile(
        &mut cs,
        "Ongoing",
        2,
        "ABC12",
        vec![publication(&mut cs, "T1", 2019), publication(&mut cs, "T2", 2020)],
        PROGRAM_START,
        PROGRAM_END,
    );
    // New history drops T1 and keeps only T2 at the front: position 0 no
    // longer matches and was not empty, so append-only must reject.
    let new = profile(&mut cs, "Ongoing", 2, "ABC12", vec![publication(&mut cs, "T2", 2020)], PROGRAM_START, PROGRAM_END);

    assert!(phd::compare_content(&mut cs, &old, &new, &limit).is_err());
}

/// Scenario 4, at the whole-record layer: a malformed `StudentID` is
/// rejected by `edit_check` even though every other field is compliant.
#[test]
fn scenario_4_format_gate_rejects_malformed_student_id() {
    init_tracing();
    let mut cs = NativeCs;
    let key = cipher::key_field(KEY_BYTES).unwrap();
    let committed = cipher::commit_key(KEY_BYTES).unwrap();
    let limit = limit(&mut cs);
    let key_var = cs.constant(key);
    let committed_var = cs.constant(committed);

    let old = profile(&mut cs, "Ongoing", 2, "abc12", vec![publication(&mut cs, "T1", 2019)], PROGRAM_START, PROGRAM_END);
    let new = profile(&mut cs, "Ongoing", 2, "abc12", vec![publication(&mut cs, "T1", 2019)], PROGRAM_START, PROGRAM_END);
    let old_cipher = encrypt(&mut cs, &old, &key);
    let new_cipher = encrypt(&mut cs, &new, &key);

    assert!(phd::edit_check(&mut cs, &old, &new, &limit, &old_cipher, &new_cipher, &committed_var, &key_var).is_err());
}

/// `Validate` (used when presenting a single already-edited record rather
/// than an edit): ciphertext/commitment agreement plus the program-year
/// floor.
#[test]
fn validate_accepts_record_above_floor_and_rejects_below() {
    init_tracing();
    let mut cs = NativeCs;
    let key = cipher::key_field(KEY_BYTES).unwrap();
    let committed = cipher::commit_key(KEY_BYTES).unwrap();
    let key_var = cs.constant(key);
    let committed_var = cs.constant(committed);

    let content = profile(&mut cs, "Ongoing", 4, "ABC12", vec![publication(&mut cs, "T1", 2019)], PROGRAM_START, PROGRAM_END);
    let record = encrypt(&mut cs, &content, &key);

    let min_year = cs.constant(F::from(2u64));
    phd::validate(&mut cs, &content, &record, &committed_var, &key_var, &min_year).unwrap();

    let too_high_floor = cs.constant(F::from(5u64));
    assert!(phd::validate(&mut cs, &content, &record, &committed_var, &key_var, &too_high_floor).is_err());
}
