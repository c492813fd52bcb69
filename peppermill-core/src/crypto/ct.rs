//! Constant-time comparison

use std::hint::black_box;

/// Compare two byte strings without leaking where they differ.
///
/// Every byte of `expected` is visited and differences are OR-accumulated;
/// the only branch on secret data is the final zero test. A length mismatch
/// is folded into the same accumulator rather than returned early.
pub fn ct_eq(expected: &[u8], given: &[u8]) -> bool {
    let mut diff = (expected.len() ^ given.len()) as u64;

    for (i, &a) in expected.iter().enumerate() {
        let b = given.get(i).copied().unwrap_or(!a);
        diff |= u64::from(black_box(a ^ b));
    }

    black_box(diff) == 0
}
