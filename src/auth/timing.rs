//! Constant-time comparison
//!
//! Used for token signatures and password digests so the time spent comparing
//! does not depend on where the first differing byte sits.

use subtle::ConstantTimeEq;

/// Compare two byte strings without leaking the position of a mismatch
///
/// A length mismatch returns early; lengths are not secret here (signatures
/// and digests have fixed sizes). Equal-length inputs are compared with
/// `subtle::ConstantTimeEq`.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}
