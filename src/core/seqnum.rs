//! Purpose: Reject snapshots whose resulting seqnum differs from the caller's expectation.
//! Exports: `validate_seqnum`, `STALE_SNAPSHOT_MESSAGE`.
//! Invariants: Seqnums are compared for equality only; no retry happens here.

use crate::core::error::{Error, ErrorKind};
use crate::core::wire::RawSnapshot;

pub const STALE_SNAPSHOT_MESSAGE: &str =
    "model snapshot seqnum does not match the expected seqnum";

pub fn validate_seqnum(expected: Option<u64>, snapshot: RawSnapshot) -> Result<RawSnapshot, Error> {
    match expected {
        Some(expected) if expected != snapshot.seqnum_after => {
            Err(Error::new(ErrorKind::StaleSnapshot)
                .with_message(STALE_SNAPSHOT_MESSAGE)
                .with_seqnums(expected, snapshot.seqnum_after))
        }
        _ => Ok(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::validate_seqnum;
    use crate::core::error::ErrorKind;
    use crate::core::wire::RawSnapshot;

    fn snapshot(after: u64) -> RawSnapshot {
        RawSnapshot {
            seqnum_before: 0,
            seqnum_after: after,
            ..RawSnapshot::default()
        }
    }

    #[test]
    fn absent_expectation_passes() {
        let out = validate_seqnum(None, snapshot(7)).expect("snapshot");
        assert_eq!(out.seqnum_after, 7);
    }

    #[test]
    fn matching_expectation_passes() {
        assert!(validate_seqnum(Some(7), snapshot(7)).is_ok());
    }

    #[test]
    fn mismatch_is_stale() {
        let err = validate_seqnum(Some(8), snapshot(7)).expect_err("stale");
        assert_eq!(err.kind(), ErrorKind::StaleSnapshot);
        assert_eq!(err.expected_seqnum(), Some(8));
        assert_eq!(err.actual_seqnum(), Some(7));
    }

    #[test]
    fn seqnum_before_is_not_consulted() {
        let mut raw = snapshot(7);
        raw.seqnum_before = 3;
        assert!(validate_seqnum(Some(3), raw).is_err());
    }
}
