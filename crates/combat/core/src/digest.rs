//! Replay digest over the battle log.
//!
//! Two runs from the same roster, handlers and seed produce the same log, so
//! comparing digests is enough to check that a replay matched.

#[cfg(feature = "serde")]
use crate::state::ActionLog;

/// SHA-256 over the bincode encoding of every log entry, in log order.
///
/// # Serialization
///
/// Requires the `serde` feature.
#[cfg(feature = "serde")]
pub fn compute_log_digest(log: &ActionLog) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    for entry in log.iter() {
        // bincode is deterministic for a given value
        if let Ok(bytes) = bincode::serialize(entry) {
            hasher.update(&bytes);
        }
    }
    hasher.finalize().into()
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::state::{Faction, LogEntry, Unit, UnitId};
    use crate::stats::{Element, StatBlock, StatKey};

    fn create_test_log(damage: f64) -> ActionLog {
        let unit = Unit::new(
            UnitId(0),
            "ally",
            Faction::Ally,
            Element::Fire,
            80,
            StatBlock::zeroed()
                .with(StatKey::Hp, 1000.0)
                .with(StatKey::Spd, 100.0),
        );
        let mut entry = LogEntry::new(&unit, "Basic ATK", 100.0, 3);
        entry.damage = damage;
        let mut log = ActionLog::default();
        log.push(entry);
        log
    }

    #[test]
    fn empty_log_hashes_to_empty_input() {
        assert_eq!(
            hex::encode(compute_log_digest(&ActionLog::default())),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn equal_logs_hash_equal() {
        assert_eq!(
            compute_log_digest(&create_test_log(450.0)),
            compute_log_digest(&create_test_log(450.0))
        );
    }

    #[test]
    fn any_change_moves_the_digest() {
        assert_ne!(
            compute_log_digest(&create_test_log(450.0)),
            compute_log_digest(&create_test_log(451.0))
        );
        assert_ne!(
            compute_log_digest(&ActionLog::default()),
            compute_log_digest(&create_test_log(450.0))
        );
    }
}
