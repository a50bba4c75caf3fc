//! Job identifiers.

use crate::error::{QueueError, QueueResult};
use rand::TryRngCore;
use rand::rngs::OsRng;

/// Random bytes per job id.
pub const JID_BYTES: usize = 12;

/// Length of a rendered job id.
pub const JID_LEN: usize = JID_BYTES * 2;

/// Generate a job id: 12 bytes from the OS random source as 24 lowercase
/// hex characters.
///
/// Fails with [`QueueError::Identifier`] if the random source does; an
/// empty id is never returned.
pub fn generate_jid() -> QueueResult<String> {
    let mut bytes = [0u8; JID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| QueueError::Identifier(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Whether `jid` has the shape of a generated job id.
pub fn is_valid_jid(jid: &str) -> bool {
    jid.len() == JID_LEN && jid.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_jid_shape() {
        let jid = generate_jid().unwrap();
        assert_eq!(jid.len(), 24);
        assert!(is_valid_jid(&jid));
    }

    #[test]
    fn test_jid_uniqueness() {
        let jids: HashSet<String> = (0..10_000).map(|_| generate_jid().unwrap()).collect();
        assert_eq!(jids.len(), 10_000);
    }

    #[test]
    fn test_is_valid_jid_rejects_bad_input() {
        assert!(!is_valid_jid(""));
        assert!(!is_valid_jid("0123456789ABCDEF01234567"));
        assert!(!is_valid_jid("0123456789abcdef0123456"));
        assert!(!is_valid_jid("0123456789abcdef0123456z"));
        assert!(is_valid_jid("0123456789abcdef01234567"));
    }
}
