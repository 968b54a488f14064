// src/fingerprint.rs

//! Content fingerprint used for change detection.
//!
//! Not a security boundary: collisions only cost a skipped refresh.

use std::collections::HashMap;

use blake3::Hasher;

use crate::groups::GroupData;
use crate::types::PlayerId;

/// Fingerprint of a category that has never been published.
pub const NEVER_PUBLISHED: u64 = 0;

/// Compute the fingerprint of `groups` with their resolved `names`.
///
/// Covers everything the rendered message depends on: group order, ids,
/// prefixes, member order and each member's name (missing names hash as
/// empty). The result is never [`NEVER_PUBLISHED`].
pub fn compute_fingerprint(groups: &[GroupData], names: &HashMap<PlayerId, String>) -> u64 {
    let mut hasher = Hasher::new();

    for group in groups {
        write_field(&mut hasher, group.id.as_bytes());
        write_field(&mut hasher, group.prefix.as_bytes());
        hasher.update(&(group.members.len() as u64).to_le_bytes());
        for member in group.members.iter() {
            write_field(&mut hasher, member.as_bytes());
            let name = names.get(member).map(String::as_str).unwrap_or("");
            write_field(&mut hasher, name.as_bytes());
        }
    }

    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);

    match u64::from_le_bytes(head) {
        NEVER_PUBLISHED => 1,
        value => value,
    }
}

// Length-prefixed so that ("ab", "c") and ("a", "bc") differ.
fn write_field(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
