//! djb2 checksum and its 5-byte text form.
//!
//! Not a security primitive: it exists so that two operators can compare
//! what was sent with what arrived at a glance.

use crate::codec::bytes_to_hex;

const DJB2_SEED: u32 = 5381;

/// Number of 7-bit groups in the text encoding.
pub const CHECKSUM_TEXT_GROUPS: usize = 5;

/// djb2 over `bytes`: `hash = hash * 33 + byte`, wrapping at 32 bits.
pub fn checksum32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(DJB2_SEED, |hash, &b| {
        hash.wrapping_mul(33).wrapping_add(u32::from(b))
    })
}

/// Split `checksum` into five 7-bit groups, least significant first.
///
/// The last group only carries the top four bits of the value. Peer
/// instances print the same groups, so the layout must not change.
pub fn checksum_groups(mut checksum: u32) -> [u8; CHECKSUM_TEXT_GROUPS] {
    let mut groups = [0u8; CHECKSUM_TEXT_GROUPS];
    for g in groups.iter_mut() {
        *g = (checksum & 0x7F) as u8;
        checksum >>= 7;
    }
    groups
}

/// Hex rendering of [`checksum_groups`], e.g. `"05 2a 00 00 00"` for 5381.
pub fn checksum_text(checksum: u32) -> String {
    bytes_to_hex(&checksum_groups(checksum))
}

/// The line printed under a dump when checksum printing is enabled.
pub fn checksum_line(bytes: &[u8]) -> String {
    let chk = checksum32(bytes);
    format!("Computed checksum is {chk} [{}]", checksum_text(chk))
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_seed() {
        assert_eq!(checksum32(&[]), 5381);
    }

    #[test]
    fn known_values() {
        // 5381 * 33 + 'a'
        assert_eq!(checksum32(b"a"), 177_670);
        assert_eq!(checksum32(&[0x41, 0x42, 0x0a]), 193_449_970);
    }

    #[test]
    fn order_sensitive() {
        assert_ne!(checksum32(b"ab"), checksum32(b"ba"));
        assert_ne!(checksum32(&[1, 2, 3]), checksum32(&[3, 2, 1]));
    }

    #[test]
    fn wraps_instead_of_overflowing() {
        let long = vec![0xffu8; 10_000];
        // Must not panic in debug builds.
        let _ = checksum32(&long);
    }

    #[test]
    fn text_is_always_five_bytes() {
        for v in [0u32, 1, 0x7F, 0x80, 0xFFFF_FFFF, 5381] {
            let text = checksum_text(v);
            assert_eq!(text.split(' ').count(), 5, "{v:#x} -> {text}");
        }
        assert_eq!(checksum_text(0), "00 00 00 00 00");
        assert_eq!(checksum_text(0xFFFF_FFFF), "7f 7f 7f 7f 0f");
    }

    #[test]
    fn groups_are_least_significant_first() {
        // 0x80 = 1 << 7 lands in the second group.
        assert_eq!(checksum_groups(0x80), [0, 1, 0, 0, 0]);
        assert_eq!(checksum_groups(5381), [0x05, 0x2a, 0, 0, 0]);
    }

    #[test]
    fn checksum_line_names_value_and_text() {
        let line = checksum_line(&[0x41, 0x42, 0x0a]);
        assert!(line.contains("193449970"));
        assert!(line.contains(&checksum_text(193_449_970)));
    }
}
