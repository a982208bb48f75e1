// src/wallet_id.rs
//! The wallet policy id: a single SHA-256 over a fixed preimage built from the header
//! (spec.md §6, C8). Grounded on `wallet.c`'s `get_policy_wallet_id`, field for field —
//! including the detail that `n_keys` is hashed as a CompactSize varint even though the
//! header itself stores it as a `u16`. Hashing style (build the full preimage into one
//! `Vec<u8>`, then a single one-shot `Hash::hash` call) follows the teacher's
//! `consensus::ark_labs`/`consensus::second_tech` modules rather than a streaming
//! `HashEngine`, since every preimage here is only a few hundred bytes at most.

use alloc::vec::Vec;

use bitcoin_hashes::{sha256, Hash};

use crate::compact_size::write_compact_size;
use crate::header::Header;
use crate::limits::SHA256_IMAGE_LEN;

/// The 32-byte wallet policy id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletId(pub [u8; SHA256_IMAGE_LEN]);

impl WalletId {
    pub fn as_bytes(&self) -> &[u8; SHA256_IMAGE_LEN] {
        &self.0
    }
}

/// `get_policy_wallet_id`: `sha256(type || name_len || name || varint(policy_map_len) ||
/// policy_map || varint(n_keys) || keys_info_merkle_root)`.
pub fn compute_wallet_id(wallet_type: u8, header: &Header<'_>) -> WalletId {
    let mut preimage = Vec::with_capacity(
        1 + 1 + header.name.len() + 9 + header.policy_body.len() + 9 + SHA256_IMAGE_LEN,
    );

    preimage.push(wallet_type);
    preimage.push(header.name.len() as u8);
    preimage.extend_from_slice(header.name);

    write_compact_size(&mut preimage, header.policy_body.len() as u64);
    preimage.extend_from_slice(header.policy_body);

    write_compact_size(&mut preimage, header.n_keys as u64);
    preimage.extend_from_slice(header.keys_info_merkle_root);

    let digest = sha256::Hash::hash(&preimage);
    WalletId(digest.to_byte_array())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::WALLET_TYPE_POLICY_MAP;

    #[test]
    fn wallet_id_is_deterministic() {
        let root = [0x22u8; 32];
        let header = Header {
            name: b"cold",
            policy_body: b"pk(@0)",
            n_keys: 1,
            keys_info_merkle_root: &root,
        };
        let a = compute_wallet_id(WALLET_TYPE_POLICY_MAP, &header);
        let b = compute_wallet_id(WALLET_TYPE_POLICY_MAP, &header);
        assert_eq!(a, b);
    }

    #[test]
    fn wallet_id_changes_with_name() {
        let root = [0x22u8; 32];
        let header_a = Header {
            name: b"cold",
            policy_body: b"pk(@0)",
            n_keys: 1,
            keys_info_merkle_root: &root,
        };
        let header_b = Header {
            name: b"warm",
            ..header_a
        };
        assert_ne!(
            compute_wallet_id(WALLET_TYPE_POLICY_MAP, &header_a),
            compute_wallet_id(WALLET_TYPE_POLICY_MAP, &header_b)
        );
    }

    #[test]
    fn n_keys_is_hashed_as_a_varint_not_a_fixed_width_field() {
        // n_keys = 253 requires the 0xfd-prefixed varint encoding (3 bytes), not a raw
        // u16 LE pair; if this ever regresses to a fixed-width field the two preimages
        // below would collide with different n_keys values that share a low byte.
        let root = [0x33u8; 32];
        let header_low = Header {
            name: b"x",
            policy_body: b"pk(@0)",
            n_keys: 1,
            keys_info_merkle_root: &root,
        };
        let header_high = Header {
            name: b"x",
            policy_body: b"pk(@0)",
            n_keys: 253,
            keys_info_merkle_root: &root,
        };
        assert_ne!(
            compute_wallet_id(WALLET_TYPE_POLICY_MAP, &header_low),
            compute_wallet_id(WALLET_TYPE_POLICY_MAP, &header_high)
        );
    }
}
