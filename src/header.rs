// src/header.rs
//! The wallet policy header: a tiny fixed-shape prefix, in front of the policy body
//! text, describing the wallet's name and committing to its set of keys. Grounded on
//! `wallet.c`'s `read_policy_map_wallet` (field order and every one of its distinct
//! failure points, reproduced here as named `HeaderMismatch` messages instead of the
//! `-1..-10` integer codes) and the teacher's `Header::from_bytes` for the borrowed-slice,
//! manual-field-read style.

use crate::cursor::Cursor;
use crate::error::CoreError;
use crate::limits::{MAX_KEYS, MAX_POLICY_BODY_LENGTH, MAX_WALLET_NAME_LENGTH, SHA256_IMAGE_LEN, WALLET_TYPE_POLICY_MAP};
use crate::trace::trace;

/// The decoded wallet policy header. Every variable-length field borrows directly from
/// the input buffer — there is no owned `name`/`policy_body` copy, matching spec.md's
/// "decode in place" requirement (C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    pub name: &'a [u8],
    pub policy_body: &'a [u8],
    pub n_keys: u16,
    pub keys_info_merkle_root: &'a [u8; SHA256_IMAGE_LEN],
}

impl<'a> Header<'a> {
    /// Decodes a header from the front of `bytes`, returning the header and the number
    /// of bytes consumed. Field order exactly mirrors `read_policy_map_wallet`: type,
    /// name length + name, policy body length (varint) + body, key count (varint),
    /// then the fixed 32-byte keys-info Merkle root.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<(Self, usize), CoreError> {
        let mut cursor = Cursor::new(bytes);

        let wallet_type = cursor.read_u8().ok_or(CoreError::HeaderMismatch("missing wallet type"))?;
        if wallet_type != WALLET_TYPE_POLICY_MAP {
            return Err(CoreError::HeaderMismatch("unsupported wallet type"));
        }

        let name_len = cursor.read_u8().ok_or(CoreError::HeaderMismatch("missing name length"))? as usize;
        if name_len == 0 || name_len > MAX_WALLET_NAME_LENGTH {
            return Err(CoreError::HeaderMismatch("wallet name length out of range"));
        }
        let name = cursor
            .read_bytes(name_len)
            .ok_or(CoreError::HeaderMismatch("truncated wallet name"))?;

        let policy_map_len = cursor
            .read_varint()
            .ok_or(CoreError::HeaderMismatch("missing policy body length"))?;
        if policy_map_len > MAX_POLICY_BODY_LENGTH as u64 {
            return Err(CoreError::HeaderMismatch("policy body too long"));
        }
        let policy_body = cursor
            .read_bytes(policy_map_len as usize)
            .ok_or(CoreError::HeaderMismatch("truncated policy body"))?;

        let n_keys = cursor
            .read_varint()
            .ok_or(CoreError::HeaderMismatch("missing key count"))?;
        if n_keys > MAX_KEYS {
            return Err(CoreError::HeaderMismatch("too many keys"));
        }
        trace!("header: name_len={} policy_body_len={} n_keys={}", name_len, policy_map_len, n_keys);

        let root_bytes = cursor
            .read_bytes(SHA256_IMAGE_LEN)
            .ok_or(CoreError::HeaderMismatch("truncated keys-info merkle root"))?;
        let keys_info_merkle_root: &[u8; SHA256_IMAGE_LEN] = root_bytes
            .try_into()
            .expect("read_bytes(SHA256_IMAGE_LEN) guarantees the exact length");

        let header = Header {
            name,
            policy_body,
            n_keys: n_keys as u16,
            keys_info_merkle_root,
        };
        let consumed = bytes.len() - cursor.remaining();
        Ok((header, consumed))
    }
}
