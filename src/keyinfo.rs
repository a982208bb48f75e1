// src/keyinfo.rs
//! Key-info string parsing (spec.md §5, C5): `[fingerprint/derivation/steps]xpub.../**`.
//! Grounded byte-for-byte on `wallet.c`'s `parse_policy_map_key_info`: the optional
//! `[...]` key-origin block, the BIP32 derivation steps it contains, the extended public
//! key run (alphanumeric, bounded to the loose 111/112-character sanity window the
//! original uses), and the optional trailing `/**` wildcard marker.

use crate::cursor::Cursor;
use crate::error::CoreError;
use crate::lex::{self, is_alphanumeric, is_lowercase_hex};
use crate::limits::{MAX_BIP32_PATH_STEPS, MAX_EXT_PUBKEY_LENGTH, MIN_EXT_PUBKEY_LENGTH};

/// One parsed key-info entry. `ext_pubkey` borrows the base58 run directly from the
/// input; it is validated to be alphanumeric and length-bounded but not base58-decoded
/// here (that belongs to a layer with the secp256k1/bip32 stack, out of scope — spec.md
/// Non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo<'a> {
    pub has_key_origin: bool,
    pub master_key_fingerprint: [u8; 4],
    pub derivation_steps: [u32; MAX_BIP32_PATH_STEPS],
    pub derivation_len: usize,
    pub ext_pubkey: &'a [u8],
    pub has_wildcard: bool,
}

impl<'a> KeyInfo<'a> {
    pub fn parse(cursor: &mut Cursor<'a>) -> Result<Self, CoreError> {
        let mut info = KeyInfo {
            has_key_origin: false,
            master_key_fingerprint: [0u8; 4],
            derivation_steps: [0u32; MAX_BIP32_PATH_STEPS],
            derivation_len: 0,
            ext_pubkey: &[],
            has_wildcard: false,
        };

        if cursor.peek() == Some(b'[') {
            cursor.seek_relative(1);
            info.has_key_origin = true;

            if !cursor.can_read(8) {
                return Err(CoreError::HeaderMismatch("key origin too short"));
            }
            for byte in info.master_key_fingerprint.iter_mut() {
                let c1 = cursor.read_u8().ok_or(CoreError::InputExhausted)?;
                let c2 = cursor.read_u8().ok_or(CoreError::InputExhausted)?;
                if !is_lowercase_hex(c1) || !is_lowercase_hex(c2) {
                    return Err(CoreError::InvalidHex);
                }
                *byte = (hex_nibble(c1) << 4) | hex_nibble(c2);
            }

            while cursor.peek() == Some(b'/') {
                cursor.seek_relative(1);
                if info.derivation_len >= MAX_BIP32_PATH_STEPS {
                    return Err(CoreError::OutOfRange("too many key-origin derivation steps"));
                }
                let step = lex::read_derivation_step(cursor)?;
                info.derivation_steps[info.derivation_len] = step;
                info.derivation_len += 1;
            }

            lex::consume_byte(cursor, b']')?;
        }

        let pubkey_start = *cursor;
        let mut ext_pubkey_len = 0usize;
        while ext_pubkey_len < MAX_EXT_PUBKEY_LENGTH {
            match cursor.peek() {
                Some(c) if is_alphanumeric(c) => {
                    cursor.seek_relative(1);
                    ext_pubkey_len += 1;
                }
                _ => break,
            }
        }

        if ext_pubkey_len < MIN_EXT_PUBKEY_LENGTH || ext_pubkey_len > MAX_EXT_PUBKEY_LENGTH {
            return Err(CoreError::OutOfRange("extended public key has an invalid length"));
        }

        // `pubkey_start` is a `Copy` snapshot taken before the scan above, so re-reading
        // from it hands back one borrowed slice instead of re-validating byte by byte.
        let mut pubkey_start = pubkey_start;
        info.ext_pubkey = pubkey_start
            .read_bytes(ext_pubkey_len)
            .expect("the scan above already confirmed this many bytes are readable");

        if !cursor.can_read(1) {
            return Ok(info);
        }

        info.has_wildcard = true;
        let wildcard = cursor
            .read_bytes(3)
            .ok_or(CoreError::HeaderMismatch("truncated wildcard suffix"))?;
        if cursor.can_read(1) || wildcard != b"/**" {
            return Err(CoreError::HeaderMismatch("expected a trailing /** wildcard"));
        }

        Ok(info)
    }
}

fn hex_nibble(c: u8) -> u8 {
    if c.is_ascii_digit() {
        c - b'0'
    } else {
        c - b'a' + 10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_info_with_origin_and_wildcard() {
        let data = b"[d34db33f/44'/0'/0']xpub6CUGRUonZSQ4TWtTMmzXdrXDtypWKiKrhko4egpiMZbpiaQL2jkwSB1icqYh2cfDfVxdx4df189oLKnC5fSwqPfgyP3hooxujYzAu3fDVmz/**";
        let mut cursor = Cursor::new(data);
        let info = KeyInfo::parse(&mut cursor).unwrap();
        assert!(info.has_key_origin);
        assert_eq!(info.master_key_fingerprint, [0xd3, 0x4d, 0xb3, 0x3f]);
        assert_eq!(info.derivation_len, 3);
        assert_eq!(info.derivation_steps[0], 44 | 0x8000_0000);
        assert!(info.has_wildcard);
        assert!(cursor.is_empty());
    }

    #[test]
    fn parses_bare_xpub_without_origin() {
        let data = b"xpub6CUGRUonZSQ4TWtTMmzXdrXDtypWKiKrhko4egpiMZbpiaQL2jkwSB1icqYh2cfDfVxdx4df189oLKnC5fSwqPfgyP3hooxujYzAu3fDVmz";
        let mut cursor = Cursor::new(data);
        let info = KeyInfo::parse(&mut cursor).unwrap();
        assert!(!info.has_key_origin);
        assert!(!info.has_wildcard);
        assert_eq!(info.ext_pubkey.len(), data.len());
    }

    #[test]
    fn rejects_malformed_wildcard_suffix() {
        let mut data = alloc::vec::Vec::new();
        data.extend_from_slice(b"xpub6CUGRUonZSQ4TWtTMmzXdrXDtypWKiKrhko4egpiMZbpiaQL2jkwSB1icqYh2cfDfVxdx4df189oLKnC5fSwqPfgyP3hooxujYzAu3fDVmz");
        data.extend_from_slice(b"/*x");
        let mut cursor = Cursor::new(&data);
        assert!(KeyInfo::parse(&mut cursor).is_err());
    }

    #[test]
    fn rejects_too_many_derivation_steps() {
        let mut data = alloc::vec::Vec::new();
        data.extend_from_slice(b"[d34db33f");
        for _ in 0..(MAX_BIP32_PATH_STEPS + 1) {
            data.extend_from_slice(b"/0");
        }
        data.extend_from_slice(b"]xpub6CUGRUonZSQ4TWtTMmzXdrXDtypWKiKrhko4egpiMZbpiaQL2jkwSB1icqYh2cfDfVxdx4df189oLKnC5fSwqPfgyP3hooxujYzAu3fDVmz");
        let mut cursor = Cursor::new(&data);
        assert!(KeyInfo::parse(&mut cursor).is_err());
    }
}
