// src/lex.rs
//! Character classes, token reading, numeric literals and the keyword table shared by
//! the header decoder, key-info parser and script parser. Grounded byte-for-byte on
//! `wallet.c`'s `is_digit`/`is_alpha`/`is_alphanumeric`/`is_lowercase_hex`,
//! `parse_unsigned_decimal`, `buffer_read_hex_hash`, `buffer_read_derivation_step` and
//! the `KNOWN_TOKENS` table (lines 58-88 and 175-316 of `wallet.c`).

use crate::cursor::Cursor;
use crate::error::CoreError;
use crate::limits::{BIP32_FIRST_HARDENED_CHILD, MAX_TOKEN_LENGTH};

pub fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

pub fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

pub fn is_alphanumeric(c: u8) -> bool {
    is_alpha(c) || is_digit(c)
}

/// Only lowercase hex is accepted; uppercase is a parse error (spec.md §4.3).
pub fn is_lowercase_hex(c: u8) -> bool {
    is_digit(c) || (b'a'..=b'f').contains(&c)
}

fn lowercase_hex_to_int(c: u8) -> u8 {
    if is_digit(c) {
        c - b'0'
    } else {
        c - b'a' + 10
    }
}

/// Consumes exactly one byte if it equals `expected`; otherwise the cursor is untouched.
pub fn consume_byte(cursor: &mut Cursor<'_>, expected: u8) -> Result<(), CoreError> {
    match cursor.peek() {
        Some(c) if c == expected => {
            cursor.seek_relative(1);
            Ok(())
        }
        Some(found) => Err(CoreError::InvalidByte { expected, found }),
        None => Err(CoreError::InputExhausted),
    }
}

/// Every keyword recognized by the policy grammar, paired with its token kind.
/// A plain linear scan, exactly like `wallet.c`'s `KNOWN_TOKENS` + `strncmp` loop —
/// the table is small (fixed at compile time) and the lookup is not a hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Zero,
    One,
    Sh,
    Wsh,
    Pkh,
    Wpkh,
    Pk,
    PkK,
    PkH,
    Tr,
    Multi,
    SortedMulti,
    Older,
    After,
    Sha256,
    Hash256,
    Ripemd160,
    Hash160,
    AndOr,
    AndV,
    AndB,
    AndN,
    OrB,
    OrC,
    OrD,
    OrI,
    Thresh,
}

const KNOWN_TOKENS: &[(&str, TokenKind)] = &[
    ("sh", TokenKind::Sh),
    ("wsh", TokenKind::Wsh),
    ("pkh", TokenKind::Pkh),
    ("wpkh", TokenKind::Wpkh),
    ("multi", TokenKind::Multi),
    ("sortedmulti", TokenKind::SortedMulti),
    ("tr", TokenKind::Tr),
    // miniscript tokens (except wrappers, which are single letters handled separately)
    ("0", TokenKind::Zero),
    ("1", TokenKind::One),
    ("pk", TokenKind::Pk),
    ("pk_k", TokenKind::PkK),
    ("pk_h", TokenKind::PkH),
    ("older", TokenKind::Older),
    ("after", TokenKind::After),
    ("sha256", TokenKind::Sha256),
    ("hash256", TokenKind::Hash256),
    ("ripemd160", TokenKind::Ripemd160),
    ("hash160", TokenKind::Hash160),
    ("andor", TokenKind::AndOr),
    ("and_v", TokenKind::AndV),
    ("and_b", TokenKind::AndB),
    ("and_n", TokenKind::AndN),
    ("or_b", TokenKind::OrB),
    ("or_c", TokenKind::OrC),
    ("or_d", TokenKind::OrD),
    ("or_i", TokenKind::OrI),
    ("thresh", TokenKind::Thresh),
];

/// The single-letter miniscript wrapper fragments, in application order outermost-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    A,
    S,
    C,
    T,
    D,
    V,
    J,
    N,
    L,
    U,
}

/// `wallet.c`'s `is_valid_miniscript_wrapper` lookup table, reproduced as a match.
pub fn wrapper_for_byte(c: u8) -> Option<Wrapper> {
    match c {
        b'a' => Some(Wrapper::A),
        b's' => Some(Wrapper::S),
        b'c' => Some(Wrapper::C),
        b'd' => Some(Wrapper::D),
        b'j' => Some(Wrapper::J),
        b'l' => Some(Wrapper::L),
        b'n' => Some(Wrapper::N),
        b't' => Some(Wrapper::T),
        b'u' => Some(Wrapper::U),
        b'v' => Some(Wrapper::V),
        _ => None,
    }
}

/// Reads a maximal run of `[A-Za-z0-9_]`, up to `MAX_TOKEN_LENGTH` bytes, and looks it up
/// in `KNOWN_TOKENS`. Returns `InvalidKeyword` if the run is empty or unrecognized.
pub fn read_token(cursor: &mut Cursor<'_>) -> Result<TokenKind, CoreError> {
    let mut buf = [0u8; MAX_TOKEN_LENGTH];
    let mut len = 0usize;
    while len < MAX_TOKEN_LENGTH {
        match cursor.peek() {
            Some(c) if is_alphanumeric(c) || c == b'_' => {
                buf[len] = c;
                len += 1;
                cursor.seek_relative(1);
            }
            _ => break,
        }
    }
    let word = &buf[..len];
    KNOWN_TOKENS
        .iter()
        .find(|(name, _)| name.as_bytes() == word)
        .map(|(_, kind)| *kind)
        .ok_or(CoreError::InvalidKeyword)
}

/// Parses an unsigned decimal with no leading zeros (`0` alone is fine, `01` is not) and
/// no overflow, into a `u64` accumulator. At least one digit is required.
pub fn parse_unsigned_decimal(cursor: &mut Cursor<'_>) -> Result<u64, CoreError> {
    let mut result: u64 = 0;
    let mut digits_read = 0u32;
    while let Some(c) = cursor.peek() {
        if !is_digit(c) {
            break;
        }
        digits_read += 1;
        let next_digit = (c - b'0') as u64;

        if digits_read == 2 && result == 0 {
            return Err(CoreError::NumericOverflow);
        }

        result = result
            .checked_mul(10)
            .and_then(|r| r.checked_add(next_digit))
            .ok_or(CoreError::NumericOverflow)?;

        cursor.seek_relative(1);
    }
    if digits_read == 0 {
        return Err(CoreError::NumericOverflow);
    }
    Ok(result)
}

/// Reads exactly `2 * n` lowercase hex characters into `out[..n]`.
pub fn read_hex_hash(cursor: &mut Cursor<'_>, out: &mut [u8]) -> Result<(), CoreError> {
    let n = out.len();
    if !cursor.can_read(2 * n) {
        return Err(CoreError::InputExhausted);
    }
    for byte in out.iter_mut() {
        let c1 = cursor.read_u8().ok_or(CoreError::InputExhausted)?;
        let c2 = cursor.read_u8().ok_or(CoreError::InputExhausted)?;
        if !is_lowercase_hex(c1) || !is_lowercase_hex(c2) {
            return Err(CoreError::InvalidHex);
        }
        *byte = (lowercase_hex_to_int(c1) << 4) | lowercase_hex_to_int(c2);
    }
    Ok(())
}

/// Reads a BIP32 derivation step: an unsigned decimal `< 2^31`, optionally followed by
/// `'` to set the hardened bit. The `h` suffix is not accepted (spec.md §4.3).
pub fn read_derivation_step(cursor: &mut Cursor<'_>) -> Result<u32, CoreError> {
    let value = parse_unsigned_decimal(cursor)?;
    if value >= BIP32_FIRST_HARDENED_CHILD as u64 {
        return Err(CoreError::OutOfRange("derivation step must be < 2^31"));
    }
    let mut step = value as u32;
    if cursor.peek() == Some(b'\'') {
        cursor.seek_relative(1);
        step |= BIP32_FIRST_HARDENED_CHILD;
    }
    Ok(step)
}
