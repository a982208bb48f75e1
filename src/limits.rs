// src/limits.rs
//! Compile-time consensus limits. There is no runtime configuration in this crate —
//! these `pub const`s are the entire "configuration surface", the same way the teacher
//! crate declares `HEADER_SIZE` / `MAX_TREE_DEPTH` / `MAX_TREE_ARITY` as consts in
//! `header.rs` rather than threading a config struct through the parser.

/// `name_len` in the wallet header: `1..=64`.
pub const MAX_WALLET_NAME_LENGTH: usize = 64;

/// `policy_body_len` in the wallet header, per the default policy size limit.
pub const MAX_POLICY_BODY_LENGTH: usize = 74;

/// `n_keys` in the wallet header.
pub const MAX_KEYS: u64 = 252;

/// Longest keyword in `KNOWN_TOKENS` ("sortedmulti"), used to bound `read_token`.
pub const MAX_TOKEN_LENGTH: usize = 11;

/// Maximum BIP32 derivation steps in a key-info origin.
pub const MAX_BIP32_PATH_STEPS: usize = 8;

/// Extended public key textual length, either bound (inclusive).
pub const MIN_EXT_PUBKEY_LENGTH: usize = 111;
pub const MAX_EXT_PUBKEY_LENGTH: usize = 112;

/// `multi`/`sortedmulti` cosigner limit: `1 <= k <= n <= MAX_COSIGNERS`.
pub const MAX_COSIGNERS: u32 = 16;

/// `older`/`after`: `1 <= n < 2^31`.
pub const MAX_RELATIVE_TIMELOCK: u32 = 1 << 31;

/// Suggested recursion-depth ceiling (spec.md §5): the policy body is at most
/// `MAX_POLICY_BODY_LENGTH` bytes, so a depth this generous can never be reached by a
/// well-formed body, but it still bounds the native call stack against adversarial input.
pub const MAX_RECURSION_DEPTH: usize = 16;

/// Policy-map discriminant byte (`header.kind`).
pub const WALLET_TYPE_POLICY_MAP: u8 = 2;

/// Wire size of the fixed-width part of the hash-image node payloads.
pub const SHA256_IMAGE_LEN: usize = 32;
pub const RIPEMD160_IMAGE_LEN: usize = 20;

/// BIP32 hardened-child bit (external collaborator per spec.md §6).
pub const BIP32_FIRST_HARDENED_CHILD: u32 = 0x8000_0000;
