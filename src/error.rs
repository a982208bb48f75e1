// src/error.rs

/// Every failure mode of the cursor, lexer, header decoder, key-info parser, script
/// parser and type calculator collapses into this one enum. There is no recovery path:
/// a failed parse means the caller discards the arena and the half-built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// The cursor ran out of bytes before a required read.
    InputExhausted,

    /// Expected one specific byte (`(`, `)`, `,`, `]`, `'`, `@`, `:`, ...) and found another.
    InvalidByte { expected: u8, found: u8 },

    /// A token was read but it is not in `KNOWN_TOKENS`.
    InvalidKeyword,

    /// A decimal literal violated the leading-zero rule, or overflowed its accumulator.
    NumericOverflow,

    /// A value was syntactically fine but outside its domain (cosigner count, `older` range).
    OutOfRange(&'static str),

    /// A Miniscript type or modifier precondition was violated.
    TypeError(&'static str),

    /// `sh`/`wsh`/`wpkh`/`tr`/`sortedmulti` appeared outside the nesting context the grammar allows.
    ContextError(&'static str),

    /// The body parsed to completion but the cursor was not empty at depth 0.
    TrailingInput(usize),

    /// The arena ran out of its pre-sized node budget.
    OutOfMemory,

    /// A non-lowercase-hex character appeared where hex was expected.
    InvalidHex,

    /// The header's discriminant byte was wrong, or a length field exceeded its limit.
    HeaderMismatch(&'static str),
}

// Manual implementation of Display for no_std environments.
impl core::fmt::Display for CoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InputExhausted => write!(f, "input exhausted before a required read"),
            Self::InvalidByte { expected, found } => write!(
                f,
                "expected byte '{}' (0x{:02x}), found '{}' (0x{:02x})",
                *expected as char, expected, *found as char, found
            ),
            Self::InvalidKeyword => write!(f, "token is not a known keyword"),
            Self::NumericOverflow => write!(f, "decimal literal has a leading zero or overflows"),
            Self::OutOfRange(what) => write!(f, "value out of range: {}", what),
            Self::TypeError(what) => write!(f, "miniscript type error: {}", what),
            Self::ContextError(what) => write!(f, "invalid nesting context: {}", what),
            Self::TrailingInput(n) => {
                write!(f, "{} trailing byte(s) after the outermost script", n)
            }
            Self::OutOfMemory => write!(f, "arena exhausted"),
            Self::InvalidHex => write!(f, "expected lowercase hex, found something else"),
            Self::HeaderMismatch(what) => write!(f, "malformed wallet header: {}", what),
        }
    }
}

// Enable standard Error trait if the "std" feature is on.
#[cfg(feature = "std")]
impl std::error::Error for CoreError {}
