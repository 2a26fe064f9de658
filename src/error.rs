//! Library error types.
use std::fmt;

/// A cfgpack `Result`, normally returning a cfgpack [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A cfgpack error. Encompasses every failure that can happen while parsing
/// a schema, binding a context, or paging a configuration in or out.
///
/// Every public operation in this crate returns one of these variants
/// rather than panicking or aborting; see the crate-level docs for the
/// full error taxonomy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed schema text, malformed JSON schema, or a malformed binary
    /// schema document (missing header, truncated entry, bad default
    /// literal, non-numeric version, ...).
    Parse {
        /// What the parser was doing, e.g. `"header"` or `"entry line 4"`.
        context: String,
    },
    /// A schema declared a type tag this crate doesn't recognize.
    InvalidType {
        /// The offending token or byte, rendered for display.
        found: String,
    },
    /// Two entries share an id, or two entries share a name.
    Duplicate {
        /// `"id"` or `"name"`.
        kind: &'static str,
        /// The id or name that was duplicated.
        value: String,
    },
    /// A caller buffer was too small, a literal overflowed its declared
    /// type, an id fell outside `[1, 65535]`, a name exceeded its max
    /// length, the entry count exceeded the implementation cap, or a
    /// `peek_name` output buffer was too small.
    Bounds {
        /// What was being bounds-checked.
        what: &'static str,
        /// The limit that was violated.
        limit: usize,
        /// The value that violated it.
        actual: usize,
    },
    /// A lookup targeted an id not in the schema, or an entry with no
    /// value currently present.
    Missing {
        /// The id that was looked up.
        id: u32,
    },
    /// An explicit `set` supplied a value of the wrong type, or a `pagein`
    /// wire type wasn't coercible to the schema's type for that entry.
    TypeMismatch {
        /// The schema's declared type.
        expected: &'static str,
        /// The type actually supplied or found on the wire.
        found: &'static str,
    },
    /// A string argument or wire value exceeded its type's maximum length.
    StrTooLong {
        /// `STR_MAX` or `FSTR_MAX`.
        max: usize,
        /// The actual length.
        actual: usize,
    },
    /// Output buffer too small for `pageout` or schema serialization.
    Encode {
        /// What was being written when space ran out.
        step: &'static str,
    },
    /// Truncated or malformed msgpack, a skipper depth overflow, or a
    /// coerced unsigned value that didn't fit its signed target.
    Decode {
        /// What was being read when decoding failed.
        step: &'static str,
    },
    /// Attempted to set/get id 0, or a schema declared an entry with id 0.
    ReservedIndex,
    /// A file-level failure surfaced by an external collaborator (flash
    /// I/O, decompression). This crate's own code never raises it, but the
    /// [`crate::external`] seams report through it.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse { context } => write!(f, "schema parse failed: {}", context),
            Error::InvalidType { found } => write!(f, "unknown type tag: {}", found),
            Error::Duplicate { kind, value } => write!(f, "duplicate {}: {}", kind, value),
            Error::Bounds {
                what,
                limit,
                actual,
            } => write!(f, "{} out of bounds: limit {}, got {}", what, limit, actual),
            Error::Missing { id } => write!(f, "no entry or value for id {}", id),
            Error::TypeMismatch { expected, found } => write!(
                f,
                "type mismatch: schema expects {}, found {}",
                expected, found
            ),
            Error::StrTooLong { max, actual } => {
                write!(f, "string too long: max {} bytes, got {}", max, actual)
            }
            Error::Encode { step } => write!(f, "encode failed: {}", step),
            Error::Decode { step } => write!(f, "decode failed: {}", step),
            Error::ReservedIndex => write!(f, "id 0 is reserved for the schema name"),
            Error::Io(msg) => write!(f, "I/O failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
