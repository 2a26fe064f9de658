//! Compile-time tunables and the runtime [`Limits`] override struct.
//!
//! The defaults below match the reference tunables. `MAX_ENTRIES` bounds
//! the schema entry count and sizes the presence bitmap only as an upper
//! safety cap — the bitmap itself is dynamically sized from `entry_count`
//! at `init` time (see [`crate::context::Context::init`]), not pinned to
//! this constant.

/// Default cap on the number of entries a schema may declare.
pub const MAX_ENTRIES: usize = 128;
/// Default bound on container nesting the generic skipper will descend.
pub const SKIP_MAX_DEPTH: usize = 32;
/// Maximum payload length, in bytes, of a `str` value.
pub const STR_MAX: usize = 64;
/// Maximum payload length, in bytes, of an `fstr` value.
pub const FSTR_MAX: usize = 16;
/// Maximum payload length, in bytes, of an entry's short name.
pub const NAME_MAX: usize = 5;
/// Maximum payload length, in bytes, of a schema's `map_name`.
pub const MAP_NAME_MAX: usize = 63;

/// Runtime override of the compile-time tunables above. Parsers and
/// `Context::init` accept a `Limits` so callers with different flash
/// budgets can raise or lower the caps without recompiling against
/// different constants; the module-level constants remain the defaults
/// used by every `Default` instance and convenience constructor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Cap on the number of entries a schema may declare.
    pub max_entries: usize,
    /// Bound on container nesting the generic skipper will descend.
    pub skip_max_depth: usize,
    /// Maximum payload length, in bytes, of a `str` value.
    pub str_max: usize,
    /// Maximum payload length, in bytes, of an `fstr` value.
    pub fstr_max: usize,
    /// Maximum payload length, in bytes, of an entry's short name.
    pub name_max: usize,
    /// Maximum payload length, in bytes, of a schema's `map_name`.
    pub map_name_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_entries: MAX_ENTRIES,
            skip_max_depth: SKIP_MAX_DEPTH,
            str_max: STR_MAX,
            fstr_max: FSTR_MAX,
            name_max: NAME_MAX,
            map_name_max: MAP_NAME_MAX,
        }
    }
}
