//! The schema model (C2): an immutable, sorted entry table plus the
//! string-pool sizing computed from it.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::value::Type;

/// One field in a schema. Entries are immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Stable integer identifier in `[1, 65535]`. Id `0` is reserved.
    pub id: u16,
    /// Short textual handle, at most `Limits::name_max` bytes.
    pub name: String,
    /// The entry's declared type.
    pub ty: Type,
    /// Whether the parser populated an initial value for this entry.
    pub has_default: bool,
}

/// Exact buffer sizes an `init` caller needs, computed from a schema alone
/// and independent of which front end parsed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemaSizing {
    /// Number of entries in the schema.
    pub entry_count: usize,
    /// Number of `str`-typed entries.
    pub str_count: usize,
    /// Number of `fstr`-typed entries.
    pub fstr_count: usize,
    /// Total string pool size in bytes (`str` and `fstr` slots combined).
    pub str_pool_bytes: usize,
    /// Bytes needed for the dynamically sized presence bitmap
    /// (`ceil(entry_count / 8)`).
    pub presence_bitmap_bytes: usize,
}

/// An immutable, sorted (`id` ascending) schema: a name, a version, and
/// its entry table. Two contexts may share one schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    map_name: String,
    version: u32,
    entries: Vec<Entry>,
}

impl Schema {
    /// Build a schema from an already-sorted, already-validated entry
    /// list. Parsers call this after running the shared validation in
    /// [`crate::parser::common`]; it re-checks the invariants defensively
    /// so a `Schema` can never be constructed in a broken state regardless
    /// of which front end built it.
    pub(crate) fn new(map_name: String, version: u32, entries: Vec<Entry>) -> Result<Schema> {
        for w in entries.windows(2) {
            if w[0].id >= w[1].id {
                return Err(Error::Parse {
                    context: "entries must be strictly ascending by id".into(),
                });
            }
        }
        Ok(Schema {
            map_name,
            version,
            entries,
        })
    }

    /// The schema's name, as it is stored under reserved key `0` in a
    /// serialized blob.
    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// The schema's version number.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// All entries, sorted ascending by id.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Binary search for an entry by id.
    pub fn entry_by_id(&self, id: u16) -> Option<(usize, &Entry)> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|idx| (idx, &self.entries[idx]))
    }

    /// Linear scan for an entry by short name. Acceptable per the design
    /// note in the spec: `N` is small (`MAX_ENTRIES` by default) and names
    /// are at most a handful of bytes.
    pub fn entry_by_name(&self, name: &str) -> Option<(usize, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.name == name)
    }

    /// Byte offset into the string pool where entry `idx`'s slot begins,
    /// assuming entries are laid out in schema order and only `str`/`fstr`
    /// entries consume pool space. Meaningless (but harmless) for a
    /// non-string entry at `idx`. Both the schema parsers (writing
    /// defaults) and [`crate::context::Context::init`] (populating
    /// `str_offsets`) call this so the two agree without either copying
    /// the other's state.
    pub fn str_slot_offset(&self, limits: &Limits, idx: usize) -> usize {
        self.entries[..idx]
            .iter()
            .filter(|e| e.ty.is_string())
            .map(|e| e.ty.pool_slot_len(limits))
            .sum()
    }

    /// Compute the buffer sizes an `init` caller needs for this schema,
    /// under the given tunable limits (use [`Limits::default`] for the
    /// compiled-in defaults).
    pub fn sizing(&self, limits: &Limits) -> SchemaSizing {
        let entry_count = self.entries.len();
        let str_count = self.entries.iter().filter(|e| e.ty == Type::Str).count();
        let fstr_count = self.entries.iter().filter(|e| e.ty == Type::FStr).count();
        let str_pool_bytes =
            str_count * Type::Str.pool_slot_len(limits) + fstr_count * Type::FStr.pool_slot_len(limits);
        SchemaSizing {
            entry_count,
            str_count,
            fstr_count,
            str_pool_bytes,
            presence_bitmap_bytes: entry_count.div_ceil(8),
        }
    }
}
