//! CFGPack: versioned, zero-heap configuration schemas and MessagePack
//! paging for memory-constrained devices.
//!
//! A device ships with a declarative schema describing its typed
//! configuration fields, keeps a live in-memory copy indexed by small
//! integer ids, serializes it to a compact binary blob, and reloads
//! that blob across reboots and across schema revisions delivered by
//! firmware upgrades. This crate implements the schema model, the two
//! schema front-ends (text and binary, optionally JSON), the runtime
//! context, and the page I/O + migration algebra that ties them
//! together; flash access and decompression are external collaborators
//! (see [`external`]).

mod coerce;
mod codec;
mod context;
mod depth_tracking;
mod error;
mod external;
mod limits;
mod marker;
mod page;
mod parser;
mod schema;
mod value;

pub use coerce::type_coercible;
pub use context::Context;
pub use error::{Error, Result};
pub use external::{Decompressor, FlashIo};
pub use limits::{Limits, FSTR_MAX, MAP_NAME_MAX, MAX_ENTRIES, NAME_MAX, SKIP_MAX_DEPTH, STR_MAX};
pub use page::{coercible, pagein, pagein_compressed, pageout, peek_name, Remap};
pub use schema::{Entry, Schema, SchemaSizing};
pub use value::{Type, Value};

pub mod codec_primitives {
    //! Re-export of the wire-codec primitives for callers building their
    //! own front-ends (e.g. the build-time schema packer).
    pub use crate::codec::decode::{decode_map_header, decode_value, peek_marker, read_marker, WirePayload, WireValue};
    pub use crate::codec::encode::{encode_f32, encode_f64, encode_int, encode_map_header, encode_str, encode_uint, encode_value};
    pub use crate::codec::skip::skip_value;
}

pub mod text {
    //! The text schema grammar front-end.
    pub use crate::parser::text::{measure, parse, Measure};
}

pub mod binary {
    //! The binary (MessagePack) schema front-end.
    pub use crate::parser::binary::{measure, parse, Measure};
}

#[cfg(feature = "json-schema")]
pub mod json {
    //! The optional JSON schema front-end.
    pub use crate::parser::json::{measure, parse, Measure};
}
