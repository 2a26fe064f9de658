//! Interfaces for the external collaborators named in §6: flash I/O and
//! optional decompression front-ends. Neither is implemented here — the
//! core only needs the shape a caller's collaborator must expose to
//! hand this crate a blob (or take one from it).

use crate::error::Result;

/// A caller's flash or other persistent-storage driver. The core never
/// implements this; `pagein`/`pageout` work on in-memory byte slices and
/// leave moving those slices to and from storage to the caller.
pub trait FlashIo {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;
    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<()>;
    fn erase(&mut self, offset: u32, len: u32) -> Result<()>;
}

/// A caller's decompression front-end (e.g. LZ4 or heatshrink), for
/// blobs stored compressed. Taken as a parameter at the call site that
/// needs it rather than bound to a context or kept as module-level
/// state, so two contexts never contend over one decoder instance.
pub trait Decompressor {
    /// Decompress `input` into `output`, returning the number of bytes
    /// written. `output` is caller-sized; an undersized buffer is a
    /// `bounds` error from the caller's perspective, not this trait's.
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;
}
