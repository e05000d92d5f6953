//! Binary frame codec for the camera stream.
//!
//! ## Wire Layout
//!
//! Every binary WebSocket message from the device is one frame:
//!
//! 1. **Header length** (2 bytes) - u16 little-endian `header_len`
//! 2. **Header** (`header_len` bytes) - UTF-8 JSON [`FrameInfo`](crate::FrameInfo)
//! 3. **Pixels** (`ResX * ResY * 2` bytes) - u16 little-endian samples, row-major
//!
//! Bytes after the pixel section are ignored. A short buffer, invalid JSON, a header
//! missing required fields, or a truncated pixel section is a decode error and the
//! frame is dropped.

mod decoder;
mod encoder;
mod sequence;

pub use decoder::{HEADER_LEN_SIZE, decode_frame};
pub use encoder::encode_frame;
pub use sequence::FrameSequence;

/// Bytes per pixel sample on the wire
pub const BYTES_PER_SAMPLE: usize = 2;
