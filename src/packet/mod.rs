// Telemetry packet encoding
//
// A packet is a fixed, positional big-endian record. Each protocol revision
// declares its field order once as a table of field descriptors; one generic
// encoder walks the table.

pub mod ascii;
pub mod layout;
pub mod revision;

pub use ascii::{pack_ascii, pad_ascii, unpack_ascii, ByteOrder};
pub use layout::{FieldKind, FieldSpec, FieldValue, Layout};
pub use revision::{Frame, Revision};

/// Encoding errors. All of them are fatal: a packet is never truncated or padded.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PacketError {
    #[error("layout {layout}: declared {declared} fields but the table has {actual}")]
    LayoutMismatch {
        layout: &'static str,
        declared: usize,
        actual: usize,
    },
    #[error("layout {layout}: encoded {actual} bytes, expected {expected}")]
    SizeMismatch {
        layout: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("field {field}: value {value} does not fit a {kind} slot")]
    FieldOverflow {
        field: &'static str,
        value: i64,
        kind: &'static str,
    },
    #[error("field {field}: expected {expected} value")]
    WrongValueType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("identifier {0:?} is not ASCII")]
    NonAscii(String),
    #[error("identifier width {0} does not fit a 4-byte slot")]
    SlotWidth(usize),
    #[error("packet is {actual} bytes, layout expects {expected}")]
    ShortPacket { expected: usize, actual: usize },
}
