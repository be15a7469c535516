// Fixed-layout encoder driven by a field descriptor table

use super::ascii::{pack_ascii, pad_ascii, unpack_ascii, ByteOrder};
use super::revision::Frame;
use super::PacketError;

/// Wire representation of one field. Everything is big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U16,
    I32,
    U32,
    /// Up to four ASCII characters reinterpreted as a 32-bit integer
    PackedAscii(ByteOrder),
    /// Raw space-padded ASCII bytes of the given width
    Ascii(usize),
}

impl FieldKind {
    pub fn width(self) -> usize {
        match self {
            FieldKind::U16 => 2,
            FieldKind::I32 | FieldKind::U32 | FieldKind::PackedAscii(_) => 4,
            FieldKind::Ascii(width) => width,
        }
    }

    fn label(self) -> &'static str {
        match self {
            FieldKind::U16 => "u16",
            FieldKind::I32 => "i32",
            FieldKind::U32 => "u32",
            FieldKind::PackedAscii(_) => "packed ascii",
            FieldKind::Ascii(_) => "ascii",
        }
    }
}

/// Value produced by a field source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// One named slot of a layout.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub source: fn(&Frame) -> FieldValue,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, source: fn(&Frame) -> FieldValue) -> Self {
        FieldSpec { name, kind, source }
    }

    pub const fn i32(name: &'static str, source: fn(&Frame) -> FieldValue) -> Self {
        Self::new(name, FieldKind::I32, source)
    }
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A validated field table with its precomputed packet size.
#[derive(Debug, Clone)]
pub struct Layout {
    name: &'static str,
    fields: &'static [FieldSpec],
    size: usize,
}

impl Layout {
    /// Validate the table against the declared field count.
    pub fn new(
        name: &'static str,
        declared_fields: usize,
        fields: &'static [FieldSpec],
    ) -> Result<Self, PacketError> {
        if fields.len() != declared_fields {
            return Err(PacketError::LayoutMismatch {
                layout: name,
                declared: declared_fields,
                actual: fields.len(),
            });
        }
        let size = fields.iter().map(|f| f.kind.width()).sum();
        Ok(Layout { name, fields, size })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Encoded size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// struct-style format summary, e.g. `>2H 20i I 21i`
    pub fn format_string(&self) -> String {
        let mut out = String::from(">");
        let mut run: Option<(String, usize)> = None;
        for field in self.fields {
            let code = match field.kind {
                FieldKind::U16 => "H".to_string(),
                FieldKind::I32 | FieldKind::PackedAscii(_) => "i".to_string(),
                FieldKind::U32 => "I".to_string(),
                FieldKind::Ascii(w) => format!("{}s", w),
            };
            run = match run {
                Some((c, n)) if c == code && !matches!(field.kind, FieldKind::Ascii(_)) => {
                    Some((c, n + 1))
                }
                Some((c, n)) => {
                    push_run(&mut out, &c, n);
                    Some((code, 1))
                }
                None => Some((code, 1)),
            };
        }
        if let Some((c, n)) = run {
            push_run(&mut out, &c, n);
        }
        out
    }

    /// Encode one frame.
    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>, PacketError> {
        let mut buf = Vec::with_capacity(self.size);
        for field in self.fields {
            let value = (field.source)(frame);
            encode_field(&mut buf, field, value)?;
        }
        if buf.len() != self.size {
            return Err(PacketError::SizeMismatch {
                layout: self.name,
                expected: self.size,
                actual: buf.len(),
            });
        }
        Ok(buf)
    }

    /// Split an encoded packet back into named values.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<(&'static str, FieldValue)>, PacketError> {
        if data.len() != self.size {
            return Err(PacketError::ShortPacket {
                expected: self.size,
                actual: data.len(),
            });
        }
        let mut out = Vec::with_capacity(self.fields.len());
        let mut i = 0;
        for field in self.fields {
            let w = field.kind.width();
            let raw = &data[i..i + w];
            let value = match field.kind {
                FieldKind::U16 => FieldValue::Int(u16::from_be_bytes([raw[0], raw[1]]) as i64),
                FieldKind::I32 => FieldValue::Int(i32::from_be_bytes(word(raw)) as i64),
                FieldKind::U32 => FieldValue::Int(u32::from_be_bytes(word(raw)) as i64),
                FieldKind::PackedAscii(order) => {
                    FieldValue::Text(unpack_ascii(u32::from_be_bytes(word(raw)), order))
                }
                FieldKind::Ascii(_) => FieldValue::Text(raw.iter().map(|&b| b as char).collect()),
            };
            out.push((field.name, value));
            i += w;
        }
        Ok(out)
    }
}

fn push_run(out: &mut String, code: &str, n: usize) {
    if out.len() > 1 {
        out.push(' ');
    }
    if n > 1 {
        out.push_str(&n.to_string());
    }
    out.push_str(code);
}

#[inline]
fn word(raw: &[u8]) -> [u8; 4] {
    [raw[0], raw[1], raw[2], raw[3]]
}

fn encode_field(buf: &mut Vec<u8>, field: &FieldSpec, value: FieldValue) -> Result<(), PacketError> {
    let overflow = |v: i64| PacketError::FieldOverflow {
        field: field.name,
        value: v,
        kind: field.kind.label(),
    };

    match (field.kind, value) {
        (FieldKind::U16, FieldValue::Int(v)) => {
            let v = u16::try_from(v).map_err(|_| overflow(v))?;
            buf.extend_from_slice(&v.to_be_bytes());
        }
        (FieldKind::I32, FieldValue::Int(v)) => {
            let v = i32::try_from(v).map_err(|_| overflow(v))?;
            buf.extend_from_slice(&v.to_be_bytes());
        }
        (FieldKind::U32, FieldValue::Int(v)) => {
            let v = u32::try_from(v).map_err(|_| overflow(v))?;
            buf.extend_from_slice(&v.to_be_bytes());
        }
        (FieldKind::PackedAscii(order), FieldValue::Text(s)) => {
            let v = pack_ascii(&s, 4, order)?;
            buf.extend_from_slice(&v.to_be_bytes());
        }
        (FieldKind::Ascii(width), FieldValue::Text(s)) => {
            buf.extend_from_slice(&pad_ascii(&s, width)?);
        }
        (kind, _) => {
            return Err(PacketError::WrongValueType {
                field: field.name,
                expected: kind.label(),
            })
        }
    }
    Ok(())
}
