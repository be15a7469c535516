// ASCII identifier packing
//
// Airport codes and flight numbers travel in integer slots: the text is
// upper-cased, left-justified with spaces to the slot width and the bytes
// are reinterpreted as an integer. Which byte order the receiver expects
// depends on the protocol revision.

use super::PacketError;

/// Byte order used to reinterpret padded text as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

/// Upper-case, space-pad and truncate `text` to exactly `width` ASCII bytes.
pub fn pad_ascii(text: &str, width: usize) -> Result<Vec<u8>, PacketError> {
    let text = text.trim().to_uppercase();
    if !text.is_ascii() {
        return Err(PacketError::NonAscii(text));
    }
    let mut bytes: Vec<u8> = text.into_bytes();
    bytes.resize(width, b' ');
    Ok(bytes)
}

/// Pack up to four characters of `code` into a 32-bit slot value.
pub fn pack_ascii(code: &str, width: usize, order: ByteOrder) -> Result<u32, PacketError> {
    if width == 0 || width > 4 {
        return Err(PacketError::SlotWidth(width));
    }
    let mut slot = [b' '; 4];
    slot[..width].copy_from_slice(&pad_ascii(code, width)?);
    Ok(match order {
        ByteOrder::Big => u32::from_be_bytes(slot),
        ByteOrder::Little => u32::from_le_bytes(slot),
    })
}

/// Recover the padded text of a packed slot (trailing spaces kept).
pub fn unpack_ascii(value: u32, order: ByteOrder) -> String {
    let bytes = match order {
        ByteOrder::Big => value.to_be_bytes(),
        ByteOrder::Little => value.to_le_bytes(),
    };
    bytes.iter().map(|&b| b as char).collect()
}
