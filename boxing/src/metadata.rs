use boxing_core::{ContentType, MetadataItem};

use crate::error::UnboxError;

/// Decodes the fixed metadata schema out of the metadata pipeline's
/// recovered bytes: each item is a one-byte type tag followed by a
/// type-specific fixed-size payload (1, 4, or 8 bytes). Items are
/// appended in file order; an unrecognised tag is `METADATA_ERROR`.
pub fn decode_metadata(bytes: &[u8]) -> Result<Vec<MetadataItem>, UnboxError> {
    let mut items = Vec::new();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        let tag = bytes[cursor];
        cursor += 1;

        let item = match tag {
            0x01 => read_u32(bytes, &mut cursor)?.let_with(MetadataItem::JobId),
            0x02 => read_u32(bytes, &mut cursor)?.let_with(MetadataItem::FrameNumber),
            0x03 => read_u32(bytes, &mut cursor)?.let_with(MetadataItem::FileId),
            0x04 => read_u64(bytes, &mut cursor)?.let_with(MetadataItem::FileSize),
            0x05 => read_u32(bytes, &mut cursor)?.let_with(MetadataItem::DataCrc),
            0x06 => read_u64(bytes, &mut cursor)?.let_with(MetadataItem::DataSize),
            0x07 => read_u8(bytes, &mut cursor)?.let_with(MetadataItem::SymbolsPerPixel),
            0x08 => {
                let byte = read_u8(bytes, &mut cursor)?;
                let content_type = ContentType::from_byte(byte).ok_or_else(|| {
                    UnboxError::MetadataError(format!("unknown content type byte {}", byte))
                })?;
                MetadataItem::ContentType(content_type)
            }
            0x09 => read_u32(bytes, &mut cursor)?.let_with(MetadataItem::CipherKey),
            0x0A => read_u8(bytes, &mut cursor)?.let_with(MetadataItem::ContentSymbolSize),
            other => return Err(UnboxError::MetadataError(format!("unknown metadata tag {}", other))),
        };
        items.push(item);
    }

    Ok(items)
}

fn read_u8(bytes: &[u8], cursor: &mut usize) -> Result<u8, UnboxError> {
    let b = *bytes
        .get(*cursor)
        .ok_or_else(|| UnboxError::MetadataError("truncated metadata item".into()))?;
    *cursor += 1;
    Ok(b)
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32, UnboxError> {
    let slice = bytes
        .get(*cursor..*cursor + 4)
        .ok_or_else(|| UnboxError::MetadataError("truncated metadata item".into()))?;
    *cursor += 4;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_u64(bytes: &[u8], cursor: &mut usize) -> Result<u64, UnboxError> {
    let slice = bytes
        .get(*cursor..*cursor + 8)
        .ok_or_else(|| UnboxError::MetadataError("truncated metadata item".into()))?;
    *cursor += 8;
    let mut arr = [0u8; 8];
    arr.copy_from_slice(slice);
    Ok(u64::from_le_bytes(arr))
}

/// Tiny local helper so the match arms above read as "value, then which
/// variant it becomes" without repeating the variant name on both sides.
trait LetWith: Sized {
    fn let_with<T>(self, f: impl FnOnce(Self) -> T) -> T {
        f(self)
    }
}
impl LetWith for u8 {}
impl LetWith for u32 {}
impl LetWith for u64 {}

/// Encodes a metadata item list back into the fixed tag+payload schema;
/// used only by tests here, since this crate carries no encoder path.
#[cfg(test)]
fn encode_metadata(items: &[MetadataItem]) -> Vec<u8> {
    let mut out = Vec::new();
    for item in items {
        out.push(item.tag());
        match item {
            MetadataItem::JobId(v) | MetadataItem::FrameNumber(v) | MetadataItem::FileId(v) | MetadataItem::CipherKey(v) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            MetadataItem::FileSize(v) | MetadataItem::DataSize(v) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
            MetadataItem::DataCrc(v) => out.extend_from_slice(&v.to_le_bytes()),
            MetadataItem::SymbolsPerPixel(v) | MetadataItem::ContentSymbolSize(v) => out.push(*v),
            MetadataItem::ContentType(ct) => out.push(ct.to_byte()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_mixed_item_list() {
        let items = vec![
            MetadataItem::JobId(42),
            MetadataItem::ContentType(ContentType::Data),
            MetadataItem::FileSize(1_000_000),
            MetadataItem::SymbolsPerPixel(4),
        ];
        let bytes = encode_metadata(&items);
        let decoded = decode_metadata(&bytes).unwrap();
        assert_eq!(decoded.len(), items.len());
        assert!(matches!(decoded[1], MetadataItem::ContentType(ContentType::Data)));
    }

    #[test]
    fn unknown_tag_is_a_metadata_error() {
        let bytes = vec![0xFF];
        assert!(decode_metadata(&bytes).is_err());
    }

    #[test]
    fn truncated_payload_is_a_metadata_error() {
        let bytes = vec![0x01, 0x00, 0x00]; // JobId tag, but only 2 payload bytes
        assert!(decode_metadata(&bytes).is_err());
    }
}
