/// One byte in the metadata strip's `ContentType` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Unknown = 0,
    Toc = 1,
    Data = 2,
    Visual = 3,
    ControlFrame = 4,
}

impl ContentType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Unknown),
            1 => Some(Self::Toc),
            2 => Some(Self::Data),
            3 => Some(Self::Visual),
            4 => Some(Self::ControlFrame),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// A single recovered metadata record. Each item begins life in the strip
/// as a one-byte tag followed by a fixed-size payload (1, 4, or 8 bytes);
/// once decoded it is this tagged union.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataItem {
    JobId(u32),
    FrameNumber(u32),
    FileId(u32),
    FileSize(u64),
    DataCrc(u32),
    DataSize(u64),
    SymbolsPerPixel(u8),
    ContentType(ContentType),
    CipherKey(u32),
    ContentSymbolSize(u8),
}

impl MetadataItem {
    /// The one-byte tag this item serialises as, matching decode order.
    pub fn tag(&self) -> u8 {
        match self {
            Self::JobId(_) => 1,
            Self::FrameNumber(_) => 2,
            Self::FileId(_) => 3,
            Self::FileSize(_) => 4,
            Self::DataCrc(_) => 5,
            Self::DataSize(_) => 6,
            Self::SymbolsPerPixel(_) => 7,
            Self::ContentType(_) => 8,
            Self::CipherKey(_) => 9,
            Self::ContentSymbolSize(_) => 10,
        }
    }
}
