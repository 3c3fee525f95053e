//! The closed set of evio/HIPO primitive and structure tags.

/// 6-bit `dataType` tag found in bank/segment/tag-segment headers.
///
/// Structure kinds (`Bank`, `Segment`, `TagSegment`) and primitive kinds are
/// disjoint; a node's `DataType` tells a scan whether to recurse or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[non_exhaustive]
pub enum DataType {
    Unknown32,
    Uint32,
    Float32,
    CharStar8,
    Short16,
    UShort16,
    Char8,
    UChar8,
    Long64,
    ULong64,
    Double64,
    Int32,
    Hollerit,
    TagSegment,
    Segment,
    Bank,
    Composite,
    NValue,
    NValueLower,
    MValue,
}

impl DataType {
    /// Decode a 6-bit tag value. Both legacy aliases for a structure kind
    /// (`0x20`/`0xD` for segment, `0x10`/`0xE` for bank) decode to the same
    /// variant.
    ///
    /// `0x0C` is wire-ambiguous between `Hollerit` (a primitive leaf) and
    /// `TagSegment` (a structure tag) in the original format. Since
    /// structure and primitive kinds must stay disjoint for a scan to decide
    /// recursion from the tag alone, this decoder resolves the ambiguity in
    /// favor of `TagSegment`. Code that needs the Hollerit reading of a
    /// leaf's raw 32-bit words does so from domain knowledge of the
    /// containing bank, not from this enum.
    pub fn from_value(value: u8) -> Option<DataType> {
        Some(match value {
            0x00 => DataType::Unknown32,
            0x01 => DataType::Uint32,
            0x02 => DataType::Float32,
            0x03 => DataType::CharStar8,
            0x04 => DataType::Short16,
            0x05 => DataType::UShort16,
            0x06 => DataType::Char8,
            0x07 => DataType::UChar8,
            0x08 => DataType::Long64,
            0x09 => DataType::ULong64,
            0x0A => DataType::Double64,
            0x0B => DataType::Int32,
            0x0C => DataType::TagSegment,
            0x0D | 0x20 => DataType::Segment,
            0x0E | 0x10 => DataType::Bank,
            0x0F => DataType::Composite,
            0x18 => DataType::NValue,
            0x19 => DataType::NValueLower,
            0x1A => DataType::MValue,
            _ => return None,
        })
    }

    /// Encode back to the 6-bit wire value. Structure kinds encode to their
    /// "modern" (non-legacy-alias) value.
    pub fn to_value(self) -> u8 {
        match self {
            DataType::Unknown32 => 0x00,
            DataType::Uint32 => 0x01,
            DataType::Float32 => 0x02,
            DataType::CharStar8 => 0x03,
            DataType::Short16 => 0x04,
            DataType::UShort16 => 0x05,
            DataType::Char8 => 0x06,
            DataType::UChar8 => 0x07,
            DataType::Long64 => 0x08,
            DataType::ULong64 => 0x09,
            DataType::Double64 => 0x0A,
            DataType::Int32 => 0x0B,
            DataType::Hollerit => 0x0C,
            DataType::TagSegment => 0x0C,
            DataType::Segment => 0x0D,
            DataType::Bank => 0x0E,
            DataType::Composite => 0x0F,
            DataType::NValue => 0x18,
            DataType::NValueLower => 0x19,
            DataType::MValue => 0x1A,
        }
    }

    /// Whether this tag names a container that a scan must recurse into.
    pub fn is_structure(self) -> bool {
        matches!(self, DataType::Bank | DataType::Segment | DataType::TagSegment)
    }

    /// Size in bytes of one element of this primitive type, where uniform.
    /// `None` for structure kinds, `Composite`, and the character types
    /// (which are not swapped element-wise).
    pub fn element_size(self) -> Option<usize> {
        match self {
            DataType::Short16 | DataType::UShort16 => Some(2),
            DataType::Uint32 | DataType::Float32 | DataType::Int32 | DataType::Hollerit => Some(4),
            DataType::Long64 | DataType::ULong64 | DataType::Double64 => Some(8),
            _ => None,
        }
    }

    /// Short display name, used only by `Display` impls for debugging,
    /// never by the codec itself.
    pub fn short_name(self) -> &'static str {
        match self {
            DataType::Unknown32 => "unknown32",
            DataType::Uint32 => "uint32",
            DataType::Float32 => "float32",
            DataType::CharStar8 => "string",
            DataType::Short16 => "short16",
            DataType::UShort16 => "ushort16",
            DataType::Char8 => "char8",
            DataType::UChar8 => "uchar8",
            DataType::Long64 => "long64",
            DataType::ULong64 => "ulong64",
            DataType::Double64 => "double64",
            DataType::Int32 => "int32",
            DataType::Hollerit => "hollerit",
            DataType::TagSegment => "tagsegment",
            DataType::Segment => "segment",
            DataType::Bank => "bank",
            DataType::Composite => "composite",
            DataType::NValue => "N",
            DataType::NValueLower => "n",
            DataType::MValue => "m",
        }
    }
}

/// 4-bit `headerType` code occupying bits 28-31 of a record/file header's
/// bit-info word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum HeaderType {
    EvioRecord,
    EvioFile,
    EvioFileExtended,
    Trailer,
    HipoRecord,
    HipoFile,
}

impl HeaderType {
    /// Decode the 4-bit code. `EVIO_TRAILER` (3) and `HIPO_TRAILER` (7) both
    /// decode to `Trailer` — the two codes are treated as equivalent on read.
    pub fn from_value(value: u8) -> Option<HeaderType> {
        Some(match value {
            0 => HeaderType::EvioRecord,
            1 => HeaderType::EvioFile,
            2 => HeaderType::EvioFileExtended,
            3 | 7 => HeaderType::Trailer,
            4 => HeaderType::HipoRecord,
            5 => HeaderType::HipoFile,
            _ => return None,
        })
    }

    /// Encode back to the 4-bit code. `Trailer` always encodes to the evio
    /// trailer code (3).
    pub fn to_value(self) -> u8 {
        match self {
            HeaderType::EvioRecord => 0,
            HeaderType::EvioFile => 1,
            HeaderType::EvioFileExtended => 2,
            HeaderType::Trailer => 3,
            HeaderType::HipoRecord => 4,
            HeaderType::HipoFile => 5,
        }
    }

    pub fn is_file_header(self) -> bool {
        matches!(self, HeaderType::EvioFile | HeaderType::EvioFileExtended | HeaderType::HipoFile)
    }
}

/// Event-type enumeration for bits 11-14 of the bit-info word. Purely opaque
/// storage: no component of this crate interprets these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum EventType {
    RocRaw,
    Physics,
    PartialPhysics,
    DisentangledPhysics,
    User,
    Control,
    Other,
    Mixed,
}

impl EventType {
    pub fn from_value(value: u8) -> EventType {
        match value & 0xF {
            0 => EventType::RocRaw,
            1 => EventType::Physics,
            2 => EventType::PartialPhysics,
            3 => EventType::DisentangledPhysics,
            4 => EventType::User,
            5 => EventType::Control,
            15 => EventType::Other,
            _ => EventType::Mixed,
        }
    }

    pub fn to_value(self) -> u8 {
        match self {
            EventType::RocRaw => 0,
            EventType::Physics => 1,
            EventType::PartialPhysics => 2,
            EventType::DisentangledPhysics => 3,
            EventType::User => 4,
            EventType::Control => 5,
            EventType::Other => 15,
            EventType::Mixed => 8,
        }
    }
}
