//! Layout of a logical field spread over one or more hardware registers.

use smallvec::SmallVec;

use crate::loader::fielddefs::SubField;

/// Extracts `width` bits starting at LSB `offset` of `register`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSegment {
    pub register: u32,
    pub offset: u32,
    pub width: u32,
}

/// Segments are stored least significant first, the order writes consume
/// the value in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitFieldSpec {
    pub segments: SmallVec<[FieldSegment; 4]>,
    pub default: u64,
    pub read_only: bool,
}

impl BitFieldSpec {
    pub fn builder() -> BitFieldSpecBuilder {
        BitFieldSpecBuilder::new()
    }

    /// Builds the spec for sub-registers listed most significant first. The
    /// default concatenates the sub-defaults; any read-only slice makes the
    /// whole field read-only.
    pub fn from_sub_fields(subs: &[SubField]) -> Self {
        let mut builder = Self::builder();
        for sub in subs {
            builder = builder
                .segment(sub.register, sub.offset, sub.width)
                .read_only(sub.read_only);
        }
        let default = subs.iter().fold(0u64, |acc, sub| {
            acc.checked_shl(sub.width).unwrap_or(0) | sub.default
        });
        builder.default(default).finish()
    }

    pub fn total_width(&self) -> u32 {
        self.segments.iter().map(|segment| segment.width).sum()
    }

}

pub struct BitFieldSpecBuilder {
    segments: SmallVec<[FieldSegment; 4]>,
    default: u64,
    read_only: bool,
}

impl BitFieldSpecBuilder {
    fn new() -> Self {
        Self {
            segments: SmallVec::new(),
            default: 0,
            read_only: false,
        }
    }

    /// Appends the next less significant slice.
    pub fn segment(mut self, register: u32, offset: u32, width: u32) -> Self {
        self.segments.push(FieldSegment {
            register,
            offset,
            width,
        });
        self
    }

    pub fn default(mut self, default: u64) -> Self {
        self.default = default;
        self
    }

    /// Sticky: once read-only, later calls cannot clear it.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only |= read_only;
        self
    }

    pub fn finish(mut self) -> BitFieldSpec {
        self.segments.reverse();
        BitFieldSpec {
            segments: self.segments,
            default: self.default,
            read_only: self.read_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_stores_least_significant_first() {
        let spec = BitFieldSpec::builder()
            .segment(0x16, 0, 8)
            .segment(0x17, 0, 4)
            .read_only(true)
            .read_only(false)
            .finish();
        let registers: Vec<u32> = spec.segments.iter().map(|segment| segment.register).collect();
        assert_eq!(registers, vec![0x17, 0x16], "declared order is most significant first");
        assert_eq!(spec.total_width(), 12);
        assert!(spec.read_only, "read-only is sticky");
    }

    #[test]
    fn sub_field_defaults_concatenate() {
        let sub = |register, width, default, read_only| SubField {
            register,
            offset: 0,
            width,
            default,
            read_only,
        };
        let spec = BitFieldSpec::from_sub_fields(&[sub(1, 8, 0x12, false), sub(2, 4, 0x3, true)]);
        assert_eq!(spec.default, 0x123, "first sub-register holds the high bits");
        assert!(spec.read_only, "one read-only slice taints the field");
    }
}
