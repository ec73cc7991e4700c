/// Conversion type code (`cc_type`) stored in a conversion block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ConversionType {
    /// 0: 1:1 conversion
    Identity,
    /// 1: `phys = raw * a + b`
    Linear,
    /// 2: ratio of two quadratic polynomials
    Rational,
    /// 3: text formula
    Algebraic,
    /// 4: value to value table with interpolation
    TableLookupInterp,
    /// 5: value to value table without interpolation
    TableLookupNoInterp,
    /// 6: value range to value table
    RangeLookup,
    /// 7: value to text table
    ValueToText,
    /// 8: value range to text table
    RangeToText,
    /// 9: text to value table
    TextToValue,
    /// 10: text to text translation
    TextToText,
    /// Anything else, including the bitfield kind (11) which is not handled.
    Unknown(u8),
}

impl ConversionType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => ConversionType::Identity,
            1 => ConversionType::Linear,
            2 => ConversionType::Rational,
            3 => ConversionType::Algebraic,
            4 => ConversionType::TableLookupInterp,
            5 => ConversionType::TableLookupNoInterp,
            6 => ConversionType::RangeLookup,
            7 => ConversionType::ValueToText,
            8 => ConversionType::RangeToText,
            9 => ConversionType::TextToValue,
            10 => ConversionType::TextToText,
            other => ConversionType::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ConversionType::Identity => 0,
            ConversionType::Linear => 1,
            ConversionType::Rational => 2,
            ConversionType::Algebraic => 3,
            ConversionType::TableLookupInterp => 4,
            ConversionType::TableLookupNoInterp => 5,
            ConversionType::RangeLookup => 6,
            ConversionType::ValueToText => 7,
            ConversionType::RangeToText => 8,
            ConversionType::TextToValue => 9,
            ConversionType::TextToText => 10,
            ConversionType::Unknown(v) => v,
        }
    }

    /// True for the kinds whose output (or input) is text.
    pub fn is_text_based(self) -> bool {
        matches!(
            self,
            ConversionType::ValueToText
                | ConversionType::RangeToText
                | ConversionType::TextToValue
                | ConversionType::TextToText
        )
    }
}
