//! Numeric field codecs.
//!
//! Multi-byte numbers are big-endian. A numeric field has a width of 1 to 4
//! bytes and a [`ValueFormat`]; values that do not fit are rejected with an
//! [`EncodeError`] instead of being truncated.

use crate::error::EncodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the bits of a numeric field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// Two's complement signed integer.
    #[default]
    SignedInteger,
    /// Unsigned integer.
    UnsignedInteger,
    /// Unsigned integer naming one of a set of states.
    Enumerated,
    /// Unsigned integer whose bits are independent flags.
    BitField,
}

impl ValueFormat {
    /// Decode the 3-bit wire format field.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(ValueFormat::SignedInteger),
            1 => Some(ValueFormat::UnsignedInteger),
            2 => Some(ValueFormat::Enumerated),
            3 => Some(ValueFormat::BitField),
            _ => None,
        }
    }

    /// Encode as the 3-bit wire format field.
    pub fn to_bits(self) -> u8 {
        match self {
            ValueFormat::SignedInteger => 0,
            ValueFormat::UnsignedInteger => 1,
            ValueFormat::Enumerated => 2,
            ValueFormat::BitField => 3,
        }
    }

    /// Whether the format is two's complement.
    pub fn is_signed(self) -> bool {
        self == ValueFormat::SignedInteger
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueFormat::SignedInteger => "signed integer",
            ValueFormat::UnsignedInteger => "unsigned integer",
            ValueFormat::Enumerated => "enumerated",
            ValueFormat::BitField => "bit field",
        };
        f.write_str(name)
    }
}

/// Check a numeric width.
pub fn validate_size(size: u8) -> Result<(), EncodeError> {
    if (1..=4).contains(&size) {
        Ok(())
    } else {
        Err(EncodeError::InvalidSize(size))
    }
}

/// Inclusive range representable with `size` bytes in `format`.
pub fn value_range(size: u8, format: ValueFormat) -> (i64, i64) {
    let bits = 8 * u32::from(size.clamp(1, 4));
    if format.is_signed() {
        (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
    } else {
        (0, (1i64 << bits) - 1)
    }
}

/// Encode `value` as `size` big-endian bytes.
pub fn encode_value(value: i64, size: u8, format: ValueFormat) -> Result<Vec<u8>, EncodeError> {
    validate_size(size)?;
    let (min, max) = value_range(size, format);
    if value < min || value > max {
        return Err(EncodeError::ValueOutOfRange {
            value,
            size,
            format,
        });
    }
    Ok(to_be_bytes(value, size))
}

/// Encode `value` as `size` bytes, accepting either a signed or an unsigned
/// interpretation of the width.
///
/// Used for re-encoding values whose format was corrected after decoding.
pub fn encode_raw(value: i64, size: u8) -> Result<Vec<u8>, EncodeError> {
    validate_size(size)?;
    let (min, _) = value_range(size, ValueFormat::SignedInteger);
    let (_, max) = value_range(size, ValueFormat::UnsignedInteger);
    if value < min || value > max {
        return Err(EncodeError::ValueOutOfRange {
            value,
            size,
            format: if value < 0 {
                ValueFormat::SignedInteger
            } else {
                ValueFormat::UnsignedInteger
            },
        });
    }
    Ok(to_be_bytes(value, size))
}

fn to_be_bytes(value: i64, size: u8) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    bytes[8 - size as usize..].to_vec()
}

/// Decode a big-endian number of 1 to 4 bytes.
///
/// The caller checks the length; longer input only uses its last four bytes.
pub fn decode_value(data: &[u8], format: ValueFormat) -> i64 {
    let data = &data[data.len().saturating_sub(4)..];
    let raw = data.iter().fold(0i64, |acc, &b| (acc << 8) | i64::from(b));
    if format.is_signed() && !data.is_empty() {
        let bits = 8 * data.len() as u32;
        if raw & (1i64 << (bits - 1)) != 0 {
            return raw - (1i64 << bits);
        }
    }
    raw
}

/// Re-read a value that was decoded as signed under its real format.
pub fn reinterpret(value: i64, size: u8, format: ValueFormat) -> i64 {
    if format.is_signed() || value >= 0 {
        value
    } else {
        value + (1i64 << (8 * u32::from(size.clamp(1, 4))))
    }
}

// ============================================================================
// Partial (bit-masked) values
// ============================================================================

fn mask_geometry(mask: u32) -> (u32, u32) {
    if mask == 0 {
        return (0, 0);
    }
    let shift = mask.trailing_zeros();
    let width = 32 - (mask >> shift).leading_zeros();
    (shift, width)
}

/// Extract the sub-value selected by `mask` from an unsigned full value.
pub fn extract_partial(full: i64, mask: u32, signed: bool) -> i64 {
    let (shift, width) = mask_geometry(mask);
    if width == 0 {
        return 0;
    }
    let raw = ((full as u64 & u64::from(mask)) >> shift) as i64;
    if signed && raw & (1i64 << (width - 1)) != 0 {
        raw - (1i64 << width)
    } else {
        raw
    }
}

/// Replace the bits selected by `mask` in `full` with `sub`.
pub fn insert_partial(full: i64, mask: u32, sub: i64, signed: bool) -> Result<i64, EncodeError> {
    let (shift, width) = mask_geometry(mask);
    if width == 0 {
        return Err(EncodeError::Invalid("empty bit mask".into()));
    }
    let (min, max) = if signed {
        (-(1i64 << (width - 1)), (1i64 << (width - 1)) - 1)
    } else {
        (0, (1i64 << width) - 1)
    };
    EncodeError::check_range("partial value", sub, min, max)?;

    let field = ((sub as u64) & ((1u64 << width) - 1)) << shift;
    let cleared = full as u64 & !u64::from(mask);
    Ok((cleared | field) as i64)
}

// ============================================================================
// Duration
// ============================================================================

/// A transition duration as carried in one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "unit", content = "value")]
pub enum Duration {
    /// 0 to 127 seconds; 0 is instant.
    Seconds(u8),
    /// 1 to 126 minutes; sets can also carry 127.
    Minutes(u8),
    /// The device does not know (reports only).
    Unknown,
    /// Use the device default (sets only).
    Default,
}

impl Duration {
    /// Instant transition.
    pub const INSTANT: Duration = Duration::Seconds(0);

    /// Decode a duration byte from a report. Reserved 0xFF reads as unknown.
    pub fn from_report_byte(byte: u8) -> Self {
        match byte {
            0x00..=0x7F => Duration::Seconds(byte),
            0x80..=0xFD => Duration::Minutes(byte - 0x7F),
            _ => Duration::Unknown,
        }
    }

    /// Decode a duration byte from a set command.
    pub fn from_set_byte(byte: u8) -> Self {
        match byte {
            0x00..=0x7F => Duration::Seconds(byte),
            0x80..=0xFE => Duration::Minutes(byte - 0x7F),
            _ => Duration::Default,
        }
    }

    /// Build the closest duration to a number of seconds.
    pub fn from_secs(secs: u32) -> Self {
        if secs <= 0x7F {
            Duration::Seconds(secs as u8)
        } else {
            let minutes = ((secs + 30) / 60).clamp(1, 126);
            Duration::Minutes(minutes as u8)
        }
    }

    /// Encode for the wire. Out-of-range fields saturate to the largest
    /// encodable count of their unit.
    pub fn to_byte(self) -> u8 {
        match self {
            Duration::Seconds(s) => s.min(0x7F),
            Duration::Minutes(m) => 0x7F + m.clamp(1, 127),
            Duration::Unknown => 0xFE,
            Duration::Default => 0xFF,
        }
    }

    /// Length as a standard duration, if it is one.
    pub fn to_std(self) -> Option<std::time::Duration> {
        match self {
            Duration::Seconds(s) => Some(std::time::Duration::from_secs(u64::from(s))),
            Duration::Minutes(m) => Some(std::time::Duration::from_secs(60 * u64::from(m))),
            Duration::Unknown | Duration::Default => None,
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duration::Seconds(s) => write!(f, "{}s", s),
            Duration::Minutes(m) => write!(f, "{}min", m),
            Duration::Unknown => f.write_str("unknown"),
            Duration::Default => f.write_str("default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_widths() {
        assert_eq!(encode_value(-1, 1, ValueFormat::SignedInteger).unwrap(), vec![0xFF]);
        assert_eq!(
            encode_value(0x1234, 2, ValueFormat::UnsignedInteger).unwrap(),
            vec![0x12, 0x34]
        );
        assert_eq!(
            encode_value(-2, 4, ValueFormat::SignedInteger).unwrap(),
            vec![0xFF, 0xFF, 0xFF, 0xFE]
        );
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert_eq!(
            encode_value(128, 1, ValueFormat::SignedInteger),
            Err(EncodeError::ValueOutOfRange {
                value: 128,
                size: 1,
                format: ValueFormat::SignedInteger
            })
        );
        assert!(encode_value(-1, 2, ValueFormat::UnsignedInteger).is_err());
        assert!(encode_value(255, 1, ValueFormat::Enumerated).is_ok());
        assert_eq!(
            encode_value(1, 5, ValueFormat::SignedInteger),
            Err(EncodeError::InvalidSize(5))
        );
    }

    #[test]
    fn test_encode_raw_accepts_both_interpretations() {
        assert_eq!(encode_raw(200, 1).unwrap(), vec![0xC8]);
        assert_eq!(encode_raw(-56, 1).unwrap(), vec![0xC8]);
        assert!(encode_raw(256, 1).is_err());
        assert!(encode_raw(-129, 1).is_err());
    }

    #[test]
    fn test_decode_sign_extension() {
        assert_eq!(decode_value(&[0xC8], ValueFormat::SignedInteger), -56);
        assert_eq!(decode_value(&[0xC8], ValueFormat::UnsignedInteger), 200);
        assert_eq!(decode_value(&[0x80, 0x00], ValueFormat::SignedInteger), -32768);
        assert_eq!(
            decode_value(&[0xFF, 0xFF, 0xFF, 0xFF], ValueFormat::BitField),
            0xFFFF_FFFF
        );
    }

    #[test]
    fn test_reinterpret() {
        assert_eq!(reinterpret(-56, 1, ValueFormat::UnsignedInteger), 200);
        assert_eq!(reinterpret(-56, 1, ValueFormat::SignedInteger), -56);
        assert_eq!(reinterpret(-1, 2, ValueFormat::Enumerated), 0xFFFF);
        assert_eq!(reinterpret(17, 4, ValueFormat::BitField), 17);
    }

    #[test]
    fn test_partial_extract_and_insert() {
        // bits 4-7 hold 0xA, bits 0-3 hold 0x3
        let full = 0xA3;
        assert_eq!(extract_partial(full, 0xF0, false), 0xA);
        assert_eq!(extract_partial(full, 0x0F, false), 0x3);
        assert_eq!(extract_partial(full, 0xF0, true), -6);

        assert_eq!(insert_partial(full, 0x0F, 0x5, false).unwrap(), 0xA5);
        assert_eq!(insert_partial(0, 0xF0, -1, true).unwrap(), 0xF0);
        assert!(insert_partial(full, 0x0F, 16, false).is_err());
    }

    #[test]
    fn test_duration_bytes() {
        assert_eq!(Duration::from_report_byte(0x03), Duration::Seconds(3));
        assert_eq!(Duration::from_report_byte(0x80), Duration::Minutes(1));
        assert_eq!(Duration::from_report_byte(0xFD), Duration::Minutes(126));
        assert_eq!(Duration::from_report_byte(0xFE), Duration::Unknown);
        assert_eq!(Duration::from_set_byte(0xFF), Duration::Default);
        assert_eq!(Duration::from_set_byte(0xFE), Duration::Minutes(127));

        assert_eq!(Duration::Seconds(3).to_byte(), 0x03);
        assert_eq!(Duration::Minutes(2).to_byte(), 0x81);
        assert_eq!(Duration::Unknown.to_byte(), 0xFE);
        assert_eq!(Duration::Default.to_byte(), 0xFF);
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(Duration::from_secs(0), Duration::INSTANT);
        assert_eq!(Duration::from_secs(127), Duration::Seconds(127));
        assert_eq!(Duration::from_secs(150), Duration::Minutes(3));
        assert_eq!(Duration::from_secs(100_000), Duration::Minutes(126));
        assert_eq!(
            Duration::Minutes(2).to_std(),
            Some(std::time::Duration::from_secs(120))
        );
        assert_eq!(Duration::Seconds(3).to_string(), "3s");
    }
}
