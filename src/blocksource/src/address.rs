//! Addresses and inclusive address ranges.
//!
//! An [`Address`] is a byte offset inside a single program address space.
//! Arithmetic is unsigned; overflow is reported through the `checked_*`
//! methods so block construction can reject layouts that run off the end of
//! the space.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid address literal: {0:?}")]
pub struct ParseAddressError(pub String);

/// Parse an unsigned number written as decimal or `0x`-prefixed hex.
pub fn parse_u64(text: &str) -> Result<u64, ParseAddressError> {
    let trimmed = text.trim().replace('_', "");
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| ParseAddressError(text.to_string()))
}

/// A location in a program's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address {
    pub const MAX: Address = Address(u64::MAX);

    pub const fn new(offset: u64) -> Self {
        Address(offset)
    }

    pub const fn offset(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, offset: u64) -> Option<Address> {
        self.0.checked_add(offset).map(Address)
    }

    pub fn checked_sub(self, offset: u64) -> Option<Address> {
        self.0.checked_sub(offset).map(Address)
    }

    /// Distance from `base` up to this address, or `None` if `base` is above it
    pub fn offset_from(self, base: Address) -> Option<u64> {
        self.0.checked_sub(base.0)
    }
}

/// Address `offset` bytes above this one.
///
/// Panics on overflow. Callers that have not validated the range should use
/// [`Address::checked_add`].
impl Add<u64> for Address {
    type Output = Address;

    fn add(self, offset: u64) -> Address {
        match self.checked_add(offset) {
            Some(address) => address,
            None => panic!("address overflow: {} + {:#x}", self, offset),
        }
    }
}

impl From<u64> for Address {
    fn from(offset: u64) -> Self {
        Address(offset)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u64(s).map(Address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        HexOrInt::deserialize(deserializer)
            .and_then(|value| value.into_u64().map_err(serde::de::Error::custom))
            .map(Address)
    }
}

/// Integer field that may also be written as a hex string in documents
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum HexOrInt {
    Int(u64),
    Text(String),
}

impl HexOrInt {
    pub(crate) fn into_u64(self) -> Result<u64, ParseAddressError> {
        match self {
            HexOrInt::Int(value) => Ok(value),
            HexOrInt::Text(text) => parse_u64(&text),
        }
    }
}

/// `deserialize_with` helper for plain `u64` fields
pub(crate) fn deserialize_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    HexOrInt::deserialize(deserializer)?
        .into_u64()
        .map_err(serde::de::Error::custom)
}

/// Inclusive range of addresses `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct AddressRange {
    #[serde(rename = "start")]
    min: Address,
    #[serde(rename = "end")]
    max: Address,
}

impl AddressRange {
    /// Returns `None` when `max < min`
    pub fn new(min: Address, max: Address) -> Option<Self> {
        (min <= max).then_some(AddressRange { min, max })
    }

    /// Range of `length` bytes starting at `min`; `None` for zero length or overflow
    pub fn with_length(min: Address, length: u64) -> Option<Self> {
        let max = min.checked_add(length.checked_sub(1)?)?;
        Some(AddressRange { min, max })
    }

    pub fn min_address(&self) -> Address {
        self.min
    }

    pub fn max_address(&self) -> Address {
        self.max
    }

    /// Number of addresses covered. A range spanning the whole 64-bit space
    /// saturates at `u64::MAX`.
    pub fn length(&self) -> u64 {
        (self.max.0 - self.min.0).saturating_add(1)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.min <= address && address <= self.max
    }
}

#[derive(Deserialize)]
struct RawRange {
    start: Address,
    end: Address,
}

impl TryFrom<RawRange> for AddressRange {
    type Error = String;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        AddressRange::new(raw.start, raw.end)
            .ok_or_else(|| format!("range end {} is below start {}", raw.end, raw.start))
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_hex_and_decimal() {
        assert_eq!(parse_u64("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_u64("0X1f").unwrap(), 0x1f);
        assert_eq!(parse_u64("4096").unwrap(), 4096);
        assert_eq!(parse_u64("0x1_0000").unwrap(), 0x10000);
        assert!(parse_u64("0xzz").is_err());
        assert!(parse_u64("").is_err());
    }

    #[test]
    fn test_address_arithmetic() {
        let base = Address::new(0x1000);
        assert_eq!(base + 0x50, Address::new(0x1050));
        assert_eq!(Address::new(0x1050).offset_from(base), Some(0x50));
        assert_eq!(base.offset_from(Address::new(0x1050)), None);
        assert_eq!(Address::MAX.checked_add(1), None);
        assert_eq!(Address::new(0).checked_sub(1), None);
    }

    #[test]
    #[should_panic(expected = "address overflow")]
    fn test_address_add_overflow_panics() {
        let _ = Address::MAX + 1;
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address::new(0x1000).to_string(), "0x00001000");
        assert_eq!("0x2000".parse::<Address>().unwrap(), Address::new(0x2000));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let range = AddressRange::new(Address::new(0x2000), Address::new(0x20ff)).unwrap();
        assert_eq!(range.length(), 0x100);
        assert!(range.contains(Address::new(0x2000)));
        assert!(range.contains(Address::new(0x20ff)));
        assert!(!range.contains(Address::new(0x1fff)));
        assert!(!range.contains(Address::new(0x2100)));
    }

    #[test]
    fn test_range_rejects_inverted_and_empty() {
        assert!(AddressRange::new(Address::new(2), Address::new(1)).is_none());
        assert!(AddressRange::with_length(Address::new(0x10), 0).is_none());
        assert!(AddressRange::with_length(Address::MAX, 2).is_none());
        assert_eq!(
            AddressRange::with_length(Address::new(0x10), 0x10),
            AddressRange::new(Address::new(0x10), Address::new(0x1f))
        );
    }

    #[test]
    fn test_range_deserialize_from_yaml_hex() {
        let range: AddressRange = serde_yaml::from_str("{ start: 0x2000, end: 8447 }").unwrap();
        assert_eq!(range.min_address(), Address::new(0x2000));
        assert_eq!(range.max_address(), Address::new(0x20ff));

        let inverted = serde_yaml::from_str::<AddressRange>("{ start: 0x20, end: 0x10 }");
        assert!(inverted.is_err());
    }
}
