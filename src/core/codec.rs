// Codec module - register values, wire hex and typed field values
use crate::domain::error::{HuberError, HuberResult};
use crate::domain::fault::{FaultRecord, FaultTable};
use crate::domain::field::{Field, FieldDescriptor, FieldFormat};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Raw value meaning "command not implemented on this model"
pub const NOT_SUPPORTED: i32 = 0x7FFF;

const BITS: u32 = 16;
const MODULUS: i32 = 1 << BITS;

/// Encode an integer as 4 uppercase hex digits, two's complement
pub fn encode_value(n: i32) -> String {
    format!("{:04X}", n.rem_euclid(MODULUS))
}

/// Decode 4 hex digits as a two's complement integer
pub fn decode_value(hex: &str) -> HuberResult<i32> {
    if hex.len() != 4 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(HuberError::Protocol(format!(
            "Expected 4 hex digits, got {:?}",
            hex
        )));
    }

    let number = i32::from_str_radix(hex, 16)
        .map_err(|e| HuberError::Protocol(format!("Invalid hex value {:?}: {}", hex, e)))?;
    if number == NOT_SUPPORTED {
        return Err(HuberError::DeviceNotSupported);
    }
    if number >> (BITS - 1) == 1 {
        Ok(number - MODULUS)
    } else {
        Ok(number)
    }
}

/// A decoded register value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i32),
    Decimal(f64),
    Flags(BTreeMap<&'static str, bool>),
    Fault(FaultRecord),
}

impl FieldValue {
    /// Numeric view used for range checks and write verification
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Bool(b) => Some(f64::from(u8::from(*b))),
            FieldValue::Integer(n) => Some(f64::from(*n)),
            FieldValue::Decimal(x) => Some(*x),
            FieldValue::Flags(_) | FieldValue::Fault(_) => None,
        }
    }

    pub fn as_flags(&self) -> Option<&BTreeMap<&'static str, bool>> {
        match self {
            FieldValue::Flags(flags) => Some(flags),
            _ => None,
        }
    }

    pub fn as_fault(&self) -> Option<&FaultRecord> {
        match self {
            FieldValue::Fault(record) => Some(record),
            _ => None,
        }
    }

    /// Named flag of a status word; false when absent
    pub fn flag(&self, name: &str) -> bool {
        self.as_flags()
            .and_then(|flags| flags.get(name).copied())
            .unwrap_or(false)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(x) => write!(f, "{}", x),
            FieldValue::Flags(flags) => {
                let set: Vec<&str> = flags
                    .iter()
                    .filter(|(_, on)| **on)
                    .map(|(name, _)| *name)
                    .collect();
                write!(f, "[{}]", set.join(", "))
            }
            FieldValue::Fault(record) => match &record.condition {
                Some(condition) => write!(f, "{} {}: {}", record.kind, record.code, condition),
                None => write!(f, "{} {}", record.kind, record.code),
            },
        }
    }
}

/// Decode a raw register value using the built-in fault table
pub fn decode_field(raw: Option<i32>, descriptor: &FieldDescriptor) -> Option<FieldValue> {
    decode_field_with(raw, descriptor, FaultTable::builtin())
}

/// Decode a raw register value; `None` stays unknown for every format
pub fn decode_field_with(
    raw: Option<i32>,
    descriptor: &FieldDescriptor,
    faults: &FaultTable,
) -> Option<FieldValue> {
    let raw = raw?;
    match descriptor.format {
        FieldFormat::Bool => Some(FieldValue::Bool(raw != 0)),
        FieldFormat::Integer => Some(FieldValue::Integer(raw)),
        FieldFormat::DecimalCenti => Some(FieldValue::Decimal(f64::from(raw) / 100.0)),
        FieldFormat::DecimalMilliPercent => Some(FieldValue::Decimal(f64::from(raw) / 1000.0)),
        FieldFormat::BitFlags => Some(FieldValue::Flags(
            descriptor
                .flags
                .iter()
                .map(|(bit, name)| (*name, (raw >> bit) & 1 == 1))
                .collect(),
        )),
        FieldFormat::Fault if raw < 0 => Some(FieldValue::Fault(faults.lookup(raw))),
        FieldFormat::Fault => None,
    }
}

/// Scale a requested value into the raw integer written to the register
pub fn encode_field(field: Field, value: f64) -> HuberResult<i32> {
    let scaled = match field.descriptor().format {
        FieldFormat::DecimalCenti => (value * 100.0).round(),
        // Anything short of a full 1 leaves the switch off
        FieldFormat::Bool => value.trunc(),
        _ => value.round(),
    };

    if !scaled.is_finite() || scaled < f64::from(i16::MIN) || scaled > f64::from(i16::MAX) {
        return Err(HuberError::OutOfRange {
            field: field.path().to_string(),
            value,
            min: f64::from(i16::MIN),
            max: f64::from(i16::MAX),
        });
    }
    Ok(scaled as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_boundaries() {
        assert_eq!(encode_value(-1), "FFFF");
        assert_eq!(encode_value(0), "0000");
        assert_eq!(encode_value(4999), "1387");
        assert_eq!(encode_value(-32768), "8000");
        assert_eq!(encode_value(32767), "7FFF");
    }

    #[test]
    fn test_decode_negative() {
        assert_eq!(decode_value("FFFF").unwrap(), -1);
        assert_eq!(decode_value("8000").unwrap(), -32768);
        assert_eq!(decode_value("ff9c").unwrap(), -100);
        assert_eq!(decode_value("7FFE").unwrap(), 32766);
    }

    #[test]
    fn test_decode_not_supported() {
        assert!(matches!(
            decode_value("7FFF"),
            Err(HuberError::DeviceNotSupported)
        ));
    }

    #[test]
    fn test_decode_malformed() {
        for hex in ["", "123", "12345", "12G4", "+123", "****"] {
            assert!(matches!(decode_value(hex), Err(HuberError::Protocol(_))));
        }
    }

    proptest! {
        #[test]
        fn test_round_trip(n in -32768i32..32767) {
            prop_assert_eq!(decode_value(&encode_value(n)).unwrap(), n);
        }
    }

    #[test]
    fn test_scaling() {
        assert_eq!(
            decode_field(Some(4999), Field::TemperatureSetpoint.descriptor()),
            Some(FieldValue::Decimal(49.99))
        );
        assert_eq!(
            decode_field(Some(500), Field::Fill.descriptor()),
            Some(FieldValue::Decimal(0.5))
        );
        assert_eq!(
            decode_field(Some(2000), Field::PumpSetpoint.descriptor()),
            Some(FieldValue::Integer(2000))
        );
        assert_eq!(
            decode_field(Some(2), Field::On.descriptor()),
            Some(FieldValue::Bool(true))
        );
    }

    #[test]
    fn test_bit_flags() {
        let value = decode_field(Some(0b1_0000_0001), Field::Status.descriptor()).unwrap();
        let flags = value.as_flags().unwrap();
        assert_eq!(flags.len(), 5);
        assert!(flags["controlling"]);
        assert!(flags["error"]);
        assert!(!flags["circulating"]);
        assert!(!flags["pumping"]);
        assert!(!flags["warning"]);
        assert!(value.flag("error"));
        assert!(!value.flag("missing"));
    }

    #[test]
    fn test_fault_decoding() {
        let table = FaultTable::from_toml(
            "[[fault]]\ncode = -3\ntype = \"Error\"\ncondition = \"Sensor fault\"",
        )
        .unwrap();
        let descriptor = Field::Error.descriptor();

        let active = decode_field_with(Some(-3), descriptor, &table).unwrap();
        assert_eq!(active.as_fault().unwrap().condition.as_deref(), Some("Sensor fault"));

        assert_eq!(decode_field_with(Some(0), descriptor, &table), None);
        assert_eq!(decode_field_with(Some(12), descriptor, &table), None);

        let unknown = decode_field_with(Some(-77), descriptor, &table).unwrap();
        assert_eq!(unknown.as_fault().unwrap().kind, "unknown");
    }

    #[test]
    fn test_no_response_is_unknown() {
        for field in Field::ALL {
            assert_eq!(decode_field(None, field.descriptor()), None);
        }
    }

    #[test]
    fn test_encode_field() {
        assert_eq!(encode_field(Field::TemperatureSetpoint, 1.23).unwrap(), 123);
        assert_eq!(encode_field(Field::TemperatureSetpoint, 0.29).unwrap(), 29);
        assert_eq!(encode_field(Field::TemperatureSetpoint, -20.5).unwrap(), -2050);
        assert_eq!(encode_field(Field::PumpSetpoint, 2000.0).unwrap(), 2000);
        assert_eq!(encode_field(Field::On, 1.0).unwrap(), 1);
        assert_eq!(encode_field(Field::On, 0.5).unwrap(), 0);
        assert_eq!(encode_field(Field::On, 0.99).unwrap(), 0);
        assert!(matches!(
            encode_field(Field::TemperatureSetpoint, 400.0),
            Err(HuberError::OutOfRange { .. })
        ));
        assert!(encode_field(Field::PumpSetpoint, f64::NAN).is_err());
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(FieldValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(FieldValue::Integer(-5).as_f64(), Some(-5.0));
        assert_eq!(FieldValue::Flags(BTreeMap::new()).as_f64(), None);
    }

    #[test]
    fn test_untagged_json() {
        assert_eq!(serde_json::to_value(FieldValue::Bool(false)).unwrap(), serde_json::json!(false));
        assert_eq!(serde_json::to_value(FieldValue::Decimal(23.49)).unwrap(), serde_json::json!(23.49));
        assert_eq!(serde_json::to_value(FieldValue::Integer(500)).unwrap(), serde_json::json!(500));
    }
}
