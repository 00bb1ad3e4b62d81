// Field module - register map of the bath
use crate::domain::error::{HuberError, HuberResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire format of a register value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    /// Nonzero means true
    Bool,
    /// Hundredths, e.g. 4999 => 49.99
    DecimalCenti,
    /// Thousandths of a fraction, e.g. 500 => 0.5
    DecimalMilliPercent,
    /// Raw signed integer
    Integer,
    /// Named bits of a status word
    BitFlags,
    /// Negative values index the fault table
    Fault,
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Bool => write!(f, "bool"),
            FieldFormat::DecimalCenti => write!(f, "decimal_centi"),
            FieldFormat::DecimalMilliPercent => write!(f, "decimal_milli_percent"),
            FieldFormat::Integer => write!(f, "integer"),
            FieldFormat::BitFlags => write!(f, "bitflags"),
            FieldFormat::Fault => write!(f, "fault"),
        }
    }
}

/// Register metadata for one leaf field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub address: u8,
    pub writable: bool,
    pub format: FieldFormat,
    /// Inclusive bounds, only for bounded numeric fields
    pub range: Option<(f64, f64)>,
    /// (bit index, name) pairs, only for `BitFlags`
    pub flags: &'static [(u8, &'static str)],
}

impl FieldDescriptor {
    /// Check a value against the configured range, if any
    pub fn contains(&self, value: f64) -> bool {
        match self.range {
            Some((min, max)) => min <= value && value <= max,
            None => true,
        }
    }
}

static ON: FieldDescriptor = FieldDescriptor {
    address: 0x14,
    writable: true,
    format: FieldFormat::Bool,
    range: Some((0.0, 1.0)),
    flags: &[],
};

static TEMPERATURE_SETPOINT: FieldDescriptor = FieldDescriptor {
    address: 0x00,
    writable: true,
    format: FieldFormat::DecimalCenti,
    range: Some((-151.0, 327.0)),
    flags: &[],
};

static TEMPERATURE_BATH: FieldDescriptor = FieldDescriptor {
    address: 0x01,
    writable: false,
    format: FieldFormat::DecimalCenti,
    range: Some((-151.0, 327.0)),
    flags: &[],
};

static TEMPERATURE_PROCESS: FieldDescriptor = FieldDescriptor {
    address: 0x07,
    writable: false,
    format: FieldFormat::DecimalCenti,
    range: Some((-151.0, 327.0)),
    flags: &[],
};

static PUMP_PRESSURE: FieldDescriptor = FieldDescriptor {
    address: 0x03,
    writable: false,
    format: FieldFormat::DecimalCenti,
    range: Some((0.0, 320.0)),
    flags: &[],
};

static PUMP_SPEED: FieldDescriptor = FieldDescriptor {
    address: 0x26,
    writable: false,
    format: FieldFormat::Integer,
    range: Some((0.0, 32000.0)),
    flags: &[],
};

static PUMP_SETPOINT: FieldDescriptor = FieldDescriptor {
    address: 0x48,
    writable: true,
    format: FieldFormat::Integer,
    range: Some((1500.0, 4500.0)),
    flags: &[],
};

static FILL: FieldDescriptor = FieldDescriptor {
    address: 0x0F,
    writable: false,
    format: FieldFormat::DecimalMilliPercent,
    range: Some((-0.001, 1.0)),
    flags: &[],
};

static MAINTENANCE: FieldDescriptor = FieldDescriptor {
    address: 0x5C,
    writable: false,
    format: FieldFormat::Integer,
    range: None,
    flags: &[],
};

static STATUS: FieldDescriptor = FieldDescriptor {
    address: 0x0A,
    writable: false,
    format: FieldFormat::BitFlags,
    range: None,
    flags: &[
        (0, "controlling"),
        (1, "circulating"),
        (4, "pumping"),
        (8, "error"),
        (9, "warning"),
    ],
};

// Fault registers are written to clear the latched fault.
static ERROR: FieldDescriptor = FieldDescriptor {
    address: 0x05,
    writable: true,
    format: FieldFormat::Fault,
    range: None,
    flags: &[],
};

static WARNING: FieldDescriptor = FieldDescriptor {
    address: 0x06,
    writable: true,
    format: FieldFormat::Fault,
    range: None,
    flags: &[],
};

/// Every addressable bath property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    On,
    TemperatureSetpoint,
    TemperatureBath,
    TemperatureProcess,
    PumpPressure,
    PumpSpeed,
    PumpSetpoint,
    Fill,
    Maintenance,
    Status,
    Error,
    Warning,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::On,
        Field::TemperatureSetpoint,
        Field::TemperatureBath,
        Field::TemperatureProcess,
        Field::PumpPressure,
        Field::PumpSpeed,
        Field::PumpSetpoint,
        Field::Fill,
        Field::Maintenance,
        Field::Status,
        Field::Error,
        Field::Warning,
    ];

    /// Fields fetched for a full device snapshot, in request order
    pub const DEFAULTS: [Field; 9] = [
        Field::On,
        Field::TemperatureBath,
        Field::TemperatureSetpoint,
        Field::PumpPressure,
        Field::PumpSpeed,
        Field::PumpSetpoint,
        Field::Fill,
        Field::Maintenance,
        Field::Status,
    ];

    /// Dotted path of the field
    pub fn path(self) -> &'static str {
        match self {
            Field::On => "on",
            Field::TemperatureSetpoint => "temperature.setpoint",
            Field::TemperatureBath => "temperature.bath",
            Field::TemperatureProcess => "temperature.process",
            Field::PumpPressure => "pump.pressure",
            Field::PumpSpeed => "pump.speed",
            Field::PumpSetpoint => "pump.setpoint",
            Field::Fill => "fill",
            Field::Maintenance => "maintenance",
            Field::Status => "status",
            Field::Error => "error",
            Field::Warning => "warning",
        }
    }

    pub fn descriptor(self) -> &'static FieldDescriptor {
        match self {
            Field::On => &ON,
            Field::TemperatureSetpoint => &TEMPERATURE_SETPOINT,
            Field::TemperatureBath => &TEMPERATURE_BATH,
            Field::TemperatureProcess => &TEMPERATURE_PROCESS,
            Field::PumpPressure => &PUMP_PRESSURE,
            Field::PumpSpeed => &PUMP_SPEED,
            Field::PumpSetpoint => &PUMP_SETPOINT,
            Field::Fill => &FILL,
            Field::Maintenance => &MAINTENANCE,
            Field::Status => &STATUS,
            Field::Error => &ERROR,
            Field::Warning => &WARNING,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Node of the dotted-path tree
enum Node {
    Leaf(Field),
    Branch(&'static [(&'static str, Node)]),
}

static TREE: &[(&str, Node)] = &[
    ("on", Node::Leaf(Field::On)),
    (
        "temperature",
        Node::Branch(&[
            ("setpoint", Node::Leaf(Field::TemperatureSetpoint)),
            ("bath", Node::Leaf(Field::TemperatureBath)),
            ("process", Node::Leaf(Field::TemperatureProcess)),
        ]),
    ),
    (
        "pump",
        Node::Branch(&[
            ("pressure", Node::Leaf(Field::PumpPressure)),
            ("speed", Node::Leaf(Field::PumpSpeed)),
            ("setpoint", Node::Leaf(Field::PumpSetpoint)),
        ]),
    ),
    ("fill", Node::Leaf(Field::Fill)),
    ("maintenance", Node::Leaf(Field::Maintenance)),
    ("status", Node::Leaf(Field::Status)),
    ("error", Node::Leaf(Field::Error)),
    ("warning", Node::Leaf(Field::Warning)),
];

impl FromStr for Field {
    type Err = HuberError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let lookup_error = || HuberError::Lookup {
            path: path.to_string(),
        };

        let mut level = TREE;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let (_, node) = level
                .iter()
                .find(|(name, _)| *name == segment)
                .ok_or_else(lookup_error)?;
            match node {
                Node::Leaf(field) if segments.peek().is_none() => return Ok(*field),
                Node::Branch(children) => level = *children,
                Node::Leaf(_) => return Err(lookup_error()),
            }
        }

        // Path ended on an interior node
        Err(lookup_error())
    }
}

/// Resolve a dotted path to its register descriptor
pub fn resolve(path: &str) -> HuberResult<&'static FieldDescriptor> {
    path.parse::<Field>().map(Field::descriptor)
}
