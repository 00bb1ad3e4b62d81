use crate::domain::error::{HuberError, HuberResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{error, warn};

const BUILTIN_FAULTS: &str = include_str!("../../data/faults.toml");

/// One entry of the fault table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRecord {
    pub code: i32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub recovery: Option<String>,
}

impl FaultRecord {
    /// Placeholder for a code the table does not list
    pub fn unknown(code: i32) -> Self {
        Self {
            code,
            kind: "unknown".to_string(),
            condition: None,
            recovery: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FaultFile {
    #[serde(default)]
    fault: Vec<FaultRecord>,
}

/// Read-only fault lookup keyed by signed fault code
#[derive(Debug, Clone, Default)]
pub struct FaultTable {
    faults: HashMap<i32, FaultRecord>,
}

impl FaultTable {
    /// Parse a fault table from TOML `[[fault]]` rows
    pub fn from_toml(content: &str) -> HuberResult<Self> {
        let file: FaultFile = toml::from_str(content).map_err(|e| HuberError::Config {
            message: format!("Failed to parse fault table: {}", e),
        })?;

        let faults = file
            .fault
            .into_iter()
            .map(|record| (record.code, record))
            .collect();
        Ok(Self { faults })
    }

    /// The table shipped with the crate, parsed once per process
    pub fn builtin() -> &'static FaultTable {
        static TABLE: OnceLock<FaultTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            FaultTable::from_toml(BUILTIN_FAULTS).unwrap_or_else(|e| {
                error!("{}", e);
                FaultTable::default()
            })
        })
    }

    pub fn get(&self, code: i32) -> Option<&FaultRecord> {
        self.faults.get(&code)
    }

    /// Look up a code, falling back to an `unknown` record
    pub fn lookup(&self, code: i32) -> FaultRecord {
        match self.faults.get(&code) {
            Some(record) => record.clone(),
            None => {
                warn!("Fault code {} not in fault table", code);
                FaultRecord::unknown(code)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}
