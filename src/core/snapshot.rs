use crate::domain::error::{HuberError, HuberResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// Nested view of bath state keyed by dotted path segments.
///
/// Built fresh for every bulk read; unknown values are stored as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a dotted path, creating intermediate maps
    pub fn insert(&mut self, path: &str, value: impl Serialize) -> HuberResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| HuberError::Output(format!("Failed to encode {}: {}", path, e)))?;
        set_nested(&mut self.0, path, value);
        Ok(())
    }

    /// Look up a value by dotted path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Leaf values with their dotted paths, in key order.
    ///
    /// Objects that are values in their own right (status flags, fault
    /// records) are flattened too.
    pub fn flatten(&self) -> Vec<(String, Value)> {
        let mut leaves = Vec::new();
        flatten_into(&self.0, "", &mut leaves);
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        leaves
    }
}

fn set_nested(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((node, rest)) => {
            let child = map
                .entry(node.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                set_nested(child, rest, value);
            }
        }
    }
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, leaves: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(child) => flatten_into(child, &path, leaves),
            other => leaves.push((path, other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_insert() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("on", false).unwrap();
        snapshot.insert("temperature.bath", 23.49).unwrap();
        snapshot.insert("temperature.setpoint", 50.0).unwrap();
        snapshot.insert("fill", Option::<f64>::None).unwrap();

        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({
                "on": false,
                "temperature": {"bath": 23.49, "setpoint": 50.0},
                "fill": null
            })
        );
        assert_eq!(snapshot.get("temperature.bath"), Some(&json!(23.49)));
        assert!(snapshot.contains("fill"));
        assert!(!snapshot.contains("pump.speed"));
        assert!(!snapshot.contains("on.off"));
    }

    #[test]
    fn test_insert_replaces_scalar_node() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("pump", 1).unwrap();
        snapshot.insert("pump.speed", 2850).unwrap();
        assert_eq!(snapshot.get("pump"), Some(&json!({"speed": 2850})));
    }

    #[test]
    fn test_flatten() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("status", json!({"error": false, "pumping": true})).unwrap();
        snapshot.insert("pump.setpoint", 3000).unwrap();

        let leaves = snapshot.flatten();
        let paths: Vec<&str> = leaves.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["pump.setpoint", "status.error", "status.pumping"]);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("maintenance", 180).unwrap();
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), r#"{"maintenance":180}"#);
    }
}
