//! Collection entry parsing.
//!
//! A collection entry is a mapping whose keys are methods, except for the two
//! reserved keys `subfilters` and `details`. Method values are comma-separated
//! strings (`"value1, value2"`), bare scalars, or sequences of scalars.

use serde_yaml::{Mapping, Value};

/// One method of a collection entry with its already-split values.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub name: String,
    pub values: Vec<String>,
}

/// A fully parsed collection entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub name: String,
    pub methods: Vec<MethodCall>,
    pub subfilters: Vec<(String, String)>,
    pub details: Vec<(String, String)>,
}

pub(crate) fn parse_entry(name: &str, body: &Mapping) -> CollectionEntry {
    let mut methods = Vec::new();
    let mut subfilters = Vec::new();
    let mut details = Vec::new();

    for (key, value) in body {
        let Some(key) = key.as_str() else { continue };
        match key {
            "subfilters" => subfilters = scalar_pairs(value),
            "details" => details = scalar_pairs(value),
            _ => {
                let values = method_values(value);
                if !values.is_empty() {
                    methods.push(MethodCall {
                        name: key.to_string(),
                        values,
                    });
                }
            }
        }
    }

    CollectionEntry {
        name: name.to_string(),
        methods,
        subfilters,
        details,
    }
}

/// Split a method value into individual values: strings on `", "`,
/// sequences element-wise, other scalars as a single value.
fn method_values(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(seq) => seq.iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => s.split(", ").map(|v| v.to_string()).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn scalar_pairs(value: &Value) -> Vec<(String, String)> {
    let Some(mapping) = value.as_mapping() else {
        return Vec::new();
    };
    mapping
        .iter()
        .filter_map(|(k, v)| Some((k.as_str()?.to_string(), scalar_to_string(v)?)))
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> CollectionEntry {
        let body: Mapping = serde_yaml::from_str(yaml).unwrap();
        parse_entry("Test", &body)
    }

    #[test]
    fn comma_separated_values_are_split() {
        let entry = parse("genres: \"Dinosaurs, Monsters\"");
        assert_eq!(
            entry.methods,
            vec![MethodCall {
                name: "genres".into(),
                values: vec!["Dinosaurs".into(), "Monsters".into()],
            }]
        );
    }

    #[test]
    fn numeric_values_become_strings() {
        let entry = parse("year: 1993");
        assert_eq!(entry.methods[0].values, vec!["1993"]);
    }

    #[test]
    fn sequences_yield_one_value_per_element() {
        let entry = parse("years:\n  - 1990\n  - 1991");
        assert_eq!(entry.methods[0].values, vec!["1990", "1991"]);
    }

    #[test]
    fn reserved_keys_are_not_methods() {
        let entry = parse(
            "genres: Dinosaurs\nsubfilters:\n  video-resolution: 4k\ndetails:\n  tmdb-summary: 328",
        );
        assert_eq!(entry.methods.len(), 1);
        assert_eq!(
            entry.subfilters,
            vec![("video-resolution".to_string(), "4k".to_string())]
        );
        assert_eq!(
            entry.details,
            vec![("tmdb-summary".to_string(), "328".to_string())]
        );
    }
}
