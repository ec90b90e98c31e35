use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value as YamlValue;

/// Owned, order-preserving parameter tree.
///
/// Mapping keys are always strings: YAML dates load as strings and numeric keys
/// (`1:`, `2:` in household-size tables) are rendered back to their text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
    Map(IndexMap<String, ParamValue>),
}

impl ParamValue {
    /// Parse a YAML document
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        let value: YamlValue = serde_yaml::from_str(source)?;
        Ok(Self::from(value))
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&Vec<Self>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Child by key, when this is a map
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map().and_then(|map| map.get(key))
    }

    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<YamlValue> for ParamValue {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Null => Self::Null,
            YamlValue::Bool(flag) => Self::Bool(flag),
            YamlValue::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            YamlValue::String(text) => Self::Text(text),
            YamlValue::Sequence(items) => Self::List(items.into_iter().map(Self::from).collect()),
            YamlValue::Mapping(mapping) => {
                let mut map = IndexMap::with_capacity(mapping.len());
                for (key, value) in mapping {
                    if let Some(key) = key_text(&key) {
                        map.insert(key, Self::from(value));
                    }
                }
                Self::Map(map)
            }
            YamlValue::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

fn key_text(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(text) => Some(text.clone()),
        YamlValue::Number(number) => Some(number.to_string()),
        YamlValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dates_and_numeric_keys_become_strings() {
        let value = ParamValue::from_yaml_str(
            "values:\n  2020-01-01: 100\n  2023-01-01: 150.5\nsizes:\n  1: 10\n  2: 20\n",
        )
        .unwrap();

        let values = value.get("values").and_then(ParamValue::as_map).unwrap();
        assert_eq!(
            values.keys().collect::<Vec<_>>(),
            vec!["2020-01-01", "2023-01-01"]
        );
        assert_eq!(values["2023-01-01"], ParamValue::Float(150.5));

        let sizes = value.get("sizes").and_then(ParamValue::as_map).unwrap();
        assert_eq!(sizes.keys().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(sizes["1"].as_f64(), Some(10.0));
    }

    #[test]
    fn serializes_untagged() {
        let value = ParamValue::from_yaml_str("a: [x, 1, true, null]\n").unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"a":["x",1,true,null]}"#
        );
    }
}
