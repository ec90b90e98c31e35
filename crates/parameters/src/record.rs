use crate::value::ParamValue;
use serde::Serialize;

/// Keys that describe a parameter rather than hold its data.
pub const RESERVED_KEYS: [&str; 5] = ["metadata", "description", "documentation", "reference", "values"];

/// The `metadata:` block of a parameter file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Dimension names for multi-dimensional parameters
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_unit: Option<String>,
}

impl ParameterMetadata {
    fn from_value(value: Option<&ParamValue>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        let text = |key: &str| value.get(key).and_then(ParamValue::as_str).map(str::to_string);

        let breakdown = match value.get("breakdown") {
            Some(ParamValue::Text(single)) => vec![single.clone()],
            Some(ParamValue::List(items)) => items
                .iter()
                .filter_map(ParamValue::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Self {
            label: text("label"),
            unit: text("unit"),
            description: text("description"),
            period: text("period"),
            breakdown,
            threshold_unit: text("threshold_unit"),
            rate_unit: text("rate_unit"),
            amount_unit: text("amount_unit"),
        }
    }
}

/// One loaded parameter: its dotted path, the whole value tree, and parsed metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRecord {
    pub path: String,
    pub metadata: ParameterMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: ParamValue,
}

impl ParameterRecord {
    pub fn new(path: impl Into<String>, data: ParamValue) -> Self {
        let metadata = ParameterMetadata::from_value(data.get("metadata"));
        let description = data
            .get("description")
            .and_then(ParamValue::as_str)
            .map(|text| text.trim().to_string())
            .or_else(|| metadata.description.clone());
        Self {
            path: path.into(),
            metadata,
            description,
            data,
        }
    }

    /// Parse a record straight from YAML text
    pub fn from_yaml_str(path: impl Into<String>, source: &str) -> Result<Self, serde_yaml::Error> {
        Ok(Self::new(path, ParamValue::from_yaml_str(source)?))
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.metadata.label.as_deref()
    }

    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.metadata.unit.as_deref()
    }

    /// Data entries in file order, reserved keys excluded. Empty for non-map records.
    pub fn data_entries(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.data
            .as_map()
            .into_iter()
            .flat_map(|map| map.iter())
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Value of a data entry by key.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&ParamValue> {
        if RESERVED_KEYS.contains(&key) {
            return None;
        }
        self.data.get(key)
    }

    /// Last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_and_entries_are_separated() {
        let record = ParameterRecord::from_yaml_str(
            "gov.hhs.fpg.first_person",
            "description: Poverty guideline for the first person.\n\
             metadata:\n  label: First person\n  unit: currency-USD\n  breakdown: [state_group]\n\
             CONTIGUOUS_US:\n  2024-01-01: 15060\n\
             AK:\n  2024-01-01: 18810\n",
        )
        .unwrap();

        assert_eq!(record.label(), Some("First person"));
        assert_eq!(record.unit(), Some("currency-USD"));
        assert_eq!(record.metadata.breakdown, vec!["state_group"]);
        assert_eq!(
            record.description.as_deref(),
            Some("Poverty guideline for the first person.")
        );
        let keys: Vec<_> = record.data_entries().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["CONTIGUOUS_US", "AK"]);
        assert_eq!(record.name(), "first_person");
        assert!(record.entry("metadata").is_none());
    }
}
