use crate::classify::{classify, ParameterStructureKind};
use crate::format::{format_parameter, FormatOptions};
use crate::record::{ParameterMetadata, ParameterRecord};
use serde::Serialize;

/// Everything shown for one parameter on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDetail {
    pub path: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub structure: ParameterStructureKind,
    pub value: String,
    pub metadata: ParameterMetadata,
}

/// Build the detail view; the label falls back to the last path segment.
#[must_use]
pub fn describe(record: &ParameterRecord, options: &FormatOptions) -> ParameterDetail {
    ParameterDetail {
        path: record.path.clone(),
        label: record.label().unwrap_or_else(|| record.name()).to_string(),
        description: record.description.clone(),
        unit: record.unit().map(str::to_string),
        structure: classify(record),
        value: format_parameter(Some(record), options),
        metadata: record.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DetailLevel;
    use pretty_assertions::assert_eq;

    #[test]
    fn describe_collects_label_structure_and_value() {
        let record = ParameterRecord::from_yaml_str(
            "gov.irs.credits.eitc.takeup",
            "description: EITC take-up rate.\nvalues:\n  2020-01-01: 0.82\nmetadata:\n  unit: /1\n",
        )
        .unwrap();

        let detail = describe(&record, &FormatOptions::new(DetailLevel::Summary));

        assert_eq!(detail.label, "takeup");
        assert_eq!(detail.structure, ParameterStructureKind::Simple);
        assert_eq!(detail.value, "82.0%");
        assert_eq!(detail.description.as_deref(), Some("EITC take-up rate."));
        assert_eq!(detail.unit.as_deref(), Some("/1"));
    }
}
