use crate::consolidate::{consolidate, DEFAULT_CONSOLIDATION_THRESHOLD};
use crate::error::{ExtractError, Result};
use crate::formula::FormulaWalker;
use crate::record::{DependencyList, VariableRecord};
use crate::syntax::{
    dotted_name, is_dotted_path, is_identity, resolve_list, simple_assignment, string_list,
    string_literal, text, unwrap_parens, ListAliases,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Class bases that mark a variable definition.
pub const DEFAULT_BASE_TYPES: [&str; 2] = ["Variable", "BaseVariable"];

/// Extractor tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Base class names that mark a variable definition
    pub base_types: Vec<String>,
    /// Distinct leaves under one parameter node kept before they collapse into the node
    pub consolidation_threshold: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_types: DEFAULT_BASE_TYPES.iter().map(ToString::to_string).collect(),
            consolidation_threshold: DEFAULT_CONSOLIDATION_THRESHOLD,
        }
    }
}

/// Reads one variable definition unit into a [`VariableRecord`] without executing it.
pub struct DefinitionExtractor {
    parser: Parser,
    config: ExtractorConfig,
}

impl DefinitionExtractor {
    pub fn new() -> Result<Self> {
        Self::with_config(ExtractorConfig::default())
    }

    pub fn with_config(config: ExtractorConfig) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ExtractError::ParserSetup(format!("Failed to set language: {e}")))?;
        Ok(Self { parser, config })
    }

    #[must_use]
    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Best-effort extraction: any parse or shape mismatch yields `None`.
    pub fn extract(&mut self, source: &str, identity: &str) -> Option<VariableRecord> {
        match self.try_extract(source, identity) {
            Ok(record) => Some(record),
            Err(err) => {
                log::debug!("No record for {identity}: {err}");
                None
            }
        }
    }

    /// Extraction with the failure reason kept.
    pub fn try_extract(&mut self, source: &str, identity: &str) -> Result<VariableRecord> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::Syntax(identity.to_string()))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(ExtractError::Syntax(identity.to_string()));
        }

        let module = ModuleScope::scan(root, source);
        let class = self
            .find_variable_class(&module, identity)
            .ok_or_else(|| ExtractError::NoVariableClass(identity.to_string()))?;

        let mut record = VariableRecord::new(identity);
        self.read_class(class, source, &module, &mut record);
        record.remove_self_references();
        Ok(record)
    }

    /// Extract a file; its base name is the identity.
    pub fn extract_file(&mut self, path: &Path) -> Result<VariableRecord> {
        let identity = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| is_identity(stem))
            .ok_or_else(|| ExtractError::InvalidFileName(path.display().to_string()))?
            .to_string();
        let source = std::fs::read_to_string(path)?;

        let mut record = self.try_extract(&source, &identity)?;
        record.source_path = Some(path.to_path_buf());
        Ok(record)
    }

    /// The class named like the identity wins; otherwise the first variable class in the unit.
    fn find_variable_class<'m, 'tree>(
        &self,
        module: &'m ModuleScope<'tree>,
        identity: &str,
    ) -> Option<&'m ClassDef<'tree>> {
        let is_variable = |class: &&ClassDef<'tree>| {
            class
                .bases
                .iter()
                .any(|base| self.config.base_types.iter().any(|known| known == base))
        };
        module
            .classes
            .iter()
            .filter(is_variable)
            .find(|class| class.name == identity)
            .or_else(|| module.classes.iter().find(is_variable))
    }

    fn read_class(
        &self,
        class: &ClassDef,
        source: &str,
        module: &ModuleScope,
        record: &mut VariableRecord,
    ) {
        let mut walker = FormulaWalker::new(source, &module.lists);
        let mut docstring = None;
        let mut possible_values = None;
        let mut first_statement = true;

        let mut cursor = class.body.walk();
        for statement in class.body.named_children(&mut cursor) {
            if statement.kind() == "comment" {
                continue;
            }
            let is_first = std::mem::replace(&mut first_statement, false);

            match statement.kind() {
                "expression_statement" => {
                    if is_first {
                        docstring = statement
                            .named_child(0)
                            .filter(|expr| expr.kind() == "string")
                            .and_then(|expr| string_literal(expr, source))
                            .map(|doc| normalize_docstring(&doc))
                            .filter(|doc| !doc.is_empty());
                    }
                    if let Some((field, value)) = simple_assignment(statement, source) {
                        if field == "possible_values" {
                            possible_values = dotted_name(value, source);
                        } else {
                            apply_field(record, &field, value, source, &module.lists);
                        }
                    }
                }
                "function_definition" | "decorated_definition" => {
                    let Some(function) = definition_of(statement) else {
                        continue;
                    };
                    let is_formula = function
                        .child_by_field_name("name")
                        .is_some_and(|name| is_formula_name(text(name, source)));
                    if is_formula {
                        walker.walk_formula(function);
                        record.formula_count += 1;
                    }
                }
                _ => {}
            }
        }

        if record.description.is_none() {
            record.description = docstring;
        }

        if let Some(enum_name) = possible_values {
            let short = enum_name.rsplit('.').next().unwrap_or(&enum_name);
            if let Some(options) = module.enums.get(short) {
                record.enum_options = options.clone();
            }
        }

        let facts = walker.finish();
        record.formula_variables.extend(facts.variables);
        record.adds.extend_resolved(facts.adds);
        record.subtracts.extend_resolved(facts.subtracts);
        record.parameters = consolidate(&facts.parameters, self.config.consolidation_threshold);
    }
}

struct ClassDef<'tree> {
    name: String,
    /// Last segment of each base (`core.Variable` -> `Variable`)
    bases: Vec<String>,
    body: Node<'tree>,
}

/// Module-level facts visible to every class in the unit.
struct ModuleScope<'tree> {
    lists: ListAliases,
    classes: Vec<ClassDef<'tree>>,
    enums: HashMap<String, Vec<String>>,
}

impl<'tree> ModuleScope<'tree> {
    fn scan(root: Node<'tree>, source: &str) -> Self {
        let mut scope = Self {
            lists: ListAliases::new(),
            classes: Vec::new(),
            enums: HashMap::new(),
        };

        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            match statement.kind() {
                "expression_statement" => {
                    if let Some((name, value)) = simple_assignment(statement, source) {
                        if let Some(items) = resolve_list(value, source, &scope.lists) {
                            scope.lists.insert(name, items);
                        }
                    }
                }
                "class_definition" | "decorated_definition" => {
                    if let Some(class) = definition_of(statement)
                        .filter(|node| node.kind() == "class_definition")
                        .and_then(|node| read_class_header(node, source))
                    {
                        if class.bases.iter().any(|base| base.ends_with("Enum")) {
                            scope
                                .enums
                                .insert(class.name.clone(), enum_members(class.body, source));
                        }
                        scope.classes.push(class);
                    }
                }
                _ => {}
            }
        }

        scope
    }
}

fn read_class_header<'tree>(node: Node<'tree>, source: &str) -> Option<ClassDef<'tree>> {
    let name = text(node.child_by_field_name("name")?, source).to_string();
    let body = node.child_by_field_name("body")?;

    let mut bases = Vec::new();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            if let Some(dotted) = dotted_name(base, source) {
                let short = dotted.rsplit('.').next().unwrap_or(&dotted).to_string();
                bases.push(short);
            }
        }
    }

    Some(ClassDef { name, bases, body })
}

fn enum_members(body: Node, source: &str) -> Vec<String> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter_map(|statement| simple_assignment(statement, source))
        .map(|(name, _)| name)
        .collect()
}

fn definition_of(statement: Node) -> Option<Node> {
    match statement.kind() {
        "decorated_definition" => statement.child_by_field_name("definition"),
        _ => Some(statement),
    }
}

fn is_formula_name(name: &str) -> bool {
    name == "formula" || name.starts_with("formula_")
}

fn apply_field(
    record: &mut VariableRecord,
    field: &str,
    value: Node,
    source: &str,
    lists: &ListAliases,
) {
    match field {
        "label" => record.label = string_literal(value, source),
        "documentation" => {
            record.description = string_literal(value, source)
                .map(|doc| normalize_docstring(&doc))
                .filter(|doc| !doc.is_empty());
        }
        "unit" => record.unit = scalar_text(value, source),
        "entity" => record.entity = scalar_text(value, source),
        "value_type" => record.value_type = scalar_text(value, source),
        "definition_period" => record.definition_period = scalar_text(value, source),
        "reference" => {
            record.reference = string_list(value, source)
                .or_else(|| string_literal(value, source).map(|reference| vec![reference]))
                .unwrap_or_default();
        }
        "default_value" => {
            record.default_value = string_literal(value, source)
                .or_else(|| Some(text(unwrap_parens(value), source).to_string()));
        }
        "defined_for" => record.defined_for = identity_list(value, source),
        "adds" => record.adds = dependency_list(value, source, lists),
        "subtracts" => record.subtracts = dependency_list(value, source, lists),
        _ => {}
    }
}

/// A string literal, or a bare / dotted name taken as written.
fn scalar_text(value: Node, source: &str) -> Option<String> {
    string_literal(value, source).or_else(|| dotted_name(value, source))
}

/// `defined_for` accepts one identity or a list of them; attribute forms are not variables.
fn identity_list(value: Node, source: &str) -> Vec<String> {
    let items = string_literal(value, source)
        .map(|item| vec![item])
        .or_else(|| string_list(value, source))
        .unwrap_or_default();
    items.into_iter().filter(|item| is_identity(item)).collect()
}

fn dependency_list(value: Node, source: &str, lists: &ListAliases) -> DependencyList {
    if let Some(literal) = string_literal(value, source) {
        if is_dotted_path(&literal) {
            return DependencyList::ParameterSourced(literal);
        }
        if is_identity(&literal) {
            return DependencyList::Resolved(vec![literal]);
        }
        return DependencyList::default();
    }

    let mut items: Vec<String> = Vec::new();
    for item in resolve_list(value, source, lists).unwrap_or_default() {
        if is_identity(&item) && !items.contains(&item) {
            items.push(item);
        }
    }
    DependencyList::Resolved(items)
}

fn normalize_docstring(doc: &str) -> String {
    doc.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(source: &str, identity: &str) -> Option<VariableRecord> {
        DefinitionExtractor::new().unwrap().extract(source, identity)
    }

    const EITC: &str = r#"
from policyengine_us.model_api import *


class eitc(Variable):
    value_type = float
    entity = TaxUnit
    label = "Earned Income Tax Credit"
    unit = USD
    definition_period = YEAR
    reference = "https://www.law.cornell.edu/uscode/text/26/32"
    defined_for = "eitc_eligible"

    def formula(tax_unit, period, parameters):
        maximum = tax_unit("eitc_maximum", period)
        phased_in = tax_unit("eitc_phased_in", period)
        reduction = tax_unit("eitc_reduction", period)
        p = parameters(period).gov.irs.credits.eitc
        return max_(0, min_(maximum, phased_in) - reduction) * p.takeup
"#;

    #[test]
    fn test_extracts_metadata_and_formula_reads() {
        let record = extract(EITC, "eitc").expect("record");

        assert_eq!(record.label.as_deref(), Some("Earned Income Tax Credit"));
        assert_eq!(record.entity.as_deref(), Some("TaxUnit"));
        assert_eq!(record.unit.as_deref(), Some("USD"));
        assert_eq!(record.value_type.as_deref(), Some("float"));
        assert_eq!(record.definition_period.as_deref(), Some("YEAR"));
        assert_eq!(record.defined_for, vec!["eitc_eligible"]);
        assert_eq!(
            record.reference,
            vec!["https://www.law.cornell.edu/uscode/text/26/32"]
        );
        assert_eq!(
            record.formula_variables.iter().cloned().collect::<Vec<_>>(),
            vec!["eitc_maximum", "eitc_phased_in", "eitc_reduction"]
        );
        assert_eq!(
            record.parameters.get("takeup").map(String::as_str),
            Some("gov.irs.credits.eitc.takeup")
        );
        assert_eq!(record.formula_count, 1);
    }

    #[test]
    fn test_syntax_error_yields_none() {
        assert!(extract("class broken(Variable:\n    label = 'x'\n", "broken").is_none());
    }

    #[test]
    fn test_unit_without_variable_class_yields_none() {
        let source = "class helper:\n    label = \"Not a variable\"\n";
        let mut extractor = DefinitionExtractor::new().unwrap();
        assert!(matches!(
            extractor.try_extract(source, "helper"),
            Err(ExtractError::NoVariableClass(_))
        ));
    }

    #[test]
    fn test_dotted_adds_string_is_parameter_sourced() {
        let source = r#"
class household_net_income(Variable):
    label = "net income"
    adds = "gov.household.net_income.components"
    subtracts = ["household_tax"]
"#;
        let record = extract(source, "household_net_income").unwrap();
        assert_eq!(
            record.adds,
            DependencyList::ParameterSourced("gov.household.net_income.components".into())
        );
        assert_eq!(record.subtracts.resolved(), ["household_tax".to_string()]);
    }

    #[test]
    fn test_self_reference_is_filtered() {
        let source = r#"
class net_income(Variable):
    adds = ["net_income", "wages"]

    def formula(person, period, parameters):
        return person("net_income", period.last_year) + person("rent", period)
"#;
        let record = extract(source, "net_income").unwrap();
        assert_eq!(record.adds.resolved(), ["wages".to_string()]);
        assert_eq!(
            record.formula_variables.iter().cloned().collect::<Vec<_>>(),
            vec!["rent"]
        );
    }

    #[test]
    fn test_docstring_and_enum_options() {
        let source = r#"
class FilingStatus(Enum):
    SINGLE = "Single"
    JOINT = "Joint"


class filing_status(Variable):
    """
    Filing status of the tax unit.
    """

    value_type = Enum
    possible_values = FilingStatus
    default_value = FilingStatus.SINGLE
"#;
        let record = extract(source, "filing_status").unwrap();
        assert_eq!(
            record.description.as_deref(),
            Some("Filing status of the tax unit.")
        );
        assert_eq!(record.enum_options, vec!["SINGLE", "JOINT"]);
        assert_eq!(record.default_value.as_deref(), Some("FilingStatus.SINGLE"));
    }

    #[test]
    fn test_module_lists_reach_every_formula() {
        let source = r#"
STATES = ["CA", "NY"]


class state_income_tax(Variable):
    def formula_2020(tax_unit, period, parameters):
        return add(tax_unit, period, [s.lower() + "_income_tax" for s in STATES])

    def formula_2023(tax_unit, period, parameters):
        return tax_unit("state_code", period)
"#;
        let record = extract(source, "state_income_tax").unwrap();
        assert_eq!(record.formula_count, 2);
        assert_eq!(
            record.adds.resolved(),
            ["ca_income_tax".to_string(), "ny_income_tax".to_string()]
        );
        assert!(record.formula_variables.contains("state_code"));
    }

    #[test]
    fn test_attribute_defined_for_is_ignored() {
        let source = r#"
class ca_eitc(Variable):
    defined_for = StateCode.CA
"#;
        let record = extract(source, "ca_eitc").unwrap();
        assert!(record.defined_for.is_empty());
    }

    #[test]
    fn test_class_named_like_identity_is_preferred() {
        let source = r#"
class helper_total(Variable):
    label = "Helper"


class snap(Variable):
    label = "SNAP"
"#;
        let record = extract(source, "snap").unwrap();
        assert_eq!(record.label.as_deref(), Some("SNAP"));
    }
}
