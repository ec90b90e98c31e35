use crate::entity::{ScopeEntity, MEMBER_PROJECTION};
use crate::syntax::{
    is_dotted_path, is_identity, positional_arguments, keyword_argument, resolve_list,
    string_literal, text, unwrap_parens, ListAliases,
};
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

/// Root call that opens a parameter tree: `parameters(period)`.
const PARAMETERS_CALL: &str = "parameters";

/// Methods that evaluate a parameter node rather than descend into it.
const TRAILING_METHODS: &[&str] = &["calc", "marginal_rates"];

const VARIABLE_READERS: &[&str] = &["variable", "get_variable"];
const PARAMETER_READERS: &[&str] = &["parameter", "get_parameter"];
const ADD_COMBINATORS: &[&str] = &["add", "aggr"];
const SUBTRACT_COMBINATOR: &str = "subtract";

/// Keyword spellings of the combinators' list argument.
const COMBINATOR_LIST_KEYWORDS: &[&str] = &["variables", "vars"];

/// One parameter reference found in a formula body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParameterUse {
    /// Last segment of `path`.
    pub key: String,
    /// Full dotted path.
    pub path: String,
    /// Path of the node the final attribute was read from, when there is one.
    pub group: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct FormulaFacts {
    pub variables: IndexSet<String>,
    pub adds: Vec<String>,
    pub subtracts: Vec<String>,
    pub parameters: Vec<ParameterUse>,
}

/// Collects dependency facts from the formula methods of one variable class.
///
/// Aliases (`p = parameters(period).gov.irs`) and list names are scoped to a single formula;
/// module-level lists are visible in every formula.
pub(crate) struct FormulaWalker<'s> {
    source: &'s str,
    module_lists: &'s ListAliases,
    lists: ListAliases,
    aliases: HashMap<String, String>,
    alias_definitions: HashSet<usize>,
    facts: FormulaFacts,
}

impl<'s> FormulaWalker<'s> {
    pub(crate) fn new(source: &'s str, module_lists: &'s ListAliases) -> Self {
        Self {
            source,
            module_lists,
            lists: ListAliases::new(),
            aliases: HashMap::new(),
            alias_definitions: HashSet::new(),
            facts: FormulaFacts::default(),
        }
    }

    pub(crate) fn walk_formula(&mut self, function: Node) {
        let Some(body) = function.child_by_field_name("body") else {
            return;
        };

        self.lists = self.module_lists.clone();
        self.aliases.clear();
        self.alias_definitions.clear();

        self.collect_aliases(body);
        self.visit(body);
    }

    pub(crate) fn finish(self) -> FormulaFacts {
        self.facts
    }

    /// Pass 1: local list names and parameter aliases, in document order so that an alias
    /// may be defined in terms of an earlier one.
    fn collect_aliases(&mut self, node: Node) {
        if node.kind() == "assignment" {
            if let (Some(left), Some(right)) = (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                if left.kind() == "identifier" {
                    let name = text(left, self.source).to_string();
                    if let Some(items) = resolve_list(right, self.source, &self.lists) {
                        self.lists.insert(name, items);
                    } else if let Some(path) = self.alias_target(right) {
                        self.alias_definitions.insert(right.id());
                        self.aliases.insert(name, path);
                    }
                }
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_aliases(child);
        }
    }

    fn alias_target(&self, node: Node) -> Option<String> {
        let (base, segments) = self.parameter_chain(node)?;
        let path = join_path(&base, &segments);
        (!path.is_empty() || is_parameters_call(unwrap_parens(node), self.source)).then_some(path)
    }

    /// Pass 2: variable reads, combinators and parameter usages.
    ///
    /// An alias binding is not itself a parameter use, but its subscript keys still are
    /// expressions that may read variables.
    fn visit(&mut self, node: Node) {
        let binding = self.alias_definitions.contains(&node.id());

        match node.kind() {
            "call" => self.visit_call(node),
            "attribute" | "subscript" if !binding && is_chain_top(node) => {
                if let Some((base, segments)) = self.parameter_chain(node) {
                    self.record_parameter(&base, segments);
                }
            }
            "identifier" if !binding && self.is_bare_alias_use(node) => {
                if let Some(base) = self.aliases.get(text(node, self.source)).cloned() {
                    self.record_parameter(&base, Vec::new());
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    fn visit_call(&mut self, call: Node) {
        let Some(function) = call.child_by_field_name("function") else {
            return;
        };
        let function = unwrap_parens(function);

        match function.kind() {
            "identifier" => {
                let name = text(function, self.source);
                if ScopeEntity::from_alias(name).is_some() {
                    self.record_variable_argument(call);
                } else if ADD_COMBINATORS.contains(&name) {
                    let items = self.combinator_list(call);
                    extend_unique(&mut self.facts.adds, items);
                } else if name == SUBTRACT_COMBINATOR {
                    let items = self.combinator_list(call);
                    extend_unique(&mut self.facts.subtracts, items);
                }
            }
            "attribute" => {
                let Some(method) = function.child_by_field_name("attribute") else {
                    return;
                };
                let method = text(method, self.source);
                if VARIABLE_READERS.contains(&method) || self.is_entity_chain(function) {
                    self.record_variable_argument(call);
                } else if PARAMETER_READERS.contains(&method) {
                    let path = positional_arguments(call)
                        .first()
                        .and_then(|arg| string_literal(*arg, self.source))
                        .filter(|path| is_dotted_path(path));
                    if let Some(path) = path {
                        self.record_parameter(&path, Vec::new());
                    }
                }
            }
            _ => {}
        }
    }

    /// `tax_unit.spm_unit`, `tax_unit.members`, `household.members.tax_unit`, ...
    fn is_entity_chain(&self, function: Node) -> bool {
        let Some(dotted) = crate::syntax::dotted_name(function, self.source) else {
            return false;
        };
        let mut parts = dotted.split('.');
        let Some(first) = parts.next() else {
            return false;
        };
        if ScopeEntity::from_alias(first).is_none() {
            return false;
        }
        let mut rest = parts.peekable();
        rest.peek().is_some()
            && rest.all(|part| part == MEMBER_PROJECTION || ScopeEntity::from_alias(part).is_some())
    }

    fn record_variable_argument(&mut self, call: Node) {
        let name = positional_arguments(call)
            .first()
            .and_then(|arg| string_literal(*arg, self.source));
        if let Some(name) = name.filter(|name| is_identity(name)) {
            self.facts.variables.insert(name);
        }
    }

    fn combinator_list(&self, call: Node) -> Vec<String> {
        let argument = positional_arguments(call).get(2).copied().or_else(|| {
            COMBINATOR_LIST_KEYWORDS
                .iter()
                .find_map(|keyword| keyword_argument(call, keyword, self.source))
        });
        argument
            .and_then(|arg| resolve_list(arg, self.source, &self.lists))
            .unwrap_or_default()
            .into_iter()
            .filter(|name| is_identity(name))
            .collect()
    }

    /// Flatten an attribute/subscript chain rooted at `parameters(...)` or a known alias.
    ///
    /// Returns the root's base path and the static segments below it; the chain stops at the
    /// first subscript whose key is not a literal.
    fn parameter_chain(&self, node: Node) -> Option<(String, Vec<String>)> {
        let mut segments: Vec<Option<String>> = Vec::new();
        let mut current = unwrap_parens(node);

        let base = loop {
            match current.kind() {
                "attribute" => {
                    let attribute = current.child_by_field_name("attribute")?;
                    segments.push(Some(text(attribute, self.source).to_string()));
                    current = unwrap_parens(current.child_by_field_name("object")?);
                }
                "subscript" => {
                    segments.push(self.literal_key(current));
                    current = unwrap_parens(current.child_by_field_name("value")?);
                }
                "identifier" => break self.aliases.get(text(current, self.source))?.clone(),
                "call" if is_parameters_call(current, self.source) => break String::new(),
                _ => return None,
            }
        };

        segments.reverse();
        let segments = segments.into_iter().map_while(|segment| segment).collect();
        Some((base, segments))
    }

    fn literal_key(&self, subscript: Node) -> Option<String> {
        let key = unwrap_parens(subscript.child_by_field_name("subscript")?);
        match key.kind() {
            "integer" => Some(text(key, self.source).to_string()),
            _ => string_literal(key, self.source).filter(|key| !key.is_empty()),
        }
    }

    fn record_parameter(&mut self, base: &str, mut segments: Vec<String>) {
        while segments
            .last()
            .is_some_and(|segment| TRAILING_METHODS.contains(&segment.as_str()))
        {
            segments.pop();
        }

        let path = join_path(base, &segments);
        if path.is_empty() {
            return;
        }

        let (group, key) = match path.rsplit_once('.') {
            Some((parent, key)) if !segments.is_empty() => (Some(parent.to_string()), key),
            Some((_, key)) => (None, key),
            None => (None, path.as_str()),
        };
        let key = key.to_string();

        self.facts.parameters.push(ParameterUse { key, path, group });
    }

    fn is_bare_alias_use(&self, node: Node) -> bool {
        if !self.aliases.contains_key(text(node, self.source)) {
            return false;
        }
        let Some(parent) = node.parent() else {
            return true;
        };
        match parent.kind() {
            "attribute" | "keyword_argument" => false,
            "subscript" => parent.child_by_field_name("value") != Some(node),
            "assignment" | "augmented_assignment" => {
                parent.child_by_field_name("left") != Some(node)
            }
            _ => true,
        }
    }
}

fn is_parameters_call(node: Node, source: &str) -> bool {
    node.kind() == "call"
        && node
            .child_by_field_name("function")
            .is_some_and(|function| {
                function.kind() == "identifier" && text(function, source) == PARAMETERS_CALL
            })
}

/// True unless `node` is the object of an enclosing attribute or subscript.
fn is_chain_top(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    match parent.kind() {
        "attribute" => parent.child_by_field_name("object") != Some(node),
        "subscript" => parent.child_by_field_name("value") != Some(node),
        "parenthesized_expression" => parent
            .parent()
            .map_or(true, |outer| !matches!(outer.kind(), "attribute" | "subscript")),
        _ => true,
    }
}

fn join_path(base: &str, segments: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(segments.len() + 1);
    if !base.is_empty() {
        parts.push(base);
    }
    parts.extend(segments.iter().map(String::as_str));
    parts.join(".")
}

fn extend_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
