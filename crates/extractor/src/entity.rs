use serde::Serialize;

/// Scope-entity aliases that formulas call to read another variable.
///
/// `person("age", period)` and `tax_unit.spm_unit("snap", period)` are the shapes recognised;
/// anything else called with a string literal is not a variable read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeEntity {
    Person,
    TaxUnit,
    Household,
    Family,
    SpmUnit,
    MaritalUnit,
    BenUnit,
}

impl ScopeEntity {
    pub const ALL: [Self; 7] = [
        Self::Person,
        Self::TaxUnit,
        Self::Household,
        Self::Family,
        Self::SpmUnit,
        Self::MaritalUnit,
        Self::BenUnit,
    ];

    /// Map a formula argument name to its entity
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "person" => Some(Self::Person),
            "tax_unit" => Some(Self::TaxUnit),
            "household" => Some(Self::Household),
            "family" => Some(Self::Family),
            "spm_unit" => Some(Self::SpmUnit),
            "marital_unit" => Some(Self::MaritalUnit),
            "benunit" => Some(Self::BenUnit),
            _ => None,
        }
    }

    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::TaxUnit => "tax_unit",
            Self::Household => "household",
            Self::Family => "family",
            Self::SpmUnit => "spm_unit",
            Self::MaritalUnit => "marital_unit",
            Self::BenUnit => "benunit",
        }
    }
}

/// Projection that may sit between entities in a chained call (`tax_unit.members(...)`).
pub(crate) const MEMBER_PROJECTION: &str = "members";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_round_trip() {
        for entity in ScopeEntity::ALL {
            assert_eq!(ScopeEntity::from_alias(entity.alias()), Some(entity));
        }
    }

    #[test]
    fn unknown_alias_is_not_an_entity() {
        assert_eq!(ScopeEntity::from_alias("parameters"), None);
        assert_eq!(ScopeEntity::from_alias("Person"), None);
    }
}
