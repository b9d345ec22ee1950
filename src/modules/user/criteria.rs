use std::collections::{HashMap, HashSet};

use crate::api::error;
use crate::modules::user::model::{SearchCriterion, SearchWarning};

pub const PROFILE_FIELD_PREFIX: &str = "profile_field_";

/// Searchable columns of the account table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedField {
    Id,
    IdNumber,
    Username,
    Email,
    Auth,
    LastName,
    FirstName,
}

impl FixedField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(FixedField::Id),
            "idnumber" => Some(FixedField::IdNumber),
            "username" => Some(FixedField::Username),
            "email" => Some(FixedField::Email),
            "auth" => Some(FixedField::Auth),
            "lastname" => Some(FixedField::LastName),
            "firstname" => Some(FixedField::FirstName),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            FixedField::Id => "id",
            FixedField::IdNumber => "idnumber",
            FixedField::Username => "username",
            FixedField::Email => "email",
            FixedField::Auth => "auth",
            FixedField::LastName => "lastname",
            FixedField::FirstName => "firstname",
        }
    }

    /// Column name in the account table. Identical to the search key, but
    /// kept separate so the SQL layer never interpolates caller input.
    pub fn column(self) -> &'static str {
        self.key()
    }

    /// Exact-match fields; the rest compile to case-insensitive patterns.
    fn matches_exact(self) -> bool {
        matches!(
            self,
            FixedField::Id | FixedField::IdNumber | FixedField::Auth | FixedField::Username
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IdEquals(i64),
    Equals { field: FixedField, value: String },
    /// Case-insensitive LIKE; the caller may embed % and _ wildcards.
    Pattern { field: FixedField, value: String },
    /// Equality on a dynamic profile field, one extra join per occurrence.
    CustomField { field_id: i64, value: String },
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub predicates: Vec<Predicate>,
}

#[derive(Debug)]
pub struct CriteriaOutcome {
    pub filter: UserFilter,
    /// Fixed fields that were searched, for the post-query visibility check.
    pub searched_fixed: Vec<FixedField>,
    pub warnings: Vec<SearchWarning>,
}

/// Translate caller criteria into a typed filter.
///
/// Duplicate keys abort the whole call. Unknown keys are dropped with a
/// warning so the operation stays extendable without breaking clients.
/// `profile_fields` maps registered profile-field short names to their ids.
pub fn build_filter(
    criteria: &[SearchCriterion],
    profile_fields: &HashMap<String, i64>,
) -> Result<CriteriaOutcome, error::SystemError> {
    let mut used_keys = HashSet::new();
    let mut predicates = Vec::new();
    let mut searched_fixed = Vec::new();
    let mut warnings = Vec::new();

    for criterion in criteria {
        if !used_keys.insert(criterion.key.as_str()) {
            return Err(error::SystemError::DuplicateCriteriaKey(criterion.key.clone().into()));
        }

        if let Some(field) = FixedField::from_key(&criterion.key) {
            let predicate = match field {
                FixedField::Id => {
                    let id = criterion.value.trim().parse::<i64>().map_err(|_| {
                        error::SystemError::InvalidCriterionValue(
                            format!("The value '{}' is not a valid id", criterion.value).into(),
                        )
                    })?;
                    Predicate::IdEquals(id)
                }
                FixedField::Auth => {
                    Predicate::Equals { field, value: clean_auth(&criterion.value) }
                }
                _ if field.matches_exact() => {
                    Predicate::Equals { field, value: criterion.value.clone() }
                }
                _ => Predicate::Pattern { field, value: criterion.value.clone() },
            };
            predicates.push(predicate);
            searched_fixed.push(field);
        } else if let Some(shortname) = criterion.key.strip_prefix(PROFILE_FIELD_PREFIX) {
            match profile_fields.get(shortname) {
                Some(&field_id) => {
                    predicates
                        .push(Predicate::CustomField { field_id, value: criterion.value.clone() });
                }
                None => warnings.push(SearchWarning::invalid_field(&criterion.key)),
            }
        } else {
            warnings.push(SearchWarning::invalid_field(&criterion.key));
        }
    }

    Ok(CriteriaOutcome { filter: UserFilter { predicates }, searched_fixed, warnings })
}

/// Auth method names are restricted to `[a-z0-9_-]`; anything else is
/// stripped before the value reaches the query.
fn clean_auth(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}
