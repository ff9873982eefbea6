//! Normalized identity records produced from identity provider claims.

use serde::{Deserialize, Serialize};

/// Identity of a principal as reported by an external identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Full display name claim.
    pub name: String,
    /// Email claim, empty when the provider did not send one.
    pub email: String,
    /// Stable subject identifier at the provider.
    pub external_id: String,
    /// Preferred username claim.
    pub username: String,
    /// Given name, possibly derived from the full name.
    pub first_name: String,
    /// Family name, possibly derived from the full name.
    pub last_name: String,
    /// Provider role keys, resolved through the role mapping.
    pub role_keys: Vec<String>,
}

impl IdentityRecord {
    /// Returns the directory login name, the trimmed username.
    ///
    /// `None` when the provider sent an empty username. The email is not a
    /// substitute: the provider always reports a username field.
    #[must_use]
    pub fn login_name(&self) -> Option<&str> {
        Some(self.username.trim()).filter(|value| !value.is_empty())
    }
}

/// Given and family name of a person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    /// Given name.
    pub first: String,
    /// Family name.
    pub last: String,
}

impl PersonName {
    /// Resolves first and last name from explicit claims or a full name.
    ///
    /// Explicit given/family names are used as-is when either is present.
    /// Otherwise the full name is split on whitespace: the first token is the
    /// first name and the remaining tokens, joined by one space, the last name.
    #[must_use]
    pub fn resolve(given_name: &str, family_name: &str, full_name: &str) -> Self {
        if !given_name.is_empty() || !family_name.is_empty() || full_name.is_empty() {
            return Self {
                first: given_name.to_owned(),
                last: family_name.to_owned(),
            };
        }

        split_full_name(full_name)
    }
}

/// Splits a full name into first name and the rest.
#[must_use]
pub fn split_full_name(full_name: &str) -> PersonName {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_owned();
    let last = parts.collect::<Vec<_>>().join(" ");

    PersonName { first, last }
}

#[cfg(test)]
mod tests {
    use super::{IdentityRecord, PersonName, split_full_name};

    fn name(first: &str, last: &str) -> PersonName {
        PersonName {
            first: first.to_owned(),
            last: last.to_owned(),
        }
    }

    #[test]
    fn split_single_token_is_first_name_only() {
        assert_eq!(split_full_name("Jane"), name("Jane", ""));
    }

    #[test]
    fn split_two_tokens() {
        assert_eq!(split_full_name("Jane Doe"), name("Jane", "Doe"));
    }

    #[test]
    fn split_joins_remaining_tokens_with_single_space() {
        assert_eq!(split_full_name("Jane Q Doe"), name("Jane", "Q Doe"));
        assert_eq!(split_full_name("  Jane   Q \t Doe "), name("Jane", "Q Doe"));
    }

    #[test]
    fn split_blank_name_yields_empty_parts() {
        assert_eq!(split_full_name("   "), name("", ""));
    }

    #[test]
    fn explicit_names_skip_splitting() {
        assert_eq!(PersonName::resolve("Janet", "Smith", "Jane Q Doe"), name("Janet", "Smith"));
        assert_eq!(PersonName::resolve("", "Smith", "Jane Q Doe"), name("", "Smith"));
        assert_eq!(PersonName::resolve("Janet", "Smith", ""), name("Janet", "Smith"));
    }

    #[test]
    fn missing_names_are_derived_from_full_name() {
        assert_eq!(PersonName::resolve("", "", "Jane Q Doe"), name("Jane", "Q Doe"));
        assert_eq!(PersonName::resolve("", "", ""), name("", ""));
    }

    #[test]
    fn login_name_is_the_trimmed_username() {
        let mut identity = IdentityRecord {
            username: " jdoe@contoso.com ".to_owned(),
            email: "jane@contoso.com".to_owned(),
            ..IdentityRecord::default()
        };
        assert_eq!(identity.login_name(), Some("jdoe@contoso.com"));

        identity.username.clear();
        assert_eq!(identity.login_name(), None);
    }
}
