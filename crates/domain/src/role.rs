//! Role names, the provider-to-role mapping and login-time reconciliation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use dashgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Unique name of a role in the user directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(NonEmptyString);

impl RoleName {
    /// Creates a validated role name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        NonEmptyString::new(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation("role name must not be empty".to_owned()))
    }

    /// Returns the role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Maps identity provider role keys to local role names.
///
/// The keys double as the set of managed role names: a role whose name is a
/// key is owned by the identity provider and is re-derived on every login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMapping {
    entries: BTreeMap<RoleName, BTreeSet<RoleName>>,
}

impl RoleMapping {
    /// Creates a mapping from `(provider key, local role names)` pairs.
    pub fn new<K, V, R>(entries: impl IntoIterator<Item = (K, V)>) -> AppResult<Self>
    where
        K: Into<String>,
        V: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let mut mapped = BTreeMap::new();
        for (key, roles) in entries {
            let key = RoleName::new(key)?;
            let roles = roles
                .into_iter()
                .map(RoleName::new)
                .collect::<AppResult<BTreeSet<_>>>()?;
            mapped.entry(key).or_insert_with(BTreeSet::new).extend(roles);
        }

        Ok(Self { entries: mapped })
    }

    /// Parses a mapping from a JSON object such as `{"User": ["Gamma", "Alpha"]}`.
    pub fn from_json(value: &str) -> AppResult<Self> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(value)
            .map_err(|error| AppError::Validation(format!("invalid role mapping: {error}")))?;
        Self::new(raw)
    }

    /// Returns whether no provider key is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the role names that login reconciliation owns.
    #[must_use]
    pub fn managed_role_names(&self) -> BTreeSet<RoleName> {
        self.entries.keys().cloned().collect()
    }

    /// Returns whether the role name is managed by the identity provider.
    #[must_use]
    pub fn is_managed(&self, role: &RoleName) -> bool {
        self.entries.contains_key(role)
    }

    /// Resolves provider role keys to the union of their mapped role names.
    ///
    /// Unknown keys map to nothing.
    pub fn roles_for_keys<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> BTreeSet<RoleName> {
        keys.into_iter()
            .filter_map(|key| RoleName::new(key).ok())
            .filter_map(|key| self.entries.get(&key))
            .flatten()
            .cloned()
            .collect()
    }

    /// Iterates over the mapping entries ordered by provider key.
    pub fn iter(&self) -> impl Iterator<Item = (&RoleName, &BTreeSet<RoleName>)> {
        self.entries.iter()
    }
}

/// Reconciles a user's roles against the roles asserted by the identity provider.
///
/// Managed roles the provider no longer asserts are removed, asserted roles are
/// added and every unmanaged role is kept.
#[must_use]
pub fn reconcile_roles(
    current: &BTreeSet<RoleName>,
    provider: &BTreeSet<RoleName>,
    mapping: &RoleMapping,
) -> BTreeSet<RoleName> {
    current
        .iter()
        .filter(|role| !mapping.is_managed(role) || provider.contains(*role))
        .chain(provider.iter())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::{RoleMapping, RoleName, reconcile_roles};

    fn roles(names: &[&str]) -> BTreeSet<RoleName> {
        names
            .iter()
            .filter_map(|name| RoleName::new(*name).ok())
            .collect()
    }

    fn role(name: &str) -> RoleName {
        match RoleName::new(name) {
            Ok(role) => role,
            Err(error) => panic!("invalid test role '{name}': {error}"),
        }
    }

    fn deployment_mapping() -> RoleMapping {
        RoleMapping::new([
            ("User", vec!["Gamma", "Alpha"]),
            ("Admin", vec!["Admin"]),
            ("Gamma", vec!["Gamma"]),
            ("Partner", vec!["Partner"]),
        ])
        .unwrap_or_default()
    }

    #[test]
    fn role_name_rejects_blank_values() {
        assert!(RoleName::new("  ").is_err());
        assert_eq!(
            RoleName::new(" Admin ").ok().map(|role| role.to_string()),
            Some("Admin".to_owned())
        );
    }

    #[test]
    fn managed_role_names_are_mapping_keys() {
        let mapping = deployment_mapping();

        assert_eq!(
            mapping.managed_role_names(),
            roles(&["Admin", "Gamma", "Partner", "User"])
        );
        assert!(mapping.is_managed(&role("Partner")));
        assert!(!mapping.is_managed(&role("Alpha")));
    }

    #[test]
    fn roles_for_keys_unions_mapped_names_and_skips_unknown_keys() {
        let mapping = deployment_mapping();

        let resolved = mapping.roles_for_keys(["User", "Gamma", "Unknown", ""]);
        assert_eq!(resolved, roles(&["Alpha", "Gamma"]));
    }

    #[test]
    fn mapping_parses_from_json() {
        let mapping = RoleMapping::from_json(r#"{"User": ["Gamma", "Alpha"], "Admin": ["Admin"]}"#);
        let Ok(mapping) = mapping else {
            panic!("mapping should parse");
        };

        assert_eq!(mapping.roles_for_keys(["Admin"]), roles(&["Admin"]));
        assert!(RoleMapping::from_json(r#"{"User": "Gamma"}"#).is_err());
        assert!(RoleMapping::from_json(r#"{"": ["Gamma"]}"#).is_err());
    }

    #[test]
    fn reconcile_drops_unasserted_managed_roles_and_keeps_unmanaged_ones() {
        let mapping = deployment_mapping();
        let current = roles(&["Admin", "Alpha", "Custom"]);
        let provider = roles(&["Gamma", "Partner"]);

        let reconciled = reconcile_roles(&current, &provider, &mapping);
        assert_eq!(reconciled, roles(&["Alpha", "Custom", "Gamma", "Partner"]));
    }

    #[test]
    fn reconcile_with_no_provider_roles_keeps_only_unmanaged_roles() {
        let mapping = deployment_mapping();
        let current = roles(&["Admin", "Gamma", "Custom"]);

        let reconciled = reconcile_roles(&current, &BTreeSet::new(), &mapping);
        assert_eq!(reconciled, roles(&["Custom"]));
    }

    fn role_set(pool: &'static [&'static str]) -> impl Strategy<Value = BTreeSet<RoleName>> {
        proptest::sample::subsequence(pool, 0..=pool.len()).prop_map(|names| roles(&names))
    }

    const MANAGED: &[&str] = &["Admin", "Gamma", "Partner", "User"];
    const UNMANAGED: &[&str] = &["Alpha", "Custom", "sql_lab"];

    proptest! {
        #[test]
        fn reconcile_result_is_unmanaged_plus_provider_roles(
            managed in role_set(MANAGED),
            unmanaged in role_set(UNMANAGED),
            provider in role_set(MANAGED),
        ) {
            let mapping = deployment_mapping();
            let current: BTreeSet<RoleName> = managed.union(&unmanaged).cloned().collect();

            let reconciled = reconcile_roles(&current, &provider, &mapping);
            let expected: BTreeSet<RoleName> = unmanaged.union(&provider).cloned().collect();

            prop_assert_eq!(reconciled, expected);
        }
    }
}
