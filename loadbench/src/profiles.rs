//! Connection Profiles
//!
//! Named connections from `[[connections]]`, owned by whoever builds them.
//! Passwords are never stored here: each profile names the environment
//! variable that holds its password, and the value is read on lookup.

use loadbench_core::{ConnectionInfo, DatabaseType, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building or querying the profile store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// No profile with this name
    #[error("connection profile not found: {0}")]
    NotFound(String),

    /// Two profiles share a name
    #[error("duplicate connection profile: {0}")]
    DuplicateName(String),

    /// More than one profile sets `default = true`
    #[error("more than one default connection: {first} and {second}")]
    MultipleDefaults {
        /// First default profile
        first: String,
        /// Second default profile
        second: String,
    },

    /// Several profiles and none is the default
    #[error("no default connection configured")]
    NoDefault,

    /// The profile's password variable is unset
    #[error("password variable {var} for connection {profile} is not set")]
    MissingPassword {
        /// Profile name
        profile: String,
        /// Environment variable name
        var: String,
    },
}

/// One named connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Profile name
    pub name: String,
    /// Database engine
    pub database: DatabaseType,
    /// Server host
    pub host: String,
    /// Engine default when absent
    #[serde(default)]
    pub port: Option<u16>,
    /// Login user
    pub user: String,
    /// Schema or database to benchmark
    pub database_name: String,
    /// Environment variable holding the password
    #[serde(default)]
    pub password_env: Option<String>,
    /// Used when no profile is named
    #[serde(default)]
    pub default: bool,
}

impl ConnectionProfile {
    /// Resolve into a connection, reading the password from the process environment
    pub fn resolve(&self) -> Result<ConnectionInfo, ProfileError> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve with a custom variable lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ConnectionInfo, ProfileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut info = ConnectionInfo::new(
            self.database,
            self.host.clone(),
            self.user.clone(),
            self.database_name.clone(),
        )
        .with_name(self.name.clone());

        if let Some(port) = self.port {
            info = info.with_port(port);
        }

        if let Some(var) = &self.password_env {
            let password = lookup(var).ok_or_else(|| ProfileError::MissingPassword {
                profile: self.name.clone(),
                var: var.clone(),
            })?;
            info = info.with_password(Secret::new(password));
        }

        Ok(info)
    }
}

/// Explicitly constructed store of connection profiles
#[derive(Debug, Clone, Default)]
pub struct ConnectionProfiles {
    profiles: Vec<ConnectionProfile>,
    default: Option<usize>,
}

impl ConnectionProfiles {
    /// Build the store, rejecting duplicate names and competing defaults
    pub fn new(profiles: Vec<ConnectionProfile>) -> Result<Self, ProfileError> {
        let mut default: Option<usize> = None;
        for (i, profile) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ProfileError::DuplicateName(profile.name.clone()));
            }
            if profile.default {
                if let Some(first) = default {
                    return Err(ProfileError::MultipleDefaults {
                        first: profiles[first].name.clone(),
                        second: profile.name.clone(),
                    });
                }
                default = Some(i);
            }
        }
        Ok(Self { profiles, default })
    }

    /// Profile by name
    pub fn get(&self, name: &str) -> Option<&ConnectionProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The profile flagged `default`, or the only profile if there is exactly one
    pub fn default_profile(&self) -> Option<&ConnectionProfile> {
        match self.default {
            Some(i) => self.profiles.get(i),
            None if self.profiles.len() == 1 => self.profiles.first(),
            None => None,
        }
    }

    /// Make `name` the default
    pub fn set_default(&mut self, name: &str) -> Result<(), ProfileError> {
        let idx = self
            .profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;
        for (i, profile) in self.profiles.iter_mut().enumerate() {
            profile.default = i == idx;
        }
        self.default = Some(idx);
        Ok(())
    }

    /// Resolved connection for `name`
    pub fn connection(&self, name: &str) -> Result<ConnectionInfo, ProfileError> {
        self.get(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))?
            .resolve()
    }

    /// Resolved default connection
    pub fn default_connection(&self) -> Result<ConnectionInfo, ProfileError> {
        self.default_profile().ok_or(ProfileError::NoDefault)?.resolve()
    }

    /// Profile names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// No profiles configured
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, default: bool) -> ConnectionProfile {
        ConnectionProfile {
            name: name.to_string(),
            database: DatabaseType::MySql,
            host: "127.0.0.1".to_string(),
            port: None,
            user: "sbtest".to_string(),
            database_name: "sbtest".to_string(),
            password_env: None,
            default,
        }
    }

    #[test]
    fn test_resolve_reads_password_variable() {
        let mut p = profile("primary", true);
        p.password_env = Some("PRIMARY_PW".to_string());
        p.port = Some(3307);

        let info = p
            .resolve_with(|var| (var == "PRIMARY_PW").then(|| "s3cret".to_string()))
            .unwrap();
        assert_eq!(info.name.as_deref(), Some("primary"));
        assert_eq!(info.port, 3307);
        assert_eq!(info.password.as_ref().map(|s| s.expose()), Some("s3cret"));
        assert!(!format!("{:?}", info).contains("s3cret"));
    }

    #[test]
    fn test_resolve_missing_password() {
        let mut p = profile("primary", false);
        p.password_env = Some("UNSET_PW".to_string());
        let err = p.resolve_with(|_| None).unwrap_err();
        assert_eq!(
            err,
            ProfileError::MissingPassword {
                profile: "primary".to_string(),
                var: "UNSET_PW".to_string()
            }
        );
    }

    #[test]
    fn test_default_port_and_no_password() {
        let info = profile("a", false).resolve_with(|_| None).unwrap();
        assert_eq!(info.port, 3306);
        assert!(info.password.is_none());
    }

    #[test]
    fn test_store_rejects_duplicates_and_defaults() {
        let dup = ConnectionProfiles::new(vec![profile("a", false), profile("a", false)]);
        assert_eq!(dup.unwrap_err(), ProfileError::DuplicateName("a".to_string()));

        let two = ConnectionProfiles::new(vec![profile("a", true), profile("b", true)]);
        assert!(matches!(two, Err(ProfileError::MultipleDefaults { .. })));
    }

    #[test]
    fn test_default_selection() {
        let single = ConnectionProfiles::new(vec![profile("only", false)]).unwrap();
        assert_eq!(single.default_profile().unwrap().name, "only");

        let mut many = ConnectionProfiles::new(vec![profile("a", false), profile("b", false)]).unwrap();
        assert!(many.default_profile().is_none());
        assert_eq!(many.default_connection().unwrap_err(), ProfileError::NoDefault);

        many.set_default("b").unwrap();
        assert_eq!(many.default_profile().unwrap().name, "b");
        assert!(many.get("b").unwrap().default);
        assert!(!many.get("a").unwrap().default);
        assert_eq!(many.default_connection().unwrap().name.as_deref(), Some("b"));

        assert_eq!(
            many.set_default("c").unwrap_err(),
            ProfileError::NotFound("c".to_string())
        );
        assert_eq!(many.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
