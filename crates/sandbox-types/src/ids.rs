//! Validated resource-name segments and fully qualified database names.
//!
//! Spanner addresses every database through a three-level hierarchy:
//! `projects/{project}/instances/{instance}/databases/{database}`. Each
//! segment has its own naming rules, so each gets its own newtype. A value
//! of [`ProjectId`], [`InstanceId`], or [`DatabaseId`] can only be obtained
//! through validation, which means a [`DatabaseIdentity`] always renders a
//! name the admin API will accept.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which level of the resource hierarchy a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// A Google Cloud project id.
    Project,
    /// A Spanner instance id.
    Instance,
    /// A Spanner database id.
    Database,
}

impl SegmentKind {
    /// Inclusive length bounds for this kind of segment.
    pub const fn length_bounds(self) -> (usize, usize) {
        match self {
            Self::Project => (6, 30),
            Self::Instance => (2, 64),
            Self::Database => (2, 30),
        }
    }

    /// Whether `_` may appear in the middle of a segment of this kind.
    const fn allows_underscore(self) -> bool {
        matches!(self, Self::Database)
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => f.write_str("project id"),
            Self::Instance => f.write_str("instance id"),
            Self::Database => f.write_str("database id"),
        }
    }
}

/// Errors produced when parsing identifiers and endpoints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The segment was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Which segment was being validated.
        kind: SegmentKind,
    },

    /// The segment is shorter or longer than allowed.
    #[error("{kind} must be {min}..={max} characters, got {len}")]
    Length {
        /// Which segment was being validated.
        kind: SegmentKind,
        /// Actual length in characters.
        len: usize,
        /// Minimum allowed length.
        min: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// The first character is not a lowercase ASCII letter.
    #[error("{kind} must start with a lowercase letter, found {found:?}")]
    InvalidStart {
        /// Which segment was being validated.
        kind: SegmentKind,
        /// The offending character.
        found: char,
    },

    /// The last character is not a lowercase ASCII letter or digit.
    #[error("{kind} must end with a lowercase letter or digit, found {found:?}")]
    InvalidEnd {
        /// Which segment was being validated.
        kind: SegmentKind,
        /// The offending character.
        found: char,
    },

    /// A character outside the allowed set appeared in the segment.
    #[error("{kind} contains invalid character {found:?}")]
    InvalidChar {
        /// Which segment was being validated.
        kind: SegmentKind,
        /// The offending character.
        found: char,
    },

    /// A fully qualified database name did not have the expected shape.
    #[error("invalid database name {0:?}, expected projects/{{p}}/instances/{{i}}/databases/{{d}}")]
    InvalidDatabaseName(String),

    /// An endpoint string could not be parsed as `host:port`.
    #[error("invalid endpoint {0:?}, expected host:port")]
    InvalidEndpoint(String),
}

/// Check `value` against the naming rules of `kind`.
fn validate_segment(kind: SegmentKind, value: &str) -> Result<(), IdError> {
    let Some(first) = value.chars().next() else {
        return Err(IdError::Empty { kind });
    };

    let (min, max) = kind.length_bounds();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(IdError::Length {
            kind,
            len,
            min,
            max,
        });
    }

    if !first.is_ascii_lowercase() {
        return Err(IdError::InvalidStart { kind, found: first });
    }

    if let Some(found) = value.chars().find(|&c| {
        !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !(c == '_' && kind.allows_underscore())
    }) {
        return Err(IdError::InvalidChar { kind, found });
    }

    let last = value.chars().last().unwrap_or(first);
    if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
        return Err(IdError::InvalidEnd { kind, found: last });
    }

    Ok(())
}

/// Generates a validated newtype wrapper around [`String`].
macro_rules! define_segment {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a segment.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                validate_segment($kind, &value)?;
                Ok(Self(value))
            }

            /// Borrow the segment text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_segment! {
    /// A Google Cloud project id, e.g. `sample-project`.
    ProjectId => SegmentKind::Project
}

define_segment! {
    /// A Spanner instance id, e.g. `sample-instance`.
    InstanceId => SegmentKind::Instance
}

define_segment! {
    /// A Spanner database id, e.g. `sample-database`.
    DatabaseId => SegmentKind::Database
}

/// Fully qualifies a logical database: project, instance, and database id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseIdentity {
    project: ProjectId,
    instance: InstanceId,
    database: DatabaseId,
}

impl DatabaseIdentity {
    /// Combine already validated segments.
    pub const fn new(project: ProjectId, instance: InstanceId, database: DatabaseId) -> Self {
        Self {
            project,
            instance,
            database,
        }
    }

    /// Validate three raw segments and combine them.
    pub fn parse(project: &str, instance: &str, database: &str) -> Result<Self, IdError> {
        Ok(Self::new(
            ProjectId::new(project)?,
            InstanceId::new(instance)?,
            DatabaseId::new(database)?,
        ))
    }

    /// The project segment.
    pub const fn project(&self) -> &ProjectId {
        &self.project
    }

    /// The instance segment.
    pub const fn instance(&self) -> &InstanceId {
        &self.instance
    }

    /// The database segment.
    pub const fn database(&self) -> &DatabaseId {
        &self.database
    }

    /// `projects/{p}`
    pub fn project_path(&self) -> String {
        format!("projects/{}", self.project)
    }

    /// `projects/{p}/instances/{i}`
    pub fn instance_path(&self) -> String {
        format!("projects/{}/instances/{}", self.project, self.instance)
    }

    /// `projects/{p}/instanceConfigs/{config}`
    pub fn instance_config_path(&self, config: &str) -> String {
        format!("projects/{}/instanceConfigs/{config}", self.project)
    }

    /// `projects/{p}/instances/{i}/databases/{d}`
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

impl fmt::Display for DatabaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.database_path())
    }
}

impl FromStr for DatabaseIdentity {
    type Err = IdError;

    /// Parse `projects/{p}/instances/{i}/databases/{d}`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdError::InvalidDatabaseName(s.to_owned());
        let mut parts = s.split('/');
        let (Some("projects"), Some(project), Some("instances"), Some(instance)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let (Some("databases"), Some(database), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Self::parse(project, instance, database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<DatabaseIdentity, IdError> {
        DatabaseIdentity::parse("sample-project", "sample-instance", "sample-database")
    }

    #[test]
    fn sample_identity_renders_resource_paths() {
        let identity = sample();
        assert!(identity.is_ok());
        let Ok(identity) = identity else { return };

        assert_eq!(identity.project_path(), "projects/sample-project");
        assert_eq!(
            identity.instance_path(),
            "projects/sample-project/instances/sample-instance"
        );
        assert_eq!(
            identity.database_path(),
            "projects/sample-project/instances/sample-instance/databases/sample-database"
        );
        assert_eq!(
            identity.instance_config_path("emulator-config"),
            "projects/sample-project/instanceConfigs/emulator-config"
        );
        assert_eq!(identity.to_string(), identity.database_path());
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert_eq!(
            InstanceId::new(""),
            Err(IdError::Empty {
                kind: SegmentKind::Instance
            })
        );
    }

    #[test]
    fn length_bounds_are_enforced() {
        assert!(matches!(
            ProjectId::new("short"),
            Err(IdError::Length { len: 5, min: 6, .. })
        ));
        assert!(DatabaseId::new("a".repeat(31)).is_err());
        assert!(DatabaseId::new("a".repeat(30)).is_ok());
        assert!(InstanceId::new("a".repeat(64)).is_ok());
    }

    #[test]
    fn character_rules_follow_segment_kind() {
        assert_eq!(
            InstanceId::new("9lives"),
            Err(IdError::InvalidStart {
                kind: SegmentKind::Instance,
                found: '9'
            })
        );
        assert_eq!(
            InstanceId::new("trailing-"),
            Err(IdError::InvalidEnd {
                kind: SegmentKind::Instance,
                found: '-'
            })
        );
        assert_eq!(
            InstanceId::new("Upper"),
            Err(IdError::InvalidStart {
                kind: SegmentKind::Instance,
                found: 'U'
            })
        );
        assert_eq!(
            InstanceId::new("has_underscore"),
            Err(IdError::InvalidChar {
                kind: SegmentKind::Instance,
                found: '_'
            })
        );
        // Underscores are only legal in database ids.
        assert!(DatabaseId::new("has_underscore").is_ok());
    }

    #[test]
    fn database_name_parses_back() {
        let parsed: Result<DatabaseIdentity, _> =
            "projects/sample-project/instances/sample-instance/databases/sample-database".parse();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn malformed_database_names_are_rejected() {
        for name in [
            "",
            "projects/sample-project",
            "projects/sample-project/instances/sample-instance",
            "projects/sample-project/instances/sample-instance/databases/sample-database/extra",
            "project/sample-project/instances/sample-instance/databases/sample-database",
        ] {
            assert!(
                matches!(
                    name.parse::<DatabaseIdentity>(),
                    Err(IdError::InvalidDatabaseName(_))
                ),
                "{name} should not parse"
            );
        }
    }

    #[test]
    fn serde_revalidates_on_deserialize() {
        let ok: Result<InstanceId, _> = serde_json::from_str("\"sample-instance\"");
        assert!(ok.is_ok());
        let bad: Result<InstanceId, _> = serde_json::from_str("\"Bad Name\"");
        assert!(bad.is_err());
    }
}
