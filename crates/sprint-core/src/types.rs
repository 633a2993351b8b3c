use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// RoleType
// ---------------------------------------------------------------------------

/// Capacity pool a team member belongs to.
///
/// Parsing is lenient: anything that is not recognisably Dev or QA lands in
/// `Other`, so an unexpected role label never drops a member's hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RoleType {
    Dev,
    #[allow(clippy::upper_case_acronyms)]
    QA,
    #[default]
    Other,
}

impl RoleType {
    pub fn all() -> &'static [RoleType] {
        &[RoleType::Dev, RoleType::QA, RoleType::Other]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleType::Dev => "Dev",
            RoleType::QA => "QA",
            RoleType::Other => "Other",
        }
    }

    /// Fold any label into a role bucket.
    pub fn from_label(s: &str) -> RoleType {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "developer" | "development" => RoleType::Dev,
            "qa" | "test" | "tester" => RoleType::QA,
            _ => RoleType::Other,
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleType {
    type Err = crate::error::PlanError;

    /// Strict parse for user input; use [`RoleType::from_label`] for stored data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(RoleType::Dev),
            "qa" => Ok(RoleType::QA),
            "other" => Ok(RoleType::Other),
            _ => Err(crate::error::PlanError::InvalidValue {
                kind: "role type",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for RoleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RoleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RoleType::from_label(&s))
    }
}

// ---------------------------------------------------------------------------
// TaskCategory
// ---------------------------------------------------------------------------

/// Which pool a sub-task draws from. Unknown categories fall back to
/// `Implementation`, so uncategorised work is always counted as Dev load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskCategory {
    #[default]
    Implementation,
    Test,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Implementation => "Implementation",
            TaskCategory::Test => "Test",
        }
    }

    pub fn from_label(s: &str) -> TaskCategory {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" | "qa" | "testing" => TaskCategory::Test,
            _ => TaskCategory::Implementation,
        }
    }

    /// Label used for sub-task rows in the tabular export.
    pub fn export_label(self) -> &'static str {
        match self {
            TaskCategory::Implementation => "Sub-Imp",
            TaskCategory::Test => "Sub-Test",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskCategory {
    type Err = crate::error::PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "implementation" | "impl" | "dev" => Ok(TaskCategory::Implementation),
            "test" | "qa" => Ok(TaskCategory::Test),
            _ => Err(crate::error::PlanError::InvalidValue {
                kind: "task category",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for TaskCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.as_deref().map(TaskCategory::from_label).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// StoryType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoryType {
    #[default]
    #[serde(rename = "User Story")]
    UserStory,
    Bug,
    Task,
}

impl StoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryType::UserStory => "User Story",
            StoryType::Bug => "Bug",
            StoryType::Task => "Task",
        }
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoryType {
    type Err = crate::error::PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user story" | "user-story" | "story" => Ok(StoryType::UserStory),
            "bug" => Ok(StoryType::Bug),
            "task" => Ok(StoryType::Task),
            _ => Err(crate::error::PlanError::InvalidValue {
                kind: "story type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Hours
// ---------------------------------------------------------------------------

/// Coerce an hour value so it is safe to feed the calculators: NaN,
/// infinities and negatives become zero.
pub fn sanitize_hours(h: f64) -> f64 {
    if h.is_finite() && h > 0.0 {
        h
    } else {
        0.0
    }
}

/// Parse free-text hours, treating anything malformed as zero.
pub fn parse_hours(s: &str) -> f64 {
    s.trim().parse::<f64>().map(sanitize_hours).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn unknown_role_folds_into_other() {
        assert_eq!(RoleType::from_label("Designer"), RoleType::Other);
        assert_eq!(RoleType::from_label("qa"), RoleType::QA);
        let parsed: RoleType = serde_json::from_str("\"PO\"").unwrap();
        assert_eq!(parsed, RoleType::Other);
    }

    #[test]
    fn strict_role_parse_rejects_garbage() {
        assert_eq!(RoleType::from_str("dev").unwrap(), RoleType::Dev);
        assert!(RoleType::from_str("wizard").is_err());
    }

    #[test]
    fn missing_or_unknown_category_is_implementation() {
        let c: TaskCategory = serde_json::from_str("null").unwrap();
        assert_eq!(c, TaskCategory::Implementation);
        let c: TaskCategory = serde_json::from_str("\"Design\"").unwrap();
        assert_eq!(c, TaskCategory::Implementation);
        let c: TaskCategory = serde_json::from_str("\"Test\"").unwrap();
        assert_eq!(c, TaskCategory::Test);
    }

    #[test]
    fn story_type_serializes_with_space() {
        let yaml = serde_yaml::to_string(&StoryType::UserStory).unwrap();
        assert!(yaml.contains("User Story"));
        assert_eq!(StoryType::from_str("bug").unwrap(), StoryType::Bug);
    }

    #[test]
    fn hours_coercion() {
        assert_eq!(parse_hours("4.5"), 4.5);
        assert_eq!(parse_hours("abc"), 0.0);
        assert_eq!(parse_hours("-3"), 0.0);
        assert_eq!(sanitize_hours(f64::NAN), 0.0);
    }
}
