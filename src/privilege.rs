use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability level of an identity. Ordering follows privilege: a later
/// variant holds every capability of an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    Unregistered,
    Student,
    TeachingAssistant,
    Instructor,
    Administrator,
    SuperAdministrator,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown privilege level '{0}'")]
pub struct UnknownPrivilege(pub String);

impl FromStr for Privilege {
    type Err = UnknownPrivilege;

    fn from_str(input: &str) -> Result<Privilege, Self::Err> {
        match input.to_lowercase().replace([' ', '-'], "_").as_str() {
            "unregistered" | "unregistered_user" => Ok(Privilege::Unregistered),
            "student" => Ok(Privilege::Student),
            "teaching_assistant" | "ta" => Ok(Privilege::TeachingAssistant),
            "instructor" => Ok(Privilege::Instructor),
            "administrator" | "admin" => Ok(Privilege::Administrator),
            "super_administrator" | "super_admin" => Ok(Privilege::SuperAdministrator),
            _ => Err(UnknownPrivilege(input.to_string())),
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl Privilege {
    /// Human-readable role title, also used to build anonymized names.
    pub fn title(&self) -> &'static str {
        match self {
            Privilege::Unregistered => "Unregistered user",
            Privilege::Student => "Student",
            Privilege::TeachingAssistant => "Teaching Assistant",
            Privilege::Instructor => "Instructor",
            Privilege::Administrator => "Administrator",
            Privilege::SuperAdministrator => "Super-Administrator",
        }
    }

    pub fn has_student_privileges(&self) -> bool {
        *self >= Privilege::Student
    }

    pub fn has_ta_privileges(&self) -> bool {
        *self >= Privilege::TeachingAssistant
    }

    /// Whether a caller at this level may take over a session at `target`.
    pub fn may_impersonate(&self, target: Privilege) -> bool {
        match self {
            Privilege::SuperAdministrator => true,
            caller if caller.has_ta_privileges() => target < *caller,
            _ => false,
        }
    }
}
