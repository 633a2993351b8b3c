use crate::types::{sanitize_hours, RoleType};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DAILY_HOURS: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    /// Free-text role label shown next to the name.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub role_type: RoleType,
    /// Percentage of time dedicated to the sprint, 0..=100.
    #[serde(default = "default_allocation")]
    pub allocation: f64,
    /// Planned absence, in hours.
    #[serde(default)]
    pub days_off: f64,
    #[serde(default = "default_daily_hours")]
    pub daily_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

fn default_allocation() -> f64 {
    100.0
}

fn default_daily_hours() -> f64 {
    DEFAULT_DAILY_HOURS
}

impl TeamMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role_type: RoleType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: String::new(),
            role_type,
            allocation: default_allocation(),
            days_off: 0.0,
            daily_hours: DEFAULT_DAILY_HOURS,
            avatar: None,
        }
    }

    /// Clamp numeric fields into the ranges the calculator assumes.
    pub fn normalize(&mut self) {
        self.allocation = sanitize_hours(self.allocation).min(100.0);
        self.days_off = sanitize_hours(self.days_off);
        self.daily_hours = sanitize_hours(self.daily_hours);
    }
}

/// Partial update for a member; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_type: Option<RoleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_off: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_hours: Option<f64>,
}

impl MemberPatch {
    pub fn apply_to(&self, member: &mut TeamMember) {
        if let Some(name) = &self.name {
            member.name = name.clone();
        }
        if let Some(role) = &self.role {
            member.role = role.clone();
        }
        if let Some(rt) = self.role_type {
            member.role_type = rt;
        }
        if let Some(a) = self.allocation {
            member.allocation = a;
        }
        if let Some(d) = self.days_off {
            member.days_off = d;
        }
        if let Some(h) = self.daily_hours {
            member.daily_hours = h;
        }
        member.normalize();
    }

    /// The fields this patch sets, with the values `member` holds after
    /// [`MemberPatch::apply_to`] normalized them.
    pub fn resolved(&self, member: &TeamMember) -> Self {
        Self {
            name: self.name.as_ref().map(|_| member.name.clone()),
            role: self.role.as_ref().map(|_| member.role.clone()),
            role_type: self.role_type.map(|_| member.role_type),
            allocation: self.allocation.map(|_| member.allocation),
            days_off: self.days_off.map(|_| member.days_off),
            daily_hours: self.daily_hours.map(|_| member.daily_hours),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &MemberPatch::default()
    }
}
