//! Capacity Calculator and Sprint Load Aggregator.
//!
//! Both are pure functions of their inputs and safe to call on every render.

use crate::member::TeamMember;
use crate::settings::SprintSettings;
use crate::story::Story;
use crate::types::{RoleType, TaskCategory};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Member capacity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemberCapacity {
    pub total_capacity: f64,
    pub rituals_deduction: f64,
    pub available_capacity: f64,
}

/// Net hours a member can contribute to the sprint.
///
/// Ritual overhead is deducted in full regardless of allocation: a member at
/// 10% loses the same ritual hours as one at 100%.
pub fn member_capacity(member: &TeamMember, settings: &SprintSettings) -> MemberCapacity {
    let total_capacity =
        settings.sprint_duration_days * member.daily_hours * (member.allocation / 100.0);
    let rituals_deduction = settings.ritual_hours();
    let available_capacity = (total_capacity - member.days_off - rituals_deduction).max(0.0);
    MemberCapacity {
        total_capacity,
        rituals_deduction,
        available_capacity,
    }
}

// ---------------------------------------------------------------------------
// Role buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RoleBuckets {
    #[serde(rename = "Dev")]
    pub dev: f64,
    #[serde(rename = "QA")]
    pub qa: f64,
    #[serde(rename = "Other")]
    pub other: f64,
}

impl RoleBuckets {
    pub fn get(&self, role: RoleType) -> f64 {
        match role {
            RoleType::Dev => self.dev,
            RoleType::QA => self.qa,
            RoleType::Other => self.other,
        }
    }

    fn add(&mut self, role: RoleType, hours: f64) {
        match role {
            RoleType::Dev => self.dev += hours,
            RoleType::QA => self.qa += hours,
            RoleType::Other => self.other += hours,
        }
    }

    /// Capacity that can absorb sprint work (Dev + QA).
    pub fn delivery(&self) -> f64 {
        self.dev + self.qa
    }
}

/// Sum of available capacity per role. Unrecognised role labels were already
/// folded into `Other` when the member was parsed.
pub fn team_capacity_by_role(members: &[TeamMember], settings: &SprintSettings) -> RoleBuckets {
    members.iter().fold(RoleBuckets::default(), |mut acc, m| {
        acc.add(m.role_type, member_capacity(m, settings).available_capacity);
        acc
    })
}

// ---------------------------------------------------------------------------
// Sprint load
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SprintLoad {
    #[serde(rename = "Dev")]
    pub dev: f64,
    #[serde(rename = "QA")]
    pub qa: f64,
}

impl SprintLoad {
    pub fn total(&self) -> f64 {
        self.dev + self.qa
    }
}

/// Committed hours per pool across every story flagged `in_sprint`.
pub fn sprint_load_by_role(stories: &[Story]) -> SprintLoad {
    let mut load = SprintLoad::default();
    for task in crate::story::in_sprint(stories).flat_map(|s| &s.sub_tasks) {
        match task.category {
            TaskCategory::Test => load.qa += task.estimate,
            // Uncategorised work was parsed as Implementation: it counts as Dev.
            TaskCategory::Implementation => load.dev += task.estimate,
        }
    }
    load
}

/// Committed / capacity as a rounded percentage. `None` when there is no
/// capacity to measure against.
pub fn utilization_percent(committed: f64, capacity: f64) -> Option<i64> {
    if capacity > 0.0 && capacity.is_finite() {
        Some((committed / capacity * 100.0).round() as i64)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoryType;

    /// Rituals sum to 8.25h.
    fn scenario_settings() -> SprintSettings {
        SprintSettings {
            sprint_duration_days: 10.0,
            daily_scrum_duration: 0.25,
            planning_duration: 2.0,
            review_duration: 2.0,
            retro_duration: 2.0,
            refinement_duration: 2.0,
            other_rituals_duration: 0.0,
        }
    }

    #[test]
    fn full_time_member_capacity() {
        let m = TeamMember::new("m1", "Ana", RoleType::Dev);
        let c = member_capacity(&m, &scenario_settings());
        assert_eq!(c.total_capacity, 80.0);
        assert_eq!(c.rituals_deduction, 8.25);
        assert_eq!(c.available_capacity, 71.75);
    }

    #[test]
    fn available_capacity_is_clamped_at_zero() {
        let mut m = TeamMember::new("m1", "Ana", RoleType::Dev);
        m.allocation = 10.0;
        m.days_off = 40.0;
        let c = member_capacity(&m, &scenario_settings());
        assert_eq!(c.total_capacity, 8.0);
        assert_eq!(c.available_capacity, 0.0);
    }

    #[test]
    fn rituals_not_scaled_by_allocation() {
        let mut m = TeamMember::new("m1", "Ana", RoleType::QA);
        m.allocation = 50.0;
        let c = member_capacity(&m, &scenario_settings());
        assert_eq!(c.rituals_deduction, 8.25);
        assert_eq!(c.available_capacity, 40.0 - 8.25);
    }

    #[test]
    fn buckets_group_by_role() {
        let settings = scenario_settings();
        let members = vec![
            TeamMember::new("a", "A", RoleType::Dev),
            TeamMember::new("b", "B", RoleType::Dev),
            TeamMember::new("c", "C", RoleType::QA),
            TeamMember::new("d", "D", RoleType::from_label("Scrum Master")),
        ];
        let b = team_capacity_by_role(&members, &settings);
        assert_eq!(b.dev, 143.5);
        assert_eq!(b.qa, 71.75);
        assert_eq!(b.other, 71.75);
        assert_eq!(b.get(RoleType::Other), 71.75);
        assert_eq!(b.delivery(), 215.25);
    }

    #[test]
    fn load_ignores_stories_outside_sprint() {
        let mut a = Story::new("a", "A", StoryType::UserStory)
            .with_sub_task("impl", TaskCategory::Implementation, 5.0)
            .with_sub_task("test", TaskCategory::Test, 3.0);
        a.in_sprint = true;
        let b = Story::new("b", "B", StoryType::UserStory).with_sub_task(
            "test",
            TaskCategory::Test,
            100.0,
        );
        let load = sprint_load_by_role(&[a, b]);
        assert_eq!(load, SprintLoad { dev: 5.0, qa: 3.0 });
    }

    #[test]
    fn toggling_out_of_sprint_removes_exactly_its_hours() {
        let mut stories: Vec<Story> = (0..3)
            .map(|i| {
                let mut s = Story::new(format!("s{i}"), "S", StoryType::Bug)
                    .with_sub_task("x", TaskCategory::Implementation, 2.0 + i as f64)
                    .with_sub_task("y", TaskCategory::Test, 1.0);
                s.in_sprint = true;
                s
            })
            .collect();
        let before = sprint_load_by_role(&stories).total();
        let removed = stories[1].total_hours();
        stories[1].in_sprint = false;
        let after = sprint_load_by_role(&stories).total();
        assert_eq!(before - after, removed);
    }

    #[test]
    fn percent_handles_zero_capacity() {
        assert_eq!(utilization_percent(120.0, 100.0), Some(120));
        assert_eq!(utilization_percent(50.0, 0.0), None);
        assert_eq!(utilization_percent(0.0, 3.0), Some(0));
    }
}
