//! Delivery Forecaster.
//!
//! Greedy list scheduling over two worker pools. Each story contributes one
//! Dev segment (sum of its Implementation estimates) and one QA segment (sum
//! of its Test estimates). Stories are taken strictly in input order and
//! each segment goes to the lane that frees up first; a story's QA segment
//! never starts before its own Dev segment ends.
//!
//! This is a forecast heuristic, not an optimal makespan scheduler. Reordering
//! the input changes the schedule.

use crate::member::TeamMember;
use crate::story::Story;
use crate::types::RoleType;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SegmentKind {
    Dev,
    #[serde(rename = "QA")]
    Qa,
}

impl SegmentKind {
    pub fn label(self) -> &'static str {
        match self {
            SegmentKind::Dev => "Development",
            SegmentKind::Qa => "QA / Testing",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SegmentKind::Dev => "Dev",
            SegmentKind::Qa => "QA",
        })
    }
}

/// One unit of schedulable work: the Dev and QA hours of a single story.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub story_id: String,
    pub title: String,
    pub dev_hours: f64,
    pub qa_hours: f64,
}

impl Job {
    pub fn from_story(story: &Story) -> Self {
        Self {
            story_id: story.id.clone(),
            title: story.title.clone(),
            dev_hours: story.dev_hours(),
            qa_hours: story.qa_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub story_id: String,
    pub title: String,
    pub kind: SegmentKind,
    pub start: f64,
    pub duration: f64,
    /// Index of the worker within its own pool.
    pub lane: usize,
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub dev_lanes: usize,
    pub qa_lanes: usize,
    pub segments: Vec<Segment>,
    /// Hour at which the last lane becomes free.
    pub horizon: f64,
}

impl Forecast {
    /// Row on a combined chart: Dev lanes first, then QA lanes.
    pub fn display_row(&self, segment: &Segment) -> usize {
        match segment.kind {
            SegmentKind::Dev => segment.lane,
            SegmentKind::Qa => self.dev_lanes + segment.lane,
        }
    }

    pub fn segments_for<'a>(&'a self, story_id: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments.iter().filter(move |s| s.story_id == story_id)
    }

    /// End hour of a story's last segment, if it was scheduled at all.
    pub fn finish_of(&self, story_id: &str) -> Option<f64> {
        self.segments_for(story_id).map(Segment::end).reduce(f64::max)
    }
}

// ---------------------------------------------------------------------------
// Lanes
// ---------------------------------------------------------------------------

struct LanePool {
    free_at: Vec<f64>,
}

impl LanePool {
    fn new(workers: usize) -> Self {
        Self {
            free_at: vec![0.0; workers.max(1)],
        }
    }

    /// Lane with the smallest free time; the lowest index wins ties.
    fn earliest(&self) -> (usize, f64) {
        let mut best = (0, self.free_at[0]);
        for (i, &t) in self.free_at.iter().enumerate().skip(1) {
            if t < best.1 {
                best = (i, t);
            }
        }
        best
    }

    fn occupy(&mut self, lane: usize, until: f64) {
        self.free_at[lane] = until;
    }

    fn latest(&self) -> f64 {
        self.free_at.iter().copied().fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Schedule `jobs` in order onto `dev_workers` Dev lanes and `qa_workers` QA
/// lanes. Worker counts below one are raised to one.
pub fn schedule(jobs: &[Job], dev_workers: usize, qa_workers: usize) -> Forecast {
    let mut dev = LanePool::new(dev_workers);
    let mut qa = LanePool::new(qa_workers);
    let mut segments = Vec::new();

    for job in jobs {
        let mut dev_end = 0.0;

        if job.dev_hours > 0.0 {
            let (lane, start) = dev.earliest();
            dev_end = start + job.dev_hours;
            dev.occupy(lane, dev_end);
            segments.push(Segment {
                story_id: job.story_id.clone(),
                title: job.title.clone(),
                kind: SegmentKind::Dev,
                start,
                duration: job.dev_hours,
                lane,
            });
        }

        if job.qa_hours > 0.0 {
            let (lane, free_at) = qa.earliest();
            let start = f64::max(free_at, dev_end);
            qa.occupy(lane, start + job.qa_hours);
            segments.push(Segment {
                story_id: job.story_id.clone(),
                title: job.title.clone(),
                kind: SegmentKind::Qa,
                start,
                duration: job.qa_hours,
                lane,
            });
        }
    }

    Forecast {
        dev_lanes: dev.free_at.len(),
        qa_lanes: qa.free_at.len(),
        horizon: dev.latest().max(qa.latest()),
        segments,
    }
}

/// Jobs for every in-sprint story, in backlog order.
pub fn sprint_jobs(stories: &[Story]) -> Vec<Job> {
    crate::story::in_sprint(stories).map(Job::from_story).collect()
}

/// Forecast the current sprint with one lane per Dev and per QA member.
pub fn forecast_sprint(stories: &[Story], members: &[TeamMember]) -> Forecast {
    let count = |role: RoleType| members.iter().filter(|m| m.role_type == role).count();
    schedule(
        &sprint_jobs(stories),
        count(RoleType::Dev),
        count(RoleType::QA),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StoryType, TaskCategory};

    fn job(id: &str, dev: f64, qa: f64) -> Job {
        Job {
            story_id: id.to_string(),
            title: id.to_uppercase(),
            dev_hours: dev,
            qa_hours: qa,
        }
    }

    #[test]
    fn two_dev_lanes_fill_in_order() {
        let f = schedule(&[job("s1", 10.0, 0.0), job("s2", 6.0, 0.0)], 2, 1);
        assert_eq!(f.segments.len(), 2);
        assert_eq!((f.segments[0].lane, f.segments[0].start, f.segments[0].end()), (0, 0.0, 10.0));
        assert_eq!((f.segments[1].lane, f.segments[1].start, f.segments[1].end()), (1, 0.0, 6.0));
        assert_eq!(f.horizon, 10.0);
    }

    #[test]
    fn qa_waits_for_its_own_dev() {
        let f = schedule(&[job("s1", 8.0, 4.0)], 1, 1);
        let qa = f.segments.iter().find(|s| s.kind == SegmentKind::Qa).unwrap();
        assert_eq!(qa.start, 8.0);
        assert_eq!(qa.end(), 12.0);
        assert_eq!(f.horizon, 12.0);
    }

    #[test]
    fn qa_only_story_starts_immediately() {
        let f = schedule(&[job("s1", 0.0, 3.0)], 1, 1);
        assert_eq!(f.segments.len(), 1);
        assert_eq!(f.segments[0].kind, SegmentKind::Qa);
        assert_eq!(f.segments[0].start, 0.0);
    }

    #[test]
    fn empty_story_occupies_nothing() {
        let f = schedule(&[job("s1", 0.0, 0.0)], 3, 2);
        assert!(f.segments.is_empty());
        assert_eq!(f.horizon, 0.0);
    }

    #[test]
    fn zero_workers_raised_to_one() {
        let f = schedule(&[job("s1", 2.0, 1.0), job("s2", 2.0, 1.0)], 0, 0);
        assert_eq!((f.dev_lanes, f.qa_lanes), (1, 1));
        assert_eq!(f.segments[2].start, 2.0);
        assert_eq!(f.horizon, 5.0);
    }

    #[test]
    fn tie_goes_to_lowest_lane() {
        let f = schedule(
            &[job("a", 4.0, 0.0), job("b", 4.0, 0.0), job("c", 1.0, 0.0)],
            2,
            1,
        );
        assert_eq!(f.segments[2].lane, 0);
        assert_eq!(f.segments[2].start, 4.0);
    }

    #[test]
    fn input_order_changes_schedule() {
        let a = schedule(&[job("x", 8.0, 2.0), job("y", 1.0, 2.0)], 1, 1);
        let b = schedule(&[job("y", 1.0, 2.0), job("x", 8.0, 2.0)], 1, 1);
        assert_ne!(a.segments, b.segments);
        assert_eq!(a.horizon, 12.0);
        assert_eq!(b.horizon, 11.0);
    }

    fn mixed_jobs() -> Vec<Job> {
        (0..12)
            .map(|i| job(&format!("s{i}"), ((i * 7) % 5) as f64 * 1.5, ((i * 3) % 4) as f64))
            .collect()
    }

    #[test]
    fn deterministic_across_calls() {
        let jobs = mixed_jobs();
        let first = schedule(&jobs, 3, 2);
        for _ in 0..5 {
            assert_eq!(schedule(&jobs, 3, 2), first);
        }
    }

    #[test]
    fn precedence_and_no_lane_overlap() {
        let f = schedule(&mixed_jobs(), 3, 2);

        for qa in f.segments.iter().filter(|s| s.kind == SegmentKind::Qa) {
            if let Some(dev) = f
                .segments_for(&qa.story_id)
                .find(|s| s.kind == SegmentKind::Dev)
            {
                assert!(qa.start >= dev.end(), "QA before Dev for {}", qa.story_id);
            }
        }

        for a in &f.segments {
            for b in &f.segments {
                if std::ptr::eq(a, b) || a.kind != b.kind || a.lane != b.lane {
                    continue;
                }
                assert!(
                    a.end() <= b.start || b.end() <= a.start,
                    "overlap on {:?} lane {}",
                    a.kind,
                    a.lane
                );
            }
        }
    }

    #[test]
    fn forecast_sprint_counts_lanes_from_roster() {
        let mut s = Story::new("s1", "Login", StoryType::UserStory)
            .with_sub_task("api", TaskCategory::Implementation, 8.0)
            .with_sub_task("check", TaskCategory::Test, 4.0);
        s.in_sprint = true;
        let parked = Story::new("s2", "Later", StoryType::UserStory).with_sub_task(
            "x",
            TaskCategory::Implementation,
            50.0,
        );
        let members = vec![
            TeamMember::new("a", "A", RoleType::Dev),
            TeamMember::new("b", "B", RoleType::Dev),
            TeamMember::new("c", "C", RoleType::Other),
        ];
        let f = forecast_sprint(&[s, parked], &members);
        assert_eq!((f.dev_lanes, f.qa_lanes), (2, 1));
        assert_eq!(f.segments.len(), 2);
        assert_eq!(f.finish_of("s1"), Some(12.0));
        assert_eq!(f.finish_of("s2"), None);
        let qa = &f.segments[1];
        assert_eq!(f.display_row(qa), 2);
    }
}
