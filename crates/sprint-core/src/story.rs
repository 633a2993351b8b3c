use crate::types::{sanitize_hours, StoryType, TaskCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SubTask
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub story_id: String,
    pub title: String,
    /// Hours, never negative once inside the store.
    #[serde(default)]
    pub estimate: f64,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub completed: bool,
}

impl SubTask {
    pub fn new(
        id: impl Into<String>,
        story_id: impl Into<String>,
        title: impl Into<String>,
        category: TaskCategory,
        estimate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            story_id: story_id.into(),
            title: title.into(),
            estimate: sanitize_hours(estimate),
            category,
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubTaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl SubTaskPatch {
    pub fn estimate(hours: f64) -> Self {
        Self {
            estimate: Some(hours),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, task: &mut SubTask) {
        if let Some(t) = &self.title {
            task.title = t.clone();
        }
        if let Some(e) = self.estimate {
            task.estimate = sanitize_hours(e);
        }
        if let Some(c) = self.category {
            task.category = c;
        }
        if let Some(done) = self.completed {
            task.completed = done;
        }
    }

    /// The fields this patch sets, with the values stored on `task`.
    pub fn resolved(&self, task: &SubTask) -> Self {
        Self {
            title: self.title.as_ref().map(|_| task.title.clone()),
            estimate: self.estimate.map(|_| task.estimate),
            category: self.category.map(|_| task.category),
            completed: self.completed.map(|_| task.completed),
        }
    }
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub story_type: StoryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    #[serde(default)]
    pub in_sprint: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
}

impl Story {
    pub fn new(id: impl Into<String>, title: impl Into<String>, story_type: StoryType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            story_type,
            points: None,
            in_sprint: false,
            created_at: Utc::now(),
            sub_tasks: Vec::new(),
        }
    }

    pub fn with_sub_task(mut self, title: &str, category: TaskCategory, estimate: f64) -> Self {
        let id = format!("{}-{}", self.id, self.sub_tasks.len() + 1);
        self.sub_tasks
            .push(SubTask::new(id, self.id.clone(), title, category, estimate));
        self
    }

    pub fn hours_for(&self, category: TaskCategory) -> f64 {
        self.sub_tasks
            .iter()
            .filter(|t| t.category == category)
            .map(|t| t.estimate)
            .sum()
    }

    pub fn dev_hours(&self) -> f64 {
        self.hours_for(TaskCategory::Implementation)
    }

    pub fn qa_hours(&self) -> f64 {
        self.hours_for(TaskCategory::Test)
    }

    pub fn total_hours(&self) -> f64 {
        self.sub_tasks.iter().map(|t| t.estimate).sum()
    }

    /// Hours the story counts for in the planning report. Tasks are
    /// bookkeeping items and count zero; their sub-tasks still list their own
    /// estimates.
    pub fn committed_hours(&self) -> f64 {
        match self.story_type {
            StoryType::Task => 0.0,
            _ => self.total_hours(),
        }
    }

    /// Coerce points and every sub-task estimate to non-negative hours.
    pub fn normalize(&mut self) {
        self.points = self.points.map(sanitize_hours);
        for t in &mut self.sub_tasks {
            t.estimate = sanitize_hours(t.estimate);
        }
    }

    pub fn sub_task(&self, id: &str) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub story_type: Option<StoryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
}

impl StoryPatch {
    pub fn apply_to(&self, story: &mut Story) {
        if let Some(t) = &self.title {
            story.title = t.clone();
        }
        if let Some(st) = self.story_type {
            story.story_type = st;
        }
        if let Some(p) = self.points {
            story.points = Some(sanitize_hours(p));
        }
    }

    pub fn resolved(&self, story: &Story) -> Self {
        Self {
            title: self.title.as_ref().map(|_| story.title.clone()),
            story_type: self.story_type.map(|_| story.story_type),
            points: self.points.and(story.points),
        }
    }
}

/// Stories currently flagged as part of the sprint, in backlog order.
pub fn in_sprint(stories: &[Story]) -> impl Iterator<Item = &Story> {
    stories.iter().filter(|s| s.in_sprint)
}

/// Human-readable summary: "3 stories in sprint, 5 in backlog, 42h committed"
pub fn summarize(stories: &[Story]) -> String {
    let sprint: Vec<&Story> = in_sprint(stories).collect();
    let committed: f64 = sprint.iter().map(|s| s.total_hours()).sum();
    format!(
        "{} stories in sprint, {} in backlog, {}h committed",
        sprint.len(),
        stories.len() - sprint.len(),
        committed
    )
}
