use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type StoryId = i64;
pub type BoardId = i64;

/// Identifiers above this value were minted on the client and have no
/// backend record yet. Server-assigned ids stay well below it.
pub const LOCAL_STORY_ID_THRESHOLD: StoryId = 1_000_000_000_000;

pub fn is_local_story_id(id: StoryId) -> bool {
    id > LOCAL_STORY_ID_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl StoryStatus {
    /// All statuses in board order.
    pub const ALL: [StoryStatus; 4] = [
        StoryStatus::Todo,
        StoryStatus::InProgress,
        StoryStatus::Review,
        StoryStatus::Done,
    ];

    /// Status given to stories created without one.
    pub fn first() -> Self {
        Self::ALL[0]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Todo => "todo",
            StoryStatus::InProgress => "in_progress",
            StoryStatus::Review => "review",
            StoryStatus::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(StoryStatus::Todo),
            "in_progress" => Some(StoryStatus::InProgress),
            "review" => Some(StoryStatus::Review),
            "done" => Some(StoryStatus::Done),
            _ => None,
        }
    }
}

impl Default for StoryStatus {
    fn default() -> Self {
        Self::first()
    }
}

/// Fibonacci-like priority levels, serialized as the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Lowest = 1,
    Low = 2,
    Medium = 3,
    High = 5,
    Critical = 8,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Lowest,
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn level(&self) -> u8 {
        *self as u8
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Lowest),
            2 => Ok(Priority::Low),
            3 => Ok(Priority::Medium),
            5 => Ok(Priority::High),
            8 => Ok(Priority::Critical),
            other => Err(format!("invalid priority level {}", other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.level()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: StoryStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_benefit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    pub board_id: BoardId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Build a client-only story. Its id is the current epoch milliseconds,
    /// which always lands above [`LOCAL_STORY_ID_THRESHOLD`].
    pub fn local(board_id: BoardId, fields: NewStory) -> Self {
        let now = Utc::now();
        let id = now.timestamp_millis().max(LOCAL_STORY_ID_THRESHOLD + 1);
        fields.into_story(id, board_id, now)
    }

    pub fn is_local(&self) -> bool {
        is_local_story_id(self.id)
    }

    /// Carry everything but the id over into a creation request.
    pub fn to_new_story(&self, status: StoryStatus) -> NewStory {
        NewStory {
            title: self.title.clone(),
            description: self.description.clone(),
            status: Some(status),
            priority: Some(self.priority),
            story_points: self.story_points,
            user_type: self.user_type.clone(),
            user_action: self.user_action.clone(),
            user_benefit: self.user_benefit.clone(),
            acceptance_criteria: self.acceptance_criteria.clone(),
            assignee_id: self.assignee_id,
        }
    }
}

/// Fields accepted when creating a story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStory {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_benefit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
}

impl NewStory {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn into_story(self, id: StoryId, board_id: BoardId, now: DateTime<Utc>) -> Story {
        Story {
            id,
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or_else(StoryStatus::first),
            priority: self.priority.unwrap_or_default(),
            story_points: self.story_points,
            user_type: self.user_type,
            user_action: self.user_action,
            user_benefit: self.user_benefit,
            acceptance_criteria: self.acceptance_criteria,
            assignee_id: self.assignee_id,
            board_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_benefit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
}

impl StoryPatch {
    pub fn apply(&self, story: &mut Story) {
        if let Some(title) = &self.title {
            story.title = title.clone();
        }
        if let Some(description) = &self.description {
            story.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            story.status = status;
        }
        if let Some(priority) = self.priority {
            story.priority = priority;
        }
        if let Some(points) = self.story_points {
            story.story_points = Some(points);
        }
        if let Some(v) = &self.user_type {
            story.user_type = Some(v.clone());
        }
        if let Some(v) = &self.user_action {
            story.user_action = Some(v.clone());
        }
        if let Some(v) = &self.user_benefit {
            story.user_benefit = Some(v.clone());
        }
        if let Some(v) = &self.acceptance_criteria {
            story.acceptance_criteria = Some(v.clone());
        }
        if let Some(v) = self.assignee_id {
            story.assignee_id = Some(v);
        }
        story.updated_at = Utc::now();
    }
}
