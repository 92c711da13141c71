/// Dashboard statistics over a board's stories.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Priority, Story, StoryStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub by_status: BTreeMap<StoryStatus, usize>,
    /// Keyed by priority level
    pub by_priority: BTreeMap<u8, usize>,
    pub total_points: u64,
    pub completed_points: u64,
    pub unestimated: usize,
    /// Share of stories in `done`, 0-100
    pub completion_percent: f64,
}

impl DashboardStats {
    pub fn compute(stories: &[Story]) -> Self {
        let mut by_status: BTreeMap<StoryStatus, usize> =
            StoryStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_priority: BTreeMap<u8, usize> =
            Priority::ALL.iter().map(|p| (p.level(), 0)).collect();
        let mut total_points: u64 = 0;
        let mut completed_points: u64 = 0;
        let mut unestimated = 0;

        for story in stories {
            *by_status.entry(story.status).or_default() += 1;
            *by_priority.entry(story.priority.level()).or_default() += 1;
            match story.story_points {
                Some(points) => {
                    let points = u64::from(points);
                    total_points += points;
                    if story.status == StoryStatus::Done {
                        completed_points += points;
                    }
                }
                None => unestimated += 1,
            }
        }

        let done = by_status.get(&StoryStatus::Done).copied().unwrap_or(0);
        let completion_percent = if stories.is_empty() {
            0.0
        } else {
            (done as f64 / stories.len() as f64) * 100.0
        };

        Self {
            total: stories.len(),
            by_status,
            by_priority,
            total_points,
            completed_points,
            unestimated,
            completion_percent,
        }
    }
}
