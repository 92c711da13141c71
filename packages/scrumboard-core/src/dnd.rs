/// Pointer drag state machine.
///
/// Pointer-down arms a pending drag; the drag only starts once the pointer
/// moved past a small threshold, so plain clicks never produce a drop.
/// Releasing over a different column yields a [`DropRequest`] for
/// [`Board::drop_story`](crate::board::Board::drop_story).
use serde::Serialize;

use crate::types::StoryId;

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequest {
    pub story_id: StoryId,
    pub source_column: String,
    pub target_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Pointer down on a story, not moved far enough yet
    Pending { start_x: i32, start_y: i32 },
    Dragging,
}

#[derive(Debug, Clone)]
pub struct DragSession {
    phase: Phase,
    story_id: Option<StoryId>,
    source_column: Option<String>,
    hover_column: Option<String>,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DragSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            story_id: None,
            source_column: None,
            hover_column: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == Phase::Dragging
    }

    pub fn dragging_story(&self) -> Option<StoryId> {
        if self.is_dragging() {
            self.story_id
        } else {
            None
        }
    }

    pub fn hover_column(&self) -> Option<&str> {
        self.hover_column.as_deref()
    }

    /// Arm a drag. Ignored while another gesture is in progress.
    pub fn pointer_down(&mut self, story_id: StoryId, column_id: &str, x: i32, y: i32) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.phase = Phase::Pending {
            start_x: x,
            start_y: y,
        };
        self.story_id = Some(story_id);
        self.source_column = Some(column_id.to_string());
        self.hover_column = None;
        true
    }

    /// Track pointer movement. Returns true when this move started the drag.
    pub fn pointer_move(&mut self, x: i32, y: i32) -> bool {
        if let Phase::Pending { start_x, start_y } = self.phase {
            let dx = x.abs_diff(start_x);
            let dy = y.abs_diff(start_y);
            if dx > DRAG_THRESHOLD_PX || dy > DRAG_THRESHOLD_PX {
                self.phase = Phase::Dragging;
                return true;
            }
        }
        false
    }

    /// Pointer entered a column (or left all columns with `None`).
    pub fn hover(&mut self, column_id: Option<&str>) {
        if self.is_dragging() {
            self.hover_column = column_id.map(str::to_string);
        }
    }

    /// Finish the gesture. Yields a drop only for a real drag released over
    /// a column other than the one it started in.
    pub fn pointer_up(&mut self) -> Option<DropRequest> {
        let was_dragging = self.is_dragging();
        let story_id = self.story_id.take();
        let source = self.source_column.take();
        let target = self.hover_column.take();
        self.phase = Phase::Idle;

        if !was_dragging {
            return None;
        }
        let (story_id, source_column, target_column) = (story_id?, source?, target?);
        if source_column == target_column {
            return None;
        }
        Some(DropRequest {
            story_id,
            source_column,
            target_column,
        })
    }

    pub fn cancel(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_is_not_a_drag() {
        let mut dnd = DragSession::new();
        dnd.pointer_down(1, "todo", 100, 100);
        assert!(!dnd.pointer_move(103, 98));
        dnd.hover(Some("done"));
        assert_eq!(dnd.pointer_up(), None);
    }

    #[test]
    fn test_extreme_coordinates_start_drag() {
        let mut dnd = DragSession::new();
        dnd.pointer_down(7, "todo", i32::MIN, 0);
        assert!(dnd.pointer_move(i32::MAX, 0));
        assert!(dnd.is_dragging());
    }

    #[test]
    fn test_drag_to_other_column() {
        let mut dnd = DragSession::new();
        dnd.pointer_down(42, "todo", 0, 0);
        assert!(dnd.pointer_move(0, 20));
        assert_eq!(dnd.dragging_story(), Some(42));
        dnd.hover(Some("custom_1"));

        let drop = dnd.pointer_up().unwrap();
        assert_eq!(
            drop,
            DropRequest {
                story_id: 42,
                source_column: "todo".to_string(),
                target_column: "custom_1".to_string(),
            }
        );
        assert!(!dnd.is_dragging());
    }

    #[test]
    fn test_release_over_source_or_nothing() {
        let mut dnd = DragSession::new();
        dnd.pointer_down(1, "todo", 0, 0);
        dnd.pointer_move(50, 0);
        dnd.hover(Some("todo"));
        assert_eq!(dnd.pointer_up(), None);

        dnd.pointer_down(1, "todo", 0, 0);
        dnd.pointer_move(50, 0);
        dnd.hover(Some("done"));
        dnd.hover(None);
        assert_eq!(dnd.pointer_up(), None);
    }

    #[test]
    fn test_second_gesture_ignored_while_dragging() {
        let mut dnd = DragSession::new();
        assert!(dnd.pointer_down(1, "todo", 0, 0));
        dnd.pointer_move(10, 10);
        assert!(!dnd.pointer_down(2, "review", 0, 0));
        assert_eq!(dnd.dragging_story(), Some(1));
    }

    #[test]
    fn test_cancel_resets() {
        let mut dnd = DragSession::new();
        dnd.pointer_down(1, "todo", 0, 0);
        dnd.pointer_move(10, 10);
        dnd.hover(Some("done"));
        dnd.cancel();
        assert!(!dnd.is_dragging());
        assert_eq!(dnd.hover_column(), None);
        assert_eq!(dnd.pointer_up(), None);
    }
}
