/// Change events broadcast to connected clients.
use serde::{Deserialize, Serialize};

use crate::types::{BoardId, StoryId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoardChangeEvent {
    StoryCreated { board_id: BoardId, story_id: StoryId },
    StoryUpdated { board_id: BoardId, story_id: StoryId },
    StoryDeleted { board_id: BoardId, story_id: StoryId },
    ColumnsChanged { board_id: BoardId },
}

impl BoardChangeEvent {
    pub fn board_id(&self) -> BoardId {
        match self {
            BoardChangeEvent::StoryCreated { board_id, .. }
            | BoardChangeEvent::StoryUpdated { board_id, .. }
            | BoardChangeEvent::StoryDeleted { board_id, .. }
            | BoardChangeEvent::ColumnsChanged { board_id } => *board_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json() {
        let event = BoardChangeEvent::StoryUpdated {
            board_id: 3,
            story_id: 42,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StoryUpdated");
        assert_eq!(json["board_id"], 3);
        assert_eq!(event.board_id(), 3);
    }
}
