/// Column title editing.
///
/// Drafts are held per column id until committed or canceled. Only custom
/// columns can be edited.
use std::collections::HashMap;

use crate::board::Board;
use crate::columns::is_custom_column_id;
use crate::error::BoardError;
use crate::service::StoryService;

#[derive(Debug, Default)]
pub struct TitleEditor {
    /// column_id -> pending title
    drafts: HashMap<String, String>,
}

impl TitleEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing, seeding the draft with the current title.
    pub fn begin(&mut self, column_id: &str, current_title: &str) -> Result<(), BoardError> {
        if !is_custom_column_id(column_id) {
            return Err(BoardError::StandardColumnReadOnly(column_id.to_string()));
        }
        self.drafts
            .insert(column_id.to_string(), current_title.to_string());
        Ok(())
    }

    /// Replace the draft. Returns false when the column is not being edited.
    pub fn set_draft(&mut self, column_id: &str, title: &str) -> bool {
        match self.drafts.get_mut(column_id) {
            Some(draft) => {
                *draft = title.to_string();
                true
            }
            None => false,
        }
    }

    pub fn draft(&self, column_id: &str) -> Option<&str> {
        self.drafts.get(column_id).map(String::as_str)
    }

    pub fn is_editing(&self, column_id: &str) -> bool {
        self.drafts.contains_key(column_id)
    }

    /// Write the draft into the persisted column list. The draft stays
    /// pending if the write is rejected. Returns the committed title, or
    /// `None` when there was nothing to commit.
    pub fn commit<S: StoryService>(
        &mut self,
        column_id: &str,
        board: &Board<S>,
    ) -> Result<Option<String>, BoardError> {
        let Some(draft) = self.drafts.get(column_id) else {
            return Ok(None);
        };
        board.rename_column(column_id, draft)?;
        let title = draft.trim().to_string();
        self.drafts.remove(column_id);
        Ok(Some(title))
    }

    /// Discard the draft without touching the column.
    pub fn cancel(&mut self, column_id: &str) -> bool {
        self.drafts.remove(column_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryStoryService;
    use crate::storage::memory::MemoryStore;
    use std::sync::Arc;

    fn board() -> Board<InMemoryStoryService> {
        Board::new(
            1,
            Arc::new(InMemoryStoryService::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    #[test]
    fn test_standard_column_not_editable() {
        let mut editor = TitleEditor::new();
        assert!(matches!(
            editor.begin("todo", "To Do"),
            Err(BoardError::StandardColumnReadOnly(_))
        ));
        assert!(!editor.is_editing("todo"));
    }

    #[test]
    fn test_commit_writes_title() {
        let board = board();
        let column = board.create_column("Blocked").unwrap();
        let mut editor = TitleEditor::new();

        editor.begin(&column.id, &column.title).unwrap();
        assert!(editor.set_draft(&column.id, " Waiting on review "));
        let committed = editor.commit(&column.id, &board).unwrap();
        assert_eq!(committed.as_deref(), Some("Waiting on review"));
        assert!(!editor.is_editing(&column.id));
        assert_eq!(
            board.custom_columns().get(&column.id).unwrap().title,
            "Waiting on review"
        );
    }

    #[test]
    fn test_cancel_discards_draft() {
        let board = board();
        let column = board.create_column("Blocked").unwrap();
        let mut editor = TitleEditor::new();

        editor.begin(&column.id, &column.title).unwrap();
        editor.set_draft(&column.id, "Something else");
        assert!(editor.cancel(&column.id));
        assert_eq!(editor.commit(&column.id, &board).unwrap(), None);
        assert_eq!(board.custom_columns().get(&column.id).unwrap().title, "Blocked");
    }

    #[test]
    fn test_blank_draft_rejected_and_kept() {
        let board = board();
        let column = board.create_column("Blocked").unwrap();
        let mut editor = TitleEditor::new();

        editor.begin(&column.id, &column.title).unwrap();
        editor.set_draft(&column.id, "   ");
        assert!(matches!(
            editor.commit(&column.id, &board),
            Err(BoardError::EmptyColumnName)
        ));
        assert!(editor.is_editing(&column.id));
        assert_eq!(board.custom_columns().get(&column.id).unwrap().title, "Blocked");
    }

    #[test]
    fn test_drafts_are_per_column() {
        let mut editor = TitleEditor::new();
        editor.begin("custom_1", "A").unwrap();
        editor.begin("custom_2", "B").unwrap();
        editor.set_draft("custom_2", "B2");
        assert_eq!(editor.draft("custom_1"), Some("A"));
        assert_eq!(editor.draft("custom_2"), Some("B2"));
        assert!(!editor.set_draft("custom_3", "C"));
    }
}
