use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created_at: i64,
    pub item_id: String,
}

/// Session-only item list with nested per-item comments. Nothing here is
/// persisted; the board resets with the process.
#[derive(Debug, Default)]
pub struct ItemBoard {
    items: Vec<Item>,
    comments: Vec<Comment>,
}

impl ItemBoard {
    pub fn new() -> Self {
        ItemBoard::default()
    }

    /// Add an item at the top of the list. Whitespace-only titles are a
    /// no-op and return false.
    pub fn add_item(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.items.insert(
            0,
            Item {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                description: None,
            },
        );
        true
    }

    /// Replace an item's title in place, same validation as add.
    pub fn rename_item(&mut self, id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        item.title = title.to_string();
        true
    }

    /// Remove an item together with its comments.
    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
        self.comments.retain(|c| c.item_id != id);
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Add a comment to an existing item, newest first. Fails on blank
    /// text or an unknown item.
    pub fn add_comment(&mut self, item_id: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.item(item_id).is_none() {
            return false;
        }
        self.comments.insert(
            0,
            Comment {
                id: Uuid::new_v4().to_string(),
                text: text.to_string(),
                created_at: Utc::now().timestamp_millis(),
                item_id: item_id.to_string(),
            },
        );
        true
    }

    pub fn edit_comment(&mut self, id: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let Some(comment) = self.comments.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        comment.text = text.to_string();
        true
    }

    pub fn remove_comment(&mut self, id: &str) {
        self.comments.retain(|c| c.id != id);
    }

    /// Comments for one item in stored (newest-first) order.
    pub fn comments_for(&self, item_id: &str) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| c.item_id == item_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_added_newest_first() {
        let mut board = ItemBoard::new();
        assert!(board.add_item("first"));
        assert!(board.add_item("second"));
        let titles: Vec<&str> = board.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn blank_titles_are_rejected() {
        let mut board = ItemBoard::new();
        assert!(!board.add_item("   "));
        assert!(board.items().is_empty());
        assert!(board.add_item("  trimmed  "));
        assert_eq!(board.items()[0].title, "trimmed");
    }

    #[test]
    fn rename_keeps_the_id() {
        let mut board = ItemBoard::new();
        board.add_item("old name");
        let id = board.items()[0].id.clone();
        assert!(board.rename_item(&id, "new name"));
        assert!(!board.rename_item(&id, "  "));
        assert!(!board.rename_item("missing", "whatever"));
        assert_eq!(board.items()[0].id, id);
        assert_eq!(board.items()[0].title, "new name");
    }

    #[test]
    fn removing_an_item_drops_its_comments() {
        let mut board = ItemBoard::new();
        board.add_item("keep");
        board.add_item("drop");
        let keep_id = board.items()[1].id.clone();
        let drop_id = board.items()[0].id.clone();
        assert!(board.add_comment(&keep_id, "stays"));
        assert!(board.add_comment(&drop_id, "goes"));

        board.remove_item(&drop_id);
        assert_eq!(board.items().len(), 1);
        assert!(board.comments_for(&drop_id).is_empty());
        assert_eq!(board.comments_for(&keep_id).len(), 1);
    }

    #[test]
    fn comments_require_an_existing_item() {
        let mut board = ItemBoard::new();
        assert!(!board.add_comment("missing", "text"));
        board.add_item("present");
        let id = board.items()[0].id.clone();
        assert!(!board.add_comment(&id, "  "));
        assert!(board.add_comment(&id, "hello"));
        assert_eq!(board.comments_for(&id).len(), 1);
    }

    #[test]
    fn comments_list_newest_first_per_item() {
        let mut board = ItemBoard::new();
        board.add_item("a");
        let id = board.items()[0].id.clone();
        board.add_comment(&id, "one");
        board.add_comment(&id, "two");
        let texts: Vec<&str> = board
            .comments_for(&id)
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["two", "one"]);
    }

    #[test]
    fn edit_and_remove_comment() {
        let mut board = ItemBoard::new();
        board.add_item("a");
        let item_id = board.items()[0].id.clone();
        board.add_comment(&item_id, "draft");
        let comment_id = board.comments_for(&item_id)[0].id.clone();

        assert!(board.edit_comment(&comment_id, "final"));
        assert!(!board.edit_comment(&comment_id, " "));
        assert_eq!(board.comments_for(&item_id)[0].text, "final");

        board.remove_comment(&comment_id);
        assert!(board.comments_for(&item_id).is_empty());
    }
}
