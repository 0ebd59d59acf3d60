//! Common test utilities and mock implementations.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;
use photo_marathon_bot::chat::ChatError;
use photo_marathon_bot::chat::ChatPlatform;
use photo_marathon_bot::chat::HistoryMessage;
use photo_marathon_bot::repository::Repository;
use uuid::Uuid;

/// Sets up a temporary test database.
pub async fn setup_db() -> (Arc<Repository>, PathBuf) {
    let uuid = Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("photo-marathon-test-{}.db", uuid));
    let db_url = format!("sqlite://{}", db_path.to_str().unwrap());

    let db = Repository::new(&db_url, db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");

    db.create_all_tables().await.expect("Failed to create tables");

    (Arc::new(db), db_path)
}

/// Cleans up the test database file.
pub async fn teardown_db(db_path: PathBuf) {
    if db_path.exists() {
        let _ = std::fs::remove_file(db_path);
    }
}

// MOCK CHAT PLATFORM

/// State for the mock chat platform.
#[derive(Default)]
pub struct MockChatState {
    /// Current membership: platform user id -> display name.
    pub members: HashMap<i64, String>,
    /// Full history, newest first.
    pub history: Vec<HistoryMessage>,
    /// Notifications delivered so far.
    pub sent: Vec<(i64, String)>,
    /// Chats whose sends fail.
    pub fail_send_chats: HashSet<i64>,
    pub fail_members: bool,
    pub fail_history: bool,
    /// History pages served so far.
    pub pages_fetched: u32,
}

/// Mock chat platform for testing.
#[derive(Clone, Default)]
pub struct MockChat {
    pub state: Arc<RwLock<MockChatState>>,
}

#[allow(dead_code)]
impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, id: i64, display: &str) {
        self.state
            .write()
            .unwrap()
            .members
            .insert(id, display.to_string());
    }

    /// Appends a history message; callers push newest first.
    pub fn push_history(&self, sender_id: i64, timestamp: i64, photo_count: u32) {
        self.state.write().unwrap().history.push(HistoryMessage {
            sender_id,
            timestamp,
            photo_count,
        });
    }

    pub fn fail_sends_for(&self, chat_id: i64) {
        self.state.write().unwrap().fail_send_chats.insert(chat_id);
    }

    pub fn fail_members(&self) {
        self.state.write().unwrap().fail_members = true;
    }

    pub fn fail_history(&self) {
        self.state.write().unwrap().fail_history = true;
    }

    pub fn sent_messages(&self) -> Vec<(i64, String)> {
        self.state.read().unwrap().sent.clone()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.state.read().unwrap().pages_fetched
    }
}

#[async_trait]
impl ChatPlatform for MockChat {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError> {
        let mut state = self.state.write().unwrap();
        if state.fail_send_chats.contains(&chat_id) {
            return Err(ChatError::RequestFailed {
                message: "send refused".to_string(),
            });
        }
        state.sent.push((chat_id, text.to_string()));
        Ok(())
    }

    async fn fetch_members(&self, _chat_id: i64) -> Result<HashMap<i64, String>, ChatError> {
        let state = self.state.read().unwrap();
        if state.fail_members {
            return Err(ChatError::RequestFailed {
                message: "members unavailable".to_string(),
            });
        }
        Ok(state.members.clone())
    }

    async fn fetch_history_page(
        &self,
        _chat_id: i64,
        page_size: u32,
        offset: u32,
    ) -> Result<Vec<HistoryMessage>, ChatError> {
        let mut state = self.state.write().unwrap();
        if state.fail_history {
            return Err(ChatError::RequestFailed {
                message: "history unavailable".to_string(),
            });
        }
        state.pages_fetched += 1;
        let start = offset as usize;
        if start >= state.history.len() {
            return Ok(Vec::new());
        }
        let end = (start + page_size as usize).min(state.history.len());
        Ok(state.history[start..end].to_vec())
    }
}
