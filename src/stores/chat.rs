//! Chat store: conversations and their messages

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ChatStoreOptions {
    pub chat_table_name: String,
    pub message_table_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    /// user, assistant or system
    pub role: String,
    pub content: String,
    pub sequence: i64,
}

pub struct ChatStore {
    db: Database,
    chat_table: String,
    message_table: String,
}

impl ChatStore {
    pub fn new(db: Database, options: ChatStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            chat_table: validate_table_name(&options.chat_table_name)?,
            message_table: validate_table_name(&options.message_table_name)?,
        })
    }

    /// Open a conversation and return its id
    pub async fn create_chat(&self, owner_id: &str, title: &str) -> Result<String, StoreError> {
        let id = new_id();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, owner_id, title, created_at) VALUES ($1, $2, $3, $4)",
                    self.chat_table
                ),
                &[id.as_str().into(), owner_id.into(), title.into(), now_millis().into()],
            )
            .await?;
        Ok(id)
    }

    /// Append a message to an existing chat
    pub async fn add_message(
        &self,
        chat_id: &str,
        role: &str,
        content: &str,
    ) -> Result<ChatMessage, StoreError> {
        require_non_empty("role", role)?;
        let exists = self
            .db
            .query_count(
                &format!("SELECT COUNT(*) FROM {} WHERE id = $1", self.chat_table),
                &[chat_id.into()],
            )
            .await?;
        if exists == 0 {
            return Err(StoreError::NotFound(format!("chat {chat_id}")));
        }

        let sequence = self
            .db
            .query_count(
                &format!(
                    "SELECT COALESCE(MAX(sequence), 0) FROM {} WHERE chat_id = $1",
                    self.message_table
                ),
                &[chat_id.into()],
            )
            .await?
            + 1;

        let message = ChatMessage {
            id: new_id(),
            chat_id: chat_id.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            sequence,
        };
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, chat_id, role, content, sequence, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                    self.message_table
                ),
                &[
                    message.id.as_str().into(),
                    message.chat_id.as_str().into(),
                    message.role.as_str().into(),
                    message.content.as_str().into(),
                    message.sequence.into(),
                    now_millis().into(),
                ],
            )
            .await?;
        Ok(message)
    }

    /// Messages of a chat in the order they were added
    pub async fn messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT id, chat_id, role, content, sequence FROM {} \
                     WHERE chat_id = $1 ORDER BY sequence",
                    self.message_table
                ),
                &[chat_id.into()],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| ChatMessage {
                id: row.string("id"),
                chat_id: row.string("chat_id"),
                role: row.string("role"),
                content: row.string("content"),
                sequence: row.get_i64("sequence").unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl Store for ChatStore {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.chat_table.clone(), self.message_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let c = &self.chat_table;
        let m = &self.message_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {c} (\
                     id TEXT PRIMARY KEY, \
                     owner_id TEXT NOT NULL DEFAULT '', \
                     title TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL)"
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {m} (\
                     id TEXT PRIMARY KEY, \
                     chat_id TEXT NOT NULL, \
                     role TEXT NOT NULL, \
                     content TEXT NOT NULL, \
                     sequence BIGINT NOT NULL, \
                     created_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{m}_chat ON {m} (chat_id, sequence)"),
            ],
        )
        .await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory_db;

    #[tokio::test]
    async fn test_messages_keep_order() {
        let store = ChatStore::new(
            memory_db().await,
            ChatStoreOptions {
                chat_table_name: "test_chats".into(),
                message_table_name: "test_messages".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        let chat = store.create_chat("user-1", "Support").await.unwrap();
        store.add_message(&chat, "user", "hi").await.unwrap();
        store.add_message(&chat, "assistant", "hello").await.unwrap();
        store.add_message(&chat, "user", "thanks").await.unwrap();

        let messages = store.messages(&chat).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["hi", "hello", "thanks"]);
        assert_eq!(messages[2].sequence, 3);
    }

    #[tokio::test]
    async fn test_message_for_unknown_chat() {
        let store = ChatStore::new(
            memory_db().await,
            ChatStoreOptions {
                chat_table_name: "test_chats".into(),
                message_table_name: "test_messages".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        let err = store.add_message("nope", "user", "hi").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
