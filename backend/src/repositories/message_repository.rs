//! Database repository for messages.
//!
//! Messages are append-only: there is no update or delete path.

use crate::database::models::{CreateMessage, Message, MessageWithParticipants, Role, UserSummary};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, project_id, content, created_at";

/// Flat row for a message joined with both participants.
#[derive(FromRow)]
struct MessageParticipantsRow {
    id: String,
    sender_id: String,
    receiver_id: String,
    project_id: Option<String>,
    content: String,
    created_at: DateTime<Utc>,
    sender_name: String,
    sender_role: Role,
    receiver_name: String,
    receiver_role: Role,
}

impl From<MessageParticipantsRow> for MessageWithParticipants {
    fn from(row: MessageParticipantsRow) -> Self {
        MessageWithParticipants {
            sender: UserSummary {
                id: row.sender_id.clone(),
                full_name: row.sender_name,
                role: row.sender_role,
            },
            receiver: UserSummary {
                id: row.receiver_id.clone(),
                full_name: row.receiver_name,
                role: row.receiver_role,
            },
            message: Message {
                id: row.id,
                sender_id: row.sender_id,
                receiver_id: row.receiver_id,
                project_id: row.project_id,
                content: row.content,
                created_at: row.created_at,
            },
        }
    }
}

/// Repository for message database operations.
pub struct MessageRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a message with a server-assigned timestamp.
    pub async fn create_message(&self, message: CreateMessage) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, project_id, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(&message.id)
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(&message.project_id)
        .bind(&message.content)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(message)
    }

    /// Messages exchanged between two users, oldest first.
    pub async fn get_conversation(&self, user_id: &str, other_user_id: &str) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE (sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?)
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(user_id)
        .bind(other_user_id)
        .bind(other_user_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }

    /// Most recent messages the user sent or received, newest first.
    pub async fn get_recent_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageWithParticipants>> {
        let rows = sqlx::query_as::<_, MessageParticipantsRow>(
            r#"
            SELECT
            m.id, m.sender_id, m.receiver_id, m.project_id, m.content, m.created_at,
            s.full_name AS sender_name, s.role AS sender_role,
            r.full_name AS receiver_name, r.role AS receiver_role
            FROM messages m
            JOIN users s ON s.id = m.sender_id
            JOIN users r ON r.id = m.receiver_id
            WHERE m.sender_id = ? OR m.receiver_id = ?
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MessageWithParticipants::from).collect())
    }
}
