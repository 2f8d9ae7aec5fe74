//! Initial database migration.
//!
//! Creates accounts, session tokens, linked pages, conversations and messages.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNTS & SESSIONS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(TOKENS_SQL).await?;

        // ============================================================
        // PART 3: PAGE INTEGRATION
        // ============================================================
        db.execute_unprepared(FACEBOOK_PAGES_SQL).await?;

        // ============================================================
        // PART 4: INBOX
        // ============================================================
        db.execute_unprepared(CONVERSATIONS_SQL).await?;
        db.execute_unprepared(MESSAGES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE sender_type AS ENUM ('customer', 'agent');

CREATE TYPE delivery_status AS ENUM ('received', 'pending', 'sent', 'failed');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_email_lowercase CHECK (email = lower(email))
);
";

const TOKENS_SQL: &str = r"
-- Session tokens, stored as SHA-256 hashes of the issued JWT
CREATE TABLE tokens (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token_hash VARCHAR(64) NOT NULL UNIQUE,
    expires_at TIMESTAMPTZ NOT NULL,
    revoked_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expires_future CHECK (expires_at > created_at)
);

CREATE INDEX idx_tokens_user ON tokens(user_id, created_at DESC) WHERE revoked_at IS NULL;

CREATE INDEX idx_tokens_expires ON tokens(expires_at);
";

const FACEBOOK_PAGES_SQL: &str = r"
-- One linked page per user
CREATE TABLE facebook_pages (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    page_id VARCHAR(64) NOT NULL,
    page_name VARCHAR(255) NOT NULL,
    access_token TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_facebook_pages_page ON facebook_pages(page_id);
";

const CONVERSATIONS_SQL: &str = r"
-- page_id is the external page id; no FK so history survives unlinking
CREATE TABLE conversations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    page_id VARCHAR(64) NOT NULL,
    customer_id VARCHAR(64) NOT NULL,
    customer_name VARCHAR(255) NOT NULL,
    last_message_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Threading lookup: latest conversation per (page, customer)
CREATE INDEX idx_conversations_thread
    ON conversations(page_id, customer_id, last_message_at DESC);

-- Inbox listing
CREATE INDEX idx_conversations_page_activity
    ON conversations(page_id, last_message_at DESC);
";

const MESSAGES_SQL: &str = r"
CREATE TABLE messages (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    conversation_id UUID NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
    sender_id VARCHAR(64) NOT NULL,
    sender_name VARCHAR(255) NOT NULL,
    body TEXT NOT NULL,
    sender_type sender_type NOT NULL,
    delivery_status delivery_status NOT NULL,
    external_id VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_messages_conversation_created
    ON messages(conversation_id, created_at, id);

-- Webhook redeliveries carry the same mid
CREATE UNIQUE INDEX idx_messages_external_id
    ON messages(external_id) WHERE external_id IS NOT NULL;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS messages CASCADE;
DROP TABLE IF EXISTS conversations CASCADE;
DROP TABLE IF EXISTS facebook_pages CASCADE;
DROP TABLE IF EXISTS tokens CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TYPE IF EXISTS delivery_status;
DROP TYPE IF EXISTS sender_type;
";
