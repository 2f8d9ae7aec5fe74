//! Database seeder for Pagedesk development and testing.
//!
//! Seeds a demo agent, a linked page with a placeholder token, and a few
//! customer messages threaded through the regular ingest path, so the inbox
//! shows both an open and a dormant conversation. Expired and revoked
//! session tokens are purged first.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use pagedesk_core::{auth::hash_password, webhook::InboundEvent};
use pagedesk_db::{
    ConversationRepository, PageRepository, TokenRepository, UserRepository,
    repositories::{IngestOutcome, LinkPageInput},
};
use pagedesk_shared::types::UserId;
use sea_orm::DatabaseConnection;

const DEMO_EMAIL: &str = "agent@pagedesk.dev";
const DEMO_PASSWORD: &str = "pagedesk-demo";
const DEMO_PAGE_ID: &str = "100000000000001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = pagedesk_db::connect(&database_url)
        .await
        .context("failed to connect to database")?;

    println!("Purging stale session tokens...");
    let purged = TokenRepository::new(db.clone())
        .purge_expired()
        .await
        .context("failed to purge session tokens")?;
    println!("  Removed {purged} tokens");

    println!("Seeding demo agent...");
    let user_id = seed_demo_agent(&db).await?;

    println!("Seeding demo page...");
    seed_demo_page(&db, user_id).await?;

    println!("Seeding conversations...");
    seed_conversations(&db).await?;

    println!("Seeding complete! Log in as {DEMO_EMAIL} / {DEMO_PASSWORD}");
    Ok(())
}

async fn seed_demo_agent(db: &DatabaseConnection) -> anyhow::Result<UserId> {
    let users = UserRepository::new(db.clone());
    if let Some(existing) = users.find_by_email(DEMO_EMAIL).await? {
        println!("  Demo agent already exists, skipping...");
        return Ok(UserId::from_uuid(existing.id));
    }

    let hash = hash_password(DEMO_PASSWORD)?;
    let user = users.create("Demo Agent", DEMO_EMAIL, &hash).await?;
    println!("  Created demo agent {}", user.id);
    Ok(UserId::from_uuid(user.id))
}

async fn seed_demo_page(db: &DatabaseConnection, user_id: UserId) -> anyhow::Result<()> {
    let page = PageRepository::new(db.clone())
        .upsert_for_user(
            user_id,
            LinkPageInput {
                page_id: DEMO_PAGE_ID.to_string(),
                page_name: "Pagedesk Demo Store".to_string(),
                access_token: "demo-page-token".to_string(),
            },
        )
        .await?;
    println!("  Linked page {} ({})", page.page_name, page.page_id);
    Ok(())
}

async fn seed_conversations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let conversations = ConversationRepository::new(db.clone());
    let now = Utc::now();

    let ada = ("200000000000001", "Ada");
    let grace = ("200000000000002", "Grace");
    let messages = [
        (
            ada,
            "Hi, is the blue jacket back in stock?",
            now - Duration::days(3),
            "seed_m_1",
        ),
        (
            ada,
            "Never mind, found it!",
            now - Duration::days(3) + Duration::minutes(5),
            "seed_m_2",
        ),
        (ada, "Actually, can I return it?", now - Duration::hours(2), "seed_m_3"),
        (grace, "When do you open tomorrow?", now - Duration::minutes(30), "seed_m_4"),
    ];

    for ((sender_id, sender_name), text, received_at, mid) in messages {
        let event = InboundEvent {
            page_id: DEMO_PAGE_ID.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            text: text.to_string(),
            received_at,
            external_id: Some(mid.to_string()),
        };
        match conversations.ingest(&event).await? {
            IngestOutcome::Stored { started: true, .. } => {
                println!("  {sender_name}: started a conversation");
            }
            IngestOutcome::Stored { .. } => println!("  {sender_name}: continued a conversation"),
            IngestOutcome::Duplicate => println!("  {mid} already seeded, skipping..."),
        }
    }
    Ok(())
}
