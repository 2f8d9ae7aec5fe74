//! `SeaORM` active enums mapped to `PostgreSQL` enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sender_type")]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    /// The customer, via webhook.
    #[sea_orm(string_value = "customer")]
    Customer,
    /// An agent, via the inbox.
    #[sea_orm(string_value = "agent")]
    Agent,
}

/// Delivery state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "delivery_status")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Inbound message stored from a webhook.
    #[sea_orm(string_value = "received")]
    Received,
    /// Agent message stored, send not yet confirmed.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Agent message accepted by the platform.
    #[sea_orm(string_value = "sent")]
    Sent,
    /// Agent message rejected by the platform or timed out.
    #[sea_orm(string_value = "failed")]
    Failed,
}
