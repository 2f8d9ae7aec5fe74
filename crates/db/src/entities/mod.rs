//! `SeaORM` entity definitions.

pub mod conversations;
pub mod facebook_pages;
pub mod messages;
pub mod sea_orm_active_enums;
pub mod tokens;
pub mod users;
