//! Graph API adapter.
//!
//! This crate provides:
//! - The [`MessagingGateway`] seam used by the HTTP layer
//! - [`GraphClient`], its reqwest-backed implementation
//! - Wire types for OAuth tokens, managed pages, profiles and send receipts

mod client;
mod error;
mod types;

pub use client::{GraphClient, GraphConfig, OAUTH_CALLBACK_PATH};
pub use error::GatewayError;
pub use types::{AccessToken, DeliveryReceipt, ManagedPage, PageInfo, UserProfile};

use async_trait::async_trait;

/// Operations the application needs from the messaging platform.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Builds the OAuth dialog URL. `state` is echoed back to the callback.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchanges an OAuth code for a user access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, GatewayError>;

    /// Lists the pages the user manages, with their page access tokens.
    ///
    /// An empty list is a valid answer: the user manages no pages.
    async fn fetch_managed_pages(
        &self,
        user_access_token: &str,
    ) -> Result<Vec<ManagedPage>, GatewayError>;

    /// Fetches id and name of a page.
    async fn fetch_page_info(
        &self,
        page_access_token: &str,
        page_id: &str,
    ) -> Result<PageInfo, GatewayError>;

    /// Fetches the public profile of a customer.
    async fn fetch_user_profile(
        &self,
        page_access_token: &str,
        customer_id: &str,
    ) -> Result<UserProfile, GatewayError>;

    /// Sends a text message from the page to a customer.
    async fn send_message(
        &self,
        page_access_token: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<DeliveryReceipt, GatewayError>;
}
