//! Graph API wire types.

use serde::{Deserialize, Serialize};

/// User access token returned by the OAuth code exchange.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    /// The token.
    pub access_token: String,
    /// Token type, normally `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[hidden]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A page the user manages.
#[derive(Clone, Deserialize)]
pub struct ManagedPage {
    /// External page id.
    pub id: String,
    /// Page name.
    pub name: String,
    /// Long-lived page access token.
    pub access_token: String,
}

impl std::fmt::Debug for ManagedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedPage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("access_token", &"[hidden]")
            .finish()
    }
}

/// `{"data": [...]}` envelope of list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Page metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// External page id.
    pub id: String,
    /// Page name.
    pub name: String,
}

/// Public profile of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Page-scoped id.
    #[serde(default)]
    pub id: String,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Profile picture URL.
    #[serde(default)]
    pub profile_pic: Option<String>,
}

impl UserProfile {
    /// First and last name joined, if any is known.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

/// Receipt of an accepted send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Customer the message went to.
    pub recipient_id: String,
    /// Platform message id.
    pub message_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let profile = UserProfile {
            first_name: Some("Amit".into()),
            last_name: Some("RG".into()),
            ..UserProfile::default()
        };
        assert_eq!(profile.display_name().as_deref(), Some("Amit RG"));
        assert_eq!(UserProfile::default().display_name(), None);
    }

    #[test]
    fn test_debug_hides_tokens() {
        let page = ManagedPage {
            id: "1".into(),
            name: "Shop".into(),
            access_token: "EAAB-secret".into(),
        };
        assert!(!format!("{page:?}").contains("EAAB-secret"));
    }

    #[test]
    fn test_data_list_defaults_to_empty() {
        let list: DataList<PageInfo> = serde_json::from_str("{}").unwrap();
        assert!(list.data.is_empty());
    }
}
