use serde::{Deserialize, Serialize};

/// Login request body.
#[derive(Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Backend response envelope; the payload is the first item.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }
}

/// Credential payload returned by the login endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginItem {
    pub access_token: String,
    #[serde(default, with = "crate::domain::serde_utils::lenient_u64")]
    pub user_id: u64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub tier_code: Option<String>,
    #[serde(default, rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Epoch milliseconds.
    #[serde(with = "crate::domain::serde_utils::lenient_i64")]
    pub expires_at: i64,
}

/// Token payload returned by the renewal endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalItem {
    pub access_token: String,
    /// Epoch milliseconds.
    #[serde(with = "crate::domain::serde_utils::lenient_i64")]
    pub expires_at: i64,
}
