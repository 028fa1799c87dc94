//! Public types for the contact API
use serde::{Deserialize, Serialize};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;

// Missing fields are read as empty and rejected during validation
// with the same message as blank ones
#[derive(Deserialize, Default)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}
