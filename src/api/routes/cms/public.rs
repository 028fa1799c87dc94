//! Public types for the content API
use serde::{Deserialize, Serialize};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}
