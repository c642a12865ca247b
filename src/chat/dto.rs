use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub input: String,
    pub image_base64: Option<String>,
    /// Name to stamp on the new row; falls back to the session's current
    /// name, then to the default.
    pub session_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Session the caller currently has open, if any.
    pub active_session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted_messages: u64,
    /// Fresh session id the caller should switch to when it deleted the
    /// session it had open.
    pub replacement_session_id: Option<Uuid>,
}
