use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{ChatMessage, SessionRow};
use crate::ai::types::{ContentPart, InputTurn, Role};

pub const DEFAULT_SESSION_NAME: &str = "New chat";

/// Placeholder persisted in place of image bytes; raw image data never
/// reaches the database.
pub const IMAGE_PLACEHOLDER: &str = "Image uploaded";

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub name: String,
    pub message_count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_at: OffsetDateTime,
}

/// Groups a user's message rows (newest first) into per-session summaries,
/// sorted by most recent activity. The display name comes from the most
/// recent row of each session.
pub fn summarize_sessions(rows: &[SessionRow]) -> Vec<SessionSummary> {
    let mut sessions: Vec<SessionSummary> = Vec::new();
    for row in rows {
        match sessions.iter_mut().find(|s| s.session_id == row.session_id) {
            Some(session) => session.message_count += 1,
            None => sessions.push(SessionSummary {
                session_id: row.session_id,
                name: if row.session_name.is_empty() {
                    DEFAULT_SESSION_NAME.into()
                } else {
                    row.session_name.clone()
                },
                message_count: 1,
                last_message_at: row.sent_at,
            }),
        }
    }
    sessions.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    sessions
}

/// Rebuilds the conversation for the completion call: each stored row
/// becomes a user turn plus an assistant turn, followed by the pending
/// user turn. `history_limit` keeps only the most recent N rows; `None`
/// sends the full session.
pub fn assemble_turns(
    history: &[ChatMessage],
    pending_text: &str,
    image_base64: Option<&str>,
    history_limit: Option<usize>,
) -> Vec<InputTurn> {
    let window = match history_limit {
        Some(limit) if history.len() > limit => &history[history.len() - limit..],
        _ => history,
    };

    let mut turns = Vec::with_capacity(window.len() * 2 + 1);
    for message in window {
        turns.push(InputTurn::user(message.user_input.clone()));
        turns.push(InputTurn::assistant(message.ai_response.clone()));
    }

    let mut content = Vec::new();
    if !pending_text.trim().is_empty() {
        content.push(ContentPart::InputText {
            text: pending_text.to_string(),
        });
    }
    if let Some(image) = image_base64 {
        content.push(ContentPart::image_from_base64(image));
    }
    turns.push(InputTurn {
        role: Role::User,
        content,
    });
    turns
}

/// What gets stored as the user input of the new row. Image bytes are
/// replaced by a readable placeholder.
pub fn persisted_input(text: &str, has_image: bool) -> String {
    let text = text.trim();
    match (text.is_empty(), has_image) {
        (true, _) => IMAGE_PLACEHOLDER.to_string(),
        (false, true) => format!("{text} ({IMAGE_PLACEHOLDER})"),
        (false, false) => text.to_string(),
    }
}

/// After a session is deleted the caller must never be left pointing at
/// it: returns a fresh empty session id when the active one went away.
pub fn select_after_delete(active: Option<Uuid>, deleted: Uuid) -> Option<Uuid> {
    match active {
        Some(current) if current == deleted => Some(Uuid::new_v4()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn message(session_id: Uuid, sent_at: OffsetDateTime, input: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            session_id,
            session_name: "Cutting advice".into(),
            user_input: input.into(),
            ai_response: format!("re: {input}"),
            sent_at,
        }
    }

    fn row(session_id: Uuid, sent_at: OffsetDateTime, name: &str) -> SessionRow {
        SessionRow {
            session_id,
            session_name: name.into(),
            sent_at,
        }
    }

    #[test]
    fn transcript_has_2k_plus_1_turns() {
        let session = Uuid::new_v4();
        let history: Vec<_> = (0..4)
            .map(|i| {
                message(
                    session,
                    datetime!(2025-03-01 10:00 UTC) + time::Duration::minutes(i),
                    "hi",
                )
            })
            .collect();
        let turns = assemble_turns(&history, "what now?", None, None);
        assert_eq!(turns.len(), 2 * 4 + 1);
    }

    #[test]
    fn transcript_alternates_roles_and_ends_with_pending_user_turn() {
        let session = Uuid::new_v4();
        let history = vec![message(session, datetime!(2025-03-01 10:00 UTC), "hello")];
        let turns = assemble_turns(&history, "follow-up", None, None);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[2].role, Role::User);
        let json = serde_json::to_value(&turns[2]).unwrap();
        assert_eq!(json["content"][0]["text"], "follow-up");
    }

    #[test]
    fn history_window_keeps_most_recent_rows() {
        let session = Uuid::new_v4();
        let history: Vec<_> = (0..10)
            .map(|i| {
                message(
                    session,
                    datetime!(2025-03-01 10:00 UTC) + time::Duration::minutes(i),
                    &format!("msg {i}"),
                )
            })
            .collect();
        let turns = assemble_turns(&history, "latest", None, Some(3));
        assert_eq!(turns.len(), 2 * 3 + 1);
        let first = serde_json::to_value(&turns[0]).unwrap();
        // Window is the tail of the ascending history.
        assert_eq!(first["content"][0]["text"], "msg 7");
    }

    #[test]
    fn pending_turn_can_carry_an_image() {
        let turns = assemble_turns(&[], "look at this", Some("QUJD"), None);
        assert_eq!(turns.len(), 1);
        let json = serde_json::to_value(&turns[0]).unwrap();
        assert_eq!(json["content"][0]["type"], "input_text");
        assert_eq!(json["content"][1]["type"], "input_image");
    }

    #[test]
    fn summaries_group_count_and_sort() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // Newest first, as the repo returns them.
        let rows = vec![
            row(b, datetime!(2025-03-02 12:00 UTC), "Leg day plan"),
            row(a, datetime!(2025-03-02 09:00 UTC), "Macros"),
            row(b, datetime!(2025-03-01 12:00 UTC), "old name"),
            row(a, datetime!(2025-03-01 09:00 UTC), "Macros"),
            row(a, datetime!(2025-02-28 09:00 UTC), "Macros"),
        ];
        let sessions = summarize_sessions(&rows);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, b);
        // Name comes from the most recent row of the session.
        assert_eq!(sessions[0].name, "Leg day plan");
        assert_eq!(sessions[0].message_count, 2);
        assert_eq!(sessions[1].message_count, 3);
    }

    #[test]
    fn summaries_default_empty_names() {
        let rows = vec![row(Uuid::new_v4(), datetime!(2025-03-02 12:00 UTC), "")];
        assert_eq!(summarize_sessions(&rows)[0].name, DEFAULT_SESSION_NAME);
    }

    #[test]
    fn persisted_input_replaces_image_bytes() {
        assert_eq!(persisted_input("", true), IMAGE_PLACEHOLDER);
        assert_eq!(
            persisted_input("what is this meal?", true),
            "what is this meal? (Image uploaded)"
        );
        assert_eq!(persisted_input("plain text", false), "plain text");
    }

    #[test]
    fn deleting_active_session_yields_fresh_replacement() {
        let active = Uuid::new_v4();
        let replacement = select_after_delete(Some(active), active);
        let new_id = replacement.expect("active session was deleted");
        assert_ne!(new_id, active);
    }

    #[test]
    fn deleting_other_session_keeps_selection() {
        let active = Uuid::new_v4();
        assert_eq!(select_after_delete(Some(active), Uuid::new_v4()), None);
        assert_eq!(select_after_delete(None, Uuid::new_v4()), None);
    }
}
