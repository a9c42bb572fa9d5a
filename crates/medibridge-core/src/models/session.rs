//! Patient chat session models.

use serde::{Deserialize, Serialize};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of a chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A recommended doctor with the model's justification. Rank is the list position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub doctor_id: i64,
    pub reason: String,
}

/// Where a session is in the consultation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    /// No turn has completed
    Empty,
    /// Still gathering symptoms, duration and age
    Gathering,
    /// The latest turn produced recommendations
    Recommending,
}

/// Server-side state for one chat, upserted once per turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientSession {
    pub session_id: String,
    /// Append-only transcript, alternating user/assistant
    pub chat_history: Vec<ChatMessage>,
    pub symptoms: Option<String>,
    pub duration: Option<String>,
    pub age: Option<u32>,
    pub medical_history: Option<String>,
    /// Latest recommendation set; empty when none
    pub recommended_doctors: Vec<Recommendation>,
    pub created_at: String,
    pub updated_at: String,
}

impl PatientSession {
    /// Create an empty session.
    pub fn new(session_id: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            session_id,
            chat_history: Vec::new(),
            symptoms: None,
            duration: None,
            age: None,
            medical_history: None,
            recommended_doctors: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Append one completed turn to the transcript.
    pub fn record_turn(&mut self, user_message: impl Into<String>, reply: impl Into<String>) {
        self.chat_history.push(ChatMessage::user(user_message));
        self.chat_history.push(ChatMessage::assistant(reply));
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Number of completed turns.
    pub fn turn_count(&self) -> usize {
        self.chat_history.len() / 2
    }

    pub fn stage(&self) -> ConversationStage {
        if self.chat_history.is_empty() {
            ConversationStage::Empty
        } else if self.recommended_doctors.is_empty() {
            ConversationStage::Gathering
        } else {
            ConversationStage::Recommending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = PatientSession::new("abc".into());
        assert_eq!(session.stage(), ConversationStage::Empty);
        assert_eq!(session.turn_count(), 0);
    }

    #[test]
    fn test_record_turn_appends_in_order() {
        let mut session = PatientSession::new("abc".into());
        session.record_turn("I have a headache", "How long has it lasted?");
        session.record_turn("Two weeks", "How old are you?");

        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.chat_history.len(), 4);
        assert_eq!(session.chat_history[0], ChatMessage::user("I have a headache"));
        assert_eq!(session.chat_history[1].role, ChatRole::Assistant);
        assert_eq!(session.chat_history[2].content, "Two weeks");
        assert_eq!(session.stage(), ConversationStage::Gathering);
    }

    #[test]
    fn test_stage_with_recommendations() {
        let mut session = PatientSession::new("abc".into());
        session.record_turn("Chest pain", "I recommend Dr. Zhang");
        session.recommended_doctors.push(Recommendation {
            doctor_id: 7,
            reason: "Cardiologist".into(),
        });
        assert_eq!(session.stage(), ConversationStage::Recommending);
    }

    #[test]
    fn test_wire_format() {
        let message = ChatMessage::assistant("hi");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);

        let rec = Recommendation {
            doctor_id: 3,
            reason: "x".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["doctorId"], 3);
    }
}
