//! Prompts for the consultation reply, extraction and ranking calls.

use crate::gateway::{Message, Role};

/// System prompt for the conversational reply.
pub const CONSULTATION_SYSTEM_PROMPT: &str = r#"You are MediBridge's medical consultation assistant, helping North American patients find suitable doctors in Shanghai, China. Your tasks:

1. Kindly ask about the patient's symptoms, duration, age, and medical history
2. When you have enough information (after 1-2 exchanges), PROACTIVELY recommend specific doctors and hospitals
3. Always mention both the doctor's name AND the hospital name in your recommendations
4. After recommending doctors, encourage patients to book an appointment for further triage consultation
5. Use phrases like: "I recommend Dr. [Name] at [Hospital Name]" or "You can book an appointment with Dr. [Name] for a detailed triage consultation"

IMPORTANT:
- Be proactive, do not wait for patients to ask "where should I go?"
- Always provide concrete doctor and hospital recommendations when you have sufficient information
- Encourage booking appointments for professional triage services
- Use a warm, professional tone
- Do not provide medical diagnoses; focus on connecting patients with the right specialists"#;

/// System prompt for keyword and patient-fact extraction.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"Extract medical keywords from patient conversation. Return JSON format:
{
  "keywords": ["keyword1", "keyword2"],
  "symptoms": "symptom description",
  "duration": "duration description",
  "age": age_number or null,
  "readyForRecommendation": true/false
}

Keywords should include: disease names, symptoms, specialty names, treatment methods, etc.
Use the language of the doctor directory (Chinese) for keywords where possible, since they are matched literally against doctor expertise, specialty, department and hospital names.
readyForRecommendation should be true if you have basic symptom information (even after just 1-2 exchanges), so we can show doctor recommendations proactively."#;

/// System prompt for ranking search candidates.
pub const RANKING_SYSTEM_PROMPT: &str = r#"Based on patient needs, select the 3-5 most suitable doctors from candidates, ranked by relevance.
Only use doctor IDs that appear in the candidate list.
Return JSON format:
{
  "selectedDoctors": [
    {
      "doctorId": doctor_id,
      "reason": "recommendation reason"
    }
  ]
}"#;

/// Expertise longer than this is cut in ranking prompts.
pub const RANKING_EXPERTISE_CHARS: usize = 200;

/// Full message list for the reply call: system prompt, prior turns, new message.
pub fn make_consultation_messages(history: &[Message], latest: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(CONSULTATION_SYSTEM_PROMPT));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(latest));
    messages
}

/// User prompt for extraction over the whole conversation.
pub fn make_extraction_prompt(history: &[Message], latest: &str) -> String {
    let transcript = history
        .iter()
        .map(|m| format!("{}: {}", role_label(m.role), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Patient conversation history:\n{transcript}\n\nLatest message: {latest}")
}

pub fn make_extraction_messages(history: &[Message], latest: &str) -> Vec<Message> {
    vec![
        Message::system(EXTRACTION_SYSTEM_PROMPT),
        Message::user(make_extraction_prompt(history, latest)),
    ]
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// A search result as presented to the ranking call.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingCandidate {
    pub doctor_id: i64,
    pub name: String,
    pub hospital: String,
    pub department: String,
    pub title: Option<String>,
    pub expertise: Option<String>,
    pub recommendation_score: Option<f64>,
}

impl RankingCandidate {
    fn describe(&self, position: usize) -> String {
        let title = non_empty(self.title.as_deref()).unwrap_or("Unknown");
        let expertise = non_empty(self.expertise.as_deref())
            .map(|e| e.chars().take(RANKING_EXPERTISE_CHARS).collect::<String>())
            .unwrap_or_else(|| "No information".to_string());
        let score = self
            .recommendation_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "{position}. {} - {} {}\nID: {}\nTitle: {title}\nExpertise: {expertise}\nRecommendation Score: {score}",
            self.name, self.hospital, self.department, self.doctor_id
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// User prompt listing the candidates to rank.
pub fn make_ranking_prompt(
    symptoms: &str,
    keywords: &[String],
    candidates: &[RankingCandidate],
) -> String {
    let listing = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| c.describe(i + 1))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Patient needs: {symptoms}\nKeywords: {}\n\nCandidate doctors:\n{listing}",
        keywords.join(", ")
    )
}

pub fn make_ranking_messages(
    symptoms: &str,
    keywords: &[String],
    candidates: &[RankingCandidate],
) -> Vec<Message> {
    vec![
        Message::system(RANKING_SYSTEM_PROMPT),
        Message::user(make_ranking_prompt(symptoms, keywords, candidates)),
    ]
}
