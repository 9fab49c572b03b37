//! Drafting of formal administrative emails.
//!
//! Each email kind declares the fields it needs. Missing required fields
//! are reported back instead of generating; complete requests go to the
//! generation provider with a JSON-structured prompt.

use async_trait::async_trait;
use campanile_core::error::Result;
use campanile_core::handler::{AgentHandler, AgentResponse, ConversationContext, Intent};
use campanile_core::provider::{GenerationProvider, GenerationRequest};
use campanile_core::session::Session;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest value accepted for any single field.
const MAX_FIELD_CHARS: usize = 500;

/// The administrative email templates the handler knows how to draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    EnrollmentCertificate,
    Complaint,
    InternshipRequest,
    LeaveRequest,
    Transcript,
    RecommendationLetter,
    /// Free-form request that fits no template.
    Custom,
}

impl EmailKind {
    /// Pick a template from the request text. Falls back to `Custom`.
    pub fn detect(query: &str) -> Self {
        let lowered = query.to_lowercase();
        if lowered.contains("enrollment certificate")
            || lowered.contains("certificate of enrollment")
            || lowered.contains("attestation")
        {
            Self::EnrollmentCertificate
        } else if lowered.contains("transcript") || lowered.contains("grade report") {
            Self::Transcript
        } else if lowered.contains("recommendation") {
            Self::RecommendationLetter
        } else if lowered.contains("internship") {
            Self::InternshipRequest
        } else if lowered.contains("leave of absence") || lowered.contains("absence") {
            Self::LeaveRequest
        } else if lowered.contains("complain") {
            Self::Complaint
        } else {
            Self::Custom
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::EnrollmentCertificate => "enrollment certificate request",
            Self::Complaint => "formal complaint",
            Self::InternshipRequest => "internship request letter",
            Self::LeaveRequest => "leave of absence request",
            Self::Transcript => "transcript request",
            Self::RecommendationLetter => "recommendation letter request",
            Self::Custom => "administrative email",
        }
    }

    fn required_fields(&self) -> &'static [EmailField] {
        use EmailField::*;
        match self {
            Self::EnrollmentCertificate => &[FullName, Program, Year, StudentId],
            Self::Complaint => &[FullName, Program, Year, StudentId, Subject],
            Self::InternshipRequest => &[FullName, Program, Year, StudentId, Company, Period],
            Self::LeaveRequest => &[FullName, Program, Year, StudentId, StartDate, EndDate, Reason],
            Self::Transcript => &[FullName, Program, Year, StudentId],
            Self::RecommendationLetter => &[FullName, Program, Year, StudentId, Recipient],
            Self::Custom => &[FullName, Content],
        }
    }

    fn optional_fields(&self) -> &'static [EmailField] {
        use EmailField::*;
        match self {
            Self::EnrollmentCertificate => &[Reason],
            Self::Complaint => &[Details],
            Self::InternshipRequest => &[Subject],
            Self::LeaveRequest => &[],
            Self::Transcript => &[Semester, Reason],
            Self::RecommendationLetter => &[Objective],
            Self::Custom => &[Program, Year, StudentId],
        }
    }
}

/// A single slot in an email template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailField {
    FullName,
    Program,
    Year,
    StudentId,
    Reason,
    Subject,
    Details,
    Company,
    Period,
    StartDate,
    EndDate,
    Semester,
    Recipient,
    Objective,
    Content,
}

impl EmailField {
    fn label(&self) -> &'static str {
        match self {
            Self::FullName => "Full name",
            Self::Program => "Program of study",
            Self::Year => "Year of study",
            Self::StudentId => "Student ID",
            Self::Reason => "Reason",
            Self::Subject => "Subject",
            Self::Details => "Details",
            Self::Company => "Company name",
            Self::Period => "Internship period",
            Self::StartDate => "Start date",
            Self::EndDate => "End date",
            Self::Semester => "Semester",
            Self::Recipient => "Recipient",
            Self::Objective => "Objective",
            Self::Content => "Request details",
        }
    }
}

/// The shape the generation provider is asked to reply with.
#[derive(Debug, Deserialize)]
struct EmailDraft {
    subject: String,
    body: String,
}

pub struct EmailHandler {
    generator: Arc<dyn GenerationProvider>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl EmailHandler {
    pub fn new(
        generator: Arc<dyn GenerationProvider>,
        model: impl Into<String>,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            generator,
            model: model.into(),
            temperature,
            max_output_tokens,
        }
    }

    fn build_prompt(kind: EmailKind, fields: &[(EmailField, String)]) -> String {
        let detail_lines: String = fields
            .iter()
            .map(|(field, value)| format!("- {}: {value}\n", field.label()))
            .collect();
        format!(
            "Draft a formal administrative email for a university context.\n\n\
             Email type: {}\n\
             Sender details:\n{detail_lines}\n\
             Requirements:\n\
             - Open with \"Dear Sir or Madam,\" unless a recipient is named in the details.\n\
             - Keep the tone formal and courteous.\n\
             - Close politely and sign with the sender's full name.\n\
             - Never mention an AI or an assistant.\n\n\
             Respond with ONLY a JSON object in this exact shape:\n\
             {{\"subject\": \"...\", \"body\": \"...\"}}",
            kind.name()
        )
    }

    /// Parse the model reply, tolerating code fences. A malformed reply
    /// becomes the draft body under a generic subject.
    fn parse_draft(raw: &str, sender: &str) -> EmailDraft {
        let stripped = strip_code_fences(raw);
        match serde_json::from_str::<EmailDraft>(stripped) {
            Ok(draft) => draft,
            Err(err) => {
                warn!(error = %err, "Email draft was not valid JSON, using raw text");
                EmailDraft {
                    subject: format!("Administrative request from {sender}"),
                    body: stripped.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl AgentHandler for EmailHandler {
    fn kind(&self) -> Intent {
        Intent::Email
    }

    async fn invoke(
        &self,
        query: &str,
        _context: &ConversationContext,
        session: &Session,
    ) -> Result<AgentResponse> {
        let kind = EmailKind::detect(query);
        debug!(kind = kind.name(), "Email request");

        // The session gives us the sender; the request text is the content.
        // Template-specific slots must be spelled out in the request.
        let provided = vec![
            (EmailField::FullName, session.user.clone()),
            (EmailField::Content, sanitize(query)),
        ];

        let missing: Vec<&str> = kind
            .required_fields()
            .iter()
            .filter(|field| !provided.iter().any(|(have, _)| have == *field))
            .map(EmailField::label)
            .collect();
        if !missing.is_empty() {
            return Ok(AgentResponse::new(
                Intent::Email,
                format!(
                    "To draft the {} for you, I still need: {}. Please include them in your request.",
                    kind.name(),
                    missing.join(", ")
                ),
            ));
        }

        let fields: Vec<(EmailField, String)> = provided
            .into_iter()
            .filter(|(field, _)| {
                kind.required_fields().contains(field) || kind.optional_fields().contains(field)
            })
            .collect();

        let request = GenerationRequest::new(&self.model, Self::build_prompt(kind, &fields))
            .with_temperature(self.temperature)
            .with_max_output_tokens(self.max_output_tokens);
        let reply = self.generator.complete(request).await?;

        let draft = Self::parse_draft(&reply, &session.user);
        Ok(AgentResponse::new(
            Intent::Email,
            format!("Subject: {}\n\n{}", draft.subject, draft.body),
        ))
    }
}

/// Trim, drop control characters (keeping line breaks and tabs) and cap
/// the length.
fn sanitize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .take(MAX_FIELD_CHARS)
        .collect()
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedGenerator;
    use campanile_core::error::ProviderError;
    use campanile_core::session::Role;

    fn session() -> Session {
        Session::new("Amina Benali", Role::Student, chrono::Duration::minutes(60))
    }

    fn handler(generator: Arc<ScriptedGenerator>) -> EmailHandler {
        EmailHandler::new(generator, "gemini-2.5-flash", 0.3, 1024)
    }

    #[test]
    fn detect_picks_the_right_template() {
        assert_eq!(
            EmailKind::detect("I need an enrollment certificate for my visa"),
            EmailKind::EnrollmentCertificate
        );
        assert_eq!(
            EmailKind::detect("Can you request my transcript?"),
            EmailKind::Transcript
        );
        assert_eq!(
            EmailKind::detect("I want to complain about the cafeteria"),
            EmailKind::Complaint
        );
        assert_eq!(
            EmailKind::detect("draft an internship request to Acme Corp"),
            EmailKind::InternshipRequest
        );
        assert_eq!(
            EmailKind::detect("I need a leave of absence next month"),
            EmailKind::LeaveRequest
        );
        assert_eq!(
            EmailKind::detect("ask Prof. Li for a recommendation"),
            EmailKind::RecommendationLetter
        );
        assert_eq!(
            EmailKind::detect("write an email to the registrar about my address change"),
            EmailKind::Custom
        );
    }

    #[tokio::test]
    async fn custom_request_drafts_immediately() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            r#"{"subject": "Address change request", "body": "Dear Sir or Madam,\n\nI would like to update my address.\n\nSincerely,\nAmina Benali"}"#.into(),
        )]));
        let email = handler(generator.clone());

        let response = email
            .invoke(
                "write an email to the registrar about my address change",
                &ConversationContext::default(),
                &session(),
            )
            .await
            .unwrap();

        assert_eq!(response.handler, Intent::Email);
        assert!(response.text.starts_with("Subject: Address change request\n\n"));
        assert!(response.text.contains("Dear Sir or Madam,"));
        assert!(!response.is_cacheable());
        assert_eq!(generator.call_count(), 1);

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Email type: administrative email"));
        assert!(prompt.contains("Full name: Amina Benali"));
        assert!(prompt.contains("Request details: write an email to the registrar"));
    }

    #[tokio::test]
    async fn template_with_missing_fields_asks_instead_of_generating() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let email = handler(generator.clone());

        let response = email
            .invoke(
                "I need an enrollment certificate",
                &ConversationContext::default(),
                &session(),
            )
            .await
            .unwrap();

        assert!(response.text.contains("enrollment certificate request"));
        assert!(response.text.contains("Program of study"));
        assert!(response.text.contains("Year of study"));
        assert!(response.text.contains("Student ID"));
        assert!(!response.text.contains("Full name"));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn fenced_json_reply_is_parsed() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            "```json\n{\"subject\": \"Hello\", \"body\": \"Dear Sir or Madam,\"}\n```".into(),
        )]));
        let email = handler(generator);

        let response = email
            .invoke(
                "write an email to housing services",
                &ConversationContext::default(),
                &session(),
            )
            .await
            .unwrap();

        assert!(response.text.starts_with("Subject: Hello\n\n"));
    }

    #[tokio::test]
    async fn malformed_reply_falls_back_to_raw_text() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            "Dear Sir or Madam, here is your letter.".into(),
        )]));
        let email = handler(generator);

        let response = email
            .invoke(
                "write an email to housing services",
                &ConversationContext::default(),
                &session(),
            )
            .await
            .unwrap();

        assert!(response
            .text
            .starts_with("Subject: Administrative request from Amina Benali\n\n"));
        assert!(response.text.ends_with("Dear Sir or Madam, here is your letter."));
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(ProviderError::RateLimited {
            retry_after_secs: 30,
        })]));
        let email = handler(generator);

        let result = email
            .invoke(
                "write an email to housing services",
                &ConversationContext::default(),
                &session(),
            )
            .await;

        assert!(result.is_err());
    }

    #[test]
    fn sanitize_strips_control_characters_and_caps_length() {
        assert_eq!(sanitize("  hello\u{0000} wor\u{001b}ld  "), "hello world");
        assert_eq!(sanitize("line one\nline two"), "line one\nline two");

        let long = "x".repeat(600);
        assert_eq!(sanitize(&long).chars().count(), MAX_FIELD_CHARS);
    }

    #[test]
    fn code_fence_stripping() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }
}
