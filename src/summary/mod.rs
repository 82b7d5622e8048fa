//! Structured call summaries (summary-mode indexing).
//!
//! One LLM-generated summary per transcript, following a strict template so
//! summaries are comparable and searchable across calls.

use crate::error::{Result, SamtaleError};
use crate::openai::{create_client, SUMMARY_TIMEOUT};
use crate::transcript::ParsedTranscript;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are an expert at analyzing call transcripts and creating \
    structured summaries. Follow instructions precisely and never fabricate information.";

/// Trait for structured summary generation.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Generate the structured summary text for a parsed transcript.
    async fn summarize(&self, transcript: &ParsedTranscript) -> Result<String>;
}

/// OpenAI-based summarizer.
pub struct OpenAISummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAISummarizer {
    pub fn new() -> Self {
        Self::with_model("gpt-4-turbo")
    }

    pub fn with_model(model: &str) -> Self {
        Self {
            client: create_client(SUMMARY_TIMEOUT),
            model: model.to_string(),
        }
    }

    /// Build the summary prompt around the full transcript text.
    fn build_prompt(transcript: &ParsedTranscript) -> String {
        format!(
            r#"Analyze this call transcript and create a structured summary.

CRITICAL INSTRUCTION: ONLY extract information that is EXPLICITLY stated in the transcript. DO NOT invent, assume, or fabricate ANY information. If information is not mentioned, write "Unknown" or leave blank as specified.

Format your response EXACTLY as follows:

CALL TYPE: [guidance session/demo/onboarding/sales call/technical review/etc]
PARTICIPANTS: [List ALL participants who spoke in the call: Name (Role), Name (Role), ...] - Include every person who spoke, extract names and roles exactly as stated
COMPANY/COMPANIES: [Only list companies explicitly mentioned as where participants work. If not stated, write "Unknown"]
DATE: [Extract if mentioned in transcript, otherwise write "Unknown"]
DURATION: [Extract if mentioned, otherwise write "Unknown"]

SUMMARY:
[2-3 well-organized paragraphs covering the main discussion points. Organize by topic/theme, not chronologically. Include specific technical details, decisions made, and context.]

KEY TOPICS:
- [Topic 1 with brief context]
- [Topic 2 with brief context]
- [Topic 3 with brief context]

ACTION ITEMS:
- [Action item 1]
- [Action item 2]

DECISIONS MADE:
- [Decision 1]
- [Decision 2]

Guidelines:
- IMPORTANT: Follow the structured format above EXACTLY, even for long transcripts
- PARTICIPANTS: List EVERY person who spoke in the call - do not omit anyone
- Use full names consistently (e.g., "Brian Hopkins" not "Brian" or "Hopkins")
- Extract roles exactly as mentioned in the transcript (e.g., "CMO", "VP of Engineering")
- For COMPANY/COMPANIES: ONLY include if the transcript explicitly states where someone works (e.g., "John from Acme Corp"). If roles are mentioned without companies, write "Unknown"
- Be specific about technical topics (don't just say "API discussion", say "OAuth 2.0 authentication implementation")
- Preserve important details like timelines, numbers, specific product names
- DO NOT make up or infer information that is not explicitly in the transcript

Transcript:
{}"#,
            transcript.full_text()
        )
    }
}

impl Default for OpenAISummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for OpenAISummarizer {
    async fn summarize(&self, transcript: &ParsedTranscript) -> Result<String> {
        info!(
            "Generating structured summary for transcript with {} segments",
            transcript.segments.len()
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| SamtaleError::Summary(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::build_prompt(transcript))
                .build()
                .map_err(|e| SamtaleError::Summary(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(4000u32)
            .build()
            .map_err(|e| SamtaleError::Summary(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SamtaleError::OpenAI(format!("Summary API error: {}", e)))?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if summary.is_empty() {
            return Err(SamtaleError::Summary(
                "API returned an empty summary".to_string(),
            ));
        }

        debug!("Summary generated ({} characters)", summary.len());
        Ok(summary)
    }
}
