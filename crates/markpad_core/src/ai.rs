//! Wire types and stream codec for AI-assisted generation.
//!
//! The backend emits `data: {json}\n\n` frames; clients accumulate content
//! in a [`GenerationBuffer`] and only touch the document on an explicit
//! apply.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Maximum prompt length accepted from clients, in bytes.
pub const MAX_PROMPT_LEN: usize = 4_000;

/// Request body for `POST /api/ai/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub current_markdown: String,
    #[serde(default)]
    pub replace_mode: bool,
    pub user_prompt: String,
}

impl GenerateRequest {
    /// Reject blank or oversized prompts and oversized documents.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] describing the first violation.
    pub fn validate(&self, max_document_size: usize) -> Result<(), AppError> {
        if self.user_prompt.trim().is_empty() {
            return Err(AppError::BadRequest("Prompt must not be empty".to_string()));
        }
        if self.user_prompt.len() > MAX_PROMPT_LEN {
            return Err(AppError::BadRequest(format!(
                "Prompt exceeds maximum of {} bytes",
                MAX_PROMPT_LEN
            )));
        }
        if self.current_markdown.len() > max_document_size {
            return Err(AppError::BadRequest(format!(
                "Document exceeds maximum of {} bytes",
                max_document_size
            )));
        }
        Ok(())
    }

    pub fn apply_mode(&self) -> ApplyMode {
        if self.replace_mode {
            ApplyMode::Replace
        } else {
            ApplyMode::Append
        }
    }

    /// Chat messages sent to the upstream provider.
    ///
    /// The system turn pins the output format; the current document is only
    /// included when it has content.
    pub fn prompt_messages(&self) -> Vec<ChatMessage> {
        let instruction = if self.replace_mode {
            "Rewrite the document according to the request. Reply with the complete new document in Markdown only."
        } else {
            "Write new Markdown to append after the document according to the request. Reply with the new Markdown only."
        };
        let mut messages = vec![ChatMessage::new(
            "system",
            format!("You are a writing assistant inside a Markdown editor. {}", instruction),
        )];
        if !self.current_markdown.trim().is_empty() {
            messages.push(ChatMessage::new(
                "user",
                format!("Current document:\n\n{}", self.current_markdown),
            ));
        }
        messages.push(ChatMessage::new("user", self.user_prompt.trim()));
        messages
    }
}

/// Role-tagged message in an OpenAI-compatible chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// One event of the generation stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamFrame {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: Some(true),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

/// Serialize a frame as an event-stream record.
///
/// # Errors
/// Returns [`AppError::Json`] if serialization fails.
pub fn encode_frame(frame: &StreamFrame) -> Result<String, AppError> {
    Ok(format!("data: {}\n\n", serde_json::to_string(frame)?))
}

/// Parse the `data` payload of one event into a frame.
///
/// # Errors
/// Returns [`AppError::Json`] when the payload is not a frame object.
pub fn decode_frame(data: &str) -> Result<StreamFrame, AppError> {
    Ok(serde_json::from_str(data.trim())?)
}

/// Incremental event-stream splitter.
///
/// Chunks may end anywhere, including inside a multi-byte character; only
/// complete events are yielded.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return the `data` payloads of completed events.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));
        let mut payloads = Vec::new();
        while let Some(boundary) = find_event_boundary(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..boundary + 2).collect();
            if let Some(data) = event_data(&event[..boundary]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        event_data(&rest)
    }
}

fn find_event_boundary(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}

fn event_data(event: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(event);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// How generated text is combined with the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Replace,
    Append,
}

/// Lifecycle of a generation stream as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    Streaming,
    Done,
    Failed(String),
}

/// Accumulates streamed content until the user applies it.
#[derive(Debug, Clone)]
pub struct GenerationBuffer {
    content: String,
    status: GenerationStatus,
}

impl Default for GenerationBuffer {
    fn default() -> Self {
        Self {
            content: String::new(),
            status: GenerationStatus::Streaming,
        }
    }
}

impl GenerationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one frame into the buffer.
    ///
    /// # Returns
    /// `false` when the stream had already terminated and the frame was
    /// ignored.
    pub fn push_frame(&mut self, frame: StreamFrame) -> bool {
        if self.status != GenerationStatus::Streaming {
            return false;
        }
        if let Some(content) = frame.content {
            self.content.push_str(&content);
        }
        if let Some(error) = frame.error {
            self.status = GenerationStatus::Failed(error);
        } else if frame.done.unwrap_or(false) {
            self.status = GenerationStatus::Done;
        }
        true
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn is_done(&self) -> bool {
        self.status == GenerationStatus::Done
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            GenerationStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Document text that applying the buffer to `current` would produce.
    pub fn applied_to(&self, current: &str, mode: ApplyMode) -> String {
        match mode {
            ApplyMode::Replace => self.content.clone(),
            ApplyMode::Append if current.trim().is_empty() => self.content.clone(),
            ApplyMode::Append => {
                let mut out = current.trim_end_matches('\n').to_string();
                out.push_str("\n\n");
                out.push_str(&self.content);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_frames_omit_absent_fields() {
        let encoded = encode_frame(&StreamFrame::content("hi")).expect("encode");
        assert_eq!(encoded, "data: {\"content\":\"hi\"}\n\n");
        let done = encode_frame(&StreamFrame::done()).expect("encode");
        assert_eq!(done, "data: {\"done\":true}\n\n");
    }

    #[test]
    fn decoder_handles_split_chunks_and_multibyte_text() {
        let stream = "data: {\"content\":\"héllo\"}\n\ndata: {\"done\":true}\n\n";
        let bytes = stream.as_bytes();
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        // Split inside the two-byte 'é'.
        let split = stream.find('é').expect("accent") + 1;
        for chunk in [&bytes[..split], &bytes[split..]] {
            for data in decoder.push(chunk) {
                frames.push(decode_frame(&data).expect("frame"));
            }
        }
        assert_eq!(
            frames,
            vec![StreamFrame::content("héllo"), StreamFrame::done()]
        );
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn prompt_includes_document_only_when_present() {
        let mut request = GenerateRequest {
            current_markdown: String::new(),
            replace_mode: false,
            user_prompt: "  add a summary ".to_string(),
        };
        let messages = request.prompt_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("append"));
        assert_eq!(messages[1].content, "add a summary");

        request.current_markdown = "# Notes".to_string();
        request.replace_mode = true;
        let messages = request.prompt_messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].content.contains("Rewrite"));
        assert!(messages[1].content.ends_with("# Notes"));
    }

    #[test]
    fn decoder_ignores_comments_and_accepts_crlf() {
        let mut decoder = FrameDecoder::new();
        let payloads = decoder.push(b": keep-alive\r\n\r\ndata: [DONE]\r\n\r\n");
        assert_eq!(payloads, vec!["[DONE]".to_string()]);
    }

    #[test]
    fn decoder_flushes_unterminated_tail() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"done\":true}").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("{\"done\":true}"));
    }

    #[test]
    fn buffer_accumulates_until_done_then_ignores_frames() {
        let mut buffer = GenerationBuffer::new();
        assert!(buffer.push_frame(StreamFrame::content("# Title")));
        assert!(buffer.push_frame(StreamFrame::content("\nBody")));
        assert!(buffer.push_frame(StreamFrame::done()));
        assert!(!buffer.push_frame(StreamFrame::content("late")));
        assert!(buffer.is_done());
        assert_eq!(buffer.content(), "# Title\nBody");
    }

    #[test]
    fn buffer_records_error() {
        let mut buffer = GenerationBuffer::new();
        buffer.push_frame(StreamFrame::content("partial"));
        buffer.push_frame(StreamFrame::error("provider failed"));
        assert_eq!(buffer.error(), Some("provider failed"));
        assert_eq!(buffer.content(), "partial");
    }

    #[test]
    fn apply_modes() {
        let mut buffer = GenerationBuffer::new();
        buffer.push_frame(StreamFrame::content("new"));
        assert_eq!(buffer.applied_to("old\n", ApplyMode::Replace), "new");
        assert_eq!(buffer.applied_to("old\n", ApplyMode::Append), "old\n\nnew");
        assert_eq!(buffer.applied_to("  ", ApplyMode::Append), "new");
    }

    #[test]
    fn request_validation() {
        let mut request = GenerateRequest {
            current_markdown: String::new(),
            replace_mode: true,
            user_prompt: "  ".to_string(),
        };
        assert!(request.validate(10).is_err());
        request.user_prompt = "write a haiku".to_string();
        assert!(request.validate(10).is_ok());
        assert_eq!(request.apply_mode(), ApplyMode::Replace);
        request.current_markdown = "x".repeat(11);
        assert!(request.validate(10).is_err());
    }

    #[test]
    fn request_uses_camel_case_fields() {
        let request: GenerateRequest = serde_json::from_str(
            r##"{"currentMarkdown":"# Doc","replaceMode":false,"userPrompt":"expand"}"##,
        )
        .expect("parse");
        assert_eq!(request.current_markdown, "# Doc");
        assert_eq!(request.apply_mode(), ApplyMode::Append);
    }
}
