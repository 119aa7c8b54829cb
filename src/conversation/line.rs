use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(Q|A|System|Error): (.*)$").expect("valid line pattern"));

/// One entry of the conversation log, persisted as `"<Prefix>: <text>"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ChatLine {
    Question(String),
    Answer(String),
    System(String),
    Error(String),
    /// Persisted string without a known prefix, written back unchanged
    Raw(String),
}

impl ChatLine {
    pub fn question(text: impl Into<String>) -> Self {
        ChatLine::Question(text.into())
    }

    pub fn answer(text: impl Into<String>) -> Self {
        ChatLine::Answer(text.into())
    }

    pub fn system(text: impl Into<String>) -> Self {
        ChatLine::System(text.into())
    }

    pub fn error(text: impl Into<String>) -> Self {
        ChatLine::Error(text.into())
    }

    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            ChatLine::Question(_) => Some("Q"),
            ChatLine::Answer(_) => Some("A"),
            ChatLine::System(_) => Some("System"),
            ChatLine::Error(_) => Some("Error"),
            ChatLine::Raw(_) => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ChatLine::Question(text)
            | ChatLine::Answer(text)
            | ChatLine::System(text)
            | ChatLine::Error(text)
            | ChatLine::Raw(text) => text,
        }
    }

    /// Parse a persisted line. Unprefixed strings are kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let Some(caps) = LINE_PATTERN.captures(raw) else {
            return ChatLine::Raw(raw.to_string());
        };

        let text = caps[2].to_string();
        match &caps[1] {
            "Q" => ChatLine::Question(text),
            "A" => ChatLine::Answer(text),
            "Error" => ChatLine::Error(text),
            _ => ChatLine::System(text),
        }
    }
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix() {
            Some(prefix) => write!(f, "{}: {}", prefix, self.text()),
            None => f.write_str(self.text()),
        }
    }
}

impl From<ChatLine> for String {
    fn from(line: ChatLine) -> Self {
        line.to_string()
    }
}

impl From<String> for ChatLine {
    fn from(raw: String) -> Self {
        ChatLine::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        for line in [
            ChatLine::question("hi"),
            ChatLine::answer("hello"),
            ChatLine::system("Loaded notes.txt"),
            ChatLine::error("service error 500"),
        ] {
            assert_eq!(ChatLine::parse(&line.to_string()), line);
        }
        assert_eq!(ChatLine::question("hi").to_string(), "Q: hi");
    }

    #[test]
    fn test_parse_multiline_text() {
        let line = ChatLine::parse("A: first\nsecond");
        assert_eq!(line, ChatLine::answer("first\nsecond"));
    }

    #[test]
    fn test_parse_unprefixed_kept_verbatim() {
        for raw in ["Calculation: 1 + 1 = 2", "Math Error: division by zero", "no prefix"] {
            let line = ChatLine::parse(raw);
            assert_eq!(line, ChatLine::Raw(raw.to_string()));
            assert_eq!(line.prefix(), None);
            assert_eq!(line.to_string(), raw);
        }
    }

    #[test]
    fn test_serde_as_plain_strings() {
        let lines = vec![ChatLine::question("hi"), ChatLine::answer("hello")];
        let json = serde_json::to_string(&lines).unwrap();
        assert_eq!(json, r#"["Q: hi","A: hello"]"#);

        let back: Vec<ChatLine> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lines);
    }
}
