//! Inbound message parsing: headers plus the primary body part.

use std::borrow::Cow;

use mail_parser::{HeaderName, Message, MessageParser, MessagePart, PartType};

use crate::error::MessageError;

/// One received email, as needed to classify and answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Bare address from the `From` header.
    pub sender: String,
    /// Bare address from the `To` header (first mailbox).
    pub recipient: String,
    /// Subject line, empty if absent.
    pub subject: String,
    /// `Date` header exactly as received, empty if absent.
    pub received: String,
    /// Decoded text of the primary body part, untouched.
    pub body: String,
}

impl InboundMessage {
    /// Parse a raw RFC 5322 message.
    pub fn parse(raw: &[u8]) -> Result<Self, MessageError> {
        let parsed = MessageParser::default()
            .parse(raw)
            .ok_or(MessageError::Unparseable)?;

        let sender = first_address(parsed.from()).ok_or(MessageError::MissingHeader("from"))?;
        let recipient = first_address(parsed.to()).ok_or(MessageError::MissingHeader("to"))?;
        let subject = parsed.subject().unwrap_or_default().to_string();
        let received = received_at(&parsed);

        let body = part_text(primary_part(&parsed)?).into_owned();

        Ok(Self {
            sender,
            recipient,
            subject,
            received,
            body,
        })
    }

    /// Body collapsed onto one line for feature extraction.
    pub fn normalized_body(&self) -> String {
        normalize_body(&self.body)
    }
}

/// The part a reply quotes and the classifier sees.
///
/// A single-part message is its own primary part. For multipart messages
/// this is the first child, descending through nested multiparts.
pub fn primary_part<'a, 'x>(message: &'a Message<'x>) -> Result<&'a MessagePart<'x>, MessageError> {
    let mut part = message.parts.first().ok_or(MessageError::NoBodyParts)?;
    while let PartType::Multipart(children) = &part.body {
        let first = children.first().ok_or(MessageError::NoBodyParts)?;
        part = message
            .parts
            .get(*first as usize)
            .ok_or(MessageError::NoBodyParts)?;
    }
    Ok(part)
}

/// Drop carriage returns, turn newlines into single spaces.
pub fn normalize_body(body: &str) -> String {
    body.replace('\r', "").replace('\n', " ")
}

fn part_text<'a>(part: &'a MessagePart<'_>) -> Cow<'a, str> {
    match &part.body {
        PartType::Text(text) | PartType::Html(text) => Cow::Borrowed(text.as_ref()),
        _ => String::from_utf8_lossy(part.contents()),
    }
}

/// Raw `Date` header value, trimmed. Falls back to the parsed date when the
/// raw value is empty.
fn received_at(message: &Message<'_>) -> String {
    message
        .header_raw(HeaderName::Date)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
        .or_else(|| message.date().map(|d| d.to_rfc822()))
        .unwrap_or_default()
}

fn first_address(addr: Option<&mail_parser::Address>) -> Option<String> {
    addr.and_then(|a| a.first())
        .and_then(|a| a.address())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART: &str = concat!(
        "From: Alice Example <alice@example.com>\r\n",
        "To: classify@mail.example.org\r\n",
        "Subject: Free prize\r\n",
        "Date: Mon, 6 May 2024 10:15:00 +0000\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/alternative; boundary=\"b1\"\r\n",
        "\r\n",
        "--b1\r\n",
        "Content-Type: text/plain; charset=\"UTF-8\"\r\n",
        "\r\n",
        "Congratulations!\r\nYou have won a prize.\r\n",
        "--b1\r\n",
        "Content-Type: text/html; charset=\"UTF-8\"\r\n",
        "\r\n",
        "<p>Congratulations!</p>\r\n",
        "--b1--\r\n",
    );

    #[test]
    fn parse_headers_and_first_part() {
        let msg = InboundMessage::parse(MULTIPART.as_bytes()).unwrap();
        assert_eq!(msg.sender, "alice@example.com");
        assert_eq!(msg.recipient, "classify@mail.example.org");
        assert_eq!(msg.subject, "Free prize");
        assert_eq!(msg.received, "Mon, 6 May 2024 10:15:00 +0000");
        assert!(msg.body.starts_with("Congratulations!"));
        assert!(msg.body.contains("You have won a prize."));
        assert!(!msg.body.contains("<p>"));
    }

    #[test]
    fn single_part_message_is_its_own_primary_part() {
        let raw = concat!(
            "From: bob@example.com\r\n",
            "To: classify@mail.example.org\r\n",
            "Subject: Lunch\r\n",
            "\r\n",
            "See you at noon.\r\n",
        );
        let msg = InboundMessage::parse(raw.as_bytes()).unwrap();
        assert_eq!(msg.body.trim_end(), "See you at noon.");
        assert_eq!(msg.received, "");
    }

    #[test]
    fn nested_multipart_descends_to_first_leaf() {
        let raw = concat!(
            "From: carol@example.com\r\n",
            "To: classify@mail.example.org\r\n",
            "Subject: Nested\r\n",
            "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "inner text\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "second part\r\n",
            "--outer--\r\n",
        );
        let msg = InboundMessage::parse(raw.as_bytes()).unwrap();
        assert_eq!(msg.body.trim_end(), "inner text");
    }

    #[test]
    fn date_header_is_quoted_as_received() {
        let raw = concat!(
            "From: erin@example.com\r\n",
            "To: classify@mail.example.org\r\n",
            "Subject: Zone\r\n",
            "Date: Mon, 6 May 2024 10:15:00 GMT\r\n",
            "\r\n",
            "hi\r\n",
        );
        let msg = InboundMessage::parse(raw.as_bytes()).unwrap();
        assert_eq!(msg.received, "Mon, 6 May 2024 10:15:00 GMT");
    }

    #[test]
    fn unparseable_date_is_kept_verbatim() {
        let raw = concat!(
            "From: erin@example.com\r\n",
            "To: classify@mail.example.org\r\n",
            "Subject: Vague\r\n",
            "Date: 6th of May, around ten\r\n",
            "\r\n",
            "hi\r\n",
        );
        let msg = InboundMessage::parse(raw.as_bytes()).unwrap();
        assert_eq!(msg.received, "6th of May, around ten");
    }

    #[test]
    fn multipart_without_parts_fails() {
        let raw = concat!(
            "From: dave@example.com\r\n",
            "To: classify@mail.example.org\r\n",
            "Subject: Empty\r\n",
            "Content-Type: multipart/mixed; boundary=\"b2\"\r\n",
            "\r\n",
            "--b2--\r\n",
        );
        assert!(matches!(
            InboundMessage::parse(raw.as_bytes()),
            Err(MessageError::NoBodyParts)
        ));
    }

    #[test]
    fn missing_from_header_fails() {
        let raw = "To: classify@mail.example.org\r\nSubject: x\r\n\r\nbody\r\n";
        assert!(matches!(
            InboundMessage::parse(raw.as_bytes()),
            Err(MessageError::MissingHeader("from"))
        ));
    }

    #[test]
    fn normalize_collapses_line_breaks() {
        assert_eq!(normalize_body("a\r\nb\nc\rd"), "a b cd");
        assert_eq!(normalize_body("one line"), "one line");
        assert_eq!(normalize_body("\r\n\r\n"), "  ");
    }
}
