//! Reply composition.

use crate::classifier::ClassificationResult;
use crate::message::InboundMessage;

/// Characters of the original body quoted back to the sender.
pub const SAMPLE_CHARS: usize = 240;

/// Reply addressed back to the original sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    pub subject: String,
    pub body: String,
    /// Original sender.
    pub recipient: String,
    /// Original recipient.
    pub sender: String,
}

/// Build the categorization reply for `message`.
pub fn compose(message: &InboundMessage, result: &ClassificationResult) -> ReplyMessage {
    let sample = body_sample(&message.body);
    let body = format!(
        "We received your email sent at {received} with the subject \"{subject}\".\r\n\r\n\
         Here is a {SAMPLE_CHARS} character sample of the email body:\r\n{sample}\r\n\r\n\
         The email was categorized as {label} with a {confidence}% confidence.",
        received = message.received,
        subject = message.subject,
        label = result.label,
        confidence = format_confidence(result.confidence_percent()),
    );

    ReplyMessage {
        subject: format!("Reply: {}", message.subject),
        body,
        recipient: message.sender.clone(),
        sender: message.recipient.clone(),
    }
}

/// First `SAMPLE_CHARS` characters of `body`.
pub fn body_sample(body: &str) -> &str {
    match body.char_indices().nth(SAMPLE_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Shortest round-trip form, with `.0` kept on whole numbers.
pub fn format_confidence(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Label;

    fn inbound(body: &str) -> InboundMessage {
        InboundMessage {
            sender: "alice@example.com".into(),
            recipient: "classify@mail.example.org".into(),
            subject: "Free prize".into(),
            received: "Mon, 06 May 2024 10:15:00 +0000".into(),
            body: body.into(),
        }
    }

    #[test]
    fn compose_full_reply() {
        let reply = compose(
            &inbound("Win now"),
            &ClassificationResult {
                label: Label::Spam,
                probability: 0.5,
            },
        );
        assert_eq!(reply.subject, "Reply: Free prize");
        assert_eq!(reply.recipient, "alice@example.com");
        assert_eq!(reply.sender, "classify@mail.example.org");
        assert_eq!(
            reply.body,
            "We received your email sent at Mon, 06 May 2024 10:15:00 +0000 with the subject \"Free prize\".\r\n\r\n\
             Here is a 240 character sample of the email body:\r\nWin now\r\n\r\n\
             The email was categorized as spam with a 50.0% confidence."
        );
    }

    #[test]
    fn sample_truncates_to_240_chars() {
        let long = "x".repeat(300);
        assert_eq!(body_sample(&long).len(), 240);

        let short = "short body";
        assert_eq!(body_sample(short), short);

        let exact = "y".repeat(240);
        assert_eq!(body_sample(&exact), exact);
    }

    #[test]
    fn sample_counts_chars_not_bytes() {
        let body = "é".repeat(250);
        let sample = body_sample(&body);
        assert_eq!(sample.chars().count(), 240);
        assert_eq!(sample.len(), 480);
    }

    #[test]
    fn reply_quotes_raw_body_prefix() {
        let body = format!("line one\r\nline two {}", "z".repeat(400));
        let reply = compose(
            &inbound(&body),
            &ClassificationResult {
                label: Label::Ham,
                probability: 0.1,
            },
        );
        let expected: String = body.chars().take(240).collect();
        assert!(reply.body.contains(&format!("body:\r\n{expected}\r\n\r\n")));
    }

    #[test]
    fn confidence_formatting_is_unrounded() {
        assert_eq!(format_confidence(100.0), "100.0");
        assert_eq!(format_confidence(0.0), "0.0");
        assert_eq!(format_confidence(98.76543), "98.76543");
        let p = 0.123_456_789_f64;
        assert_eq!(format_confidence(p * 100.0), (p * 100.0).to_string());
    }
}
