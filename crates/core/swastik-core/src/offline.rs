//! Synthetic reply used when no live backend is reachable

/// Ticket-style reply returned in offline mode
pub const OFFLINE_REPLY: &str = "Issue summary: System connectivity issues - customer inquiry
Category: technical
Priority: medium
Urgent: No
Sentiment: neutral

Ticket

ID: N/A
Status: N/A
Action taken: N/A

Suggested reply to customer

Dear valued customer,

Thank you for contacting us. We're currently experiencing some technical difficulties with our systems, but we've received your inquiry and are working to resolve it promptly.

We'll have a response for you shortly. If this is urgent, please don't hesitate to call our support line.

Thank you for your patience and understanding.

Sincerely,
SWASTIK Support Team

*Note: System is in mock mode - APIs currently unavailable*";

/// Offline reply; identical for every call
pub fn offline_reply() -> &'static str {
    OFFLINE_REPLY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_fields_present() {
        let reply = offline_reply();
        for line in [
            "Issue summary: System connectivity issues - customer inquiry",
            "Category: technical",
            "Priority: medium",
            "Urgent: No",
            "Sentiment: neutral",
            "Suggested reply to customer",
            "SWASTIK Support Team",
        ] {
            assert!(reply.lines().any(|l| l == line), "missing line: {line}");
        }
        assert!(reply.ends_with("*Note: System is in mock mode - APIs currently unavailable*"));
    }

    #[test]
    fn test_reply_is_static() {
        assert_eq!(offline_reply(), offline_reply());
        assert_eq!(offline_reply(), OFFLINE_REPLY);
    }
}
