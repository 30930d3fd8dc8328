//! Support agent: returns, order problems, account help, complaints.
//!
//! Pure text rules; never touches the store.

const RETURN_POLICY: &str = "Our return policy:\n\
- Returns and exchanges are accepted within 30 days of delivery\n\
- Items must be unworn with original tags attached\n\
- Refunds go back to your original payment method within 5-7 business days\n\
- Exchanges for a different size or color ship free\n\n\
Would you like me to start a return or exchange for one of your orders?";

const ORDER_ISSUE: &str = "I'm sorry there's a problem with your order. \
I can arrange a free replacement or a full refund. \
Please share your order number and a photo of the item, \
and I'll get this resolved right away.";

const ACCOUNT_HELP: &str = "I can help with your account:\n\
- Reset your password from the sign-in page using \"Forgot password\"\n\
- Update your profile, addresses, and preferences under Account Settings\n\
- Contact us if you can't access your email and we'll verify your identity";

const COMPLAINT: &str = "I'm really sorry to hear about your experience. \
Your feedback matters to us and I've noted it for our customer care team. \
Could you tell me a bit more about what happened so I can make it right?";

const TOPICS: &str = "I'm here to help! I can assist with:\n\
- Returns and exchanges\n\
- Damaged or incorrect items\n\
- Account and login issues\n\
- Feedback and complaints\n\n\
What can I help you with?";

pub fn handle(message: &str) -> String {
    let lowered = message.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| lowered.contains(k));

    let reply = if has(&["return", "exchange", "refund"]) {
        RETURN_POLICY
    } else if has(&["wrong item", "damaged", "defective", "quality issue"]) {
        ORDER_ISSUE
    } else if has(&["account", "login", "log in", "password", "profile"]) {
        ACCOUNT_HELP
    } else if has(&["complaint", "unhappy", "disappointed", "problem"]) {
        COMPLAINT
    } else {
        TOPICS
    };
    reply.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_by_keyword() {
        assert!(handle("Can I return this dress?").contains("30 days"));
        assert!(handle("the zipper arrived damaged").contains("replacement"));
        assert!(handle("I forgot my password").contains("Forgot password"));
        assert!(handle("I'm very disappointed").contains("sorry to hear"));
        assert!(handle("help").contains("What can I help you with?"));
    }

    #[test]
    fn test_returns_take_precedence() {
        // Refund of a damaged item is still a returns question first.
        assert!(handle("refund for a damaged item").contains("return policy"));
    }
}
