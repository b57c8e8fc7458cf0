//! Selection paraphrase and canned acknowledgments.
//!
//! When the user picks an option or submits the contact form, the widget
//! synthesizes a natural-language User turn from a fixed label dictionary
//! and answers with a canned acknowledgment keyed by which selection was
//! just made. Unknown values fall back to their raw form.

use serde_json::{Map, Value};

fn chatbot_label(value: &str) -> Option<&'static str> {
    Some(match value {
        "support" => "customer support chatbot",
        "sales" => "sales assistant chatbot",
        "helpdesk" => "internal helpdesk chatbot",
        "automation" => "workflow automation chatbot",
        _ => return None,
    })
}

fn channel_label(value: &str) -> Option<&'static str> {
    Some(match value {
        "web" => "Web",
        "mobile" => "Mobile",
        "whatsapp_sms" => "WhatsApp/SMS",
        "slack" => "Slack",
        "teams" => "Teams",
        "voice" => "Voice",
        _ => return None,
    })
}

fn audience_label(value: &str) -> Option<&'static str> {
    Some(match value {
        "customers" => "customers",
        "prospects" => "potential customers",
        "partners" => "partners",
        "employees" => "employees",
        "agents" => "support agents",
        _ => return None,
    })
}

/// Natural-language User turn paraphrasing a selection event.
pub fn selection_message(selections: &Map<String, Value>) -> String {
    let mut parts = Vec::new();

    if let Some(value) = selections.get("what_chatbot").and_then(Value::as_str) {
        parts.push(format!(
            "I want a {}.",
            chatbot_label(value).unwrap_or(value)
        ));
    }
    if let Some(value) = selections.get("channels").and_then(Value::as_str) {
        parts.push(format!(
            "I want this on {}.",
            channel_label(value).unwrap_or(value)
        ));
    }
    if let Some(value) = selections.get("audience").and_then(Value::as_str) {
        parts.push(format!(
            "I want this for {}.",
            audience_label(value).unwrap_or(value)
        ));
    }
    if selections.contains_key("contact") {
        parts.push("I've filled out my contact information.".to_string());
    }

    parts.join(" ")
}

/// Canned acknowledgment for a selection event.
/// Priority: what_chatbot > channels > audience > contact > generic.
pub fn acknowledgment(selections: &Map<String, Value>) -> &'static str {
    if selections.contains_key("what_chatbot") {
        "Great choice! Now let's determine which channels you'd like to use for your chatbot."
    } else if selections.contains_key("channels") {
        "Perfect! Now tell me who will be using this chatbot."
    } else if selections.contains_key("audience") {
        "Excellent! I have all the information I need. Let me prepare a message for you to send to our team."
    } else if selections.contains_key("contact") {
        "Thank you for providing your contact information! Your message is ready to send."
    } else {
        "Thanks for your selection! Let's continue."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(key: &str, value: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        map
    }

    #[test]
    fn paraphrases_each_known_key() {
        assert_eq!(
            selection_message(&event("what_chatbot", json!("support"))),
            "I want a customer support chatbot."
        );
        assert_eq!(
            selection_message(&event("channels", json!("whatsapp_sms"))),
            "I want this on WhatsApp/SMS."
        );
        assert_eq!(
            selection_message(&event("audience", json!("prospects"))),
            "I want this for potential customers."
        );
        assert_eq!(
            selection_message(&event("contact", json!({"name": "Ada"}))),
            "I've filled out my contact information."
        );
    }

    #[test]
    fn unknown_values_fall_back_to_raw_form() {
        assert_eq!(
            selection_message(&event("channels", json!("telex"))),
            "I want this on telex."
        );
    }

    #[test]
    fn acknowledgment_priority_order() {
        let mut both = event("channels", json!("slack"));
        both.insert("what_chatbot".to_string(), json!("sales"));
        assert!(acknowledgment(&both).starts_with("Great choice!"));

        assert!(acknowledgment(&event("channels", json!("slack"))).starts_with("Perfect!"));
        assert!(acknowledgment(&event("audience", json!("agents"))).starts_with("Excellent!"));
        assert!(acknowledgment(&event("contact", json!({}))).starts_with("Thank you"));
        assert_eq!(
            acknowledgment(&event("favorite_color", json!("green"))),
            "Thanks for your selection! Let's continue."
        );
    }
}
