//! Outreach message composer.
//!
//! Turns accumulated selections into a ready-to-send note for the team:
//! resolve three human-readable phrases from fixed dictionaries, then
//! interpolate them into one of four sentence templates picked uniformly
//! at random. No network calls.

use rand::Rng;
use serde_json::{Map, Value};

const FALLBACK_MESSAGE: &str = "I am looking to build a chatbot for my business. \
     I look forward to further discussing this with you.";

pub const TEMPLATE_COUNT: usize = 4;

/// Compose an outreach message from the session's selections and the
/// active or most recent flow. Without a flow the generic fallback is
/// returned. Pure given the same selections and the same random draw.
pub fn outreach_message(selections: &Map<String, Value>, flow_id: Option<&str>) -> String {
    if flow_id.is_none() {
        return FALLBACK_MESSAGE.to_string();
    }
    let index = rand::thread_rng().gen_range(0..TEMPLATE_COUNT);
    outreach_message_with_template(selections, flow_id, index)
}

/// Deterministic variant: caller supplies the template index.
pub fn outreach_message_with_template(
    selections: &Map<String, Value>,
    flow_id: Option<&str>,
    index: usize,
) -> String {
    let chatbot = chatbot_phrase(selections, flow_id);
    let channels = channel_phrase(selections.get("channels"));
    let audience = audience_phrase(selections.get("audience"));

    match index % TEMPLATE_COUNT {
        0 => format!(
            "Hi! I'm interested in building a {chatbot} for {channels} that will be used by \
             {audience}. I'd love to discuss this project with you."
        ),
        1 => format!(
            "Hello! I want to create a {chatbot} for {channels} to serve {audience}. \
             Let's schedule a call to discuss this further."
        ),
        2 => format!(
            "Hi there! I'm looking to build a {chatbot} for {channels} that will help \
             {audience}. I'd appreciate the opportunity to discuss this with your team."
        ),
        _ => format!(
            "Hello! I'm interested in developing a {chatbot} for {channels} to support \
             {audience}. I'd love to learn more about your services."
        ),
    }
}

/// Fill a flow step's message template with the session's raw selections.
pub fn fill_template(template: &str, selections: &Map<String, Value>) -> String {
    let channels =
        selection_text(selections.get("channels")).unwrap_or_else(|| "Not specified".to_string());
    let audience =
        selection_text(selections.get("audience")).unwrap_or_else(|| "Not specified".to_string());
    let contact = format_contact(selections.get("contact"));

    template
        .replace("{channels}", &channels)
        .replace("{audience}", &audience)
        .replace("{contact}", &contact)
}

/// Render contact details as a single comma-joined line.
pub fn format_contact(contact: Option<&Value>) -> String {
    let Some(Value::Object(fields)) = contact else {
        return "Not provided".to_string();
    };
    let mut parts = Vec::new();
    for (field, label) in [
        ("name", "Name"),
        ("email", "Email"),
        ("company", "Company"),
        ("note", "Note"),
    ] {
        if let Some(value) = fields.get(field).and_then(Value::as_str) {
            if !value.is_empty() {
                parts.push(format!("{label}: {value}"));
            }
        }
    }
    if parts.is_empty() {
        "Not provided".to_string()
    } else {
        parts.join(", ")
    }
}

fn chatbot_phrase(selections: &Map<String, Value>, flow_id: Option<&str>) -> &'static str {
    if let Some(value) = selections.get("what_chatbot").and_then(Value::as_str) {
        return match value {
            "support" => "customer support chatbot",
            "sales" => "sales assistant chatbot",
            "helpdesk" => "internal helpdesk chatbot",
            "automation" => "workflow automation chatbot",
            _ => "chatbot",
        };
    }
    match flow_id {
        Some("flow_customer_support") => "customer support chatbot",
        Some("flow_sales_assistant") => "sales assistant chatbot",
        Some("flow_internal_helpdesk") => "internal helpdesk chatbot",
        Some("flow_workflow_automation") => "workflow automation chatbot",
        _ => "chatbot",
    }
}

fn channel_phrase(value: Option<&Value>) -> String {
    phrase_for(value, "various channels", |v| match v {
        "web" => Some("website"),
        "mobile" => Some("mobile app"),
        "whatsapp_sms" => Some("WhatsApp/SMS"),
        "slack" => Some("Slack"),
        "teams" => Some("Microsoft Teams"),
        "voice" => Some("voice calls"),
        _ => None,
    })
}

fn audience_phrase(value: Option<&Value>) -> String {
    phrase_for(value, "our users", |v| match v {
        "customers" => Some("customers"),
        "prospects" => Some("potential customers"),
        "partners" => Some("partners"),
        "employees" => Some("employees"),
        "agents" => Some("support agents"),
        _ => None,
    })
}

/// Resolve a selection value (string or array of strings) through a
/// lookup, falling back to the raw value, or to `default` when unset.
fn phrase_for(
    value: Option<&Value>,
    default: &str,
    lookup: fn(&str) -> Option<&'static str>,
) -> String {
    match value {
        Some(Value::String(s)) => lookup(s).unwrap_or(s).to_string(),
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| lookup(s).unwrap_or(s))
            .collect::<Vec<_>>()
            .join(", "),
        _ => default.to_string(),
    }
}

/// Raw text for a selection value used in template interpolation.
fn selection_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selections() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("what_chatbot".to_string(), json!("support"));
        map.insert("channels".to_string(), json!("slack"));
        map.insert("audience".to_string(), json!("employees"));
        map
    }

    #[test]
    fn every_template_contains_the_resolved_phrases() {
        let selections = selections();
        for index in 0..TEMPLATE_COUNT {
            let message = outreach_message_with_template(
                &selections,
                Some("flow_customer_support"),
                index,
            );
            assert!(message.contains("customer support chatbot"), "{message}");
            assert!(message.contains("Slack"), "{message}");
            assert!(message.contains("employees"), "{message}");
        }
    }

    #[test]
    fn no_flow_yields_the_fallback() {
        let message = outreach_message(&selections(), None);
        assert_eq!(message, FALLBACK_MESSAGE);
    }

    #[test]
    fn flow_id_resolves_chatbot_type_when_unselected() {
        let mut selections = Map::new();
        selections.insert("channels".to_string(), json!("web"));
        let message =
            outreach_message_with_template(&selections, Some("flow_internal_helpdesk"), 1);
        assert!(message.contains("internal helpdesk chatbot"));
        assert!(message.contains("website"));
        assert!(message.contains("our users"));
    }

    #[test]
    fn array_selections_are_joined() {
        let mut selections = Map::new();
        selections.insert("channels".to_string(), json!(["web", "voice"]));
        let message = outreach_message_with_template(&selections, Some("flow_sales_assistant"), 0);
        assert!(message.contains("website, voice calls"));
    }

    #[test]
    fn unknown_values_pass_through_raw() {
        let mut selections = Map::new();
        selections.insert("channels".to_string(), json!("carrier_pigeon"));
        let message = outreach_message_with_template(&selections, Some("flow_sales_assistant"), 2);
        assert!(message.contains("carrier_pigeon"));
    }

    #[test]
    fn random_draw_stays_within_the_template_set() {
        let selections = selections();
        let expected: Vec<String> = (0..TEMPLATE_COUNT)
            .map(|i| outreach_message_with_template(&selections, Some("flow_customer_support"), i))
            .collect();
        for _ in 0..20 {
            let message = outreach_message(&selections, Some("flow_customer_support"));
            assert!(expected.contains(&message));
        }
    }

    #[test]
    fn fill_template_substitutes_all_placeholders() {
        let mut selections = selections();
        selections.insert(
            "contact".to_string(),
            json!({"name": "Ada", "email": "ada@example.com", "company": "", "note": "asap"}),
        );
        let filled = fill_template(
            "Type: X\n- Channels: {channels}\n- Audience: {audience}\n- Contact: {contact}",
            &selections,
        );
        assert!(filled.contains("- Channels: slack"));
        assert!(filled.contains("- Audience: employees"));
        assert!(filled.contains("Name: Ada, Email: ada@example.com, Note: asap"));
        assert!(!filled.contains('{'));
    }

    #[test]
    fn missing_selections_fill_as_not_specified() {
        let filled = fill_template(
            "{channels} / {audience} / {contact}",
            &Map::new(),
        );
        assert_eq!(filled, "Not specified / Not specified / Not provided");
    }

    #[test]
    fn contact_formatting_edge_cases() {
        assert_eq!(format_contact(None), "Not provided");
        assert_eq!(format_contact(Some(&json!("just a string"))), "Not provided");
        assert_eq!(format_contact(Some(&json!({}))), "Not provided");
        assert_eq!(
            format_contact(Some(&json!({"email": "a@b.com"}))),
            "Email: a@b.com"
        );
    }
}
