//! Tag protocol and component registry.
//!
//! Assistant turns may embed bracketed tokens. The last non-numeric token
//! is a component tag selecting which interactive unit to render; purely
//! numeric tokens are citation markers and are left alone. The registry
//! maps each recognized tag to a serializable component definition, so new
//! dialogue steps only need a new registration, not new dispatch code.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([A-Za-z0-9_]+)\]").expect("token regex is valid"))
}

/// Extract the component tag from assistant text: the last bracketed token
/// that is not purely numeric, lower-cased.
pub fn extract_tag(text: &str) -> Option<String> {
    token_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .filter(|tag| !tag.chars().all(|c| c.is_ascii_digit()))
        .last()
}

/// Remove the last occurrence of `[tag]` from the text, trimming trailing
/// whitespace. Citation markers and any earlier occurrences stay in place.
pub fn strip_tag(text: &str, tag: &str) -> String {
    let mut range = None;
    for caps in token_regex().captures_iter(text) {
        if let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) {
            if token.as_str().eq_ignore_ascii_case(tag) {
                range = Some(whole.range());
            }
        }
    }
    match range {
        Some(r) => {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..r.start]);
            out.push_str(&text[r.end..]);
            out.trim_end().to_string()
        }
        None => text.to_string(),
    }
}

/// One choice in a button group. A `flow_id` makes picking the option
/// enter that flow before the selection is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ButtonOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
}

/// A renderable interactive unit bound to a tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    ButtonGroup {
        title: String,
        selection_key: String,
        options: Vec<ButtonOption>,
    },
    ContactForm {
        title: String,
        selection_key: String,
        fields: Vec<String>,
    },
    MessageComposer {
        title: String,
    },
    Link {
        title: String,
        href: String,
    },
    Notice {
        text: String,
    },
}

/// Registry mapping tag identifiers to component definitions.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Component>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: impl Into<String>, component: Component) {
        self.components.insert(tag.into(), component);
    }

    /// Look up the component for a tag. Unrecognized tags resolve to None;
    /// the surrounding text is still shown.
    pub fn get(&self, tag: &str) -> Option<&Component> {
        self.components.get(&tag.trim().to_lowercase())
    }

    /// All registered tags.
    pub fn tags(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Flow associated with picking `value` on the selector for `key`,
    /// if any button group carries one.
    pub fn flow_for_selection(&self, key: &str, value: &str) -> Option<&str> {
        self.components.values().find_map(|component| match component {
            Component::ButtonGroup {
                selection_key,
                options,
                ..
            } if selection_key == key => options
                .iter()
                .find(|option| option.value == value)
                .and_then(|option| option.flow_id.as_deref()),
            _ => None,
        })
    }

    /// The seven built-in components.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(
            "button_group_what_chatbot",
            Component::ButtonGroup {
                title: "What kind of chatbot are you looking for?".to_string(),
                selection_key: "what_chatbot".to_string(),
                options: vec![
                    flow_option("Customer Support", "support", "flow_customer_support"),
                    flow_option("Sales Assistant", "sales", "flow_sales_assistant"),
                    flow_option("Internal Helpdesk", "helpdesk", "flow_internal_helpdesk"),
                    flow_option("Workflow Automation", "automation", "flow_workflow_automation"),
                ],
            },
        );
        registry.register(
            "button_group_channels",
            Component::ButtonGroup {
                title: "Which channels?".to_string(),
                selection_key: "channels".to_string(),
                options: vec![
                    option("Web", "web"),
                    option("Mobile", "mobile"),
                    option("WhatsApp/SMS", "whatsapp_sms"),
                    option("Slack", "slack"),
                    option("Teams", "teams"),
                    option("Voice", "voice"),
                ],
            },
        );
        registry.register(
            "button_group_audience",
            Component::ButtonGroup {
                title: "Who will use it?".to_string(),
                selection_key: "audience".to_string(),
                options: vec![
                    option("Customers", "customers"),
                    option("Prospects", "prospects"),
                    option("Partners", "partners"),
                    option("Employees", "employees"),
                    option("Agents", "agents"),
                ],
            },
        );
        registry.register(
            "contact_form",
            Component::ContactForm {
                title: "Share your contact details".to_string(),
                selection_key: "contact".to_string(),
                fields: ["name", "email", "company", "note"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
        );
        registry.register(
            "send_message",
            Component::MessageComposer {
                title: "Review your message".to_string(),
            },
        );
        registry.register(
            "book_demo",
            Component::Link {
                title: "Book a Demo".to_string(),
                href: "https://cal.com".to_string(),
            },
        );
        registry.register(
            "thank_you",
            Component::Notice {
                text: "Thank you for your interest! We'll be in touch soon.".to_string(),
            },
        );

        registry
    }
}

fn option(label: &str, value: &str) -> ButtonOption {
    ButtonOption {
        label: label.to_string(),
        value: value.to_string(),
        flow_id: None,
    }
}

fn flow_option(label: &str, value: &str, flow_id: &str) -> ButtonOption {
    ButtonOption {
        label: label.to_string(),
        value: value.to_string(),
        flow_id: Some(flow_id.to_string()),
    }
}
