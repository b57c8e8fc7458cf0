//! Flow table — static declarative data describing the scripted
//! lead-qualification dialogues.
//!
//! Loaded once at startup and immutable thereafter. The built-in table
//! mirrors what `/flows` serves; an override file can replace it wholesale.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Tag appended to the greeting so a fresh flow can be selected.
pub const ENTRY_TAG: &str = "button_group_what_chatbot";

/// One scripted assistant turn within a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStep {
    pub assistant: String,
    /// Identifier of the interactive unit rendered with this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Template with `{channels}`, `{audience}`, `{contact}` placeholders,
    /// filled in by the composer when this step is reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,
}

impl FlowStep {
    /// Assistant text with the step's tag appended as a bracketed token.
    pub fn content(&self) -> String {
        match &self.tag {
            Some(tag) => format!("{} [{}]", self.assistant, tag),
            None => self.assistant.clone(),
        }
    }
}

/// A named, linear, scripted sequence of assistant prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// Literal prefixes that start this flow when matched against
    /// lower-cased free text.
    #[serde(default)]
    pub start_triggers: Vec<String>,
    /// Literal prefix free text must start with to advance the flow
    /// while it is active.
    #[serde(default)]
    pub continue_prefix: String,
    #[serde(default)]
    pub sequence: Vec<FlowStep>,
}

impl Flow {
    /// A flow missing triggers or steps is never entered via free text.
    /// Malformed entries are no-ops, not errors.
    pub fn is_enterable(&self) -> bool {
        !self.start_triggers.is_empty() && !self.sequence.is_empty()
    }
}

/// The full flow table: greeting, completion message, and named flows.
///
/// Flows are held in a `BTreeMap` so trigger matching iterates in a
/// deterministic order ("first encountered wins"). The built-in trigger
/// sets are disjoint, so ordering never changes which flow is entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowTable {
    pub greeting: String,
    pub thank_you: String,
    #[serde(default)]
    pub flows: BTreeMap<String, Flow>,
}

impl FlowTable {
    pub fn get(&self, flow_id: &str) -> Option<&Flow> {
        self.flows.get(flow_id)
    }

    /// Greeting turn content with the entry selector appended.
    pub fn greeting_content(&self) -> String {
        format!("{} [{}]", self.greeting, ENTRY_TAG)
    }

    /// Load the table from an optional JSON file, falling back to the
    /// built-in table when the path is unset, unreadable, or invalid.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<FlowTable>(&raw) {
                Ok(table) => {
                    info!(path = %path.display(), flows = table.flows.len(), "Loaded flow table");
                    table
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid flow table file, using built-in table");
                    Self::builtin()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read flow table file, using built-in table");
                Self::builtin()
            }
        }
    }

    /// The four built-in lead-qualification flows.
    pub fn builtin() -> Self {
        let mut flows = BTreeMap::new();
        flows.insert(
            "flow_customer_support".to_string(),
            lead_flow("customer support", "a", "Customer Support"),
        );
        flows.insert(
            "flow_sales_assistant".to_string(),
            lead_flow("sales assistant", "a", "Sales Assistant"),
        );
        flows.insert(
            "flow_internal_helpdesk".to_string(),
            lead_flow("internal helpdesk", "an", "Internal Helpdesk"),
        );
        flows.insert(
            "flow_workflow_automation".to_string(),
            lead_flow("workflow automation", "a", "Workflow Automation"),
        );
        FlowTable {
            greeting: "Hi! What would you like to build?".to_string(),
            thank_you: "Thank you for your interest! We'll be in touch soon.".to_string(),
            flows,
        }
    }
}

/// The four built-in flows share everything but the chatbot noun.
fn lead_flow(noun: &str, article: &str, type_label: &str) -> Flow {
    Flow {
        start_triggers: vec![
            format!("i want {article} {noun} chatbot"),
            format!("{noun} chatbot"),
        ],
        continue_prefix: "i want".to_string(),
        sequence: vec![
            FlowStep {
                assistant: "Great choice! Now let's determine which channels you'd like to use for your chatbot.".to_string(),
                tag: Some("button_group_channels".to_string()),
                message_template: None,
            },
            FlowStep {
                assistant: "Perfect! Now tell me who will be using this chatbot.".to_string(),
                tag: Some("button_group_audience".to_string()),
                message_template: None,
            },
            FlowStep {
                assistant: "Excellent! I have all the information I need. Let me prepare a message for you to send to our team.".to_string(),
                tag: Some("contact_form".to_string()),
                message_template: None,
            },
            FlowStep {
                assistant: "Perfect! I've prepared a message with your requirements. Review it and press send to contact our team.".to_string(),
                tag: Some("send_message".to_string()),
                message_template: Some(format!(
                    "Hi! I'm interested in building {article} {noun} chatbot. Here are my requirements:\n\n\
                     - Chatbot Type: {type_label}\n\
                     - Channels: {{channels}}\n\
                     - Audience: {{audience}}\n\
                     - Contact: {{contact}}\n\n\
                     Please reach out to discuss next steps!"
                )),
            },
        ],
    }
}
