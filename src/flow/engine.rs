//! Flow engine — the finite-state walk over a flow's step sequence.
//!
//! `FlowCursor` is the explicit, side-effect-free state both rendering
//! surfaces share: it owns only the active flow identity and step index,
//! and every operation returns the assistant turns to emit rather than
//! touching any log itself.

use serde::Serialize;

use super::table::{Flow, FlowTable};

/// Where a session stands in the scripted dialogue.
///
/// Idle when `active` is `None`. The step index is only meaningful while
/// a flow is active and is reset to 0 whenever a flow is entered or exited.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowCursor {
    pub active: Option<String>,
    pub step: usize,
    /// Most recently entered flow, kept for the composer after completion.
    #[serde(skip)]
    pub last_entered: Option<String>,
}

/// What to do with a piece of free text.
#[derive(Debug)]
pub enum Dispatch {
    /// Handled locally; the contained assistant turns were emitted.
    Emitted(Vec<String>),
    /// No flow intercepted the text — forward it to the backend.
    Forward,
}

impl FlowCursor {
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Active or most recently entered flow id, for the composer.
    pub fn composer_flow(&self) -> Option<&str> {
        self.active.as_deref().or(self.last_entered.as_deref())
    }

    fn active_flow<'t>(&self, table: &'t FlowTable) -> Option<&'t Flow> {
        self.active.as_deref().and_then(|id| table.get(id))
    }

    /// Find the flow whose start trigger prefixes the lower-cased text.
    /// First match in table iteration order wins.
    pub fn find_flow_by_start<'t>(table: &'t FlowTable, text: &str) -> Option<&'t str> {
        let query = text.to_lowercase();
        for (flow_id, flow) in &table.flows {
            if !flow.is_enterable() {
                continue;
            }
            if flow
                .start_triggers
                .iter()
                .any(|trigger| query.starts_with(&trigger.to_lowercase()))
            {
                return Some(flow_id);
            }
        }
        None
    }

    /// Enter a flow and emit its first step.
    ///
    /// Unknown flow ids and flows with an empty sequence are no-ops: the
    /// cursor stays where it was.
    pub fn enter(&mut self, table: &FlowTable, flow_id: &str) -> Vec<String> {
        let Some(step) = table.get(flow_id).and_then(|flow| flow.sequence.first()) else {
            return Vec::new();
        };
        self.active = Some(flow_id.to_string());
        self.last_entered = Some(flow_id.to_string());
        self.step = 0;
        let content = step.content();
        if content.is_empty() {
            Vec::new()
        } else {
            vec![content]
        }
    }

    /// Advance the active flow by one step.
    ///
    /// Emits the step at the new index if one exists. Advancing past the
    /// last step emits the thank-you turn followed by a fresh greeting and
    /// resets to Idle.
    pub fn advance(&mut self, table: &FlowTable) -> Vec<String> {
        let Some(flow) = self.active_flow(table) else {
            return Vec::new();
        };
        let next = self.step + 1;
        match flow.sequence.get(next) {
            Some(step) => {
                self.step = next;
                let content = step.content();
                if content.is_empty() {
                    Vec::new()
                } else {
                    vec![content]
                }
            }
            None => {
                let mut turns = Vec::new();
                if !table.thank_you.is_empty() {
                    turns.push(table.thank_you.clone());
                }
                turns.push(self.reset(table));
                turns
            }
        }
    }

    /// Exit any active flow and re-emit the greeting with the entry selector.
    pub fn reset(&mut self, table: &FlowTable) -> String {
        self.exit();
        table.greeting_content()
    }

    /// Drop the flow position without emitting anything (abandonment).
    /// Accumulated selections are untouched.
    pub fn exit(&mut self) {
        self.active = None;
        self.step = 0;
    }

    /// Route free text through the state machine.
    ///
    /// Idle + trigger match enters the flow; in-flow text starting with the
    /// continue prefix advances it; anything else while in-flow abandons the
    /// flow and falls through to the backend, as does unmatched idle text.
    pub fn dispatch(&mut self, table: &FlowTable, text: &str) -> Dispatch {
        if self.active.is_some() {
            match self.active_flow(table) {
                Some(flow) => {
                    let expect = flow.continue_prefix.to_lowercase();
                    if text.to_lowercase().starts_with(&expect) {
                        return Dispatch::Emitted(self.advance(table));
                    }
                    self.exit();
                    return Dispatch::Forward;
                }
                // Active flow vanished from the table — treat as Idle.
                None => self.exit(),
            }
        }
        match Self::find_flow_by_start(table, text) {
            Some(flow_id) => {
                let flow_id = flow_id.to_string();
                Dispatch::Emitted(self.enter(table, &flow_id))
            }
            None => Dispatch::Forward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::table::{Flow, FlowStep};

    fn table() -> FlowTable {
        FlowTable::builtin()
    }

    #[test]
    fn trigger_entry_emits_step_zero_first() {
        let table = table();
        let mut cursor = FlowCursor::default();

        let dispatch = cursor.dispatch(&table, "I want a Customer Support chatbot, please");
        let Dispatch::Emitted(turns) = dispatch else {
            panic!("trigger text should be handled locally");
        };
        assert_eq!(turns.len(), 1);
        assert!(turns[0].starts_with("Great choice!"));
        assert!(turns[0].ends_with("[button_group_channels]"));
        assert_eq!(cursor.active.as_deref(), Some("flow_customer_support"));
        assert_eq!(cursor.step, 0);
    }

    #[test]
    fn completion_emits_thank_you_then_greeting_and_resets() {
        let table = table();
        let mut cursor = FlowCursor::default();
        cursor.enter(&table, "flow_sales_assistant");

        // Walk through the remaining three steps.
        for _ in 0..3 {
            let turns = cursor.advance(&table);
            assert_eq!(turns.len(), 1);
        }
        assert_eq!(cursor.step, 3);

        // One more advance completes the flow.
        let turns = cursor.advance(&table);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], table.thank_you);
        assert_eq!(turns[1], table.greeting_content());
        assert!(cursor.is_idle());
        assert_eq!(cursor.step, 0);
        // Most-recent flow survives completion for the composer.
        assert_eq!(cursor.composer_flow(), Some("flow_sales_assistant"));
    }

    #[test]
    fn continue_prefix_advances_active_flow() {
        let table = table();
        let mut cursor = FlowCursor::default();
        cursor.enter(&table, "flow_customer_support");

        let dispatch = cursor.dispatch(&table, "I WANT it on Slack");
        let Dispatch::Emitted(turns) = dispatch else {
            panic!("prefix-matching text should advance locally");
        };
        assert_eq!(cursor.step, 1);
        assert!(turns[0].ends_with("[button_group_audience]"));
    }

    #[test]
    fn non_matching_text_abandons_flow_and_forwards() {
        let table = table();
        let mut cursor = FlowCursor::default();
        cursor.enter(&table, "flow_customer_support");
        cursor.advance(&table);
        assert_eq!(cursor.step, 1);

        let dispatch = cursor.dispatch(&table, "what does pricing look like?");
        assert!(matches!(dispatch, Dispatch::Forward));
        assert!(cursor.is_idle());
        assert_eq!(cursor.step, 0);
    }

    #[test]
    fn unmatched_idle_text_forwards() {
        let table = table();
        let mut cursor = FlowCursor::default();
        let dispatch = cursor.dispatch(&table, "tell me about your retrieval pipeline");
        assert!(matches!(dispatch, Dispatch::Forward));
        assert!(cursor.is_idle());
    }

    #[test]
    fn unknown_flow_id_is_a_noop() {
        let table = table();
        let mut cursor = FlowCursor::default();
        let turns = cursor.enter(&table, "flow_does_not_exist");
        assert!(turns.is_empty());
        assert!(cursor.is_idle());
    }

    #[test]
    fn malformed_flow_is_never_entered_or_advanced() {
        let mut table = table();
        table.flows.insert(
            "flow_broken".to_string(),
            Flow {
                start_triggers: vec!["broken".to_string()],
                continue_prefix: String::new(),
                sequence: vec![],
            },
        );

        let mut cursor = FlowCursor::default();
        assert!(cursor.enter(&table, "flow_broken").is_empty());
        assert!(cursor.is_idle());

        // Via trigger matching the empty sequence makes it non-enterable.
        let dispatch = cursor.dispatch(&table, "broken thing");
        assert!(matches!(dispatch, Dispatch::Forward));
    }

    #[test]
    fn advance_while_idle_is_a_noop() {
        let table = table();
        let mut cursor = FlowCursor::default();
        assert!(cursor.advance(&table).is_empty());
    }

    #[test]
    fn first_trigger_match_wins_in_table_order() {
        let mut table = table();
        // Two flows sharing a trigger prefix; BTreeMap order decides.
        table.flows.insert(
            "flow_a_overlap".to_string(),
            overlap_flow("hello there"),
        );
        table.flows.insert(
            "flow_b_overlap".to_string(),
            overlap_flow("hello"),
        );

        let mut cursor = FlowCursor::default();
        cursor.dispatch(&table, "hello there friend");
        assert_eq!(cursor.active.as_deref(), Some("flow_a_overlap"));
    }

    fn overlap_flow(trigger: &str) -> Flow {
        Flow {
            start_triggers: vec![trigger.to_string()],
            continue_prefix: "i want".to_string(),
            sequence: vec![FlowStep {
                assistant: "step".to_string(),
                tag: None,
                message_template: None,
            }],
        }
    }

    #[test]
    fn empty_continue_prefix_always_advances() {
        let mut table = table();
        table.flows.insert(
            "flow_loose".to_string(),
            Flow {
                start_triggers: vec!["loose".to_string()],
                continue_prefix: String::new(),
                sequence: vec![
                    FlowStep {
                        assistant: "one".to_string(),
                        tag: None,
                        message_template: None,
                    },
                    FlowStep {
                        assistant: "two".to_string(),
                        tag: None,
                        message_template: None,
                    },
                ],
            },
        );

        let mut cursor = FlowCursor::default();
        cursor.enter(&table, "flow_loose");
        let dispatch = cursor.dispatch(&table, "anything at all");
        let Dispatch::Emitted(turns) = dispatch else {
            panic!("empty prefix matches everything");
        };
        assert_eq!(turns, vec!["two".to_string()]);
    }
}
