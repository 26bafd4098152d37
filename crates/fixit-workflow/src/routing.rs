//! Status routing from the selected issue types.

use crate::model::{RoutingRule, Workflow};
use fixit_field::{Record, Selection, normalize};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Where a ticket goes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDecision {
    pub rule_index: usize,
    pub assignee_role: String,
    pub status: String,
    /// True when no typed rule matched and the fallback rule was used.
    pub fallback: bool,
}

impl RouteDecision {
    fn from_rule(index: usize, rule: &RoutingRule, fallback: bool) -> Self {
        Self {
            rule_index: index,
            assignee_role: rule.assignee_role.clone(),
            status: rule.status.clone(),
            fallback,
        }
    }
}

impl Workflow {
    /// First rule whose issue types intersect `issue_types`, else the first
    /// fallback rule. `None` when nothing applies.
    pub fn route(&self, issue_types: &Selection) -> Option<RouteDecision> {
        let typed = self.routing.iter().enumerate().find(|(_, rule)| {
            !rule.is_fallback()
                && rule
                    .issue_types
                    .iter()
                    .any(|issue| issue_types.contains(issue))
        });
        let decision = match typed {
            Some((index, rule)) => Some(RouteDecision::from_rule(index, rule, false)),
            None => self
                .routing
                .iter()
                .enumerate()
                .find(|(_, rule)| rule.is_fallback())
                .map(|(index, rule)| RouteDecision::from_rule(index, rule, true)),
        };
        debug!(
            issue_types = ?issue_types.keys(),
            ?decision,
            "routed ticket"
        );
        decision
    }

    /// Route using the record's value for the routing field.
    pub fn route_record(&self, record: &Record) -> Option<RouteDecision> {
        let raw = record.get(&self.routing_field).unwrap_or(&Value::Null);
        self.route(&normalize(raw))
    }
}
