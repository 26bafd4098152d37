//! Notification templates.
//!
//! Subjects, bodies and recipients may reference record columns as
//! `{{Column}}`. Unknown placeholders render empty and are reported in
//! [`RenderedNotification::missing`] so callers can surface them.

use crate::model::{NotificationRule, Workflow};
use fixit_field::{Record, to_key};
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::warn;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("placeholder regex")
    })
}

/// Placeholder names referenced by `template`, in first-use order.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    placeholder_re()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Text a record value contributes to a template.
pub fn template_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("Title") {
            Some(title) => template_value(title),
            None => to_key(value),
        },
        Value::Array(items) => items
            .iter()
            .map(template_value)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        other => to_key(other),
    }
}

/// Template variables for `record`; null columns are omitted.
pub fn template_vars(record: &Record) -> BTreeMap<String, String> {
    record
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| (name.clone(), template_value(value)))
        .collect()
}

/// A notification ready to hand to a mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNotification {
    pub status: String,
    pub trigger: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
    /// Placeholders with no value, sorted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

struct Renderer<'a> {
    vars: &'a BTreeMap<String, String>,
    missing: BTreeSet<String>,
}

impl Renderer<'_> {
    fn render(&mut self, template: &str) -> String {
        placeholder_re()
            .replace_all(template, |caps: &Captures<'_>| {
                let name = &caps[1];
                match self.vars.get(name) {
                    Some(value) => value.clone(),
                    None => {
                        self.missing.insert(name.to_string());
                        String::new()
                    }
                }
            })
            .into_owned()
    }

    fn recipients(&mut self, entries: &[String]) -> Vec<String> {
        entries
            .iter()
            .flat_map(|entry| {
                self.render(entry)
                    .split(';')
                    .map(str::trim)
                    .filter(|address| !address.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl NotificationRule {
    pub fn render(&self, vars: &BTreeMap<String, String>) -> RenderedNotification {
        let mut renderer = Renderer {
            vars,
            missing: BTreeSet::new(),
        };
        let to = renderer.recipients(&self.to);
        let cc = renderer.recipients(&self.cc);
        let subject = renderer.render(&self.subject);
        let body = renderer.render(&self.body);
        if !renderer.missing.is_empty() {
            warn!(
                status = %self.status,
                trigger = %self.trigger,
                missing = ?renderer.missing,
                "notification rendered with missing placeholders"
            );
        }
        RenderedNotification {
            status: self.status.clone(),
            trigger: self.trigger.clone(),
            to,
            cc,
            subject,
            body,
            missing: renderer.missing.into_iter().collect(),
        }
    }

    /// Every template string this rule carries.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .map(String::as_str)
            .chain([self.subject.as_str(), self.body.as_str()])
    }
}

impl Workflow {
    /// Rules for `status`, optionally narrowed to one trigger.
    pub fn notifications_for<'a>(
        &'a self,
        status: &'a str,
        trigger: Option<&'a str>,
    ) -> impl Iterator<Item = &'a NotificationRule> + 'a {
        self.notifications.iter().filter(move |rule| {
            rule.status == status && trigger.is_none_or(|trigger| rule.trigger == trigger)
        })
    }

    /// Render every matching rule against `record`.
    pub fn render_notifications(
        &self,
        status: &str,
        trigger: Option<&str>,
        record: &Record,
    ) -> Vec<RenderedNotification> {
        let vars = template_vars(record);
        self.notifications_for(status, trigger)
            .map(|rule| rule.render(&vars))
            .collect()
    }
}
