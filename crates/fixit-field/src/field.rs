//! The dropdown field state machine.
//!
//! A [`DropdownField`] is one mounted field instance. It moves through two
//! independent, monotonic state dimensions:
//!
//! - [`Phase`]: `Uninitialized → Initialized`. The first reconciliation
//!   seeds the selection (starter value in create mode, record snapshot
//!   otherwise); later ones only re-clamp it.
//! - [`Latch`]: `Active → Locked`. Locking freezes the display text and
//!   keeps the field disabled until the instance is dropped.
//!
//! Neither dimension ever moves backwards. Showing another record means
//! building a new instance.

use crate::commit::{EncodedCommit, encode_commit, target_key};
use crate::config::FieldConfig;
use crate::context::{FieldContext, FormSink};
use crate::key::{FieldOption, Selection, display_text, option_keys};
use crate::mode::FormMode;
use crate::normalize::{clamp, normalize_clamped};
use crate::policy::{FieldFlags, Latch, LockCause, PermissionRequest, PolicyInput, derive_policy};
use crate::validate::validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// Initialization phase of a field instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Initialized,
}

/// Rendered state of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub field_id: String,
    pub target_key: String,
    pub phase: Phase,
    pub selection: Selection,
    pub flags: FieldFlags,
    pub locked: bool,
    pub display_text: String,
    pub error: Option<String>,
    pub touched: bool,
}

/// One controlled dropdown / multi-select field.
#[derive(Debug, Clone)]
pub struct DropdownField {
    config: FieldConfig,
    phase: Phase,
    latch: Latch,
    selection: Selection,
    flags: FieldFlags,
    error: Option<String>,
    touched: bool,
    options: Vec<FieldOption>,
}

impl DropdownField {
    pub fn new(config: FieldConfig) -> Self {
        let flags = FieldFlags {
            required: config.required,
            ..FieldFlags::default()
        };
        Self {
            config,
            phase: Phase::Uninitialized,
            latch: Latch::default(),
            selection: Selection::new(),
            flags,
            error: None,
            touched: false,
            options: Vec::new(),
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn latch(&self) -> &Latch {
        &self.latch
    }

    pub fn is_locked(&self) -> bool {
        self.latch.is_locked()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn display_override(&self) -> Option<&str> {
        self.latch.display_override()
    }

    /// Store key this field commits to.
    pub fn target_key(&self) -> String {
        target_key(&self.config.field_id, self.config.lookup)
    }

    /// Re-evaluate the field against a fresh context snapshot.
    ///
    /// Runs on every change to record, options, mode or permission context.
    pub fn reconcile(&mut self, ctx: &FieldContext<'_>, sink: &mut dyn FormSink) {
        trace!(field_id = %self.config.field_id, ?ctx, "reconcile");
        self.options = ctx.options.to_vec();

        match self.phase {
            Phase::Uninitialized => {
                sink.register(&self.config.field_id);
                self.selection = self.seed(ctx);
                self.phase = Phase::Initialized;
                debug!(
                    field_id = %self.config.field_id,
                    mode = %ctx.mode,
                    selection = ?self.selection.keys(),
                    "field seeded"
                );
            }
            Phase::Initialized => {
                self.selection = clamp(&self.selection, &self.options);
            }
        }

        // Locked fields are never looked up again.
        let candidates = if self.latch.is_locked() {
            Vec::new()
        } else {
            ctx.permissions.lookup(&PermissionRequest {
                field_id: &self.config.field_id,
                label: self.config.display_label(),
                tables: ctx.tables,
            })
        };

        let decision = derive_policy(
            &PolicyInput {
                mode: ctx.mode,
                candidates: &candidates,
                submission_in_flight: ctx.submission_in_flight,
                required: ctx.is_required.unwrap_or(self.config.required),
                hidden_override: ctx.is_hidden,
            },
            &self.latch,
        );
        self.flags = decision.flags;
        if let Some(cause) = decision.lock {
            self.lock(cause, decision.permission_hidden);
        }

        if self.config.resync.clear_error_on_resync {
            if self.error.take().is_some() {
                sink.report_error(&self.target_key(), None);
            }
            self.touched = false;
        } else if self.error.is_some() {
            // A kept error must still hold under the new flags.
            self.error = validate(&self.flags, &self.selection)
                .err()
                .map(|err| err.to_string());
            sink.report_error(&self.target_key(), self.error.as_deref());
        }
    }

    /// Initial selection for a fresh instance.
    fn seed(&self, ctx: &FieldContext<'_>) -> Selection {
        let raw = if ctx.mode == FormMode::Create {
            &self.config.starter_value
        } else if self.config.lookup && !self.config.multi {
            ctx.record
                .get(&self.config.lookup_id_key())
                .unwrap_or(&Value::Null)
        } else {
            ctx.record
                .get(&self.config.field_id)
                .unwrap_or(&Value::Null)
        };
        normalize_clamped(raw, &self.options)
    }

    fn lock(&mut self, cause: LockCause, permission_hidden: bool) {
        let display_override = display_text(&self.selection, &self.options);
        debug!(
            field_id = %self.config.field_id,
            ?cause,
            display = %display_override,
            "field locked"
        );
        self.latch = Latch::Locked {
            display_override,
            hidden: permission_hidden,
        };
    }

    /// Replace the selection with a raw value (user selection event).
    ///
    /// Keys outside the current options are dropped; a single-select field
    /// keeps only the first key. Validation runs immediately so required
    /// feedback is live before the field is left.
    pub fn select(&mut self, raw: &Value) {
        let mut next = normalize_clamped(raw, &self.options);
        if !self.config.multi {
            next.truncate(1);
        }
        self.apply_selection(next);
    }

    /// Toggle one option, as a dropdown change event reports it.
    pub fn toggle(&mut self, key: &str, selected: bool) {
        if !option_keys(&self.options).contains(key) {
            debug!(field_id = %self.config.field_id, key, "ignoring unknown option");
            return;
        }

        let mut next = self.selection.clone();
        match (self.config.multi, selected) {
            (true, true) => {
                next.insert(key.to_string());
            }
            (true, false) | (false, false) => {
                next.remove(key);
            }
            (false, true) => {
                next = Selection::from_keys([key]);
            }
        }
        self.apply_selection(next);
    }

    fn apply_selection(&mut self, next: Selection) {
        if self.flags.disabled {
            debug!(field_id = %self.config.field_id, "selection changed on disabled field");
        }
        self.selection = next;
        self.touched = true;
        self.error = validate(&self.flags, &self.selection)
            .err()
            .map(|err| err.to_string());
    }

    /// Commit on loss of focus.
    ///
    /// Emits the encoded value and the validation result. The display
    /// override follows the committed labels unless the field is locked.
    pub fn blur(&mut self, sink: &mut dyn FormSink) -> EncodedCommit {
        let commit = encode_commit(
            &self.config.field_id,
            &self.selection,
            self.config.lookup,
            self.config.multi,
        );
        self.touched = true;
        self.error = validate(&self.flags, &self.selection)
            .err()
            .map(|err| err.to_string());

        sink.commit(&commit.target_key, &commit.value);
        sink.report_error(&commit.target_key, self.error.as_deref());

        if let Latch::Active { display_override } = &mut self.latch {
            *display_override = Some(display_text(&self.selection, &self.options));
        }

        debug!(
            field_id = %self.config.field_id,
            target_key = %commit.target_key,
            value = %commit.value.to_json(),
            "field committed"
        );
        commit
    }

    /// Current rendered state.
    pub fn view(&self) -> FieldView {
        // Only a locked field shows frozen text.
        let display = match &self.latch {
            Latch::Locked {
                display_override, ..
            } => display_override.clone(),
            Latch::Active { .. } => display_text(&self.selection, &self.options),
        };
        FieldView {
            field_id: self.config.field_id.clone(),
            target_key: self.target_key(),
            phase: self.phase,
            selection: self.selection.clone(),
            flags: self.flags,
            locked: self.latch.is_locked(),
            display_text: display,
            error: self.error.clone(),
            touched: self.touched,
        }
    }
}
