//! Disable / hide / lock policy.
//!
//! The permission model lives outside this crate. A [`PermissionLookup`]
//! returns zero or more [`PermissionCandidate`]s for a field; this module only
//! merges that output with the form mode and submission state:
//!
//! 1. a locked field stays disabled and is not looked up again;
//! 2. terminal mode disables and locks;
//! 3. a submission in flight disables transiently (no lock);
//! 4. otherwise the last explicit candidate value wins.
//!
//! `required` never takes part in the disable/hide merge.

use crate::mode::FormMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One permission verdict. Absent members defer to earlier candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,
}

impl PermissionCandidate {
    pub fn disabled(value: bool) -> Self {
        Self {
            is_disabled: Some(value),
            is_hidden: None,
        }
    }

    pub fn hidden(value: bool) -> Self {
        Self {
            is_disabled: None,
            is_hidden: Some(value),
        }
    }
}

/// Fold candidates in list order; later explicit values override earlier ones.
pub fn resolve_candidates(candidates: &[PermissionCandidate]) -> PermissionCandidate {
    candidates
        .iter()
        .fold(PermissionCandidate::default(), |acc, candidate| {
            PermissionCandidate {
                is_disabled: candidate.is_disabled.or(acc.is_disabled),
                is_hidden: candidate.is_hidden.or(acc.is_hidden),
            }
        })
}

/// Read-only permission context handed to the lookup.
///
/// The tables are opaque to this crate; only the lookup interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionTables {
    #[serde(default)]
    pub disable: Value,
    #[serde(default)]
    pub hide: Value,
    #[serde(default)]
    pub roles: Value,
    #[serde(default)]
    pub current_user: Value,
    #[serde(default)]
    pub record_fields: Vec<String>,
    #[serde(default)]
    pub known_columns: Vec<String>,
}

impl PermissionTables {
    pub const EMPTY: Self = Self {
        disable: Value::Null,
        hide: Value::Null,
        roles: Value::Null,
        current_user: Value::Null,
        record_fields: Vec::new(),
        known_columns: Vec::new(),
    };
}

/// What the lookup is asked about.
#[derive(Debug, Clone, Copy)]
pub struct PermissionRequest<'a> {
    pub field_id: &'a str,
    pub label: &'a str,
    pub tables: &'a PermissionTables,
}

/// The external permission collaborator.
pub trait PermissionLookup {
    fn lookup(&self, request: &PermissionRequest<'_>) -> Vec<PermissionCandidate>;
}

impl<F> PermissionLookup for F
where
    F: Fn(&PermissionRequest<'_>) -> Vec<PermissionCandidate>,
{
    fn lookup(&self, request: &PermissionRequest<'_>) -> Vec<PermissionCandidate> {
        self(request)
    }
}

/// A fixed candidate list, returned for every field.
impl PermissionLookup for Vec<PermissionCandidate> {
    fn lookup(&self, _request: &PermissionRequest<'_>) -> Vec<PermissionCandidate> {
        self.clone()
    }
}

/// No permission restrictions at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl PermissionLookup for Unrestricted {
    fn lookup(&self, _request: &PermissionRequest<'_>) -> Vec<PermissionCandidate> {
        Vec::new()
    }
}

/// Final rendered flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFlags {
    pub required: bool,
    pub disabled: bool,
    pub hidden: bool,
    /// Set only for disables that come from policy or terminal mode.
    pub default_disabled: bool,
}

/// Display-text latch.
///
/// `Active` tracks the last committed labels. `Locked` is terminal for the
/// lifetime of the field instance; there is no transition out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Latch {
    Active {
        display_override: Option<String>,
    },
    Locked {
        display_override: String,
        /// Permission-derived hidden flag frozen at lock time.
        hidden: bool,
    },
}

impl Latch {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    pub fn display_override(&self) -> Option<&str> {
        match self {
            Self::Active { display_override } => display_override.as_deref(),
            Self::Locked {
                display_override, ..
            } => Some(display_override),
        }
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::Active {
            display_override: None,
        }
    }
}

/// Why a field entered the locked state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockCause {
    Permission,
    TerminalMode,
}

/// Inputs to [`derive_policy`].
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    pub mode: FormMode,
    pub candidates: &'a [PermissionCandidate],
    pub submission_in_flight: bool,
    pub required: bool,
    /// Externally supplied visibility (`visibleWhen` rules); `Some(true)` hides.
    pub hidden_override: Option<bool>,
}

/// Result of one policy merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision {
    pub flags: FieldFlags,
    /// Set when this evaluation must move an active field into `Locked`.
    pub lock: Option<LockCause>,
    /// Hidden flag as resolved from permissions alone.
    pub permission_hidden: bool,
}

/// Merge mode, permissions and submission state into flags.
pub fn derive_policy(input: &PolicyInput<'_>, latch: &Latch) -> PolicyDecision {
    let external_hidden = input.hidden_override.unwrap_or(false);

    if let Latch::Locked { hidden, .. } = latch {
        return PolicyDecision {
            flags: FieldFlags {
                required: input.required,
                disabled: true,
                hidden: *hidden || external_hidden,
                default_disabled: true,
            },
            lock: None,
            permission_hidden: *hidden,
        };
    }

    let resolved = resolve_candidates(input.candidates);
    let permission_hidden = resolved.is_hidden.unwrap_or(false);
    let permission_disabled = resolved.is_disabled.unwrap_or(false);

    let (disabled, default_disabled, lock) = if input.mode.is_terminal() {
        (true, true, Some(LockCause::TerminalMode))
    } else if input.submission_in_flight {
        (true, false, None)
    } else if permission_disabled {
        (true, true, Some(LockCause::Permission))
    } else {
        (false, false, None)
    };

    PolicyDecision {
        flags: FieldFlags {
            required: input.required,
            disabled,
            hidden: permission_hidden || external_hidden,
            default_disabled,
        },
        lock,
        permission_hidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(mode: FormMode, candidates: &[PermissionCandidate]) -> PolicyInput<'_> {
        PolicyInput {
            mode,
            candidates,
            submission_in_flight: false,
            required: false,
            hidden_override: None,
        }
    }

    #[test]
    fn last_explicit_candidate_wins() {
        let candidates = [
            PermissionCandidate::disabled(true),
            PermissionCandidate::hidden(true),
            PermissionCandidate::disabled(false),
            PermissionCandidate::default(),
        ];
        let resolved = resolve_candidates(&candidates);
        assert_eq!(resolved.is_disabled, Some(false));
        assert_eq!(resolved.is_hidden, Some(true));
    }

    #[test]
    fn no_candidates_leaves_field_enabled() {
        let decision = derive_policy(&input(FormMode::Edit, &[]), &Latch::default());
        assert_eq!(decision.flags, FieldFlags::default());
        assert_eq!(decision.lock, None);
    }

    #[test]
    fn permission_disable_requests_lock() {
        let candidates = [PermissionCandidate::disabled(true)];
        let decision = derive_policy(&input(FormMode::Edit, &candidates), &Latch::default());
        assert!(decision.flags.disabled);
        assert!(decision.flags.default_disabled);
        assert_eq!(decision.lock, Some(LockCause::Permission));
    }

    #[test]
    fn submission_disable_is_transient() {
        let candidates = [PermissionCandidate::disabled(true)];
        let mut policy = input(FormMode::Edit, &candidates);
        policy.submission_in_flight = true;
        let decision = derive_policy(&policy, &Latch::default());
        assert!(decision.flags.disabled);
        assert!(!decision.flags.default_disabled);
        assert_eq!(decision.lock, None);
    }

    #[test]
    fn terminal_mode_locks_regardless_of_permissions() {
        let candidates = [PermissionCandidate::disabled(false)];
        let decision = derive_policy(&input(FormMode::View, &candidates), &Latch::default());
        assert!(decision.flags.disabled);
        assert_eq!(decision.lock, Some(LockCause::TerminalMode));
    }

    #[test]
    fn locked_latch_stays_disabled_without_relocking() {
        let latch = Latch::Locked {
            display_override: "Alpha".to_string(),
            hidden: false,
        };
        let candidates = [PermissionCandidate::disabled(false)];
        let decision = derive_policy(&input(FormMode::Edit, &candidates), &latch);
        assert!(decision.flags.disabled);
        assert!(decision.flags.default_disabled);
        assert_eq!(decision.lock, None);
    }

    #[test]
    fn required_is_independent_of_disable() {
        let candidates = [PermissionCandidate::disabled(true)];
        let mut policy = input(FormMode::Edit, &candidates);
        policy.required = true;
        let decision = derive_policy(&policy, &Latch::default());
        assert!(decision.flags.required);

        policy.required = false;
        let decision = derive_policy(&policy, &Latch::default());
        assert!(!decision.flags.required);
    }

    #[test]
    fn external_hidden_combines_with_permission_hidden() {
        let mut policy = input(FormMode::Edit, &[]);
        policy.hidden_override = Some(true);
        assert!(derive_policy(&policy, &Latch::default()).flags.hidden);

        let candidates = [PermissionCandidate::hidden(true)];
        let policy = input(FormMode::Edit, &candidates);
        let decision = derive_policy(&policy, &Latch::default());
        assert!(decision.flags.hidden);
        assert!(decision.permission_hidden);
    }
}
