//! # Fixit Field
//!
//! State reconciliation for a controlled dropdown / multi-select form field.
//!
//! A field instance merges five independently changing inputs into one
//! rendered state: the record snapshot, the permission output, the current
//! user context, the form mode and user interaction. It owns exactly one
//! piece of mutable data, the [`Selection`]; everything else is derived.
//!
//! ## Architecture
//!
//! ```text
//! RawRecordValue ──normalize──▶ Selection ──clamp(options)──▶ Selection
//!                                                  │
//! FormMode + PermissionCandidate[] + submission ──derive_policy──▶ FieldFlags
//!                                                  │                 │
//!                                                  ▼                 ▼
//!                                           Latch (Active | Locked) ─▶ FieldView
//!                                                  │
//!                                 blur ──encode_commit──▶ FormSink
//! ```
//!
//! All recomputation is synchronous: each notification (context change,
//! selection, blur) resolves fully before the next one is handled.

pub mod commit;
pub mod config;
pub mod context;
pub mod error;
pub mod field;
pub mod key;
pub mod mode;
pub mod normalize;
pub mod policy;
pub mod scenario;
pub mod validate;

pub use commit::{CommitValue, EncodedCommit, LookupId, encode_commit, target_key};
pub use config::{FieldConfig, ResyncPolicy};
pub use context::{FieldContext, FormSink, Record, RecordingSink, SinkEvent};
pub use error::FieldError;
pub use field::{DropdownField, FieldView, Phase};
pub use key::{FieldOption, Selection, display_text, to_key};
pub use mode::FormMode;
pub use normalize::{clamp, normalize, normalize_clamped};
pub use policy::{
    FieldFlags, Latch, LockCause, PermissionCandidate, PermissionLookup, PermissionRequest,
    PermissionTables, PolicyDecision, PolicyInput, Unrestricted, derive_policy,
    resolve_candidates,
};
pub use scenario::{
    ContextPatch, ContextSnapshot, Scenario, ScenarioEvent, ScenarioOutcome, load_scenario,
    run_scenario,
};
pub use validate::{REQUIRED_FIELD_MESSAGE, validate};
