pub mod reconcile;
pub mod workflow_check;
pub mod workflow_eval;
