//! # `cordon-policy`
//!
//! The wallet firewall: ERC-20 `approve()` intent detection, the pure
//! policy evaluator, risk scoring for display, and the persisted approval
//! ledger those checks get recorded into.

pub mod intent;
pub mod ledger;
pub mod policy;
pub mod risk;
pub mod types;

pub use intent::{detect_approve_intent, modify_approve_calldata};
pub use ledger::{ApprovalLedger, KvApprovalLedger};
pub use policy::{check_approval_policy, suggested_cap_without_price, PolicyCheckResult};
pub use risk::{is_high_value_token, is_known_spender, score as score_risk, sort_by_risk};
pub use types::{
    ApprovalRecord, ApprovalStatus, DetectedApproval, PolicySettings, RiskLevel, TokenMetadata,
};
