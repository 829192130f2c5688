//! Two-stage review workflow.
//!
//! ```text
//!   AwaitingInitial --approve--> AwaitingFinal --approve--> Approved
//!         |                           |
//!         +--reject--> Rejected <-----+--reject
//! ```
//!
//! Approved and Rejected are terminal. The transition function here is pure;
//! persisting it (with the optimistic version check) is the repository's job.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::define_status_enum;

define_status_enum! {
    /// Review stage an asset currently sits in.
    ApprovalStep ("approval_steps") {
        Initial = 1 => "initial",
        Final = 2 => "final",
    }
}

define_status_enum! {
    /// Overall review outcome.
    ApprovalStatus ("approval_statuses") {
        InProgress = 1 => "in_progress",
        Approved = 2 => "approved",
        Rejected = 3 => "rejected",
    }
}

impl ApprovalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::InProgress)
    }
}

/// A reviewer's verdict on the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn is_approve(self) -> bool {
        matches!(self, Decision::Approve)
    }
}

/// Position of an asset in the workflow, derived from its stored step and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    AwaitingInitial,
    AwaitingFinal,
    Terminal(ApprovalStatus),
}

impl ReviewState {
    pub fn from_parts(step: ApprovalStep, status: ApprovalStatus) -> Self {
        if status.is_terminal() {
            return ReviewState::Terminal(status);
        }
        match step {
            ApprovalStep::Initial => ReviewState::AwaitingInitial,
            ApprovalStep::Final => ReviewState::AwaitingFinal,
        }
    }
}

/// The write set produced by one advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Which reviewer slot (initial or final) the decision is recorded in.
    pub stage: ApprovalStep,
    pub next_step: ApprovalStep,
    pub next_status: ApprovalStatus,
    pub approved: bool,
}

/// Compute the transition for `decision` from the given stored state.
///
/// Fails with [`CoreError::InvalidState`] when the asset is already approved
/// or rejected.
pub fn plan_advance(
    step: ApprovalStep,
    status: ApprovalStatus,
    decision: Decision,
) -> Result<Transition, CoreError> {
    let approved = decision.is_approve();
    match ReviewState::from_parts(step, status) {
        ReviewState::AwaitingInitial => Ok(Transition {
            stage: ApprovalStep::Initial,
            next_step: if approved {
                ApprovalStep::Final
            } else {
                ApprovalStep::Initial
            },
            next_status: if approved {
                ApprovalStatus::InProgress
            } else {
                ApprovalStatus::Rejected
            },
            approved,
        }),
        ReviewState::AwaitingFinal => Ok(Transition {
            stage: ApprovalStep::Final,
            next_step: ApprovalStep::Final,
            next_status: if approved {
                ApprovalStatus::Approved
            } else {
                ApprovalStatus::Rejected
            },
            approved,
        }),
        ReviewState::Terminal(outcome) => Err(CoreError::InvalidState(format!(
            "Review already concluded as {}",
            outcome.name()
        ))),
    }
}
