//! # Milestone workflow
//!
//! State transitions of a single milestone inside its project.
//!
//! | Transition                     | Precondition                          | Effect |
//! |--------------------------------|---------------------------------------|--------|
//! | [`Transition::Complete`]       | -                                     | `UnderReview`, deadline = now + 7 days |
//! | [`Transition::RequestAmendment`] | fewer than 2 amendments so far      | `InProgress`, counter + 1 |
//! | [`Transition::Approve`]        | -                                     | `Approved` |
//! | [`Transition::ReleasePayment`] | deadline set and reached              | `PaymentReleased` |
//!
//! Release is gated only on the review deadline. A milestone that entered
//! review once keeps its deadline through later amendments.
//!
//! [`advance`] is the only path that writes: it checks the caller, loads the
//! project, applies the transition to a copy and replaces the stored project
//! in one write. Any error leaves storage untouched.

use soroban_sdk::{Address, Env, Symbol};

use crate::events::{self, MilestoneEvent};
use crate::rbac;
use crate::storage;
use crate::types::{Milestone, MilestoneStatus, Project, Role};
use crate::Error;

/// Length of the client review window, in seconds (7 days).
pub const REVIEW_PERIOD_SECS: u64 = 604_800;

/// Amendments a milestone may receive over its lifetime.
pub const MAX_AMENDMENT_REQUESTS: u32 = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    Complete,
    RequestAmendment,
    Approve,
    ReleasePayment,
}

impl Transition {
    /// Compute the next state of `milestone` at ledger time `now`.
    pub fn apply(self, milestone: &Milestone, now: u64) -> Result<Milestone, Error> {
        let mut next = milestone.clone();
        match self {
            Transition::Complete => {
                next.status = MilestoneStatus::UnderReview;
                next.review_deadline = Some(now.saturating_add(REVIEW_PERIOD_SECS));
            }
            Transition::RequestAmendment => {
                if milestone.amendment_requests >= MAX_AMENDMENT_REQUESTS {
                    return Err(Error::AmendmentLimitExceeded);
                }
                next.amendment_requests += 1;
                next.status = MilestoneStatus::InProgress;
            }
            Transition::Approve => {
                next.status = MilestoneStatus::Approved;
            }
            Transition::ReleasePayment => match milestone.review_deadline {
                None => return Err(Error::NotUnderReview),
                Some(deadline) if now < deadline => return Err(Error::ReviewPeriodNotComplete),
                Some(_) => next.status = MilestoneStatus::PaymentReleased,
            },
        }
        Ok(next)
    }

    fn topic(self) -> Symbol {
        match self {
            Transition::Complete => events::TOPIC_MILESTONE_COMPLETED,
            Transition::RequestAmendment => events::TOPIC_AMENDMENT_REQUESTED,
            Transition::Approve => events::TOPIC_MILESTONE_APPROVED,
            Transition::ReleasePayment => events::TOPIC_PAYMENT_RELEASED,
        }
    }
}

/// Return a copy of `project` with milestone `milestone_id` advanced by
/// `transition`.
pub fn apply_to_project(
    project: &Project,
    milestone_id: u64,
    transition: Transition,
    now: u64,
) -> Result<Project, Error> {
    let (index, milestone) = project
        .find_milestone(milestone_id)
        .ok_or(Error::NotFound)?;
    let advanced = transition.apply(&milestone, now)?;

    let mut updated = project.clone();
    updated.milestones.set(index, advanced);
    Ok(updated)
}

/// Run `transition` on a stored milestone on behalf of `caller`.
///
/// Returns the milestone as persisted.
pub fn advance(
    env: &Env,
    caller: &Address,
    project_id: u64,
    milestone_id: u64,
    transition: Transition,
) -> Result<Milestone, Error> {
    rbac::require_permission(env, caller, Role::User, true)?;

    let project = storage::load_project(env, project_id).ok_or(Error::NotFound)?;
    let now = env.ledger().timestamp();
    let updated = apply_to_project(&project, milestone_id, transition, now)?;
    storage::save_project(env, &updated);

    let (_, milestone) = updated
        .find_milestone(milestone_id)
        .ok_or(Error::NotFound)?;
    publish(env, caller, project_id, &milestone, transition);
    Ok(milestone)
}

fn publish(
    env: &Env,
    caller: &Address,
    project_id: u64,
    milestone: &Milestone,
    transition: Transition,
) {
    match transition {
        Transition::ReleasePayment => events::emit_payment_released(
            env,
            project_id,
            milestone.id,
            caller.clone(),
            milestone.amount,
        ),
        _ => events::emit_milestone_event(
            env,
            transition.topic(),
            MilestoneEvent {
                project_id,
                milestone_id: milestone.id,
                caller: caller.clone(),
                status: milestone.status,
                amendment_requests: milestone.amendment_requests,
                review_deadline: milestone.review_deadline,
            },
        ),
    }
}
