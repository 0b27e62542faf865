//! # Events
//!
//! One event is published per successful mutation. Failed calls publish
//! nothing. The off-chain indexer keys on the leading topic symbol:
//!
//! | Topic      | Extra topics               | Data               |
//! |------------|----------------------------|--------------------|
//! | `init`     | -                          | admin `Address`    |
//! | `user_reg` | principal                  | [`UserRegistered`] |
//! | `role_set` | target                     | [`RoleAssigned`]   |
//! | `appr_set` | target                     | [`ApprovalSet`]    |
//! | `created`  | project_id                 | [`ProjectCreated`] |
//! | `bid`      | project_id                 | [`BidSubmitted`]   |
//! | `ms_done`  | project_id, milestone_id   | [`MilestoneEvent`] |
//! | `amend`    | project_id, milestone_id   | [`MilestoneEvent`] |
//! | `ms_ok`    | project_id, milestone_id   | [`MilestoneEvent`] |
//! | `released` | project_id, milestone_id   | [`PaymentReleased`] |

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::types::{ApprovalStatus, MilestoneStatus, Role};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserRegistered {
    pub principal: Address,
    pub role: Role,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleAssigned {
    pub by: Address,
    pub target: Address,
    pub role: Role,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApprovalSet {
    pub by: Address,
    pub target: Address,
    pub status: ApprovalStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCreated {
    pub project_id: u64,
    pub client: Address,
    pub total_amount: u128,
    pub milestone_count: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BidSubmitted {
    pub project_id: u64,
    pub provider: Address,
    pub amount: u128,
}

/// Data of the `ms_done`, `amend` and `ms_ok` events.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneEvent {
    pub project_id: u64,
    pub milestone_id: u64,
    pub caller: Address,
    pub status: MilestoneStatus,
    pub amendment_requests: u32,
    pub review_deadline: Option<u64>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentReleased {
    pub project_id: u64,
    pub milestone_id: u64,
    pub caller: Address,
    pub amount: u128,
}

pub const TOPIC_INIT: Symbol = symbol_short!("init");
pub const TOPIC_USER_REGISTERED: Symbol = symbol_short!("user_reg");
pub const TOPIC_ROLE_SET: Symbol = symbol_short!("role_set");
pub const TOPIC_APPROVAL_SET: Symbol = symbol_short!("appr_set");
pub const TOPIC_PROJECT_CREATED: Symbol = symbol_short!("created");
pub const TOPIC_BID_SUBMITTED: Symbol = symbol_short!("bid");
pub const TOPIC_MILESTONE_COMPLETED: Symbol = symbol_short!("ms_done");
pub const TOPIC_AMENDMENT_REQUESTED: Symbol = symbol_short!("amend");
pub const TOPIC_MILESTONE_APPROVED: Symbol = symbol_short!("ms_ok");
pub const TOPIC_PAYMENT_RELEASED: Symbol = symbol_short!("released");

pub fn emit_initialized(env: &Env, admin: Address) {
    env.events().publish((TOPIC_INIT,), admin);
}

pub fn emit_user_registered(env: &Env, principal: Address, role: Role) {
    let data = UserRegistered {
        principal: principal.clone(),
        role,
    };
    env.events().publish((TOPIC_USER_REGISTERED, principal), data);
}

pub fn emit_role_assigned(env: &Env, by: Address, target: Address, role: Role) {
    let data = RoleAssigned {
        by,
        target: target.clone(),
        role,
    };
    env.events().publish((TOPIC_ROLE_SET, target), data);
}

pub fn emit_approval_set(env: &Env, by: Address, target: Address, status: ApprovalStatus) {
    let data = ApprovalSet {
        by,
        target: target.clone(),
        status,
    };
    env.events().publish((TOPIC_APPROVAL_SET, target), data);
}

pub fn emit_project_created(
    env: &Env,
    project_id: u64,
    client: Address,
    total_amount: u128,
    milestone_count: u32,
) {
    let data = ProjectCreated {
        project_id,
        client,
        total_amount,
        milestone_count,
    };
    env.events().publish((TOPIC_PROJECT_CREATED, project_id), data);
}

pub fn emit_bid_submitted(env: &Env, project_id: u64, provider: Address, amount: u128) {
    let data = BidSubmitted {
        project_id,
        provider,
        amount,
    };
    env.events().publish((TOPIC_BID_SUBMITTED, project_id), data);
}

/// Publish a milestone transition under `topic`.
pub fn emit_milestone_event(env: &Env, topic: Symbol, data: MilestoneEvent) {
    env.events().publish((topic, data.project_id, data.milestone_id), data);
}

pub fn emit_payment_released(
    env: &Env,
    project_id: u64,
    milestone_id: u64,
    caller: Address,
    amount: u128,
) {
    let data = PaymentReleased {
        project_id,
        milestone_id,
        caller,
        amount,
    };
    env.events().publish((TOPIC_PAYMENT_RELEASED, project_id, milestone_id), data);
}
