//! # Milestone Market Contract
//!
//! Clients post projects split into milestones, providers bid, and each
//! milestone moves through review, amendment and payment release. Every
//! mutation is gated on the caller's role and approval status.
//!
//! | Phase        | Entry Point(s)                                              |
//! |--------------|-------------------------------------------------------------|
//! | Bootstrap    | [`MilestoneMarket::init`]                                   |
//! | Registration | [`MilestoneMarket::initialize_auth`]                        |
//! | Role admin   | `assign_role`, `set_approval`, `list_users`                 |
//! | Projects     | [`MilestoneMarket::create_project`]                         |
//! | Bidding      | [`MilestoneMarket::submit_bid`]                             |
//! | Milestones   | `complete_milestone`, `request_amendment`, `approve_milestone`, `release_payment` |
//! | Queries      | `get_project`, `list_projects`, `get_milestone`, `project_count`, `get_user_role`, `is_admin`, `get_approval_status` |
//!
//! ## Architecture
//!
//! Authorization is delegated to [`rbac`], storage access to [`storage`],
//! milestone transitions to [`workflow`] and bids to [`bidding`]. This file
//! holds the public entry points only.
//!
//! Every fallible entry point returns `Result<_, Error>`. Nothing is written
//! before all checks pass, and a failed invocation is rolled back by the host.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

pub mod bidding;
pub mod events;
pub mod rbac;
mod storage;
mod types;
pub mod workflow;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use types::{
    ApprovalStatus, Bid, Milestone, MilestoneStatus, Project, ProjectStatus, Role, UserInfo,
    UserRecord,
};
pub use workflow::{Transition, MAX_AMENDMENT_REQUESTS, REVIEW_PERIOD_SECS};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Role or approval gate failed.
    Unauthorized = 1,
    /// Unknown project or milestone id.
    NotFound = 2,
    /// Operation not valid for the project's current status.
    InvalidState = 3,
    AmendmentLimitExceeded = 4,
    /// Release attempted on a milestone that never entered review.
    NotUnderReview = 5,
    ReviewPeriodNotComplete = 6,
    AlreadyInitialized = 7,
}

#[contract]
pub struct MilestoneMarket;

#[contractimpl]
impl MilestoneMarket {
    // ─────────────────────────────────────────────────────────
    // Bootstrap and registration
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract and set the first Admin.
    ///
    /// Must be called exactly once immediately after deployment.
    /// Subsequent calls fail with `Error::AlreadyInitialized`.
    pub fn init(env: Env, admin: Address) -> Result<(), Error> {
        admin.require_auth();
        rbac::init_admin(&env, &admin)
    }

    /// Register `caller` as a `User` awaiting approval.
    ///
    /// No-op if `caller` already has a record.
    pub fn initialize_auth(env: Env, caller: Address) {
        caller.require_auth();
        rbac::register(&env, &caller);
    }

    // ─────────────────────────────────────────────────────────
    // Access control
    // ─────────────────────────────────────────────────────────

    /// Role of `caller`; `Guest` if unregistered.
    pub fn get_user_role(env: Env, caller: Address) -> Role {
        rbac::role_of(&env, &caller)
    }

    pub fn is_admin(env: Env, caller: Address) -> bool {
        rbac::is_admin(&env, &caller)
    }

    /// Approval status of `caller`; `Pending` if unregistered.
    pub fn get_approval_status(env: Env, caller: Address) -> ApprovalStatus {
        rbac::approval_of(&env, &caller)
    }

    /// Set the role of `target`. `caller` must be an Admin.
    pub fn assign_role(
        env: Env,
        caller: Address,
        target: Address,
        role: Role,
    ) -> Result<(), Error> {
        caller.require_auth();
        rbac::assign_role(&env, &caller, &target, role)
    }

    /// Set the approval status of `target`. `caller` must be an Admin.
    pub fn set_approval(
        env: Env,
        caller: Address,
        target: Address,
        status: ApprovalStatus,
    ) -> Result<(), Error> {
        caller.require_auth();
        rbac::set_approval(&env, &caller, &target, status)
    }

    /// All registered principals. `caller` must be an Admin.
    pub fn list_users(env: Env, caller: Address) -> Result<Vec<UserInfo>, Error> {
        caller.require_auth();
        rbac::list_users(&env, &caller)
    }

    /// Return `true` if `caller` holds at least `required` and, when
    /// `require_approval` is set, has been approved.
    pub fn has_permission(
        env: Env,
        caller: Address,
        required: Role,
        require_approval: bool,
    ) -> bool {
        rbac::has_permission(&env, &caller, required, require_approval)
    }

    // ─────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────

    /// Create a project owned by `caller` and return its ID.
    ///
    /// Milestones are stored exactly as given.
    pub fn create_project(
        env: Env,
        caller: Address,
        title: String,
        description: String,
        milestones: Vec<Milestone>,
        total_amount: u128,
    ) -> Result<u64, Error> {
        caller.require_auth();
        rbac::require_permission(&env, &caller, Role::User, true)?;

        let id = storage::get_and_increment_project_id(&env);
        let milestone_count = milestones.len();
        let project = Project {
            id,
            client: caller.clone(),
            title,
            description,
            milestones,
            total_amount,
            status: ProjectStatus::Open,
            accepted_bid: None,
        };
        storage::save_project(&env, &project);

        events::emit_project_created(&env, id, caller, total_amount, milestone_count);
        Ok(id)
    }

    pub fn get_project(env: Env, id: u64) -> Option<Project> {
        storage::load_project(&env, id)
    }

    /// Every project, in ascending ID order.
    pub fn list_projects(env: Env) -> Vec<Project> {
        storage::load_all_projects(&env)
    }

    pub fn get_milestone(env: Env, project_id: u64, milestone_id: u64) -> Option<Milestone> {
        storage::load_project(&env, project_id)
            .and_then(|project| project.find_milestone(milestone_id))
            .map(|(_, milestone)| milestone)
    }

    /// Number of projects created so far.
    pub fn project_count(env: Env) -> u64 {
        storage::project_count(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Bidding
    // ─────────────────────────────────────────────────────────

    /// Record a bid from `caller`, replacing any earlier bid.
    ///
    /// The project must be `Open`.
    pub fn submit_bid(
        env: Env,
        caller: Address,
        project_id: u64,
        proposed_timeline: String,
        terms: String,
        amount: u128,
    ) -> Result<(), Error> {
        caller.require_auth();
        bidding::submit_bid(&env, &caller, project_id, proposed_timeline, terms, amount)
    }

    // ─────────────────────────────────────────────────────────
    // Milestone workflow
    // ─────────────────────────────────────────────────────────

    /// Put a milestone under review and start the 7-day review window.
    pub fn complete_milestone(
        env: Env,
        caller: Address,
        project_id: u64,
        milestone_id: u64,
    ) -> Result<(), Error> {
        caller.require_auth();
        workflow::advance(&env, &caller, project_id, milestone_id, Transition::Complete)?;
        Ok(())
    }

    /// Send a milestone back to `InProgress`. At most two per milestone.
    pub fn request_amendment(
        env: Env,
        caller: Address,
        project_id: u64,
        milestone_id: u64,
    ) -> Result<(), Error> {
        caller.require_auth();
        workflow::advance(
            &env,
            &caller,
            project_id,
            milestone_id,
            Transition::RequestAmendment,
        )?;
        Ok(())
    }

    pub fn approve_milestone(
        env: Env,
        caller: Address,
        project_id: u64,
        milestone_id: u64,
    ) -> Result<(), Error> {
        caller.require_auth();
        workflow::advance(&env, &caller, project_id, milestone_id, Transition::Approve)?;
        Ok(())
    }

    /// Mark a milestone's payment as releasable.
    ///
    /// Requires the milestone's review deadline to have passed. This records
    /// the release; it does not move funds.
    pub fn release_payment(
        env: Env,
        caller: Address,
        project_id: u64,
        milestone_id: u64,
    ) -> Result<(), Error> {
        caller.require_auth();
        workflow::advance(
            &env,
            &caller,
            project_id,
            milestone_id,
            Transition::ReleasePayment,
        )?;
        Ok(())
    }
}
