//! # Types
//!
//! Shared data structures used across all modules of the marketplace contract.
//!
//! ## Value semantics
//!
//! A [`Project`] is stored as a single ledger entry that embeds its
//! [`Milestone`]s and its accepted [`Bid`]. Milestones and bids have no
//! storage of their own: every transition rebuilds the owning project and
//! writes it back under the same id.
//!
//! ## Milestone lifecycle
//!
//! ```text
//! Pending ──► InProgress ──► UnderReview ──► Approved ──► PaymentReleased
//!                  ▲              │
//!                  └──────────────┘  (amendment, at most twice)
//! ```
//!
//! `Completed` is part of the encoding but no entry point produces it.

use soroban_sdk::{contracttype, Address, String, Vec};

/// Coarse privilege level of a principal.
///
/// Ordered `Guest < User < Admin`; see [`Role::rank`].
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Guest,
    User,
    Admin,
}

impl Role {
    /// Position in the privilege order.
    pub fn rank(&self) -> u32 {
        match self {
            Role::Guest => 0,
            Role::User => 1,
            Role::Admin => 2,
        }
    }

    /// `true` if this role is at least as privileged as `required`.
    pub fn satisfies(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

/// Admin decision on whether a principal may take part in paid workflows.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Stored access record of a principal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserRecord {
    pub role: Role,
    pub approval: ApprovalStatus,
}

impl Default for UserRecord {
    /// Record seen for a principal that never registered.
    fn default() -> Self {
        UserRecord {
            role: Role::Guest,
            approval: ApprovalStatus::Pending,
        }
    }
}

/// Listing view returned by `list_users`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserInfo {
    pub principal: Address,
    pub role: Role,
    pub approval: ApprovalStatus,
}

/// Lifecycle status of a project.
///
/// Only `Open` is produced by the current entry points; the other variants are
/// kept so stored projects stay decodable once close-out flows exist.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProjectStatus {
    /// Accepting bids.
    Open,
    InProgress,
    Completed,
    Disputed,
}

/// Lifecycle status of a single milestone.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    /// Delivered; the client review window is running.
    UnderReview,
    Completed,
    Approved,
    /// Terminal: funds may be released to the provider.
    PaymentReleased,
}

/// A priced sub-deliverable of a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Milestone {
    /// Caller-supplied identifier, used to address the milestone.
    pub id: u64,
    pub description: String,
    pub deliverables: String,
    pub amount: u128,
    pub status: MilestoneStatus,
    /// Number of amendments requested so far (0..=2).
    pub amendment_requests: u32,
    /// Ledger timestamp after which payment may be released.
    /// Set only when the milestone enters `UnderReview`.
    pub review_deadline: Option<u64>,
}

/// A provider's offer on a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bid {
    pub provider: Address,
    pub proposed_timeline: String,
    pub terms: String,
    pub amount: u128,
}

/// A client's project as stored on-chain.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Sequential identifier, assigned once at creation.
    pub id: u64,
    /// Principal that created the project.
    pub client: Address,
    pub title: String,
    pub description: String,
    /// Ordered as supplied at creation.
    pub milestones: Vec<Milestone>,
    pub total_amount: u128,
    pub status: ProjectStatus,
    /// Most recently submitted bid, if any.
    pub accepted_bid: Option<Bid>,
}

impl Project {
    /// Locate a milestone by id. Returns its position and a copy.
    pub fn find_milestone(&self, milestone_id: u64) -> Option<(u32, Milestone)> {
        for (index, milestone) in self.milestones.iter().enumerate() {
            if milestone.id == milestone_id {
                return Some((index as u32, milestone));
            }
        }
        None
    }
}
