//! Canonical event types emitted by the milestone market contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/milestone_market/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the marketplace contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The bootstrap admin was set (`init` topic).
    Initialized,
    /// A principal registered (`user_reg` topic).
    UserRegistered,
    /// An admin assigned a role (`role_set` topic).
    RoleAssigned,
    /// An admin decided an approval (`appr_set` topic).
    ApprovalSet,
    /// A new project was created (`created` topic).
    ProjectCreated,
    /// A provider bid on a project (`bid` topic).
    BidSubmitted,
    /// A milestone entered review (`ms_done` topic).
    MilestoneCompleted,
    /// A milestone was sent back for rework (`amend` topic).
    AmendmentRequested,
    /// A milestone was approved (`ms_ok` topic).
    MilestoneApproved,
    /// A milestone's payment became releasable (`released` topic).
    PaymentReleased,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "init" => Self::Initialized,
            "user_reg" => Self::UserRegistered,
            "role_set" => Self::RoleAssigned,
            "appr_set" => Self::ApprovalSet,
            "created" => Self::ProjectCreated,
            "bid" => Self::BidSubmitted,
            "ms_done" => Self::MilestoneCompleted,
            "amend" => Self::AmendmentRequested,
            "ms_ok" => Self::MilestoneApproved,
            "released" => Self::PaymentReleased,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::UserRegistered => "user_registered",
            Self::RoleAssigned => "role_assigned",
            Self::ApprovalSet => "approval_set",
            Self::ProjectCreated => "project_created",
            Self::BidSubmitted => "bid_submitted",
            Self::MilestoneCompleted => "milestone_completed",
            Self::AmendmentRequested => "amendment_requested",
            Self::MilestoneApproved => "milestone_approved",
            Self::PaymentReleased => "payment_released",
            Self::Unknown => "unknown",
        }
    }

    /// `true` for events whose second topic is a project id.
    pub fn is_project_scoped(&self) -> bool {
        matches!(
            self,
            Self::ProjectCreated
                | Self::BidSubmitted
                | Self::MilestoneCompleted
                | Self::AmendmentRequested
                | Self::MilestoneApproved
                | Self::PaymentReleased
        )
    }

    /// `true` for events whose third topic is a milestone id.
    pub fn is_milestone_scoped(&self) -> bool {
        matches!(
            self,
            Self::MilestoneCompleted
                | Self::AmendmentRequested
                | Self::MilestoneApproved
                | Self::PaymentReleased
        )
    }
}

/// A fully decoded marketplace event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEvent {
    /// RPC event id; the dedup key.
    pub event_id: String,
    pub event_type: String,
    pub project_id: Option<String>,
    pub milestone_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub project_id: Option<String>,
    pub milestone_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
