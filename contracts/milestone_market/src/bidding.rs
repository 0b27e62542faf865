//! # Bidding
//!
//! A project keeps a single bid. Submitting a bid replaces whatever bid was
//! stored before; the project stays `Open` and the amount is not compared
//! with the project's budget.

use soroban_sdk::{Address, Env, String};

use crate::events;
use crate::rbac;
use crate::storage;
use crate::types::{Bid, Project, ProjectStatus, Role};
use crate::Error;

/// Return a copy of `project` with `bid` recorded as its accepted bid.
pub fn place(project: &Project, bid: Bid) -> Result<Project, Error> {
    if project.status != ProjectStatus::Open {
        return Err(Error::InvalidState);
    }
    let mut updated = project.clone();
    updated.accepted_bid = Some(bid);
    Ok(updated)
}

pub fn submit_bid(
    env: &Env,
    provider: &Address,
    project_id: u64,
    proposed_timeline: String,
    terms: String,
    amount: u128,
) -> Result<(), Error> {
    rbac::require_permission(env, provider, Role::User, true)?;

    let project = storage::load_project(env, project_id).ok_or(Error::NotFound)?;
    let bid = Bid {
        provider: provider.clone(),
        proposed_timeline,
        terms,
        amount,
    };
    let updated = place(&project, bid)?;
    storage::save_project(env, &updated);

    events::emit_bid_submitted(env, project_id, provider.clone(), amount);
    Ok(())
}
