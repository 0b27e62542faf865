//! # Storage
//!
//! The contract's state store. Every read and write of contract state goes
//! through the typed helpers below; no other module touches `env.storage()`.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key              | Type      | Description                        |
//! |------------------|-----------|------------------------------------|
//! | `Admin`          | `Address` | Bootstrap admin set by `init`      |
//! | `ProjectCount`   | `u64`     | Auto-increment project ID counter  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key             | Type           | Description                          |
//! |-----------------|----------------|--------------------------------------|
//! | `Project(id)`   | `Project`      | Whole project, milestones and bid    |
//! | `User(address)` | `UserRecord`   | Role and approval of a principal     |
//! | `UserIndex`     | `Vec<Address>` | Principals in registration order     |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! A project is written as one entry so that a milestone transition replaces
//! the whole value in a single `set`.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{Project, UserRecord};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Bootstrap admin address (Instance).
    Admin,
    /// Global auto-increment counter for project IDs (Instance).
    ProjectCount,
    /// Project keyed by ID (Persistent).
    Project(u64),
    /// Access record keyed by principal (Persistent).
    User(Address),
    /// Registration-ordered list of known principals (Persistent).
    UserIndex,
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn has_admin(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

/// Atomically reads, increments, and stores the project counter.
/// Returns the ID to use for the *current* project (pre-increment value).
pub fn get_and_increment_project_id(env: &Env) -> u64 {
    bump_instance(env);
    let current = project_count(env);
    env.storage()
        .instance()
        .set(&DataKey::ProjectCount, &(current + 1));
    current
}

/// Number of projects ever created; also the next ID to be assigned.
pub fn project_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Write (or replace) a project under its own ID.
pub fn save_project(env: &Env, project: &Project) {
    let key = DataKey::Project(project.id);
    env.storage().persistent().set(&key, project);
    bump_persistent(env, &key);
}

/// Load a project, or `None` if the ID was never assigned.
pub fn load_project(env: &Env, id: u64) -> Option<Project> {
    let key = DataKey::Project(id);
    let project: Option<Project> = env.storage().persistent().get(&key);
    if project.is_some() {
        bump_persistent(env, &key);
    }
    project
}

/// All projects in ascending ID order.
pub fn load_all_projects(env: &Env) -> Vec<Project> {
    let mut projects = Vec::new(env);
    for id in 0..project_count(env) {
        if let Some(project) = load_project(env, id) {
            projects.push_back(project);
        }
    }
    projects
}

/// Load the access record of `address`, if one was ever written.
pub fn load_user(env: &Env, address: &Address) -> Option<UserRecord> {
    let key = DataKey::User(address.clone());
    let record: Option<UserRecord> = env.storage().persistent().get(&key);
    if record.is_some() {
        bump_persistent(env, &key);
    }
    record
}

/// Write the access record of `address`.
///
/// The first write for a principal also appends it to the user index, so the
/// index holds exactly one entry per record.
pub fn save_user(env: &Env, address: &Address, record: &UserRecord) {
    let key = DataKey::User(address.clone());
    if !env.storage().persistent().has(&key) {
        let mut index = load_user_index(env);
        index.push_back(address.clone());
        env.storage().persistent().set(&DataKey::UserIndex, &index);
        bump_persistent(env, &DataKey::UserIndex);
    }
    env.storage().persistent().set(&key, record);
    bump_persistent(env, &key);
}

/// Principals with a stored record, in first-registration order.
pub fn load_user_index(env: &Env) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::UserIndex)
        .unwrap_or_else(|| Vec::new(env))
}
