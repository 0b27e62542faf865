//! # Role-Based Access Control
//!
//! Every principal has at most one [`UserRecord`]: a [`Role`] and an
//! [`ApprovalStatus`]. Principals without a record read as `Guest` /
//! `Pending`.
//!
//! | Role    | Can do                                                   |
//! |---------|----------------------------------------------------------|
//! | `Admin` | assign roles, decide approvals, list users, everything a `User` can |
//! | `User`  | create projects, bid, drive milestones (once `Approved`) |
//! | `Guest` | read-only access                                         |
//!
//! The first Admin is set explicitly by [`init_admin`]; further admins are
//! appointed through [`assign_role`].
//!
//! Workflow entry points call [`require_permission`], which turns a failed
//! [`has_permission`] check into [`Error::Unauthorized`] before any state is
//! read or written.

use soroban_sdk::{Address, Env, Vec};

use crate::events;
use crate::storage;
use crate::types::{ApprovalStatus, Role, UserInfo, UserRecord};
use crate::Error;

/// Record a fresh principal gets from [`register`].
const REGISTERED: UserRecord = UserRecord {
    role: Role::User,
    approval: ApprovalStatus::Pending,
};

// ── Bootstrap ────────────────────────────────────────────────────────

/// Make `admin` the bootstrap Admin. Callable once.
pub fn init_admin(env: &Env, admin: &Address) -> Result<(), Error> {
    if storage::has_admin(env) {
        return Err(Error::AlreadyInitialized);
    }
    storage::set_admin(env, admin);
    storage::save_user(
        env,
        admin,
        &UserRecord {
            role: Role::Admin,
            approval: ApprovalStatus::Approved,
        },
    );
    events::emit_initialized(env, admin.clone());
    Ok(())
}

/// First-contact registration. Creates a `User`/`Pending` record for
/// `caller` unless one already exists.
pub fn register(env: &Env, caller: &Address) {
    if storage::load_user(env, caller).is_some() {
        return;
    }
    storage::save_user(env, caller, &REGISTERED);
    events::emit_user_registered(env, caller.clone(), REGISTERED.role);
}

// ── Queries ──────────────────────────────────────────────────────────

/// Stored record of `address`, or the default for unknown principals.
pub fn record_of(env: &Env, address: &Address) -> UserRecord {
    storage::load_user(env, address).unwrap_or_default()
}

pub fn role_of(env: &Env, address: &Address) -> Role {
    record_of(env, address).role
}

pub fn approval_of(env: &Env, address: &Address) -> ApprovalStatus {
    record_of(env, address).approval
}

pub fn is_admin(env: &Env, address: &Address) -> bool {
    role_of(env, address) == Role::Admin
}

/// The permission gate.
///
/// `true` iff the caller's role is at least `required` and, when
/// `require_approval` is set, the caller is `Approved`. Admins always pass.
pub fn has_permission(
    env: &Env,
    caller: &Address,
    required: Role,
    require_approval: bool,
) -> bool {
    let record = record_of(env, caller);
    if record.role == Role::Admin {
        return true;
    }
    if !record.role.satisfies(required) {
        return false;
    }
    !require_approval || record.approval == ApprovalStatus::Approved
}

/// [`has_permission`] as a guard.
pub fn require_permission(
    env: &Env,
    caller: &Address,
    required: Role,
    require_approval: bool,
) -> Result<(), Error> {
    if has_permission(env, caller, required, require_approval) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

pub fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    if is_admin(env, caller) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

// ── Admin mutations ──────────────────────────────────────────────────

/// Overwrite the role of `target`. Approval is left as it was.
pub fn assign_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    require_admin(env, caller)?;
    let mut record = record_of(env, target);
    record.role = role;
    storage::save_user(env, target, &record);
    events::emit_role_assigned(env, caller.clone(), target.clone(), role);
    Ok(())
}

/// Overwrite the approval status of `target`. Role is left as it was.
pub fn set_approval(
    env: &Env,
    caller: &Address,
    target: &Address,
    status: ApprovalStatus,
) -> Result<(), Error> {
    require_admin(env, caller)?;
    let mut record = record_of(env, target);
    record.approval = status;
    storage::save_user(env, target, &record);
    events::emit_approval_set(env, caller.clone(), target.clone(), status);
    Ok(())
}

/// Every principal with a stored record, in registration order.
pub fn list_users(env: &Env, caller: &Address) -> Result<Vec<UserInfo>, Error> {
    require_admin(env, caller)?;
    let mut users = Vec::new(env);
    for principal in storage::load_user_index(env).iter() {
        let record = record_of(env, &principal);
        users.push_back(UserInfo {
            principal,
            role: record.role,
            approval: record.approval,
        });
    }
    Ok(users)
}
