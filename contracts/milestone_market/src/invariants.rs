#![allow(dead_code)]

extern crate std;

use soroban_sdk::Vec;

use crate::types::{Milestone, MilestoneStatus, Project};
use crate::workflow::{MAX_AMENDMENT_REQUESTS, REVIEW_PERIOD_SECS};

/// INV-1: Project IDs are sequential starting from 0.
pub fn assert_sequential_ids(projects: &Vec<Project>) {
    for (i, project) in projects.iter().enumerate() {
        assert_eq!(
            project.id, i as u64,
            "INV-1 violated: expected id {}, got {}",
            i, project.id
        );
    }
}

/// INV-2: A milestone never records more than two amendment requests.
pub fn assert_amendment_cap(milestone: &Milestone) {
    assert!(
        milestone.amendment_requests <= MAX_AMENDMENT_REQUESTS,
        "INV-2 violated: milestone {} has {} amendment requests",
        milestone.id,
        milestone.amendment_requests
    );
}

/// INV-3: A milestone under review or released has a review deadline.
pub fn assert_deadline_consistent(milestone: &Milestone) {
    if matches!(
        milestone.status,
        MilestoneStatus::UnderReview | MilestoneStatus::PaymentReleased
    ) {
        assert!(
            milestone.review_deadline.is_some(),
            "INV-3 violated: milestone {} is {:?} without a review deadline",
            milestone.id,
            milestone.status
        );
    }
}

/// INV-4: Payment is only released once the review window has closed.
pub fn assert_release_after_deadline(milestone: &Milestone, released_at: u64) {
    if milestone.status == MilestoneStatus::PaymentReleased {
        let deadline = milestone.review_deadline.unwrap_or(u64::MAX);
        assert!(
            released_at >= deadline,
            "INV-4 violated: milestone {} released at {} before deadline {}",
            milestone.id,
            released_at,
            deadline
        );
    }
}

/// INV-5: The review deadline sits exactly one review period after `completed_at`.
pub fn assert_review_window(milestone: &Milestone, completed_at: u64) {
    assert_eq!(
        milestone.review_deadline,
        Some(completed_at + REVIEW_PERIOD_SECS),
        "INV-5 violated: milestone {} has wrong review deadline",
        milestone.id
    );
}

/// INV-6: Fields fixed at creation (id, client, title, description,
/// total_amount, milestone ids and order) never change.
pub fn assert_project_immutable_fields(original: &Project, current: &Project) {
    assert_eq!(original.id, current.id, "INV-6 violated: project id changed");
    assert_eq!(
        original.client, current.client,
        "INV-6 violated: project client changed"
    );
    assert_eq!(
        original.title, current.title,
        "INV-6 violated: project title changed"
    );
    assert_eq!(
        original.description, current.description,
        "INV-6 violated: project description changed"
    );
    assert_eq!(
        original.total_amount, current.total_amount,
        "INV-6 violated: project total_amount changed"
    );
    assert_eq!(
        original.milestones.len(),
        current.milestones.len(),
        "INV-6 violated: milestone count changed"
    );
    for (before, after) in original.milestones.iter().zip(current.milestones.iter()) {
        assert_eq!(before.id, after.id, "INV-6 violated: milestone order changed");
    }
}

/// Run all stateless project invariants.
pub fn assert_all_project_invariants(project: &Project) {
    for milestone in project.milestones.iter() {
        assert_amendment_cap(&milestone);
        assert_deadline_consistent(&milestone);
    }
}
