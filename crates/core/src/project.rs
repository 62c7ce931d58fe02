//! Project and task status values.
//!
//! Stored as lowercase text in `projects.status` and `tasks.status`.

/// Project is being scoped.
pub const PROJECT_PLANNING: &str = "planning";
/// Project work is underway.
pub const PROJECT_ACTIVE: &str = "active";
/// Project is paused.
pub const PROJECT_ON_HOLD: &str = "on_hold";
/// Project deliverables are finished.
pub const PROJECT_COMPLETED: &str = "completed";
/// Project is closed and read-only.
pub const PROJECT_ARCHIVED: &str = "archived";

/// All valid project statuses.
pub const VALID_PROJECT_STATUSES: &[&str] = &[
    PROJECT_PLANNING,
    PROJECT_ACTIVE,
    PROJECT_ON_HOLD,
    PROJECT_COMPLETED,
    PROJECT_ARCHIVED,
];

pub const TASK_TODO: &str = "todo";
pub const TASK_IN_PROGRESS: &str = "in_progress";
pub const TASK_REVIEW: &str = "review";
pub const TASK_DONE: &str = "done";

/// All valid task statuses.
pub const VALID_TASK_STATUSES: &[&str] = &[TASK_TODO, TASK_IN_PROGRESS, TASK_REVIEW, TASK_DONE];

/// Validate that a project status string is one of the accepted values.
pub fn validate_project_status(status: &str) -> Result<(), String> {
    if VALID_PROJECT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid project status '{status}'. Must be one of: {}",
            VALID_PROJECT_STATUSES.join(", ")
        ))
    }
}

/// Validate that a task status string is one of the accepted values.
pub fn validate_task_status(status: &str) -> Result<(), String> {
    if VALID_TASK_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid task status '{status}'. Must be one of: {}",
            VALID_TASK_STATUSES.join(", ")
        ))
    }
}

/// Archived projects no longer accept new tasks or edits to existing ones.
pub fn project_accepts_changes(status: &str) -> bool {
    status != PROJECT_ARCHIVED
}

/// Validate an optional start/end date pair.
pub fn validate_date_range(
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Result<(), String> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err(format!("End date {e} is before start date {s}")),
        _ => Ok(()),
    }
}
