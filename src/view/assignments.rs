use chrono::{DateTime, Utc};

use crate::data::assignment::{Assignment, AssignmentStatus};

/// Assignments split by the status the API reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentBoard<'a> {
    pub assigned: Vec<&'a Assignment>,
    pub in_progress: Vec<&'a Assignment>,
    pub completed: Vec<&'a Assignment>,
    pub overdue: Vec<&'a Assignment>,
}

impl<'a> AssignmentBoard<'a> {
    pub fn new(assignments: &'a [Assignment]) -> AssignmentBoard<'a> {
        let mut board = AssignmentBoard::default();
        for assignment in assignments {
            match assignment.status {
                AssignmentStatus::Assigned => board.assigned.push(assignment),
                AssignmentStatus::InProgress => board.in_progress.push(assignment),
                AssignmentStatus::Completed => board.completed.push(assignment),
                AssignmentStatus::Overdue => board.overdue.push(assignment),
            }
        }
        board
    }

    /// Non-empty groups in display order.
    pub fn groups(&self) -> Vec<(AssignmentStatus, &[&'a Assignment])> {
        [
            (AssignmentStatus::Assigned, self.assigned.as_slice()),
            (AssignmentStatus::InProgress, self.in_progress.as_slice()),
            (AssignmentStatus::Completed, self.completed.as_slice()),
            (AssignmentStatus::Overdue, self.overdue.as_slice()),
        ]
        .into_iter()
        .filter(|(_, it)| !it.is_empty())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups().is_empty()
    }
}

/// One line of the assignment list.
pub fn describe(assignment: &Assignment, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{} [{}] due {}",
        assignment.quiz.title(),
        assignment.status,
        assignment.due_date.format("%Y-%m-%d %H:%M")
    );
    if assignment.is_past_due(now) {
        line.push_str(" (past due)");
    }
    line
}
