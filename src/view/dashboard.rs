use crate::data::assignment::{Assignment, AssignmentStatus};
use crate::data::quiz::Quiz;

const RECENT_QUIZZES: usize = 3;
const RECENT_ASSIGNMENTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherDashboard<'a> {
    pub total_quizzes: usize,
    /// Summed over quizzes, so a question used twice counts twice.
    pub total_questions: usize,
    pub recent_quizzes: &'a [Quiz],
}

impl<'a> TeacherDashboard<'a> {
    /// `quizzes` in the order the API lists them.
    pub fn new(quizzes: &'a [Quiz]) -> TeacherDashboard<'a> {
        TeacherDashboard {
            total_quizzes: quizzes.len(),
            total_questions: quizzes.iter().map(|it| it.questions.len()).sum(),
            recent_quizzes: &quizzes[..quizzes.len().min(RECENT_QUIZZES)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentDashboard<'a> {
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
    pub recent_assignments: &'a [Assignment],
}

impl<'a> StudentDashboard<'a> {
    pub fn new(assignments: &'a [Assignment]) -> StudentDashboard<'a> {
        let count = |status: AssignmentStatus| {
            assignments
                .iter()
                .filter(|it| it.status == status)
                .count()
        };
        StudentDashboard {
            pending: count(AssignmentStatus::Assigned),
            completed: count(AssignmentStatus::Completed),
            overdue: count(AssignmentStatus::Overdue),
            recent_assignments: &assignments[..assignments.len().min(RECENT_ASSIGNMENTS)],
        }
    }
}
