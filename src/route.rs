//! Screens of the client and which one a user actually lands on.

use crate::data::user::User;
use crate::role::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Questions,
    Quizzes,
    CreateQuiz,
    EditQuiz(String),
    Assignments,
    TakeQuiz(String),
    Analytics(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::Questions => "/questions".to_string(),
            Route::Quizzes => "/quizzes".to_string(),
            Route::CreateQuiz => "/quiz/create".to_string(),
            Route::EditQuiz(id) => format!("/quiz/edit/{}", id),
            Route::Assignments => "/assignments".to_string(),
            Route::TakeQuiz(id) => format!("/take-quiz/{}", id),
            Route::Analytics(id) => format!("/analytics/{}", id),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            [""] => Route::Dashboard,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["questions"] => Route::Questions,
            ["quizzes"] => Route::Quizzes,
            ["quiz", "create"] => Route::CreateQuiz,
            ["quiz", "edit", id] if !id.is_empty() => Route::EditQuiz(id.to_string()),
            ["assignments"] => Route::Assignments,
            ["take-quiz", id] if !id.is_empty() => Route::TakeQuiz(id.to_string()),
            ["analytics", id] if !id.is_empty() => Route::Analytics(id.to_string()),
            _ => return None,
        };
        Some(route)
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::Dashboard => "Dashboard",
            Route::Questions => "Questions",
            Route::Quizzes => "Quizzes",
            Route::CreateQuiz => "Create Quiz",
            Route::EditQuiz(_) => "Edit Quiz",
            Route::Assignments => "Assignments",
            Route::TakeQuiz(_) => "Take Quiz",
            Route::Analytics(_) => "Analytics",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Where a request for `route` ends up. Protected screens need a session;
/// the login and registration screens are skipped once there is one.
///
/// Roles are not checked here, the API refuses what a role may not do.
pub fn resolve(route: Route, user: Option<&User>) -> Route {
    match user {
        None if !route.is_public() => Route::Login,
        Some(_) if route.is_public() => Route::Dashboard,
        _ => route,
    }
}

/// Navigation links shown to a logged in user.
pub fn nav(role: Role) -> Vec<Route> {
    match role {
        Role::Teacher => vec![Route::Dashboard, Route::Questions, Route::Quizzes],
        Role::Student => vec![Route::Dashboard, Route::Assignments],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            name: "Test".to_string(),
            role,
        }
    }

    #[test]
    fn anonymous_users_land_on_login() {
        assert_eq!(resolve(Route::Dashboard, None), Route::Login);
        assert_eq!(
            resolve(Route::TakeQuiz("z1".to_string()), None),
            Route::Login
        );
        assert_eq!(resolve(Route::Register, None), Route::Register);
    }

    #[test]
    fn logged_in_users_skip_login() {
        let teacher = user(Role::Teacher);
        assert_eq!(resolve(Route::Login, Some(&teacher)), Route::Dashboard);
        assert_eq!(resolve(Route::Quizzes, Some(&teacher)), Route::Quizzes);
    }

    #[test]
    fn nav_follows_role() {
        assert_eq!(
            nav(Role::Teacher),
            vec![Route::Dashboard, Route::Questions, Route::Quizzes]
        );
        assert_eq!(nav(Role::Student), vec![Route::Dashboard, Route::Assignments]);
    }

    #[test]
    fn paths_parse_back() {
        for route in [
            Route::Dashboard,
            Route::CreateQuiz,
            Route::EditQuiz("z1".to_string()),
            Route::Analytics("z1".to_string()),
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/take-quiz/"), None);
        assert_eq!(Route::parse("/nowhere"), None);
    }
}
