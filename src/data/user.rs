use crate::error::ClientError;
use crate::role::Role;

/// User identity as embedded in auth token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials:{}", self.email)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Profile:{}({})", self.email, self.role)
    }
}

impl Profile {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::Validation("Name is required.".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ClientError::Validation(
                "Not a valid e-mail address.".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(ClientError::Validation("Password is required.".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of plain `{ "msg": ... }` responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub msg: Option<String>,
}
