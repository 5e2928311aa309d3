use std::fmt;

use serde::Deserialize;

/// A registered account. The password is stored exactly as submitted.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub user_name: String,
    pub password: String,
}

impl User {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<User {}>", self.user_name)
    }
}

/// Body of `POST /signUp` and `POST /login`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialsForm {
    pub user_name: String,
    pub password: String,
}

/// Body of `POST /changePassword`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub user_name: String,
    pub old_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_password() {
        let user = User::new("testUser1", "123four");
        let debug = format!("{user:?}");
        assert!(debug.contains("testUser1"));
        assert!(!debug.contains("123four"));
        assert_eq!(user.to_string(), "<User testUser1>");
    }
}
