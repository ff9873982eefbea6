use serde::{Deserialize, Serialize};

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    username: String,
    display_name: String,
    email: Option<String>,
    roles: Vec<String>,
}

impl UserIdentity {
    /// Creates a user identity from directory data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        username: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            username: username.into(),
            display_name: display_name.into(),
            email,
            roles,
        }
    }

    /// Returns the stable directory identifier of the user.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the login name the user signed in with.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the role names granted at sign-in.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        self.roles.as_slice()
    }
}
