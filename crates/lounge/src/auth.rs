//! Role gate for the web UI.
//!
//! A shared code per role is exchanged for a session token. Handlers resolve
//! the token into an explicit [`Access`] value and check it before calling
//! into the store, which does no access control of its own.

use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;

pub const SESSION_COOKIE: &str = "lounge_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Staff,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
        }
    }

    /// Staff may do everything a student can
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::Student => true,
            Role::Staff => self == Role::Staff,
        }
    }
}

/// The caller of an operation, passed explicitly to each handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub role: Role,
}

impl Access {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Ok when the caller holds `required` or a stronger role
    pub fn require(&self, required: Role) -> Result<(), Forbidden> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(Forbidden { required })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forbidden {
    pub required: Role,
}

/// Map a submitted code to the role it unlocks
pub fn role_for_code(config: &Config, code: &str) -> Option<Role> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else if code == config.staff_code {
        Some(Role::Staff)
    } else if code == config.student_code {
        Some(Role::Student)
    } else {
        None
    }
}

/// In-memory session table, token -> role
#[derive(Default)]
pub struct Sessions {
    inner: RwLock<HashMap<String, Role>>,
}

impl Sessions {
    pub async fn create(&self, role: Role) -> String {
        let token = Uuid::new_v4().to_string();
        self.inner.write().await.insert(token.clone(), role);
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<Access> {
        self.inner
            .read()
            .await
            .get(token)
            .map(|&role| Access { role })
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }
}

/// Extract the session token from a raw `Cookie` header value
pub fn session_token(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            db_path: "unused.db".into(),
            staff_code: "staff-secret".to_string(),
            student_code: "student-secret".to_string(),
        }
    }

    #[test]
    fn test_role_for_code() {
        let config = test_config();
        assert_eq!(role_for_code(&config, "staff-secret"), Some(Role::Staff));
        assert_eq!(role_for_code(&config, " student-secret "), Some(Role::Student));
        assert_eq!(role_for_code(&config, "guess"), None);
        assert_eq!(role_for_code(&config, ""), None);
    }

    #[test]
    fn test_access_require() {
        let staff = Access { role: Role::Staff };
        let student = Access { role: Role::Student };

        assert!(staff.require(Role::Staff).is_ok());
        assert!(staff.require(Role::Student).is_ok());
        assert!(student.require(Role::Student).is_ok());
        assert_eq!(
            student.require(Role::Staff),
            Err(Forbidden { required: Role::Staff })
        );
    }

    #[test]
    fn test_session_token_parsing() {
        assert_eq!(
            session_token("theme=dark; lounge_session=abc-123; other=1"),
            Some("abc-123")
        );
        assert_eq!(session_token("lounge_session="), None);
        assert_eq!(session_token("theme=dark"), None);
    }

    #[tokio::test]
    async fn test_sessions_lifecycle() {
        let sessions = Sessions::default();
        let token = sessions.create(Role::Student).await;

        assert_eq!(
            sessions.resolve(&token).await,
            Some(Access { role: Role::Student })
        );
        assert!(sessions.remove(&token).await);
        assert!(sessions.resolve(&token).await.is_none());
        assert!(!sessions.remove(&token).await);
    }
}
