use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
        }
    }

    /// Mock login identity: the display name is the local part of the email.
    pub fn from_email(email: String) -> Self {
        let name = email.split('@').next().unwrap_or_default().to_string();

        Self::new(name, email)
    }
}

#[test]
fn from_email_uses_local_part() {
    let user = User::from_email("ana@example.com".into());

    assert_eq!(user.name, "ana");
    assert_eq!(user.email, "ana@example.com");
}

#[test]
fn from_email_without_domain() {
    assert_eq!(User::from_email("ana".into()).name, "ana");
}
