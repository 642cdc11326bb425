use super::{SessionStorage, User};

use crate::error::Error;

pub const STORAGE_KEY: &str = "ppb_user";

/// Mock login state. Any credentials are accepted; the identity record is kept
/// as JSON under `STORAGE_KEY`.
pub struct Session<S> {
    storage: S,
    user: Option<User>,
}

impl<S: SessionStorage> Session<S> {
    /// Loads the stored identity, discarding a record that no longer parses.
    #[tracing::instrument(name = "Session::restore", skip(storage))]
    pub fn restore(storage: S) -> Result<Self, Error> {
        let user = match storage.get(STORAGE_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!("discarding unreadable session: {}", err);
                    storage.remove(STORAGE_KEY)?;
                    None
                }
            },
            None => None,
        };

        Ok(Self { storage, user })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[tracing::instrument(skip(self, _password))]
    pub fn login(&mut self, email: &str, _password: &str) -> Result<&User, Error> {
        self.sign_in(User::from_email(email.into()))
    }

    #[tracing::instrument(skip(self, _password))]
    pub fn register(&mut self, name: &str, email: &str, _password: &str) -> Result<&User, Error> {
        self.sign_in(User::new(name.into(), email.into()))
    }

    #[tracing::instrument(skip(self))]
    pub fn logout(&mut self) -> Result<(), Error> {
        self.storage.remove(STORAGE_KEY)?;
        self.user = None;

        Ok(())
    }

    fn sign_in(&mut self, user: User) -> Result<&User, Error> {
        self.storage
            .set(STORAGE_KEY, &serde_json::to_string(&user)?)?;

        tracing::info!("signed in as {:?}", &user.email);

        Ok(self.user.insert(user))
    }
}

#[cfg(test)]
use super::MemoryStorage;

#[test]
fn restore_without_record_is_logged_out() {
    let session = Session::restore(MemoryStorage::new()).unwrap();

    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
}

#[test]
fn login_persists_and_restores() {
    let storage = MemoryStorage::new();
    let mut session = Session::restore(storage).unwrap();

    let user = session.login("ana@example.com", "secret").unwrap().clone();
    assert_eq!(user.name, "ana");
    assert!(session.is_authenticated());

    let Session { storage, .. } = session;
    let restored = Session::restore(storage).unwrap();
    assert_eq!(restored.user(), Some(&user));
}

#[test]
fn register_uses_given_name() {
    let mut session = Session::restore(MemoryStorage::new()).unwrap();

    let user = session
        .register("Ana Souza", "ana@example.com", "secret")
        .unwrap();

    assert_eq!(user.name, "Ana Souza");
}

#[test]
fn logout_clears_record() {
    let mut session = Session::restore(MemoryStorage::new()).unwrap();
    session.login("ana@example.com", "secret").unwrap();

    session.logout().unwrap();

    assert!(!session.is_authenticated());
    assert_eq!(session.storage.get(STORAGE_KEY).unwrap(), None);
}

#[test]
fn corrupt_record_is_removed() {
    let storage = MemoryStorage::new();
    storage.set(STORAGE_KEY, "{not json").unwrap();

    let session = Session::restore(storage).unwrap();

    assert!(!session.is_authenticated());
    assert_eq!(session.storage.get(STORAGE_KEY).unwrap(), None);
}
