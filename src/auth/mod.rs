mod session;
mod storage;
mod user;

pub use session::{Session, STORAGE_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use user::User;
