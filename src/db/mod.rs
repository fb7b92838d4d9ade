//! Persistence layer: a generic document store over Firestore or memory.

pub mod firestore;
pub mod locks;
pub mod memory;
pub mod store;

pub use self::firestore::FirestoreBackend;
pub use locks::KeyedLocks;
pub use memory::MemoryStore;
pub use store::Db;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GYMS: &str = "gyms";
    pub const TEAMS: &str = "group_activity_teams";
}
