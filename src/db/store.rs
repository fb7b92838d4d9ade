// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage handle used by the services.
//!
//! [`Db`] dispatches generic document operations to either Firestore or the
//! in-memory store, and adds typed helpers for the three collections.

use serde::{de::DeserializeOwned, Serialize};

use crate::config::{Config, DatabaseBackend};
use crate::db::{collections, FirestoreBackend, MemoryStore};
use crate::error::AppError;
use crate::models::{GroupActivityTeam, Gym, User};

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreBackend),
    Memory(MemoryStore),
}

/// Cloneable database handle.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
}

impl Db {
    /// Open the backend selected in configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.database_backend {
            DatabaseBackend::Firestore => {
                let firestore = FirestoreBackend::new(&config.gcp_project_id).await?;
                Ok(Self {
                    backend: Backend::Firestore(firestore),
                })
            }
            DatabaseBackend::Memory => {
                tracing::warn!("Using in-memory database; data will not survive restart");
                Ok(Self::new_in_memory())
            }
        }
    }

    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
        }
    }

    // ─── Generic Operations ──────────────────────────────────────

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.get(collection, id).await,
            Backend::Memory(mem) => mem.get(collection, id),
        }
    }

    /// Create or overwrite a document.
    pub async fn put<T>(&self, collection: &str, id: &str, record: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.put(collection, id, record).await,
            Backend::Memory(mem) => mem.put(collection, id, record),
        }
    }

    pub async fn list<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.list(collection).await,
            Backend::Memory(mem) => mem.list(collection),
        }
    }

    /// List a collection and keep the records matching `predicate`.
    pub async fn query<T, F>(&self, collection: &str, predicate: F) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
        F: Fn(&T) -> bool,
    {
        let mut records: Vec<T> = self.list(collection).await?;
        records.retain(|r| predicate(r));
        Ok(records)
    }

    pub async fn find_by_field<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(fs) => fs.find_by_field(collection, field, value).await,
            Backend::Memory(mem) => mem.find_by_field(collection, field, value),
        }
    }

    /// Delete a document, returning whether it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.delete(collection, id).await,
            Backend::Memory(mem) => Ok(mem.delete(collection, id)),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get(collections::USERS, user_id).await
    }

    /// Look up a user by (already normalized) email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .find_by_field(collections::USERS, "email", email)
            .await?;
        Ok(users.into_iter().next())
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.put(collections::USERS, &user.user_id, user).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.list(collections::USERS).await
    }

    // ─── Team Operations ─────────────────────────────────────────

    pub async fn get_team(&self, team_id: &str) -> Result<Option<GroupActivityTeam>, AppError> {
        self.get(collections::TEAMS, team_id).await
    }

    pub async fn upsert_team(&self, team: &GroupActivityTeam) -> Result<(), AppError> {
        self.put(collections::TEAMS, &team.team_id, team).await
    }

    pub async fn delete_team(&self, team_id: &str) -> Result<bool, AppError> {
        self.delete(collections::TEAMS, team_id).await
    }

    // ─── Gym Operations ──────────────────────────────────────────

    pub async fn get_gym(&self, gym_id: &str) -> Result<Option<Gym>, AppError> {
        self.get(collections::GYMS, gym_id).await
    }

    pub async fn upsert_gym(&self, gym: &Gym) -> Result<(), AppError> {
        self.put(collections::GYMS, &gym.gym_id, gym).await
    }

    pub async fn list_gyms(&self) -> Result<Vec<Gym>, AppError> {
        self.list(collections::GYMS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_lookup_by_email() {
        let db = Db::new_in_memory();
        let user = User::new("Ana", "ana@example.com", "hash".to_string());
        db.upsert_user(&user).await.unwrap();

        let found = db.get_user_by_email("ana@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.user_id), Some(user.user_id));
        assert!(db.get_user_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_by_id() {
        let db = Db::new_in_memory();
        let mut user = User::new("Ana", "ana@example.com", "hash".to_string());
        db.put(collections::USERS, &user.user_id, &user).await.unwrap();

        user.name = "Ana Maria".to_string();
        db.put(collections::USERS, &user.user_id, &user).await.unwrap();

        let stored: Option<User> = db.get(collections::USERS, &user.user_id).await.unwrap();
        assert_eq!(stored.map(|u| u.name), Some("Ana Maria".to_string()));
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_filters_in_order() {
        let db = Db::new_in_memory();
        for name in ["a", "b", "c"] {
            let user = User::new(name, &format!("{}@example.com", name), "h".to_string());
            db.upsert_user(&user).await.unwrap();
        }

        let users: Vec<User> = db
            .query(collections::USERS, |u: &User| u.name != "b")
            .await
            .unwrap();
        let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
