// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Documents are kept as JSON values so every read and write goes through the
//! same serde boundary as the Firestore backend. Each collection preserves
//! insertion order; overwriting a document keeps its original position.

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::error::AppError;

type Collection = Vec<(String, serde_json::Value)>;

/// Shared in-memory collections. Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError> {
        let value = self.collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, value)| value.clone())
        });

        value.map(decode).transpose()
    }

    pub fn put<T: Serialize>(&self, collection: &str, id: &str, record: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(record)
            .map_err(|e| AppError::Database(format!("Failed to encode document {}: {}", id, e)))?;

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some(slot) => slot.1 = value,
            None => docs.push((id.to_string(), value)),
        }
        Ok(())
    }

    pub fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, AppError> {
        let values: Vec<serde_json::Value> = self
            .collections
            .get(collection)
            .map(|docs| docs.iter().map(|(_, value)| value.clone()).collect())
            .unwrap_or_default();

        values.into_iter().map(decode).collect()
    }

    /// Documents whose string `field` equals `value`.
    pub fn find_by_field<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        let values: Vec<serde_json::Value> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| doc.get(field).and_then(|v| v.as_str()) == Some(value))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default();

        values.into_iter().map(decode).collect()
    }

    pub fn delete(&self, collection: &str, id: &str) -> bool {
        match self.collections.get_mut(collection) {
            Some(mut docs) => {
                let before = docs.len();
                docs.retain(|(doc_id, _)| doc_id != id);
                docs.len() != before
            }
            None => false,
        }
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Database(format!("Failed to decode document: {}", e)))
}
