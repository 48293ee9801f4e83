//! Storage trait and in-memory implementation.

use std::sync::RwLock;

use async_trait::async_trait;
use provisio_core::ResourceId;

use crate::error::StorageError;
use crate::resource::Resource;

/// Predicate used by [`ResourceStore::find_first`].
pub type Predicate<'a, R> = &'a (dyn Fn(&R) -> bool + Send + Sync);

/// Persistence for one resource type.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    async fn find_by_id(&self, id: &ResourceId) -> Result<Option<R>, StorageError>;

    /// First entity, in insertion order, for which `predicate` holds.
    async fn find_first(&self, predicate: Predicate<'_, R>) -> Result<Option<R>, StorageError>;

    /// Inserts a new entity; an existing id is a [`StorageError::Duplicate`].
    async fn insert(&self, entity: R) -> Result<(), StorageError>;

    /// Replaces a stored entity. Returns `false` when it no longer exists.
    async fn update(&self, entity: R) -> Result<bool, StorageError>;

    async fn remove(&self, id: &ResourceId) -> Result<Option<R>, StorageError>;

    /// One page of entities plus the total count.
    async fn list(&self, offset: usize, limit: usize) -> Result<(Vec<R>, usize), StorageError>;

    async fn contains(&self, id: &ResourceId) -> Result<bool, StorageError> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// In-memory [`ResourceStore`], kept in insertion order.
#[derive(Debug)]
pub struct InMemoryStore<R> {
    entities: RwLock<Vec<R>>,
}

impl<R> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            entities: RwLock::new(Vec::new()),
        }
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Backend("lock poisoned".to_string())
}

impl<R: Resource> InMemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entities`.
    pub fn with_entities(entities: impl IntoIterator<Item = R>) -> Self {
        Self {
            entities: RwLock::new(entities.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for InMemoryStore<R> {
    async fn find_by_id(&self, id: &ResourceId) -> Result<Option<R>, StorageError> {
        let entities = self.entities.read().map_err(poisoned)?;
        Ok(entities.iter().find(|e| e.id() == *id).cloned())
    }

    async fn find_first(&self, predicate: Predicate<'_, R>) -> Result<Option<R>, StorageError> {
        let entities = self.entities.read().map_err(poisoned)?;
        Ok(entities.iter().find(|e| predicate(e)).cloned())
    }

    async fn insert(&self, entity: R) -> Result<(), StorageError> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        let id = entity.id();
        if entities.iter().any(|e| e.id() == id) {
            return Err(StorageError::Duplicate(id.to_string()));
        }
        entities.push(entity);
        Ok(())
    }

    async fn update(&self, entity: R) -> Result<bool, StorageError> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        let id = entity.id();
        match entities.iter_mut().find(|e| e.id() == id) {
            Some(slot) => {
                *slot = entity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &ResourceId) -> Result<Option<R>, StorageError> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        Ok(entities
            .iter()
            .position(|e| e.id() == *id)
            .map(|index| entities.remove(index)))
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<(Vec<R>, usize), StorageError> {
        let entities = self.entities.read().map_err(poisoned)?;
        let page = entities.iter().skip(offset).take(limit).cloned().collect();
        Ok((page, entities.len()))
    }
}
