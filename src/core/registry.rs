//! In-memory container registry
//!
//! This module provides `InMemoryRegistry`, the default `ContainerRegistry`.
//!
//! # Design
//!
//! Containers live in a `DashMap` keyed by `ContainerRef`. Each value is an
//! `Arc<Mutex<..>>` handle, so the map's own shard locks are only held for the
//! lookup; the per-container mutex is what serializes balance reads and writes.
//! Engines clone the handles they need and then lock them, never calling back
//! into the registry while a container lock is held.

use crate::core::traits::{lock_container, ContainerHandle, ContainerRegistry, MoneyContainer};
use crate::types::{ContainerRef, ContainerSnapshot, EngineError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// Thread-safe container store
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    containers: DashMap<ContainerRef, ContainerHandle>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            containers: DashMap::new(),
        }
    }

    /// Register a container
    ///
    /// # Errors
    ///
    /// - `InvalidBalance` if an asset container holds a negative balance
    /// - `DuplicateContainer` if the `(kind, id)` pair is already registered
    pub fn register(&self, container: Box<dyn MoneyContainer>) -> Result<ContainerRef, EngineError> {
        let container_ref = container.container_ref();
        container_ref
            .polarity()
            .check_opening_balance(&container_ref, container.balance())?;

        match self.containers.entry(container_ref.clone()) {
            Entry::Occupied(_) => Err(EngineError::duplicate_container(&container_ref)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(container)));
                Ok(container_ref)
            }
        }
    }

    pub fn contains(&self, container: &ContainerRef) -> bool {
        self.containers.contains_key(container)
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl ContainerRegistry for InMemoryRegistry {
    fn resolve_container(&self, container: &ContainerRef) -> Result<ContainerHandle, EngineError> {
        self.containers
            .get(container)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::container_not_found(container))
    }

    /// Snapshot every container, sorted by reference
    ///
    /// Each container is read under its own lock; the snapshot as a whole is
    /// not atomic across containers.
    fn snapshot(&self) -> Vec<ContainerSnapshot> {
        let handles: Vec<(ContainerRef, ContainerHandle)> = self
            .containers
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut snapshots: Vec<ContainerSnapshot> = handles
            .into_iter()
            .map(|(container, handle)| {
                let guard = lock_container(&handle);
                ContainerSnapshot {
                    container,
                    name: guard.display_name(),
                    balance: guard.balance(),
                }
            })
            .collect();

        snapshots.sort_by(|a, b| a.container.cmp(&b.container));
        snapshots
    }
}
