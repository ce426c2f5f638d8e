use crate::error::Result;
use crate::store::AnimalLookup;
use crate::types::Animal;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Animal store held entirely in memory, keyed by animal id
#[derive(Default)]
pub struct InMemoryAnimalStore {
    animals: RwLock<HashMap<String, Animal>>,
}

impl InMemoryAnimalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_animals<I>(animals: I) -> Self
    where
        I: IntoIterator<Item = Animal>,
    {
        let animals = animals
            .into_iter()
            .map(|animal| (animal.id.clone(), animal))
            .collect();

        Self {
            animals: RwLock::new(animals),
        }
    }

    /// Insert or replace an animal, returning the previous record if any
    pub async fn insert(&self, animal: Animal) -> Option<Animal> {
        let mut animals = self.animals.write().await;
        animals.insert(animal.id.clone(), animal)
    }

    pub async fn len(&self) -> usize {
        self.animals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.animals.read().await.is_empty()
    }
}

#[async_trait]
impl AnimalLookup for InMemoryAnimalStore {
    async fn lookup_animal(&self, id: &str) -> Result<Option<Animal>> {
        let animals = self.animals.read().await;
        let found = animals.get(id).cloned();
        debug!("In-memory lookup for {}: {}", id, if found.is_some() { "hit" } else { "miss" });
        Ok(found)
    }
}
