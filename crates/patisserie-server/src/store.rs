//! Record storage
//!
//! Handlers talk to [`Repository`]; [`MemoryStore`] is the in-process
//! implementation. Identifiers are assigned sequentially from 1 and listings
//! are ordered by identifier.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::models::{Cake, CakePatch, Drink, DrinkPatch, NewCake, NewDrink, RecipePart};

/// Storage failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record with this identifier
    #[error("{kind} {id} not found")]
    NotFound {
        /// Record kind
        kind: &'static str,
        /// Requested identifier
        id: u64,
    },

    /// Another drink already uses this title
    #[error("a drink titled {0:?} already exists")]
    DuplicateTitle(String),

    /// Field values the store refuses
    #[error("{0}")]
    Invalid(String),
}

/// Result alias for storage calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence seam for drinks and cakes
#[async_trait]
pub trait Repository: Send + Sync {
    /// All drinks, ordered by id
    async fn list_drinks(&self) -> StoreResult<Vec<Drink>>;
    /// Insert a drink
    async fn insert_drink(&self, drink: NewDrink) -> StoreResult<Drink>;
    /// Apply `patch` to drink `id`
    async fn update_drink(&self, id: u64, patch: DrinkPatch) -> StoreResult<Drink>;
    /// Delete drink `id`
    async fn delete_drink(&self, id: u64) -> StoreResult<()>;

    /// All cakes, ordered by id
    async fn list_cakes(&self) -> StoreResult<Vec<Cake>>;
    /// Insert a cake
    async fn insert_cake(&self, cake: NewCake) -> StoreResult<Cake>;
    /// Apply `patch` to cake `id`
    async fn update_cake(&self, id: u64, patch: CakePatch) -> StoreResult<Cake>;
    /// Delete cake `id`
    async fn delete_cake(&self, id: u64) -> StoreResult<()>;

    /// Drop every record and restart identifiers at 1
    async fn reset(&self) -> StoreResult<()>;
}

#[derive(Debug)]
struct Tables {
    drinks: BTreeMap<u64, Drink>,
    cakes: BTreeMap<u64, Cake>,
    next_drink_id: u64,
    next_cake_id: u64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            drinks: BTreeMap::new(),
            cakes: BTreeMap::new(),
            next_drink_id: 1,
            next_cake_id: 1,
        }
    }
}

impl Tables {
    fn title_taken(&self, title: &str, except: Option<u64>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

/// In-memory [`Repository`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the sample drink
    ///
    /// # Errors
    ///
    /// Propagates any failure inserting the sample records.
    pub async fn with_sample_data() -> StoreResult<Self> {
        let store = Self::new();
        seed(&store).await?;
        Ok(store)
    }
}

fn validate_title(title: &str) -> StoreResult<()> {
    if title.trim().is_empty() {
        return Err(StoreError::Invalid("title must not be empty".into()));
    }
    Ok(())
}

fn validate_recipe(recipe: &[RecipePart]) -> StoreResult<()> {
    if recipe.is_empty() {
        return Err(StoreError::Invalid("recipe must not be empty".into()));
    }
    Ok(())
}

#[async_trait]
impl Repository for MemoryStore {
    async fn list_drinks(&self) -> StoreResult<Vec<Drink>> {
        Ok(self.tables.read().drinks.values().cloned().collect())
    }

    async fn insert_drink(&self, drink: NewDrink) -> StoreResult<Drink> {
        let recipe = drink.recipe.into_parts();
        validate_title(&drink.title)?;
        validate_recipe(&recipe)?;

        let mut tables = self.tables.write();
        if tables.title_taken(&drink.title, None) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        let id = tables.next_drink_id;
        tables.next_drink_id += 1;
        let drink = Drink {
            id,
            title: drink.title,
            recipe,
        };
        tables.drinks.insert(id, drink.clone());
        debug!(id, title = %drink.title, "Drink inserted");
        Ok(drink)
    }

    async fn update_drink(&self, id: u64, patch: DrinkPatch) -> StoreResult<Drink> {
        let recipe = patch.recipe.map(|r| r.into_parts());
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(recipe) = &recipe {
            validate_recipe(recipe)?;
        }

        let mut tables = self.tables.write();
        if !tables.drinks.contains_key(&id) {
            return Err(StoreError::NotFound { kind: "drink", id });
        }
        if let Some(title) = &patch.title
            && tables.title_taken(title, Some(id))
        {
            return Err(StoreError::DuplicateTitle(title.clone()));
        }

        let drink = tables
            .drinks
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "drink", id })?;
        if let Some(title) = patch.title {
            drink.title = title;
        }
        if let Some(recipe) = recipe {
            drink.recipe = recipe;
        }
        debug!(id, "Drink updated");
        Ok(drink.clone())
    }

    async fn delete_drink(&self, id: u64) -> StoreResult<()> {
        self.tables
            .write()
            .drinks
            .remove(&id)
            .map(|_| debug!(id, "Drink deleted"))
            .ok_or(StoreError::NotFound { kind: "drink", id })
    }

    async fn list_cakes(&self) -> StoreResult<Vec<Cake>> {
        Ok(self.tables.read().cakes.values().cloned().collect())
    }

    async fn insert_cake(&self, cake: NewCake) -> StoreResult<Cake> {
        if cake.name.trim().is_empty() {
            return Err(StoreError::Invalid("name must not be empty".into()));
        }

        let mut tables = self.tables.write();
        let id = tables.next_cake_id;
        tables.next_cake_id += 1;
        let cake = Cake {
            id,
            name: cake.name,
            description: cake.description,
        };
        tables.cakes.insert(id, cake.clone());
        debug!(id, name = %cake.name, "Cake inserted");
        Ok(cake)
    }

    async fn update_cake(&self, id: u64, patch: CakePatch) -> StoreResult<Cake> {
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(StoreError::Invalid("name must not be empty".into()));
        }

        let mut tables = self.tables.write();
        let cake = tables
            .cakes
            .get_mut(&id)
            .ok_or(StoreError::NotFound { kind: "cake", id })?;
        if let Some(name) = patch.name {
            cake.name = name;
        }
        if let Some(description) = patch.description {
            cake.description = description;
        }
        debug!(id, "Cake updated");
        Ok(cake.clone())
    }

    async fn delete_cake(&self, id: u64) -> StoreResult<()> {
        self.tables
            .write()
            .cakes
            .remove(&id)
            .map(|_| debug!(id, "Cake deleted"))
            .ok_or(StoreError::NotFound { kind: "cake", id })
    }

    async fn reset(&self) -> StoreResult<()> {
        *self.tables.write() = Tables::default();
        info!("Store reset");
        Ok(())
    }
}

/// Reset `store` and insert the sample drink
///
/// # Errors
///
/// Propagates store failures.
pub async fn seed(store: &dyn Repository) -> StoreResult<()> {
    store.reset().await?;
    store
        .insert_drink(NewDrink {
            title: "water".to_string(),
            recipe: crate::models::RecipeInput::Many(vec![RecipePart {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }]),
        })
        .await?;
    info!("Sample data loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeInput;

    fn part(name: &str) -> RecipePart {
        RecipePart {
            name: name.into(),
            color: "white".into(),
            parts: 1,
        }
    }

    fn new_drink(title: &str) -> NewDrink {
        NewDrink {
            title: title.into(),
            recipe: RecipeInput::One(part("milk")),
        }
    }

    #[tokio::test]
    async fn test_sequential_ids_and_order() {
        let store = MemoryStore::new();
        let a = store.insert_drink(new_drink("a")).await.unwrap();
        let b = store.insert_drink(new_drink("b")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let titles: Vec<_> = store
            .list_drinks()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_title() {
        let store = MemoryStore::new();
        store.insert_drink(new_drink("latte")).await.unwrap();
        assert_eq!(
            store.insert_drink(new_drink("latte")).await,
            Err(StoreError::DuplicateTitle("latte".into()))
        );

        let other = store.insert_drink(new_drink("mocha")).await.unwrap();
        let patch = DrinkPatch {
            title: Some("latte".into()),
            recipe: None,
        };
        assert!(matches!(
            store.update_drink(other.id, patch).await,
            Err(StoreError::DuplicateTitle(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let store = MemoryStore::new();
        let drink = store.insert_drink(new_drink("latte")).await.unwrap();

        let patch = DrinkPatch {
            title: Some("flat white".into()),
            recipe: None,
        };
        let updated = store.update_drink(drink.id, patch).await.unwrap();
        assert_eq!(updated.title, "flat white");
        assert_eq!(updated.recipe, drink.recipe);

        // Keeping its own title is not a conflict
        let patch = DrinkPatch {
            title: Some("flat white".into()),
            recipe: Some(RecipeInput::Many(vec![part("oat milk")])),
        };
        let updated = store.update_drink(drink.id, patch).await.unwrap();
        assert_eq!(updated.recipe[0].name, "oat milk");
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryStore::new();
        assert_eq!(
            store.delete_drink(7).await,
            Err(StoreError::NotFound { kind: "drink", id: 7 })
        );
        assert!(matches!(
            store.update_cake(1, CakePatch::default()).await,
            Err(StoreError::NotFound { kind: "cake", .. })
        ));
    }

    #[tokio::test]
    async fn test_cakes() {
        let store = MemoryStore::new();
        let cake = store
            .insert_cake(NewCake {
                name: "opera".into(),
                description: "almond sponge, coffee, ganache".into(),
            })
            .await
            .unwrap();
        assert_eq!(cake.id, 1);

        let patch = CakePatch {
            name: None,
            description: Some("layered".into()),
        };
        let updated = store.update_cake(cake.id, patch).await.unwrap();
        assert_eq!(updated.name, "opera");
        assert_eq!(updated.description, "layered");

        store.delete_cake(cake.id).await.unwrap();
        assert!(store.list_cakes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_values() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.insert_drink(new_drink(" ")).await,
            Err(StoreError::Invalid(_))
        ));
        let empty_recipe = NewDrink {
            title: "air".into(),
            recipe: RecipeInput::Many(vec![]),
        };
        assert!(matches!(
            store.insert_drink(empty_recipe).await,
            Err(StoreError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_resets() {
        let store = MemoryStore::new();
        store.insert_drink(new_drink("latte")).await.unwrap();
        seed(&store).await.unwrap();

        let drinks = store.list_drinks().await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].id, 1);
        assert_eq!(drinks[0].title, "water");
    }
}
