//! Drink and cake records and their JSON views

use serde::{Deserialize, Serialize};

/// One ingredient of a drink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipePart {
    /// Ingredient name
    pub name: String,
    /// Display colour
    pub color: String,
    /// Relative amount
    pub parts: u32,
}

/// A stored drink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Drink {
    /// Assigned identifier
    pub id: u64,
    /// Unique title
    pub title: String,
    /// Ingredients in order
    pub recipe: Vec<RecipePart>,
}

/// Public view of an ingredient: colour and amount only
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ShortRecipePart<'a> {
    /// Display colour
    pub color: &'a str,
    /// Relative amount
    pub parts: u32,
}

/// Public view of a drink
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ShortDrink<'a> {
    /// Identifier
    pub id: u64,
    /// Title
    pub title: &'a str,
    /// Ingredients without names
    pub recipe: Vec<ShortRecipePart<'a>>,
}

impl Drink {
    /// Representation for unauthenticated listings
    pub fn short(&self) -> ShortDrink<'_> {
        ShortDrink {
            id: self.id,
            title: &self.title,
            recipe: self
                .recipe
                .iter()
                .map(|part| ShortRecipePart {
                    color: &part.color,
                    parts: part.parts,
                })
                .collect(),
        }
    }

    /// Full representation
    pub fn long(&self) -> &Self {
        self
    }
}

/// A recipe as submitted: either one ingredient object or a list
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecipeInput {
    /// A single ingredient, stored as a one-element recipe
    One(RecipePart),
    /// The full ingredient list
    Many(Vec<RecipePart>),
}

impl RecipeInput {
    /// Normalize into a list
    pub fn into_parts(self) -> Vec<RecipePart> {
        match self {
            Self::One(part) => vec![part],
            Self::Many(parts) => parts,
        }
    }
}

/// Body of `POST /drinks`
#[derive(Debug, Clone, Deserialize)]
pub struct NewDrink {
    /// Unique title
    pub title: String,
    /// Ingredients
    pub recipe: RecipeInput,
}

/// Body of `PATCH /drinks/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrinkPatch {
    /// New title
    #[serde(default)]
    pub title: Option<String>,
    /// New ingredients
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

/// A stored cake
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cake {
    /// Assigned identifier
    pub id: u64,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
}

/// Body of `POST /cakes`
#[derive(Debug, Clone, Deserialize)]
pub struct NewCake {
    /// Name
    pub name: String,
    /// Description
    pub description: String,
}

/// Body of `PATCH /cakes/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CakePatch {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
}
