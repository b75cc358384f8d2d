//! Menu catalog: item records, dietary labels and the parallel embedding index.
//!
//! Ingestion produces two files: a menu JSON of the form
//! `{"items": [...], "documents": [...]}` and an `N × d` JSON matrix of
//! precomputed embeddings, where row `i` was computed from `documents[i]`.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{RagError, Result};
use crate::intent::DietaryRequirement;

/// A single dish from the catalog. Immutable after loading.
///
/// Numeric fields are `None` when the source value was missing or could not
/// be parsed as a number. Scoring treats `None` as zero and display renders
/// it as `N/A`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    /// Item name; also the deduplication key.
    #[serde(rename = "item_name")]
    pub name: String,
    /// Serving location.
    #[serde(default)]
    pub restaurant: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub protein_g: Option<f64>,
    #[serde(rename = "total_carbs_g", default, deserialize_with = "lenient_number")]
    pub carbs_g: Option<f64>,
    #[serde(rename = "total_fat_g", default, deserialize_with = "lenient_number")]
    pub fat_g: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fiber_g: Option<f64>,
    #[serde(rename = "sugars_g", default, deserialize_with = "lenient_number")]
    pub sugar_g: Option<f64>,
    #[serde(default)]
    pub dietary_labels: DietaryLabels,
}

impl MenuItem {
    /// Create an item with only a name and restaurant; nutrients unknown.
    pub fn new(name: impl Into<String>, restaurant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            restaurant: Some(restaurant.into()),
            calories: None,
            protein_g: None,
            carbs_g: None,
            fat_g: None,
            fiber_g: None,
            sugar_g: None,
            dietary_labels: DietaryLabels::default(),
        }
    }

    /// Set calories and the three macros in grams.
    pub fn with_macros(mut self, calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        self.calories = Some(calories);
        self.protein_g = Some(protein_g);
        self.carbs_g = Some(carbs_g);
        self.fat_g = Some(fat_g);
        self
    }

    /// Set fiber in grams.
    pub fn with_fiber(mut self, fiber_g: f64) -> Self {
        self.fiber_g = Some(fiber_g);
        self
    }

    /// Set dietary labels from a semicolon-delimited string.
    pub fn with_labels(mut self, labels: &str) -> Self {
        self.dietary_labels = DietaryLabels::parse(labels);
        self
    }

    /// Restaurant name for display, `Unknown` when absent.
    pub fn restaurant_display(&self) -> &str {
        self.restaurant.as_deref().filter(|r| !r.is_empty()).unwrap_or("Unknown")
    }

    /// Whether this item's labels satisfy a dietary requirement.
    ///
    /// A vegetarian requirement accepts vegan items; every other requirement
    /// needs its own label.
    pub fn satisfies(&self, requirement: DietaryRequirement) -> bool {
        let labels = &self.dietary_labels;
        match requirement {
            DietaryRequirement::Vegetarian => labels.contains("vegetarian") || labels.contains("vegan"),
            other => labels.contains(other.label()),
        }
    }
}

/// Accept a JSON number, a numeric string, or anything else as `None`.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Render an optional nutrient amount, `N/A` when unknown.
pub fn format_amount(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v}"),
        None => "N/A".to_string(),
    }
}

/// The set of dietary tags on an item.
///
/// Parsed from a semicolon-delimited string. Tags are lower-cased and
/// trimmed, and `gluten-free` is folded into `gluten free`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub struct DietaryLabels(BTreeSet<String>);

impl DietaryLabels {
    /// Parse a semicolon-delimited label string.
    pub fn parse(raw: &str) -> Self {
        let labels = raw
            .split(';')
            .map(|label| label.trim().to_lowercase())
            .filter(|label| !label.is_empty())
            .map(|label| if label == "gluten-free" { "gluten free".to_string() } else { label })
            .collect();
        Self(labels)
    }

    /// Whether a normalized label is present.
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Option<String>> for DietaryLabels {
    fn from(raw: Option<String>) -> Self {
        raw.map(|s| Self::parse(&s)).unwrap_or_default()
    }
}

impl From<DietaryLabels> for String {
    fn from(labels: DietaryLabels) -> Self {
        labels.to_string()
    }
}

impl fmt::Display for DietaryLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(";"))
    }
}

#[derive(Deserialize)]
struct MenuFile {
    items: Vec<MenuItem>,
    #[serde(default)]
    documents: Vec<String>,
}

/// The catalog held in memory: items, their source documents and their
/// precomputed embeddings, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    items: Vec<MenuItem>,
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    dimensions: usize,
}

impl CatalogIndex {
    /// Build an index from parallel arrays.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CatalogError`] if the arrays differ in length or
    /// the embeddings do not share one dimension.
    pub fn new(
        items: Vec<MenuItem>,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if items.len() != documents.len() || items.len() != embeddings.len() {
            return Err(RagError::CatalogError(format!(
                "parallel arrays differ in length: {} items, {} documents, {} embeddings",
                items.len(),
                documents.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings.first().map_or(0, Vec::len);
        if let Some((row, embedding)) =
            embeddings.iter().enumerate().find(|(_, e)| e.len() != dimensions)
        {
            return Err(RagError::CatalogError(format!(
                "embedding {row} has dimension {}, expected {dimensions}",
                embedding.len()
            )));
        }

        Ok(Self { items, documents, embeddings, dimensions })
    }

    /// Load the menu JSON and the embedding matrix JSON from disk.
    pub fn load(menu_path: impl AsRef<Path>, embeddings_path: impl AsRef<Path>) -> Result<Self> {
        let menu_path = menu_path.as_ref();
        let embeddings_path = embeddings_path.as_ref();

        let menu: MenuFile = serde_json::from_reader(BufReader::new(File::open(menu_path)?))?;
        let embeddings: Vec<Vec<f32>> =
            serde_json::from_reader(BufReader::new(File::open(embeddings_path)?))?;

        let index = Self::new(menu.items, menu.documents, embeddings)?;
        info!(
            items = index.len(),
            dimensions = index.dimensions(),
            menu = %menu_path.display(),
            "loaded catalog"
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Embedding dimensionality, zero for an empty catalog.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&MenuItem> {
        self.items.get(index)
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Number of distinct non-empty restaurant names.
    pub fn restaurant_count(&self) -> usize {
        self.items
            .iter()
            .filter_map(|item| item.restaurant.as_deref())
            .filter(|r| !r.is_empty())
            .collect::<HashSet<_>>()
            .len()
    }
}
