use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

const MAX_TIP_LENGTH: usize = 1000;
pub(crate) const MAX_CATEGORIES: usize = 100;

/// One waste category: the label the model predicts and the disposal tip shown with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// The category name, e.g. "paper"
    pub label: String,
    /// Human-readable disposal recommendation for this category
    pub tip: String,
}

impl CategoryDefinition {
    /// Creates a new category definition
    ///
    /// # Example
    /// ```
    /// use ecosort::CategoryDefinition;
    ///
    /// let paper = CategoryDefinition::new("paper", "Keep it dry and put it in the paper bin.");
    /// ```
    pub fn new(label: impl Into<String>, tip: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tip: tip.into(),
        }
    }
}

/// Label sets shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCatalog {
    /// metal, organic, paper, plastic
    FourClass,
    /// battery, biological, cardboard, clothes, glass, metal, paper, plastic, shoes, trash
    TenClass,
}

impl BuiltinCatalog {
    fn categories(&self) -> Vec<CategoryDefinition> {
        let entries: &[(&str, &str)] = match self {
            BuiltinCatalog::FourClass => &[
                ("metal", METAL_TIP),
                ("organic", ORGANIC_TIP),
                ("paper", PAPER_TIP),
                ("plastic", PLASTIC_TIP),
            ],
            BuiltinCatalog::TenClass => &[
                ("battery", BATTERY_TIP),
                ("biological", ORGANIC_TIP),
                ("cardboard", CARDBOARD_TIP),
                ("clothes", CLOTHES_TIP),
                ("glass", GLASS_TIP),
                ("metal", METAL_TIP),
                ("paper", PAPER_TIP),
                ("plastic", PLASTIC_TIP),
                ("shoes", SHOES_TIP),
                ("trash", TRASH_TIP),
            ],
        };
        entries
            .iter()
            .map(|(label, tip)| CategoryDefinition::new(*label, *tip))
            .collect()
    }
}

const BATTERY_TIP: &str = "Never bin batteries. Tape the terminals and take them to a battery drop-off or e-waste point.";
const ORGANIC_TIP: &str = "Compost it at home or use the green/organic bin. Keep plastic bags and stickers out.";
const CARDBOARD_TIP: &str = "Flatten boxes, remove tape and keep them dry before placing them in the cardboard recycling.";
const CLOTHES_TIP: &str = "Donate wearable clothes. Worn-out textiles go to a textile collection bank, not the trash.";
const GLASS_TIP: &str = "Rinse bottles and jars, remove lids and put them in the glass bank. Broken window glass is not accepted.";
const METAL_TIP: &str = "Rinse cans and tins, squash them if possible and put them in the metal recycling.";
const PAPER_TIP: &str = "Keep paper clean and dry and put it in the paper bin. Greasy or wet paper belongs in compost.";
const PLASTIC_TIP: &str = "Empty and rinse the container, check the resin code and recycle it if your area accepts it.";
const SHOES_TIP: &str = "Donate wearable pairs tied together. Worn-out shoes go to a shoe or textile collection point.";
const TRASH_TIP: &str = "This item is not recyclable. Put it in general waste and consider reusable alternatives next time.";

#[derive(Deserialize)]
struct CatalogFile {
    categories: Vec<CategoryDefinition>,
}

/// The ordered label list together with the tip table.
///
/// Label order must match the output index order the model was trained with.
/// Every label carries a non-empty tip, so a tip lookup for a label in the
/// catalog never misses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    labels: Vec<String>,
    tips: HashMap<String, String>,
}

impl Catalog {
    /// Builds a catalog from categories listed in model output order.
    pub fn new(categories: Vec<CategoryDefinition>) -> Result<Self, ClassifierError> {
        if categories.is_empty() {
            return Err(ClassifierError::ValidationError("Catalog must contain at least one category".into()));
        }
        if categories.len() > MAX_CATEGORIES {
            return Err(ClassifierError::ValidationError(
                format!("Maximum number of categories ({}) exceeded: {}", MAX_CATEGORIES, categories.len())
            ));
        }

        let mut labels = Vec::with_capacity(categories.len());
        let mut tips = HashMap::with_capacity(categories.len());
        for (pos, category) in categories.into_iter().enumerate() {
            Self::validate_category(pos, &category)?;
            if tips.contains_key(&category.label) {
                return Err(ClassifierError::ValidationError(
                    format!("Duplicate label '{}'", category.label)
                ));
            }
            labels.push(category.label.clone());
            tips.insert(category.label, category.tip);
        }

        Ok(Self { labels, tips })
    }

    /// Builds a catalog from a separately supplied label list and tip table.
    ///
    /// Fails if any label is missing from the tip table. Tips for labels that
    /// are not in the list are ignored.
    pub fn from_parts(labels: Vec<String>, mut tips: HashMap<String, String>) -> Result<Self, ClassifierError> {
        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(labels.len());
        for label in labels {
            if !seen.insert(label.clone()) {
                return Err(ClassifierError::ValidationError(format!("Duplicate label '{}'", label)));
            }
            let tip = tips.remove(&label).ok_or_else(|| {
                ClassifierError::ValidationError(format!("No tip configured for label '{}'", label))
            })?;
            categories.push(CategoryDefinition { label, tip });
        }
        Self::new(categories)
    }

    pub fn builtin(preset: BuiltinCatalog) -> Self {
        let categories = preset.categories();
        let labels = categories.iter().map(|c| c.label.clone()).collect();
        let tips = categories.into_iter().map(|c| (c.label, c.tip)).collect();
        Self { labels, tips }
    }

    /// Parses a catalog from JSON of the form `{"categories": [{"label": .., "tip": ..}]}`.
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| ClassifierError::ValidationError(format!("Invalid catalog JSON: {}", e)))?;
        Self::new(file.categories)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ClassifierError::ValidationError(format!("Failed to read catalog {:?}: {}", path, e))
        })?;
        let catalog = Self::from_json(&json)?;
        info!("Loaded catalog with {} categories from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    fn validate_category(pos: usize, category: &CategoryDefinition) -> Result<(), ClassifierError> {
        if category.label.trim().is_empty() {
            return Err(ClassifierError::ValidationError(
                format!("Label of category {} cannot be empty", pos + 1)
            ));
        }
        if category.tip.trim().is_empty() {
            return Err(ClassifierError::ValidationError(
                format!("Tip for label '{}' cannot be empty", category.label)
            ));
        }
        if category.tip.len() > MAX_TIP_LENGTH {
            return Err(ClassifierError::ValidationError(
                format!("Tip for label '{}' is too long ({} chars, max is {})",
                    category.label, category.tip.len(), MAX_TIP_LENGTH)
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in model output order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn tip(&self, label: &str) -> Option<&str> {
        self.tips.get(label).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.tips.contains_key(label)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin(BuiltinCatalog::TenClass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let four = Catalog::builtin(BuiltinCatalog::FourClass);
        assert_eq!(four.labels(), &["metal", "organic", "paper", "plastic"]);

        let ten = Catalog::builtin(BuiltinCatalog::TenClass);
        assert_eq!(ten.len(), 10);
        assert_eq!(ten.label(0), Some("battery"));
        assert_eq!(ten.label(9), Some("trash"));
        assert_eq!(ten.label(10), None);
    }

    #[test]
    fn test_builtins_pass_validation() {
        for preset in [BuiltinCatalog::FourClass, BuiltinCatalog::TenClass] {
            let rebuilt = Catalog::new(preset.categories());
            assert_eq!(rebuilt.ok(), Some(Catalog::builtin(preset)));
        }
    }

    #[test]
    fn test_tip_too_long() {
        let result = Catalog::new(vec![CategoryDefinition::new("paper", "a".repeat(1001))]);
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }
}
