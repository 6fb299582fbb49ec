//! Default catalog of size/spring/shell classes and equipment categories.
//!
//! Classes and categories are admin-managed data; this module provides the
//! converged production shape as a built-in default plus the consistency
//! checks run before the catalog is used.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of classes and categories
///
/// **Note**: For production use, prefer `get_default_catalog()` which
/// returns a cached reference. This function is retained for testing and
/// custom catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn size(name: &str, min: Option<i32>, max: Option<i32>) -> (String, SizeClass) {
    (
        name.into(),
        SizeClass {
            name: name.into(),
            min_shoe_size: min,
            max_shoe_size: max,
            active: true,
        },
    )
}

fn category(name: &str, size: &str, spring: &str, shell: Option<&str>) -> (String, EquipmentCategory) {
    (
        name.into(),
        EquipmentCategory {
            name: name.into(),
            size_class: size.into(),
            spring_class: spring.into(),
            shell_class: shell.map(Into::into),
            active: true,
        },
    )
}

fn build_default_catalog_internal() -> Catalog {
    let size_classes: HashMap<String, SizeClass> = [
        size("S", Some(32), Some(36)),
        size("M", Some(37), Some(41)),
        size("L", Some(42), Some(46)),
        size("XL", Some(47), None),
    ]
    .into_iter()
    .collect();

    let mut spring_classes = HashMap::new();
    spring_classes.insert(
        "Standard".to_string(),
        SpringClass {
            name: "Standard".into(),
            max_weight_kg: Some(80.0),
            active: true,
        },
    );
    spring_classes.insert(
        "HD".to_string(),
        SpringClass {
            name: "HD".into(),
            // No maximum: the catch-all/heaviest-duty class
            max_weight_kg: None,
            active: true,
        },
    );

    let mut shell_classes = HashMap::new();
    shell_classes.insert(
        "Green".to_string(),
        ShellClass {
            name: "Green".into(),
            active: true,
        },
    );
    shell_classes.insert(
        "Orange".to_string(),
        ShellClass {
            name: "Orange".into(),
            active: true,
        },
    );

    let categories: HashMap<String, EquipmentCategory> = [
        category("S Standard", "S", "Standard", Some("Green")),
        category("S HD", "S", "HD", None),
        category("M Standard", "M", "Standard", Some("Green")),
        category("M HD", "M", "HD", Some("Orange")),
        category("L Standard", "L", "Standard", None),
        category("L HD", "L", "HD", Some("Orange")),
        category("XL Standard", "XL", "Standard", None),
        category("XL HD", "XL", "HD", None),
    ]
    .into_iter()
    .collect();

    Catalog {
        size_classes,
        spring_classes,
        shell_classes,
        categories,
    }
}

impl Catalog {
    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, class) in &self.size_classes {
            if key.is_empty() || class.name.is_empty() {
                errors.push("Size class has empty name".to_string());
            }
            if key != &class.name {
                errors.push(format!(
                    "Size class key '{}' doesn't match class name '{}'",
                    key, class.name
                ));
            }
            if let (Some(min), Some(max)) = (class.min_shoe_size, class.max_shoe_size) {
                if min > max {
                    errors.push(format!(
                        "Size class '{}': min shoe size {} > max {}",
                        key, min, max
                    ));
                }
            }
        }

        // Ranges must not overlap for active size classes
        let mut ranged: Vec<&SizeClass> = self
            .size_classes
            .values()
            .filter(|c| c.active && (c.min_shoe_size.is_some() || c.max_shoe_size.is_some()))
            .collect();
        ranged.sort_by_key(|c| c.min_shoe_size.unwrap_or(i32::MIN));
        for pair in ranged.windows(2) {
            let lower = pair[0];
            let upper = pair[1];
            let lower_max = lower.max_shoe_size.unwrap_or(i32::MAX);
            let upper_min = upper.min_shoe_size.unwrap_or(i32::MIN);
            if upper_min <= lower_max {
                errors.push(format!(
                    "Size classes '{}' and '{}' have overlapping ranges",
                    lower.name, upper.name
                ));
            }
        }

        for (key, class) in &self.spring_classes {
            if key.is_empty() || class.name.is_empty() {
                errors.push("Spring class has empty name".to_string());
            }
            if let Some(max) = class.max_weight_kg {
                if max <= 0.0 {
                    errors.push(format!(
                        "Spring class '{}' has non-positive max weight",
                        key
                    ));
                }
            }
        }

        let has_catch_all = self
            .spring_classes
            .values()
            .any(|c| c.active && c.max_weight_kg.is_none());
        if !has_catch_all {
            errors.push("Catalog has no catch-all spring class (no max weight)".to_string());
        }

        for (key, cat) in &self.categories {
            if key.is_empty() || cat.name.is_empty() {
                errors.push("Equipment category has empty name".to_string());
            }
            if key != &cat.name {
                errors.push(format!(
                    "Category key '{}' doesn't match category name '{}'",
                    key, cat.name
                ));
            }
            if !self.size_classes.contains_key(&cat.size_class) {
                errors.push(format!(
                    "Category '{}' references non-existent size class '{}'",
                    key, cat.size_class
                ));
            }
            if !self.spring_classes.contains_key(&cat.spring_class) {
                errors.push(format!(
                    "Category '{}' references non-existent spring class '{}'",
                    key, cat.spring_class
                ));
            }
            if let Some(ref shell) = cat.shell_class {
                if !self.shell_classes.contains_key(shell) {
                    errors.push(format!(
                        "Category '{}' references non-existent shell class '{}'",
                        key, shell
                    ));
                }
            }
        }

        errors
    }

    /// Active categories, sorted by name for deterministic iteration
    pub fn active_categories(&self) -> Vec<&EquipmentCategory> {
        let mut cats: Vec<_> = self.categories.values().filter(|c| c.active).collect();
        cats.sort_by(|a, b| a.name.cmp(&b.name));
        cats
    }
}
