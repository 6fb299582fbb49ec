//! Category resolution from member attributes.
//!
//! Maps a member's shoe size and body weight (or an explicit admin
//! override) to one equipment category. The override short-circuits all
//! other logic as an explicit two-branch decision; there is no hidden
//! cache or global state behind it.

use crate::types::{Catalog, EquipmentCategory, MemberAttributes, SizeClass, SpringClass};
use crate::{Error, Result};
use std::cmp::Ordering;

/// Parse a shoe-size string ("44", " 38 ") into a whole size
fn parse_shoe_size(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// Resolve the equipment category for the given attributes.
///
/// Resolution order:
/// 1. An override category is returned unconditionally.
/// 2. Size class by inclusive range containment of the parsed shoe size.
/// 3. Spring classes ranked most-specific first: defined maxima that still
///    support the weight in ascending order, then the catch-all class.
///    Unknown weight prefers the lightest-duty class with a defined max.
/// 4. First active category matching the (size, spring) pair wins.
///
/// Shell class is informational only and never filters candidates.
pub fn resolve_category<'a>(
    catalog: &'a Catalog,
    attrs: &MemberAttributes,
) -> Result<&'a EquipmentCategory> {
    if let Some(ref name) = attrs.override_category {
        return catalog.categories.get(name).ok_or_else(|| {
            Error::NoMatchingCategory(format!("override category '{}' is not configured", name))
        });
    }

    let raw_size = attrs
        .shoe_size
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::IncompleteProfile("shoe size missing from profile".into()))?;

    let shoe_size = parse_shoe_size(raw_size)
        .ok_or_else(|| Error::NoMatchingCategory(format!("unparseable shoe size '{}'", raw_size)))?;

    let size_class = resolve_size_class(catalog, shoe_size).ok_or_else(|| {
        Error::NoMatchingCategory(format!("no size class covers shoe size {}", shoe_size))
    })?;

    let spring_order = spring_preference(catalog, attrs.weight_kg);
    if spring_order.is_empty() {
        return Err(Error::NoMatchingCategory(match attrs.weight_kg {
            Some(w) => format!("no spring class supports weight {} kg", w),
            None => "no spring class configured".into(),
        }));
    }

    for spring in &spring_order {
        let hit = catalog.active_categories().into_iter().find(|c| {
            c.size_class == size_class.name && c.spring_class == spring.name
        });
        if let Some(category) = hit {
            tracing::debug!(
                "Resolved shoe size {} / weight {:?} to category '{}'",
                shoe_size,
                attrs.weight_kg,
                category.name
            );
            return Ok(category);
        }
    }

    Err(Error::NoMatchingCategory(format!(
        "no category configured for size class '{}'",
        size_class.name
    )))
}

/// The active size class whose range contains the shoe size
fn resolve_size_class(catalog: &Catalog, shoe_size: i32) -> Option<&SizeClass> {
    catalog
        .size_classes
        .values()
        .filter(|c| c.active)
        .find(|c| c.contains(shoe_size))
}

/// Active spring classes in resolution preference order.
///
/// With a known weight: eligible defined maxima ascending, catch-all last.
/// With unknown weight: all defined maxima ascending, catch-all last.
fn spring_preference(catalog: &Catalog, weight_kg: Option<f64>) -> Vec<&SpringClass> {
    let mut defined: Vec<&SpringClass> = catalog
        .spring_classes
        .values()
        .filter(|c| c.active && c.max_weight_kg.is_some())
        .filter(|c| match (weight_kg, c.max_weight_kg) {
            (Some(w), Some(max)) => max >= w,
            _ => true,
        })
        .collect();
    defined.sort_by(|a, b| {
        a.max_weight_kg
            .partial_cmp(&b.max_weight_kg)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut catch_all: Vec<&SpringClass> = catalog
        .spring_classes
        .values()
        .filter(|c| c.active && c.max_weight_kg.is_none())
        .collect();
    catch_all.sort_by(|a, b| a.name.cmp(&b.name));

    defined.extend(catch_all);
    defined
}
