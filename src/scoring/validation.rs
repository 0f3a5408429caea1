use std::collections::HashSet;

use super::config::{is_unset_role, CategoryConfig};

/// Validate category configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_categories(categories: &[CategoryConfig]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if categories.is_empty() {
        errors.push("categories: at least one category is required".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, category) in categories.iter().enumerate() {
        let prefix = if category.id.trim().is_empty() {
            errors.push(format!("categories[{}].id: must not be empty", i));
            format!("categories[{}]", i)
        } else {
            if !seen_ids.insert(category.id.as_str()) {
                errors.push(format!("categories[{}].id: duplicate id '{}'", i, category.id));
            }
            format!("categories.{}", category.id)
        };
        collect_category_errors(&prefix, category, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_category_errors(prefix: &str, category: &CategoryConfig, errors: &mut Vec<String>) {
    if category.max_score == 0 {
        errors.push(format!("{}.max_score: must be greater than zero", prefix));
    }

    if category.per_row_max > category.max_score {
        errors.push(format!(
            "{}.per_row_max: {} exceeds max_score {}",
            prefix, category.per_row_max, category.max_score
        ));
    }

    if category.fields.is_empty() {
        errors.push(format!("{}.fields: at least one text field is required", prefix));
    }

    let mut keys = HashSet::new();
    for (i, field) in category.fields.iter().enumerate() {
        if field.key.trim().is_empty() {
            errors.push(format!("{}.fields[{}].key: must not be empty", prefix, i));
        } else if !keys.insert(field.key.as_str()) {
            errors.push(format!(
                "{}.fields[{}].key: duplicate key '{}'",
                prefix, i, field.key
            ));
        }
    }

    let mut values = HashSet::new();
    for (i, role) in category.roles.iter().enumerate() {
        if is_unset_role(&role.value) {
            // Blank is the implicit "unset" choice and always scores 0
            errors.push(format!(
                "{}.roles[{}].value: blank is reserved for the unset role",
                prefix, i
            ));
        } else if !values.insert(role.value.as_str()) {
            errors.push(format!(
                "{}.roles[{}].value: duplicate value '{}'",
                prefix, i, role.value
            ));
        }
        if role.score > category.per_row_max {
            errors.push(format!(
                "{}.roles[{}].score: {} exceeds per_row_max {}",
                prefix, i, role.score, category.per_row_max
            ));
        }
    }
}
