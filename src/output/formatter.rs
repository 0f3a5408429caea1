use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::records::{numbered, LineItem};
use crate::scoring::{config::is_unset_role, CategoryConfig, ScoredList};

const SEPARATOR: &str = " | ";
const MIN_CELL_WIDTH: usize = 10;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_cell(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Width available to each free-text cell, or None when output is not a terminal
fn text_cell_width(category: &CategoryConfig, term_width: Option<usize>) -> Option<usize> {
    let width = term_width?;
    // "NN." + co-authors + role + score columns and their separators
    let fixed = 4 + 3 + 16 + 4 + SEPARATOR.len() * (category.fields.len() + 3);
    let per_field = width.saturating_sub(fixed) / category.fields.len().max(1);
    Some(per_field.max(MIN_CELL_WIDTH))
}

fn role_label<'a>(category: &'a CategoryConfig, role: &'a str) -> &'a str {
    if is_unset_role(role) {
        return "-";
    }
    category
        .roles
        .iter()
        .find(|r| r.value == role)
        .map(|r| r.label())
        .unwrap_or(role)
}

fn format_row(
    number: usize,
    item: &LineItem,
    category: &CategoryConfig,
    cell_width: Option<usize>,
    use_colors: bool,
) -> String {
    let index_str = format!("{:>2}.", number);
    let cells: Vec<String> = category
        .fields
        .iter()
        .map(|f| {
            let value = item.field(&f.key);
            match cell_width {
                Some(w) => truncate_cell(value, w),
                None => value.to_string(),
            }
        })
        .collect();
    let role = role_label(category, &item.role);
    let score = format!("{:>3}", item.score);

    if use_colors {
        format!(
            "{} {}{}{}{}{}{}{}",
            index_str.dimmed(),
            cells.join(SEPARATOR),
            SEPARATOR,
            item.co_authors,
            SEPARATOR,
            role.cyan(),
            SEPARATOR,
            score.bold()
        )
    } else {
        format!(
            "{} {}{}{}{}{}{}{}",
            index_str,
            cells.join(SEPARATOR),
            SEPARATOR,
            item.co_authors,
            SEPARATOR,
            role,
            SEPARATOR,
            score
        )
    }
}

/// Format the running total against the cap, e.g. "Total Score: 35 / 100"
pub fn format_total(total: u32, cap: u32, use_colors: bool) -> String {
    let line = format!("Total Score: {} / {}", total, cap);
    if !use_colors {
        line
    } else if total >= cap {
        line.yellow().bold().to_string()
    } else {
        line.bold().to_string()
    }
}

/// Format the override score line; None when there is nothing to show
pub fn format_override(value: Option<&str>, cap: u32, use_colors: bool) -> Option<String> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    let line = format!("Override Score: {} / {}", value.trim(), cap);
    Some(if use_colors {
        line.yellow().to_string()
    } else {
        line
    })
}

/// Format a scored list as numbered rows followed by the total and any pending warning.
pub fn format_list(list: &ScoredList, use_colors: bool) -> String {
    format_list_with_width(list, use_colors, get_terminal_width())
}

fn format_list_with_width(list: &ScoredList, use_colors: bool, term_width: Option<usize>) -> String {
    let category = list.category();
    let mut lines = Vec::new();

    if !category.title.is_empty() {
        lines.push(if use_colors {
            category.title.bold().to_string()
        } else {
            category.title.clone()
        });
    }

    if list.items().is_empty() {
        lines.push("No records.".to_string());
    } else {
        let cell_width = text_cell_width(category, term_width);
        for row in numbered(list.items()) {
            lines.push(format_row(row.number, row.item, category, cell_width, use_colors));
        }
    }

    lines.push(format_total(list.aggregate_score(), category.max_score, use_colors));

    if let Some(warning) = list.warning() {
        lines.push(if use_colors {
            warning.red().bold().to_string()
        } else {
            warning.to_string()
        });
    }

    lines.join("\n")
}

/// Format rows as tab-separated values for scripting
/// Columns: number, text fields in schema order, co_authors, role, score (no headers, no colors)
pub fn format_tsv(items: &[LineItem], category: &CategoryConfig) -> String {
    numbered(items)
        .map(|row| {
            let mut cols = vec![row.number.to_string()];
            cols.extend(category.fields.iter().map(|f| row.item.field(&f.key).to_string()));
            cols.push(row.item.co_authors.to_string());
            cols.push(row.item.role.clone());
            cols.push(row.item.score.to_string());
            cols.join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a category's scoring table, e.g. for the `categories` command
pub fn format_category_summary(category: &CategoryConfig, use_colors: bool) -> String {
    let roles = category
        .roles
        .iter()
        .map(|r| format!("{}: {}", r.label(), r.score))
        .collect::<Vec<_>>()
        .join(", ");
    let fields = category
        .fields
        .iter()
        .map(|f| f.key.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let id = if use_colors {
        category.id.bold().to_string()
    } else {
        category.id.clone()
    };

    format!(
        "{}\n  [{}] Maximum Score: {} (per row up to {})\n  Fields: {}",
        id, roles, category.max_score, category.per_row_max, fields
    )
}
