pub mod formatter;

pub use formatter::{
    format_category_summary, format_list, format_override, format_total, format_tsv,
    should_use_colors,
};
