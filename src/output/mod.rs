pub mod export;
pub mod formatter;

pub use export::{build_results_csv, export_file_name, write_csv};
pub use formatter::{
    format_points, format_question_table, format_summary, format_tsv, should_use_colors,
};
