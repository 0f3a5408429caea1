pub mod storage;
pub mod types;

pub use storage::{load_appraisal, save_appraisal};
pub use types::AppraisalFile;
