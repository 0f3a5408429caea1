use super::types::{AppraisalFile, CURRENT_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::Path;

/// Load an appraisal file from JSON
///
/// Unlike config, a missing file is an error: files are created with `init`.
pub fn load_appraisal(path: &Path) -> Result<AppraisalFile> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open appraisal file at {}", path.display()))?;

    let appraisal: AppraisalFile = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load appraisal file at {}", path.display()))?;

    if appraisal.version != CURRENT_VERSION {
        anyhow::bail!("Unsupported appraisal file version: {}", appraisal.version);
    }

    Ok(appraisal)
}

/// Save an appraisal file atomically
///
/// The file is never left half-written: either the old or the new content is on disk.
pub fn save_appraisal(path: &Path, appraisal: &AppraisalFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, appraisal)
        .context("Failed to serialize appraisal file")?;

    file.commit().context("Failed to save appraisal file")?;

    Ok(())
}
