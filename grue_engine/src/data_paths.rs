//! Locating the runtime data directory (where `grue.toml` lives).

use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Cached path to the directory containing the engine's runtime data files.
static DATA_ROOT: LazyLock<PathBuf> = LazyLock::new(detect_data_root);

/// Construct a data path relative to the resolved data root.
pub fn data_path(relative: impl AsRef<Path>) -> PathBuf {
    DATA_ROOT.join(relative)
}

/// Resolve the most likely location of the runtime data directory.
fn detect_data_root() -> PathBuf {
    let mut bases = vec![PathBuf::new()];
    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        bases.push(dir.to_path_buf());
        if let Some(parent) = dir.parent() {
            bases.push(parent.to_path_buf());
        }
    }
    first_existing(&bases).unwrap_or_else(|| PathBuf::from("grue_engine/data"))
}

/// Workspace layout first, then a flattened `data/`, under each base in turn.
fn first_existing(bases: &[PathBuf]) -> Option<PathBuf> {
    bases
        .iter()
        .flat_map(|base| [base.join("grue_engine/data"), base.join("data")])
        .find(|candidate| candidate.is_dir())
}
