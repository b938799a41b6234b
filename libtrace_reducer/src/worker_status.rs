use std::path::{Path, PathBuf};

/// Which stage of folder processing a status refers to
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BarColor {
    #[default]
    CYAN,
    GREEN,
    RED,
}

/// A progress update sent from a worker thread to whoever is drawing progress bars
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerStatus {
    pub progress: f32,
    pub folder: PathBuf,
    pub worker_id: usize,
    pub color: BarColor,
}

impl WorkerStatus {
    pub fn new(progress: f32, folder: &Path, worker_id: usize, color: BarColor) -> Self {
        Self {
            progress,
            folder: folder.to_path_buf(),
            worker_id,
            color,
        }
    }
}
