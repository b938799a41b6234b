use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use super::column_store::ColumnStore;
use super::config::Config;
use super::error::ProcessorError;
use super::exporter::collect_run_features;
use super::trigger_source::TriggerSource;
use super::worker_status::{BarColor, WorkerStatus};

/// What preprocessing a folder produced
#[derive(Debug, Clone, PartialEq)]
pub struct FolderReport {
    pub n_triggers: usize,
    pub n_columns: usize,
    pub store_path: PathBuf,
}

/// The result of preprocessing one folder of a subset
#[derive(Debug)]
pub struct FolderOutcome {
    pub folder: PathBuf,
    pub result: Result<FolderReport, ProcessorError>,
}

/// Collect every trigger of the configured channel in a folder and persist the features
/// next to the waveform files.
pub fn process_folder(
    config: &Config,
    source: &TriggerSource,
    folder: &Path,
) -> Result<FolderReport, ProcessorError> {
    let table = collect_run_features(source, folder, &config.channel)?;
    let store_path = config.get_store_path(folder);
    ColumnStore::persist(&store_path, &table)?;
    log::info!(
        "Extracted {} triggers from {:?} to {:?}",
        table.n_rows(),
        folder,
        store_path
    );
    Ok(FolderReport {
        n_triggers: table.n_rows(),
        n_columns: table.n_columns(),
        store_path,
    })
}

/// Process a subset of folders.
///
/// A folder that fails is logged and recorded in its outcome; the remaining folders are
/// still processed. Only a broken progress channel stops the subset early.
pub fn process_subset(
    config: &Config,
    source: &TriggerSource,
    tx: &Sender<WorkerStatus>,
    worker_id: usize,
    subset: &[PathBuf],
) -> Result<Vec<FolderOutcome>, ProcessorError> {
    let mut outcomes = Vec::with_capacity(subset.len());
    for (idx, folder) in subset.iter().enumerate() {
        let progress = idx as f32 / subset.len() as f32;
        tx.send(WorkerStatus::new(progress, folder, worker_id, BarColor::CYAN))?;
        log::info!("Processing folder {:?}...", folder);
        let result = process_folder(config, source, folder);
        match &result {
            Ok(_) => log::info!("Finished processing folder {:?}.", folder),
            Err(e) => {
                log::error!("Failed to process folder {:?}: {}", folder, e);
                tx.send(WorkerStatus::new(progress, folder, worker_id, BarColor::RED))?;
            }
        }
        outcomes.push(FolderOutcome {
            folder: folder.clone(),
            result,
        });
    }
    if let Some(last) = subset.last() {
        tx.send(WorkerStatus::new(1.0, last, worker_id, BarColor::GREEN))?;
    }
    Ok(outcomes)
}

/// Divide the folders into a set of subsets (per thread/worker), round-robin
pub fn create_subsets(config: &Config, folders: &[PathBuf]) -> Vec<Vec<PathBuf>> {
    let n_subsets = config.n_threads.max(1) as usize;
    let mut subsets: Vec<Vec<PathBuf>> = vec![Vec::new(); n_subsets];

    for (idx, folder) in folders.iter().enumerate() {
        subsets[idx % n_subsets].push(folder.clone())
    }

    subsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExporterError;
    use crate::testing::{make_waveform, MemoryDecoder};
    use std::env;
    use std::sync::mpsc::channel;
    use std::sync::Arc;

    fn make_folder(name: &str) -> PathBuf {
        let folder = env::temp_dir().join(name);
        std::fs::create_dir_all(&folder).unwrap();
        folder
    }

    #[test]
    fn test_create_subsets() {
        let config = Config {
            n_threads: 2,
            ..Default::default()
        };
        let folders: Vec<PathBuf> = ["a", "b", "c"].iter().map(PathBuf::from).collect();
        let subsets = create_subsets(&config, &folders);
        assert_eq!(
            subsets,
            vec![
                vec![PathBuf::from("a"), PathBuf::from("c")],
                vec![PathBuf::from("b")]
            ]
        );
    }

    #[test]
    fn test_process_subset_isolates_failures() {
        let config = Config::default();
        let good = make_folder("trace_reducer_test_process_good");
        let empty = make_folder("trace_reducer_test_process_empty");
        let decoder = Arc::new(MemoryDecoder::new());
        decoder.add_run(
            &config,
            &good,
            &config.channel,
            vec![make_waveform(&[0.1, 0.5], 0.0), make_waveform(&[0.7], 2.0)],
        );
        let source = TriggerSource::new(&config, decoder);
        let (tx, rx) = channel();

        let outcomes =
            process_subset(&config, &source, &tx, 0, &[empty.clone(), good.clone()]).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            outcomes[0].result,
            Err(ProcessorError::ExporterError(ExporterError::EmptyRun { .. }))
        ));
        let report = outcomes[1].result.as_ref().unwrap();
        assert_eq!(report.n_triggers, 2);
        assert_eq!(report.store_path, good.join("data.h5"));

        let loaded = ColumnStore::load(&report.store_path).unwrap();
        assert_eq!(loaded.n_rows(), 2);

        drop(tx);
        let statuses: Vec<WorkerStatus> = rx.iter().collect();
        assert!(statuses.iter().any(|s| s.color == BarColor::RED && s.folder == empty));
        assert_eq!(statuses.last().map(|s| s.progress), Some(1.0));

        std::fs::remove_file(&report.store_path).unwrap();
    }
}
