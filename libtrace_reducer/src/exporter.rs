use std::path::Path;

use super::error::ExporterError;
use super::feature_table::FeatureTable;
use super::raw_trigger::{Scalar, TRIGGER_TIME_KEY};
use super::trace::pulse_height;
use super::trigger_source::TriggerSource;

/// Name of the synthesized pulse height column
pub const PULSE_HEIGHT_KEY: &str = "pulse_height";

/// Flatten every trigger of a run into a FeatureTable.
///
/// Each row holds every scalar metadata field of one trigger, the trigger timestamp as
/// seconds since the epoch, and the pulse height of the trigger. Array and text fields
/// are left out. Every column must be present on every trigger; a field missing from some
/// triggers is an error rather than a silently misaligned column.
pub fn collect_run_features(
    source: &TriggerSource,
    folder: &Path,
    channel: &str,
) -> Result<FeatureTable, ExporterError> {
    let mut table = FeatureTable::new();
    let mut n_triggers = 0;
    for item in source.enumerate(folder, channel, None) {
        let item = item?;
        let trigger = &item.trigger;
        for (key, value) in trigger.metadata() {
            if key == TRIGGER_TIME_KEY {
                table.push(key, Scalar::Float(trigger.timestamp().unix_seconds()));
            } else if let Some(scalar) = value.as_scalar() {
                table.push(key, scalar);
            }
        }
        let height = pulse_height(trigger).map_err(|source| ExporterError::FeatureError {
            index: item.index,
            source,
        })?;
        table.push(PULSE_HEIGHT_KEY, Scalar::Float(height));
        n_triggers += 1;
    }

    if n_triggers == 0 {
        return Err(ExporterError::EmptyRun {
            folder: folder.to_path_buf(),
            channel: channel.to_string(),
        });
    }
    if let Some((field, present)) = table.find_short_column() {
        return Err(ExporterError::RaggedField {
            field: field.clone(),
            present,
            expected: n_triggers,
        });
    }

    log::info!(
        "Collected {} columns from {} triggers of channel {} in {:?}",
        table.n_columns(),
        n_triggers,
        channel,
        folder
    );
    Ok(table)
}
