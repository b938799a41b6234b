use std::path::Path;

use super::error::DurationError;
use super::timestamp::TriggerTimestamp;
use super::trigger_source::TriggerSource;

/// The elapsed time of a run in whole seconds, from its earliest to its latest trigger.
///
/// Every trigger of the run is enumerated to read its timestamp. Only the extremes
/// matter, so the result does not depend on the order triggers are visited.
///
/// The scope's sub-second timestamps are known to drift between triggers; the value is
/// reported as computed and should not be trusted below one second.
pub fn run_duration(
    source: &TriggerSource,
    folder: &Path,
    channel: &str,
) -> Result<f64, DurationError> {
    let mut timestamps = Vec::new();
    for trigger in source.enumerate(folder, channel, None) {
        timestamps.push(*trigger?.trigger.timestamp());
    }
    duration_from_timestamps(&timestamps)
}

/// Whole seconds between the earliest and latest of a set of timestamps
pub fn duration_from_timestamps(timestamps: &[TriggerTimestamp]) -> Result<f64, DurationError> {
    if timestamps.len() < 2 {
        return Err(DurationError::InsufficientData(timestamps.len()));
    }
    let (first, last) = match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(DurationError::InsufficientData(timestamps.len())),
    };
    Ok(last.whole_seconds_since(first) as f64)
}

/// Seconds between the earliest and latest of a set of absolute trigger times (seconds
/// since the epoch, as stored in the column store). The sub-second part is kept.
pub fn duration_from_seconds(times: &[f64]) -> Result<f64, DurationError> {
    if times.len() < 2 {
        return Err(DurationError::InsufficientData(times.len()));
    }
    let first = times.iter().copied().fold(f64::INFINITY, f64::min);
    let last = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok(last - first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{make_waveform, MemoryDecoder};
    use std::sync::Arc;

    fn duration_of_run(offsets: &[f64]) -> Result<f64, DurationError> {
        let config = Config::default();
        let decoder = Arc::new(MemoryDecoder::new());
        let waveforms = offsets.iter().map(|t| make_waveform(&[0.5], *t)).collect();
        decoder.add_run(&config, Path::new("run"), "C4", waveforms);
        let source = TriggerSource::new(&config, decoder);
        run_duration(&source, Path::new("run"), "C4")
    }

    #[test]
    fn test_run_duration() {
        let duration = duration_of_run(&[10.0, 20.5, 3605.75]).unwrap();
        assert_eq!(duration, 3595.0);
    }

    #[test]
    fn test_order_invariance() {
        let ordered = duration_of_run(&[1.0, 2.0, 30.0, 400.0, 5000.0]).unwrap();
        let shuffled = duration_of_run(&[30.0, 5000.0, 2.0, 400.0, 1.0]).unwrap();
        assert_eq!(ordered, 4999.0);
        assert_eq!(ordered, shuffled);
    }

    #[test]
    fn test_insufficient_data() {
        assert!(matches!(
            duration_of_run(&[1.0]),
            Err(DurationError::InsufficientData(1))
        ));
        assert!(matches!(
            duration_of_run(&[]),
            Err(DurationError::InsufficientData(0))
        ));
    }

    #[test]
    fn test_duration_from_seconds() {
        assert_eq!(
            duration_from_seconds(&[100.25, 90.0, 130.5]).unwrap(),
            40.5
        );
        assert!(matches!(
            duration_from_seconds(&[1.0]),
            Err(DurationError::InsufficientData(1))
        ));
    }
}
