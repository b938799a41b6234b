use std::fmt;
use std::path::Path;

use super::column_store::ColumnStore;
use super::duration::duration_from_seconds;
use super::error::ComparisonError;
use super::exporter::PULSE_HEIGHT_KEY;
use super::feature_table::FeatureTable;
use super::histogram::{
    histogram, ratio, subtract, BinEdges, DifferenceSeries, RateHistogram, RatioSeries,
};
use super::raw_trigger::TRIGGER_TIME_KEY;

/// Vertical offset applied by the scope; added back onto the pulse height
pub const VERT_OFFSET_KEY: &str = "acq_vert_offset";

/// The parts of a persisted run needed to compare it against another
#[derive(Debug, Clone, PartialEq)]
pub struct RunFeatures {
    pub label: String,
    pub pulse_heights: Vec<f64>,
    pub duration: f64,
}

impl RunFeatures {
    /// Pull the offset-corrected pulse heights and the run duration out of a table
    pub fn from_table(label: &str, table: &FeatureTable) -> Result<Self, ComparisonError> {
        let missing = |column: &str| ComparisonError::MissingColumn {
            run: label.to_string(),
            column: column.to_string(),
        };
        let mut pulse_heights = table
            .column(PULSE_HEIGHT_KEY)
            .ok_or_else(|| missing(PULSE_HEIGHT_KEY))?
            .to_f64();
        let times = table
            .column(TRIGGER_TIME_KEY)
            .ok_or_else(|| missing(TRIGGER_TIME_KEY))?
            .to_f64();
        if times.len() != pulse_heights.len() {
            return Err(ComparisonError::MisalignedColumns {
                run: label.to_string(),
            });
        }

        match table.column(VERT_OFFSET_KEY) {
            Some(offsets) if offsets.len() == pulse_heights.len() => {
                for (height, offset) in pulse_heights.iter_mut().zip(offsets.to_f64()) {
                    *height += offset;
                }
            }
            Some(_) => {
                return Err(ComparisonError::MisalignedColumns {
                    run: label.to_string(),
                })
            }
            None => log::warn!(
                "Run {} has no {} column; pulse heights are not offset corrected",
                label,
                VERT_OFFSET_KEY
            ),
        }

        let duration = duration_from_seconds(&times)?;
        Ok(Self {
            label: label.to_string(),
            pulse_heights,
            duration,
        })
    }

    /// Load a run from a column store written by the preprocess step
    pub fn load(label: &str, store_path: &Path) -> Result<Self, ComparisonError> {
        let table = ColumnStore::load(store_path)?;
        Self::from_table(label, &table)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            label: self.label.clone(),
            n_triggers: self.pulse_heights.len(),
            duration: self.duration,
        }
    }
}

/// One line of the comparison report
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub label: String,
    pub n_triggers: usize,
    pub duration: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} Triggers over {:.2} Hours",
            self.label,
            self.n_triggers,
            self.duration / 3600.0
        )
    }
}

/// Pulse height spectra of a background run and a signal run, and their (S+B)/B ratio
#[derive(Debug, Clone)]
pub struct RunComparison {
    pub background: RateHistogram,
    pub signal: RateHistogram,
    pub ratio: RatioSeries,
    pub difference: DifferenceSeries,
    pub summaries: Vec<RunSummary>,
}

impl RunComparison {
    pub fn edges(&self) -> &BinEdges {
        self.background.edges()
    }

    /// The summary lines, one per run, each ending in a newline
    pub fn report(&self) -> String {
        self.summaries
            .iter()
            .map(|summary| format!("{summary}\n"))
            .collect()
    }
}

/// Histogram both runs on the same edges and take the signal over background ratio
pub fn compare_runs(
    background: &RunFeatures,
    signal: &RunFeatures,
    edges: &BinEdges,
) -> Result<RunComparison, ComparisonError> {
    let background_rates =
        RateHistogram::new(histogram(&background.pulse_heights, edges), background.duration)?;
    let signal_rates = RateHistogram::new(histogram(&signal.pulse_heights, edges), signal.duration)?;
    let ratio = ratio(&background_rates, &signal_rates)?;
    let difference = subtract(&background_rates, &signal_rates)?;
    Ok(RunComparison {
        background: background_rates,
        signal: signal_rates,
        ratio,
        difference,
        summaries: vec![background.summary(), signal.summary()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DurationError, HistogramError};
    use crate::feature_table::Column;

    fn make_table(heights: &[f64], offset: Option<f64>, times: &[f64]) -> FeatureTable {
        let mut table = FeatureTable::new();
        table.insert(PULSE_HEIGHT_KEY, Column::Float(heights.to_vec()));
        table.insert(TRIGGER_TIME_KEY, Column::Float(times.to_vec()));
        if let Some(offset) = offset {
            table.insert(VERT_OFFSET_KEY, Column::Float(vec![offset; heights.len()]));
        }
        table
    }

    #[test]
    fn test_from_table() {
        let table = make_table(&[0.5, 1.0, 1.5], Some(0.25), &[100.0, 7300.0, 3700.0]);
        let run = RunFeatures::from_table("Background", &table).unwrap();
        assert_eq!(run.pulse_heights, vec![0.75, 1.25, 1.75]);
        assert_eq!(run.duration, 7200.0);
        assert_eq!(
            run.summary().to_string(),
            "  - Background: 3 Triggers over 2.00 Hours"
        );
    }

    #[test]
    fn test_missing_offset_is_tolerated() {
        let table = make_table(&[0.5, 1.0], None, &[0.0, 10.0]);
        let run = RunFeatures::from_table("run", &table).unwrap();
        assert_eq!(run.pulse_heights, vec![0.5, 1.0]);
    }

    #[test]
    fn test_missing_columns() {
        let mut table = FeatureTable::new();
        table.insert(TRIGGER_TIME_KEY, Column::Float(vec![0.0, 1.0]));
        assert!(matches!(
            RunFeatures::from_table("run", &table),
            Err(ComparisonError::MissingColumn { column, .. }) if column == PULSE_HEIGHT_KEY
        ));

        let table = make_table(&[0.5], Some(0.0), &[0.0]);
        assert!(matches!(
            RunFeatures::from_table("run", &table),
            Err(ComparisonError::DurationError(DurationError::InsufficientData(1)))
        ));
    }

    #[test]
    fn test_compare_runs() {
        let edges = BinEdges::new(vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let background = RunFeatures {
            label: "Background".to_string(),
            pulse_heights: vec![0.5, 0.5, 1.5, 1.5],
            duration: 10.0,
        };
        let signal = RunFeatures {
            label: "With Source".to_string(),
            pulse_heights: vec![0.5, 0.5, 0.5, 0.5, 1.5, 1.5, 5.0],
            duration: 10.0,
        };
        let comparison = compare_runs(&background, &signal, &edges).unwrap();
        assert_eq!(comparison.background.histogram.counts, vec![2, 2, 0]);
        assert_eq!(comparison.signal.histogram.counts, vec![4, 2, 0]);
        assert_eq!(comparison.ratio.ratio, vec![2.0, 1.0, 0.0]);
        assert_eq!(comparison.ratio.error[2], 0.0);
        assert_eq!(comparison.difference.rate, vec![0.2, 0.0, 0.0]);
        assert_eq!(comparison.edges(), &edges);
        assert_eq!(
            comparison.report(),
            "  - Background: 4 Triggers over 0.00 Hours\n  - With Source: 7 Triggers over 0.00 Hours\n"
        );
    }

    #[test]
    fn test_zero_duration_run() {
        let edges = BinEdges::linspace(0.0, 3.0, 30).unwrap();
        let run = RunFeatures {
            label: "run".to_string(),
            pulse_heights: vec![1.0, 1.0],
            duration: 0.0,
        };
        assert!(matches!(
            compare_runs(&run, &run, &edges),
            Err(ComparisonError::HistogramError(HistogramError::InvalidDuration(_)))
        ));
    }
}
