use super::error::HistogramError;

/// The boundaries of a set of histogram bins.
///
/// At least 2 finite, strictly increasing values. Bin i covers
/// `[edges[i], edges[i+1])`, except the last bin which also includes its upper edge.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    pub fn new(edges: Vec<f64>) -> Result<Self, HistogramError> {
        let is_valid = edges.len() >= 2
            && edges.iter().all(|e| e.is_finite())
            && edges.windows(2).all(|w| w[0] < w[1]);
        if is_valid {
            Ok(Self { edges })
        } else {
            Err(HistogramError::InvalidEdges)
        }
    }

    /// `n_edges` evenly spaced edges from `start` to `stop`, both included
    pub fn linspace(start: f64, stop: f64, n_edges: usize) -> Result<Self, HistogramError> {
        if n_edges < 2 {
            return Err(HistogramError::InvalidEdges);
        }
        let step = (stop - start) / (n_edges - 1) as f64;
        let mut edges: Vec<f64> = (0..n_edges).map(|i| start + i as f64 * step).collect();
        edges[n_edges - 1] = stop;
        Self::new(edges)
    }

    /// Number of edges (one more than the number of bins)
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.edges
    }

    /// The bin containing value, if any
    pub fn find_bin(&self, value: f64) -> Option<usize> {
        let last = self.edges[self.edges.len() - 1];
        if value.is_nan() || value < self.edges[0] || value > last {
            return None;
        }
        if value == last {
            return Some(self.n_bins() - 1);
        }
        Some(self.edges.partition_point(|e| *e <= value) - 1)
    }

    /// Midpoint of each bin
    pub fn bin_centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// Half the width of each bin
    pub fn bin_half_widths(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[1] - w[0]) / 2.0).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: BinEdges,
    pub counts: Vec<u64>,
}

/// Count values into fixed bins. Values outside the edges (and NaN) are dropped.
pub fn histogram(values: &[f64], edges: &BinEdges) -> Histogram {
    let mut counts = vec![0; edges.n_bins()];
    for bin in values.iter().filter_map(|v| edges.find_bin(*v)) {
        counts[bin] += 1;
    }
    Histogram {
        edges: edges.clone(),
        counts,
    }
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Per-bin rates (Hz) and their Poisson uncertainties
#[derive(Debug, Clone, PartialEq)]
pub struct RateView {
    pub rate: Vec<f64>,
    pub rate_error: Vec<f64>,
}

fn check_counts(found: usize, edges: &BinEdges) -> Result<(), HistogramError> {
    if found != edges.n_bins() {
        return Err(HistogramError::CountMismatch {
            found,
            n_bins: edges.n_bins(),
        });
    }
    Ok(())
}

/// rate = counts / duration, rate_error = sqrt(counts) / duration
pub fn rate_view(histogram: &Histogram, duration: f64) -> Result<RateView, HistogramError> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(HistogramError::InvalidDuration(duration));
    }
    check_counts(histogram.counts.len(), &histogram.edges)?;
    let rate = histogram
        .counts
        .iter()
        .map(|n| *n as f64 / duration)
        .collect();
    let rate_error = histogram
        .counts
        .iter()
        .map(|n| (*n as f64).sqrt() / duration)
        .collect();
    Ok(RateView { rate, rate_error })
}

/// A histogram together with the run duration used to turn it into rates
#[derive(Debug, Clone, PartialEq)]
pub struct RateHistogram {
    pub histogram: Histogram,
    pub duration: f64,
    pub rates: RateView,
}

impl RateHistogram {
    pub fn new(histogram: Histogram, duration: f64) -> Result<Self, HistogramError> {
        let rates = rate_view(&histogram, duration)?;
        Ok(Self {
            histogram,
            duration,
            rates,
        })
    }

    pub fn edges(&self) -> &BinEdges {
        &self.histogram.edges
    }
}

/// Bin by bin ratio of two rate histograms. Undefined entries are 0.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioSeries {
    pub ratio: Vec<f64>,
    pub error: Vec<f64>,
}

/// Bin by bin difference of two rate histograms
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceSeries {
    pub rate: Vec<f64>,
    pub rate_error: Vec<f64>,
}

// Fields are public, so every per-bin vector is rechecked before indexing
fn check_edges(a: &RateHistogram, b: &RateHistogram) -> Result<(), HistogramError> {
    if a.edges() != b.edges() {
        return Err(HistogramError::DimensionMismatch(a.edges().len(), b.edges().len()));
    }
    for h in [a, b] {
        check_counts(h.histogram.counts.len(), h.edges())?;
        check_counts(h.rates.rate.len(), h.edges())?;
        check_counts(h.rates.rate_error.len(), h.edges())?;
    }
    Ok(())
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Ratio b / a of two rate histograms with identical edges.
///
/// `ratio = rate_b / rate_a` and `error = |ratio| * sqrt(1/n_b + 1/n_a)`. Where either
/// bin is empty both are 0, never NaN or infinite.
pub fn ratio(a: &RateHistogram, b: &RateHistogram) -> Result<RatioSeries, HistogramError> {
    check_edges(a, b)?;
    let n_bins = a.histogram.counts.len();
    let mut series = RatioSeries {
        ratio: Vec::with_capacity(n_bins),
        error: Vec::with_capacity(n_bins),
    };
    for bin in 0..n_bins {
        let n_a = a.histogram.counts[bin];
        let n_b = b.histogram.counts[bin];
        if n_a == 0 || n_b == 0 {
            series.ratio.push(0.0);
            series.error.push(0.0);
            continue;
        }
        let r = finite_or_zero(b.rates.rate[bin] / a.rates.rate[bin]);
        let err = finite_or_zero(r.abs() * (1.0 / n_b as f64 + 1.0 / n_a as f64).sqrt());
        series.ratio.push(r);
        series.error.push(err);
    }
    Ok(series)
}

/// Background subtraction: `rate_b - rate_a`, errors added in quadrature
pub fn subtract(a: &RateHistogram, b: &RateHistogram) -> Result<DifferenceSeries, HistogramError> {
    check_edges(a, b)?;
    let rate = a
        .rates
        .rate
        .iter()
        .zip(b.rates.rate.iter())
        .map(|(ra, rb)| rb - ra)
        .collect();
    let rate_error = a
        .rates
        .rate_error
        .iter()
        .zip(b.rates.rate_error.iter())
        .map(|(ea, eb)| ea.hypot(*eb))
        .collect();
    Ok(DifferenceSeries { rate, rate_error })
}
