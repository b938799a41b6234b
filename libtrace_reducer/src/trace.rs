use ndarray::{Array1, ArrayView1};

use super::error::FeatureError;
use super::raw_trigger::RawTrigger;

/// A time axis paired with a view of a trigger's samples.
///
/// The samples are borrowed from the RawTrigger, never copied.
#[derive(Debug, Clone)]
pub struct Trace<'a> {
    pub times: Array1<f64>,
    pub samples: ArrayView1<'a, f64>,
}

/// The largest sample of a trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseHeight {
    pub index: usize,
    pub time: f64,
    pub amplitude: f64,
}

impl Trace<'_> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// (time, amplitude) pairs, in sample order
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.samples.iter().copied())
    }
}

/// Build the time axis of a trigger: sample i sits at i * horizontal interval
pub fn to_trace(trigger: &RawTrigger) -> Trace<'_> {
    let samples = trigger.samples();
    let interval = trigger.horiz_interval();
    let times = Array1::from_iter((0..samples.len()).map(|i| i as f64 * interval));
    Trace { times, samples }
}

/// Find the maximum sample of the trace.
///
/// Ties resolve to the first maximum. NaN samples never win, unlike numpy's `argmax`
/// which returns the first NaN; an all-NaN trace reports its first sample.
pub fn find_pulse_height(trace: &Trace) -> Result<PulseHeight, FeatureError> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in trace.samples.iter().enumerate() {
        match best {
            Some((_, max)) if *value <= max || value.is_nan() => (),
            None if value.is_nan() => (),
            _ => best = Some((index, *value)),
        }
    }

    // An all-NaN trace has no maximum; report its first sample
    let (index, amplitude) = match best {
        Some(found) => found,
        None => (0, *trace.samples.first().ok_or(FeatureError::EmptyTrace)?),
    };

    Ok(PulseHeight {
        index,
        time: trace.times[index],
        amplitude,
    })
}

/// The pulse height amplitude of a trigger
pub fn pulse_height(trigger: &RawTrigger) -> Result<f64, FeatureError> {
    Ok(find_pulse_height(&to_trace(trigger))?.amplitude)
}
