use time::{Date, Month, PrimitiveDateTime, Time};

use super::error::TimestampError;

const N_COMPONENTS: usize = 6;
const MICROS_PER_SECOND: f64 = 1.0e6;

/// The trigger timestamp recorded by the oscilloscope.
///
/// The instrument stores (year, month, day, hour, minute, seconds) with the seconds
/// carrying the sub-second part. The seconds are split into whole seconds and a
/// remainder truncated to microseconds. The civil time is taken to be UTC; only
/// differences between timestamps are ever used, so the zone cancels out.
///
/// The sub-second part is known to be unreliable between triggers of the same run.
/// It is reported as recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerTimestamp {
    instant: PrimitiveDateTime,
}

impl TriggerTimestamp {
    /// Build a timestamp from the 6 numeric components found in the waveform metadata
    pub fn from_components(components: &[f64]) -> Result<Self, TimestampError> {
        if components.len() != N_COMPONENTS {
            return Err(TimestampError::BadLength(components.len()));
        }
        if let Some(bad) = components.iter().position(|c| !c.is_finite()) {
            return Err(TimestampError::NotFinite(bad));
        }

        let seconds = components[5];
        let whole_seconds = seconds.div_euclid(1.0);
        let micros = ((seconds - whole_seconds) * MICROS_PER_SECOND) as u32;

        let month = Month::try_from(component_as::<u8>(components[1])?)
            .map_err(|e| TimestampError::OutOfRange(e.to_string()))?;
        let date = Date::from_calendar_date(
            component_as::<i32>(components[0])?,
            month,
            component_as::<u8>(components[2])?,
        )
        .map_err(|e| TimestampError::OutOfRange(e.to_string()))?;
        let time = Time::from_hms_micro(
            component_as::<u8>(components[3])?,
            component_as::<u8>(components[4])?,
            component_as::<u8>(whole_seconds)?,
            micros,
        )
        .map_err(|e| TimestampError::OutOfRange(e.to_string()))?;

        Ok(Self {
            instant: PrimitiveDateTime::new(date, time),
        })
    }

    pub fn instant(&self) -> PrimitiveDateTime {
        self.instant
    }

    /// Seconds since the unix epoch, with microsecond resolution
    pub fn unix_seconds(&self) -> f64 {
        let utc = self.instant.assume_utc();
        utc.unix_timestamp() as f64 + utc.microsecond() as f64 / MICROS_PER_SECOND
    }

    /// Whole seconds elapsed from `earlier` to `self` (truncated toward zero)
    pub fn whole_seconds_since(&self, earlier: &Self) -> i64 {
        (self.instant - earlier.instant).whole_seconds()
    }
}

/// Convert an integral-valued float component into the target integer type
fn component_as<T: TryFrom<i64>>(value: f64) -> Result<T, TimestampError> {
    if value.fract() != 0.0 {
        return Err(TimestampError::OutOfRange(format!(
            "component {value} is not a whole number"
        )));
    }
    T::try_from(value as i64)
        .map_err(|_| TimestampError::OutOfRange(format!("component {value} is out of range")))
}
