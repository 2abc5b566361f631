//! Property tests for comparison and sound averaging

use envwatch_core::{
    evaluate,
    sensors::{average_samples, AnalogInput, SoundMeter, SOUND_SAMPLES},
    Metric, SensorError, SensorReading, SoundComparison, Thresholds,
};
use proptest::prelude::*;

fn thresholds(min_temp: f32, max_temp: f32, min_humidity: f32, max_humidity: f32) -> Thresholds {
    Thresholds {
        max_temp,
        min_temp,
        max_humidity,
        min_humidity,
        max_sound: 500.0,
        temp_interval: 60.0,
        humidity_interval: 60.0,
    }
}

struct ReplayAdc {
    samples: Vec<u16>,
    pos: usize,
}

impl AnalogInput for ReplayAdc {
    fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
        let sample = self.samples[self.pos % self.samples.len()];
        self.pos += 1;
        Ok(sample)
    }
}

proptest! {
    #[test]
    fn temperature_reported_iff_strictly_outside(
        min in -40.0f32..40.0,
        width in 0.0f32..40.0,
        temperature in -80.0f32..100.0,
    ) {
        let max = min + width;
        let t = thresholds(min, max, 0.0, 100.0);

        let violations = evaluate(
            &t,
            Some(SensorReading::new(temperature, 50.0)),
            None,
            &SoundComparison::AboveMax,
        );

        let outside = temperature < min || temperature > max;
        prop_assert_eq!(violations.len(), usize::from(outside));
        if outside {
            prop_assert_eq!(violations[0].metric, Metric::Temperature);
            prop_assert_eq!(violations[0].value, temperature);
        }
    }

    #[test]
    fn bounds_themselves_are_in_range(min in -40.0f32..40.0, width in 0.0f32..40.0) {
        let max = min + width;
        let t = thresholds(min, max, min, max);

        for value in [min, max] {
            let violations = evaluate(
                &t,
                Some(SensorReading::new(value, value)),
                None,
                &SoundComparison::AboveMax,
            );
            prop_assert!(violations.is_empty());
        }
    }

    #[test]
    fn sound_above_max_only_flags_loud(level in 0u16..1024) {
        let t = thresholds(18.0, 26.0, 20.0, 70.0);
        let violations = evaluate(&t, None, Some(envwatch_core::SoundLevel(level)), &SoundComparison::AboveMax);
        prop_assert_eq!(violations.len(), usize::from(level > 500));
    }

    #[test]
    fn average_is_truncated_mean(samples in proptest::array::uniform32(any::<u16>())) {
        let expected = samples.iter().map(|&s| u32::from(s)).sum::<u32>() / SOUND_SAMPLES as u32;
        prop_assert_eq!(u32::from(average_samples(&samples).value()), expected);
    }

    #[test]
    fn meter_consumes_one_window_per_read(samples in proptest::collection::vec(0u16..1024, 64)) {
        let first: [u16; SOUND_SAMPLES] = samples[..SOUND_SAMPLES].try_into().unwrap();
        let second: [u16; SOUND_SAMPLES] = samples[SOUND_SAMPLES..].try_into().unwrap();
        let mut meter = SoundMeter::new(ReplayAdc { samples, pos: 0 });

        prop_assert_eq!(meter.read_level().unwrap(), average_samples(&first));
        prop_assert_eq!(meter.read_level().unwrap(), average_samples(&second));
    }
}
