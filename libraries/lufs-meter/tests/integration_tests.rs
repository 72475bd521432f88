//! Integration tests for lufs-meter
//!
//! Tests include:
//! - Meters built from JSON configuration
//! - Custom weighting cascades
//! - PCM ingestion and multichannel layouts
//! - Measure-then-normalize workflows

use lufs_meter::{
    filter::FilterType, make_filter, normalize, AudioBuffer, FilterClass, LoudnessError,
    LoudnessTarget, Meter, MeterConfig, RangeSettings,
};

// ========== Helper Functions ==========

/// Generate an interleaved sine wave, identical on every channel
fn generate_sine(
    sample_rate: u32,
    channels: usize,
    frequency: f64,
    amplitude: f64,
    duration_secs: f64,
) -> Vec<f64> {
    let num_samples = (f64::from(sample_rate) * duration_secs) as usize;
    let mut samples = Vec::with_capacity(num_samples * channels);

    for i in 0..num_samples {
        let t = i as f64 / f64::from(sample_rate);
        let sample = amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin();
        for _ in 0..channels {
            samples.push(sample);
        }
    }

    samples
}

fn mono_sine(sample_rate: u32, frequency: f64, amplitude: f64, duration_secs: f64) -> AudioBuffer {
    AudioBuffer::mono(generate_sine(sample_rate, 1, frequency, amplitude, duration_secs)).unwrap()
}

// ========== Configuration ==========

#[test]
fn test_empty_config_is_standard_meter() {
    let config: MeterConfig = serde_json::from_str("{}").unwrap();
    let from_config = Meter::from_config(&config).unwrap();
    let standard = Meter::new(48000).unwrap();

    let buffer = mono_sine(48000, 1000.0, 0.3, 3.0);
    assert_eq!(
        from_config.integrated_loudness(&buffer).unwrap(),
        standard.integrated_loudness(&buffer).unwrap()
    );
}

#[test]
fn test_config_selects_class_and_rate() {
    let config: MeterConfig = serde_json::from_str(
        r#"{
            "sample_rate": 44100,
            "block_size": 0.4,
            "filter_class": "DeMan"
        }"#,
    )
    .unwrap();

    let meter = Meter::from_config(&config).unwrap();
    assert_eq!(meter.sample_rate(), 44100);
    assert_eq!(meter.filter_class(), &FilterClass::DeMan);
    assert_eq!(meter.stages()[1].filter_type(), FilterType::HighPassDeMan);
}

#[test]
fn test_config_custom_stages() {
    let config: MeterConfig = serde_json::from_str(
        r#"{
            "filter_class": "custom",
            "stages": [
                { "filter_type": "high_shelf", "gain_db": 4.0, "q": 0.7071067811865476, "center_hz": 1500.0 },
                { "filter_type": "high_pass", "q": 0.5, "center_hz": 38.0 }
            ]
        }"#,
    )
    .unwrap();

    let custom = Meter::from_config(&config).unwrap();
    let standard = Meter::new(48000).unwrap();
    assert_eq!(custom.stages().len(), 2);

    // Same stages as K-weighting, so the same measurement
    let buffer = mono_sine(48000, 1000.0, 0.5, 3.0);
    let a = custom.integrated_loudness(&buffer).unwrap();
    let b = standard.integrated_loudness(&buffer).unwrap();
    assert!((a - b).abs() < 1e-9, "custom {a}, K-weighting {b}");
}

#[test]
fn test_config_rejects_unknown_stage_type() {
    let config: MeterConfig = serde_json::from_str(
        r#"{
            "filter_class": "custom",
            "stages": [{ "filter_type": "comb", "q": 1.0, "center_hz": 100.0 }]
        }"#,
    )
    .unwrap();

    assert!(matches!(
        Meter::from_config(&config),
        Err(LoudnessError::InvalidFilterType(_))
    ));
}

#[test]
fn test_config_round_trips_through_json() {
    let config = MeterConfig {
        sample_rate: 96000,
        channel_weights: Some(vec![1.0, 1.0, 0.0]),
        ..MeterConfig::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    let parsed: MeterConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_config_channel_weights_mute_centre() {
    let config: MeterConfig =
        serde_json::from_str(r#"{ "channel_weights": [1.0, 1.0, 0.0] }"#).unwrap();
    let meter = Meter::from_config(&config).unwrap();

    let tone = generate_sine(48000, 1, 1000.0, 0.3, 3.0);
    let silent = vec![0.0; tone.len()];
    let centre_only = AudioBuffer::from_channels(vec![silent.clone(), silent, tone]).unwrap();

    assert_eq!(
        meter.integrated_loudness(&centre_only),
        Err(LoudnessError::DegenerateGating)
    );
}

#[test]
fn test_config_range_settings() {
    let config: MeterConfig =
        serde_json::from_str(r#"{ "range": { "min_blocks": 50 } }"#).unwrap();
    let meter = Meter::from_config(&config).unwrap();
    assert_eq!(meter.range_settings().min_blocks, 50);

    // 10 s gives 8 short-term windows
    let buffer = mono_sine(48000, 1000.0, 0.5, 10.0);
    assert_eq!(
        meter.loudness_range(&buffer),
        Err(LoudnessError::InsufficientShortTermBlocks {
            found: 8,
            required: 50
        })
    );
}

// ========== Builder ==========

#[test]
fn test_builder_custom_cascade() {
    let shelf = make_filter(4.0, 0.707, 1500.0, 48000.0, FilterType::HighShelf).unwrap();
    let high_pass = make_filter(0.0, 0.5, 38.0, 48000.0, FilterType::HighPass).unwrap();

    let meter = Meter::builder(48000)
        .filter_class(FilterClass::Custom(vec![shelf]))
        .with_stage(high_pass)
        .build()
        .unwrap();

    assert_eq!(meter.stages().len(), 2);
    assert_eq!(meter.filter_class().name(), "custom");
    let lufs = meter
        .integrated_loudness(&mono_sine(48000, 1000.0, 1.0, 3.0))
        .unwrap();
    assert!((lufs + 3.01).abs() < 0.1, "got {lufs:.3}");
}

#[test]
fn test_builder_rejects_bad_block_settings() {
    assert!(Meter::builder(48000).block_size(0.0).build().is_err());
    assert!(Meter::builder(48000).overlap(1.0).build().is_err());
    assert!(Meter::builder(48000).overlap(-0.1).build().is_err());

    let settings = RangeSettings {
        lower_percentile: 95.0,
        upper_percentile: 10.0,
        ..RangeSettings::default()
    };
    assert!(Meter::builder(48000).range_settings(settings).build().is_err());
}

#[test]
fn test_non_overlapping_blocks() {
    let meter = Meter::builder(48000).overlap(0.0).build().unwrap();
    let report = meter
        .gated_loudness(&mono_sine(48000, 1000.0, 0.5, 2.0))
        .unwrap();
    assert_eq!(report.total_blocks, 5);
}

// ========== PCM ingestion ==========

#[test]
fn test_i16_matches_float_input() {
    let meter = Meter::new(48000).unwrap();
    let float = generate_sine(48000, 2, 1000.0, 0.5, 3.0);
    let pcm: Vec<i16> = float.iter().map(|s| (s * 32767.0).round() as i16).collect();

    let from_float = meter
        .integrated_loudness(&AudioBuffer::from_interleaved(&float, 2).unwrap())
        .unwrap();
    let from_pcm = meter
        .integrated_loudness(&AudioBuffer::from_interleaved_i16(&pcm, 2).unwrap())
        .unwrap();

    assert!((from_float - from_pcm).abs() < 0.01);
}

#[test]
fn test_i32_full_scale() {
    let buffer = AudioBuffer::from_interleaved_i32(&[i32::MAX, -i32::MAX, 0, 0], 2).unwrap();
    assert_eq!(buffer.frames(), 2);
    assert!((buffer.peak() - 1.0).abs() < 1e-12);
}

#[test]
fn test_f32_interleaved_stereo() {
    let meter = Meter::new(44100).unwrap();
    let samples: Vec<f32> = generate_sine(44100, 2, 1000.0, 0.5, 3.0)
        .into_iter()
        .map(|s| s as f32)
        .collect();

    let buffer = AudioBuffer::from_interleaved_f32(&samples, 2).unwrap();
    assert_eq!(buffer.channels(), 2);

    // Identical stereo channels: mono level + 3 dB
    let lufs = meter.integrated_loudness(&buffer).unwrap();
    let expected = -3.01 - 6.02 + 3.01;
    assert!((lufs - expected).abs() < 0.1, "got {lufs:.3}");
}

#[test]
fn test_ragged_interleaved_input() {
    assert_eq!(
        AudioBuffer::from_interleaved(&[0.0; 5], 2),
        Err(LoudnessError::InvalidBufferLayout {
            samples: 5,
            channels: 2
        })
    );
}

#[test]
fn test_non_finite_sample_rejected() {
    let mut samples = vec![0.0; 8];
    samples[5] = f64::NAN;
    assert_eq!(
        AudioBuffer::from_interleaved(&samples, 2),
        Err(LoudnessError::NonFiniteSample {
            channel: 1,
            index: 2
        })
    );
}

#[test]
fn test_five_channel_layout() {
    let meter = Meter::new(48000).unwrap();
    let interleaved = generate_sine(48000, 5, 1000.0, 0.1, 3.0);
    let buffer = AudioBuffer::from_interleaved(&interleaved, 5).unwrap();

    let mono = meter
        .integrated_loudness(&mono_sine(48000, 1000.0, 0.1, 3.0))
        .unwrap();
    let surround = meter.integrated_loudness(&buffer).unwrap();

    // 1 + 1 + 1 + 1.41 + 1.41
    let expected = mono + 10.0 * 5.82_f64.log10();
    assert!((surround - expected).abs() < 1e-9);
}

// ========== Normalization workflows ==========

#[test]
fn test_measure_then_normalize_to_target() {
    let meter = Meter::new(48000).unwrap();
    let buffer = mono_sine(48000, 1000.0, 0.1, 5.0);

    let measured = meter.integrated_loudness(&buffer).unwrap();
    let target = LoudnessTarget::Streaming;
    let normalized = normalize::loudness(&buffer, measured, target.lufs()).unwrap();

    let after = meter.integrated_loudness(&normalized).unwrap();
    assert!((after - target.lufs()).abs() < 1e-6, "got {after}");
}

#[test]
fn test_parsed_target_normalization() {
    let meter = Meter::new(48000).unwrap();
    let buffer = mono_sine(48000, 440.0, 0.5, 3.0);

    let target: LoudnessTarget = "-16 LUFS".parse().unwrap();
    let measured = meter.integrated_loudness(&buffer).unwrap();
    let normalized = normalize::loudness(&buffer, measured, target.lufs()).unwrap();

    let after = meter.integrated_loudness(&normalized).unwrap();
    assert!((after + 16.0).abs() < 1e-6);
}

#[test]
fn test_peak_normalize_then_analyze() {
    let meter = Meter::new(48000).unwrap();
    let buffer = mono_sine(48000, 1000.0, 0.2, 4.0);

    let normalized = normalize::peak(&buffer, -1.0).unwrap();
    let report = meter.analyze(&normalized).unwrap();

    assert!((report.sample_peak_dbfs + 1.0).abs() < 1e-9);
    assert!(!report.will_clip_at_gain(0.5));
    assert!(report.will_clip_at_gain(1.5));
}

#[test]
fn test_analyze_matches_individual_measurements() {
    let meter = Meter::new(48000).unwrap();
    let mut samples = generate_sine(48000, 1, 440.0, 0.05, 6.0);
    samples.extend(generate_sine(48000, 1, 440.0, 0.5, 6.0));
    let buffer = AudioBuffer::mono(samples).unwrap();

    let report = meter.analyze(&buffer).unwrap();
    assert_eq!(
        report.integrated_lufs,
        meter.integrated_loudness(&buffer).unwrap()
    );
    assert_eq!(
        report.loudness_range_lu,
        Some(meter.loudness_range(&buffer).unwrap())
    );
    assert_eq!(report.sample_rate, 48000);
    assert!((report.duration_seconds - 12.0).abs() < 1e-9);
}
