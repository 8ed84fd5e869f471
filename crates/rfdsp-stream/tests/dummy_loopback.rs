//! Integration tests driving the full controller against the Dummy
//! front-end (S1-S4, S8). Durations are kept short relative to the
//! scenario descriptions' literal 1s/11ms figures to keep the suite fast.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rfdsp_config::DriverConfig;
use rfdsp_core::dsp_types::BASE_FFT_SAVE_SIZE;
use rfdsp_stream::StreamController;

fn test_config(decimation: usize) -> DriverConfig {
    DriverConfig {
        front_end_model: "dummy".to_string(),
        decimation_default: decimation,
        real_block_size: BASE_FFT_SAVE_SIZE * 2,
        ring_slot_count: 8,
        ..DriverConfig::default()
    }
}

#[test]
fn s1_dummy_loopback_across_decimations() {
    let expected_block = BASE_FFT_SAVE_SIZE as u64;

    for d in 1..=5usize {
        let cfg = test_config(d);
        let mut controller = StreamController::init(cfg).unwrap();

        let frame_count = Arc::new(AtomicU64::new(0));
        let total_samples = Arc::new(AtomicU64::new(0));
        let fc = Arc::clone(&frame_count);
        let ts = Arc::clone(&total_samples);
        controller.attach_iq(move |block| {
            fc.fetch_add(1, Ordering::Relaxed);
            ts.fetch_add(block.len() as u64, Ordering::Relaxed);
        });

        controller.start(true).unwrap();
        std::thread::sleep(Duration::from_millis(150));
        controller.stop().unwrap();

        let frames = frame_count.load(Ordering::Relaxed);
        let samples = total_samples.load(Ordering::Relaxed);
        assert!(frames > 0, "decimation {d}: expected at least one I/Q frame");
        assert_eq!(samples / frames, expected_block, "decimation {d}: unexpected block size");
    }
}

#[test]
fn s2_open_close() {
    let controller = StreamController::init(test_config(0)).unwrap();
    drop(controller);

    let mut controller = StreamController::init(test_config(0)).unwrap();
    controller.start(true).unwrap();
    drop(controller);
}

#[test]
fn s3_getter_setter_parity() {
    let controller = StreamController::init(test_config(0)).unwrap();

    controller.set_adc_sample_rate(128_000_000).unwrap();
    assert_eq!(controller.adc_sample_rate(), 128_000_000);

    assert!(!controller.dither());
    controller.set_dither(true).unwrap();
    assert!(controller.dither());

    assert!(!controller.rand());
    controller.set_rand(true).unwrap();
    assert!(controller.rand());

    assert!(!controller.pga());
    controller.set_pga(true).unwrap();
    assert!(controller.pga());

    assert!(!controller.bias_t_hf());
    controller.set_bias_t_hf(true).unwrap();
    assert!(controller.bias_t_hf());

    assert!(!controller.bias_t_vhf());
    controller.set_bias_t_vhf(true).unwrap();
    assert!(controller.bias_t_vhf());
}

#[test]
fn s4_tune_during_streaming() {
    let mut controller = StreamController::init(test_config(1)).unwrap();
    controller.start(true).unwrap();

    for khz in (100..=1900).step_by(300) {
        let freq_hz = khz as u64 * 1000;
        controller.set_center_frequency(freq_hz).unwrap();
        std::thread::sleep(Duration::from_millis(5));
    }

    controller.stop().unwrap();
}

#[test]
fn s8_stop_is_idempotent() {
    let mut controller = StreamController::init(test_config(0)).unwrap();
    controller.stop().unwrap();
    controller.start(true).unwrap();
    controller.stop().unwrap();
    controller.stop().unwrap();
}
