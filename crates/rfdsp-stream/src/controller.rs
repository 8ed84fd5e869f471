//! Stream controller (C6): owns the rings, the DSP worker, the front-end,
//! and the fine-tune mixer; orchestrates the USB-producer/worker/sink/stats
//! threads and propagates runtime parameter changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use num_complex::Complex;

use rfdsp_config::{DriverConfig, DriverState, RfMode, SharedConfig};
use rfdsp_core::dsp_types::{ComplexSample, RawSample};
use rfdsp_core::error::{DriverError, DriverResult};
use rfdsp_core::ring::BlockRing;
use rfdsp_dsp::{quantize_offset, DspWorker, FftPlans, FilterBank, FineTuneMixer, WorkerParams};
use rfdsp_frontend::{FrontEnd, FrontEndDevice};

use crate::producer::run_dummy_producer;
use crate::stats::{run_stats_loop, StreamStats};

type RealSinkFn = dyn Fn(&[RawSample]) + Send;
type IqSinkFn = dyn Fn(&[ComplexSample]) + Send;

/// Threads spawned while streaming; cleared as each is joined.
#[derive(Default)]
struct StreamThreads {
    producer: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
    sink: Option<JoinHandle<()>>,
    stats: Option<JoinHandle<()>>,
    stats_stop: Option<crossbeam_channel::Sender<()>>,
}

/// Owns one active (or inactive) streaming session against a single
/// front-end device. Mirrors the teacher's entity/worker thread-lifecycle
/// idiom: threads are held as `Option<JoinHandle<_>>`, spawned via
/// `thread::Builder`, and joined in the reverse of spawn order on stop.
pub struct StreamController {
    shared: SharedConfig,
    frontend: Arc<Mutex<FrontEndDevice>>,
    real_ring: Arc<BlockRing<RawSample>>,
    iq_ring: Arc<BlockRing<ComplexSample>>,
    filters: Arc<FilterBank>,
    plans: Arc<FftPlans>,
    params: Arc<Mutex<WorkerParams>>,
    mixer: Arc<FineTuneMixer>,
    stats: Arc<StreamStats>,
    running: Arc<AtomicBool>,
    convert_iq: Arc<AtomicBool>,
    real_sink: Arc<Mutex<Option<Box<RealSinkFn>>>>,
    iq_sink: Arc<Mutex<Option<Box<IqSinkFn>>>>,
    threads: StreamThreads,
}

impl StreamController {
    /// Opens the (simulated) transport, instantiates the matching
    /// front-end, and sizes the rings and FFT/filter state. No streaming
    /// threads are started yet; call [`start`](Self::start) for that.
    pub fn init(config: DriverConfig) -> DriverResult<Self> {
        config
            .validate()
            .map_err(|_| DriverError::BufferSizeInvalid)?;

        let front_end = FrontEndDevice::from_model_name(&config.front_end_model)?;

        let shared = SharedConfig::new(config.clone());
        {
            let mut st = shared.state_write();
            st.rf_mode = front_end.best_rf_mode();
            st.adc_sample_rate = front_end.adc_sample_rate().max(config.adc_sample_rate_default);
        }

        let real_ring = Arc::new(BlockRing::new(config.ring_slot_count));
        real_ring.set_block_size(config.real_block_size)?;
        let iq_ring = Arc::new(BlockRing::new(config.ring_slot_count));
        iq_ring.set_block_size((config.real_block_size / 2).max(1))?;

        let filters = Arc::new(FilterBank::new(front_end.gain_dbfs()));
        let plans = Arc::new(FftPlans::new());

        let params = Arc::new(Mutex::new(WorkerParams {
            decimation: config.decimation_default,
            lsb: false,
            rand: false,
            center_frequency_bin: 0,
        }));

        Ok(Self {
            shared,
            frontend: Arc::new(Mutex::new(front_end)),
            real_ring,
            iq_ring,
            filters,
            plans,
            params,
            mixer: Arc::new(FineTuneMixer::new()),
            stats: Arc::new(StreamStats::default()),
            running: Arc::new(AtomicBool::new(false)),
            convert_iq: Arc::new(AtomicBool::new(true)),
            real_sink: Arc::new(Mutex::new(None)),
            iq_sink: Arc::new(Mutex::new(None)),
            threads: StreamThreads::default(),
        })
    }

    pub fn attach_real(&self, cb: impl Fn(&[RawSample]) + Send + 'static) {
        *self.real_sink.lock().unwrap() = Some(Box::new(cb));
    }

    pub fn attach_iq(&self, cb: impl Fn(&[ComplexSample]) + Send + 'static) {
        *self.iq_sink.lock().unwrap() = Some(Box::new(cb));
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> (u64, u64) {
        (
            self.stats.real_samples_per_sec.load(Ordering::Relaxed),
            self.stats.iq_samples_per_sec.load(Ordering::Relaxed),
        )
    }

    /// Starts (or restarts, if already running) the streaming session.
    /// `convert_iq` selects whether the DSP worker runs and the I/Q sink
    /// is fed, or whether the real sink is fed directly from the real
    /// ring with no conversion.
    pub fn start(&mut self, convert_iq: bool) -> DriverResult<()> {
        if self.running.load(Ordering::Acquire) {
            self.stop()?;
        }

        self.convert_iq.store(convert_iq, Ordering::Release);
        self.real_ring.start();
        self.iq_ring.start();
        self.running.store(true, Ordering::Release);
        tracing::info!(convert_iq, "stream starting");

        let producer_running = Arc::clone(&self.running);
        let producer_ring = Arc::clone(&self.real_ring);
        self.threads.producer = Some(
            thread::Builder::new()
                .name("rfdsp-producer".into())
                .spawn(move || run_dummy_producer(&producer_ring, &producer_running))
                .expect("failed to spawn producer thread"),
        );

        if convert_iq {
            let worker = DspWorker::new(
                Arc::clone(&self.real_ring),
                Arc::clone(&self.iq_ring),
                Arc::clone(&self.filters),
                Arc::clone(&self.plans),
                Arc::clone(&self.params),
            );
            self.threads.worker = Some(
                thread::Builder::new()
                    .name("rfdsp-worker".into())
                    .spawn(move || worker.run())
                    .expect("failed to spawn DSP worker thread"),
            );
        }

        {
            let convert_iq_flag = convert_iq;
            let real_ring = Arc::clone(&self.real_ring);
            let iq_ring = Arc::clone(&self.iq_ring);
            let mixer = Arc::clone(&self.mixer);
            let real_sink = Arc::clone(&self.real_sink);
            let iq_sink = Arc::clone(&self.iq_sink);
            self.threads.sink = Some(
                thread::Builder::new()
                    .name("rfdsp-sink".into())
                    .spawn(move || run_sink_loop(convert_iq_flag, real_ring, iq_ring, mixer, real_sink, iq_sink))
                    .expect("failed to spawn sink thread"),
            );
        }

        {
            let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);
            let real_ring = Arc::clone(&self.real_ring);
            let iq_ring = Arc::clone(&self.iq_ring);
            let stats = Arc::clone(&self.stats);
            let verbose = self.shared.config().verbose;
            self.threads.stats_stop = Some(stop_tx);
            self.threads.stats = Some(
                thread::Builder::new()
                    .name("rfdsp-stats".into())
                    .spawn(move || run_stats_loop(real_ring, iq_ring, stats, verbose, stop_rx))
                    .expect("failed to spawn stats thread"),
            );
        }

        Ok(())
    }

    /// Idempotent: calling `stop` on an already-stopped stream returns
    /// `Ok(())` without touching any thread handle.
    pub fn stop(&mut self) -> DriverResult<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::info!("stream stopping");

        self.real_ring.stop();
        self.iq_ring.stop();

        if let Some(tx) = self.threads.stats_stop.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.threads.stats.take() {
            let _ = h.join();
        }
        if let Some(h) = self.threads.sink.take() {
            let _ = h.join();
        }
        if let Some(h) = self.threads.worker.take() {
            let _ = h.join();
        }
        if let Some(h) = self.threads.producer.take() {
            let _ = h.join();
        }
        Ok(())
    }

    fn state(&self) -> std::sync::RwLockReadGuard<'_, DriverState> {
        self.shared.state_read()
    }

    pub fn rf_mode(&self) -> RfMode {
        self.state().rf_mode
    }

    pub fn set_rf_mode(&self, mode: RfMode) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_rf_mode(mode)?;
        self.params.lock().unwrap().lsb = mode == RfMode::Vhf;
        self.shared.state_write().rf_mode = mode;
        Ok(())
    }

    pub fn decimation(&self) -> usize {
        self.state().decimation
    }

    pub fn set_decimation(&self, d: usize) -> DriverResult<()> {
        if d >= rfdsp_core::dsp_types::NDECIDX {
            return Err(DriverError::DecimationOutOfRange);
        }
        self.params.lock().unwrap().decimation = d;
        self.shared.state_write().decimation = d;
        Ok(())
    }

    pub fn adc_sample_rate(&self) -> u64 {
        self.state().adc_sample_rate
    }

    pub fn set_adc_sample_rate(&self, rate_hz: u64) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_adc_sample_rate(rate_hz)?;
        self.shared.state_write().adc_sample_rate = rate_hz;
        Ok(())
    }

    /// Routes to the active-mode front-end setter, reads back the carrier
    /// the hardware settled on, and updates the DSP's `center_frequency_bin`
    /// and the fine-tune mixer residual together under the parameter lock.
    pub fn set_center_frequency(&self, freq_hz: u64) -> DriverResult<u64> {
        let mode = self.rf_mode();
        let carrier = self.frontend.lock().unwrap().set_lo_freq(mode, freq_hz)?;

        let adc_rate = self.adc_sample_rate().max(1) as f64;
        let offset = carrier as f64 / (adc_rate / 2.0);
        let decimation = self.decimation();
        let lsb = self.params.lock().unwrap().lsb;
        let (bin, residual) = quantize_offset(offset, decimation, lsb);

        self.params.lock().unwrap().center_frequency_bin = bin;
        self.mixer.set_residual(residual);
        self.shared.state_write().center_frequency_hz = carrier;
        Ok(carrier)
    }

    pub fn center_frequency(&self) -> u64 {
        self.state().center_frequency_hz
    }

    pub fn set_rand(&self, on: bool) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_rand(on)?;
        self.params.lock().unwrap().rand = on;
        self.shared.state_write().rand = on;
        Ok(())
    }

    pub fn rand(&self) -> bool {
        self.state().rand
    }

    pub fn set_dither(&self, on: bool) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_dither(on)?;
        self.shared.state_write().dither = on;
        Ok(())
    }

    pub fn dither(&self) -> bool {
        self.state().dither
    }

    pub fn set_pga(&self, on: bool) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_pga(on)?;
        self.shared.state_write().pga = on;
        Ok(())
    }

    pub fn pga(&self) -> bool {
        self.state().pga
    }

    pub fn set_bias_t_hf(&self, on: bool) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_bias_t(RfMode::Hf, on)?;
        self.shared.state_write().bias_t_hf = on;
        Ok(())
    }

    pub fn bias_t_hf(&self) -> bool {
        self.state().bias_t_hf
    }

    pub fn set_bias_t_vhf(&self, on: bool) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_bias_t(RfMode::Vhf, on)?;
        self.shared.state_write().bias_t_vhf = on;
        Ok(())
    }

    pub fn bias_t_vhf(&self) -> bool {
        self.state().bias_t_vhf
    }

    pub fn set_rf_attenuation(&self, mode: RfMode, step: usize) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_rf_attenuation(mode, step)
    }

    pub fn set_if_gain(&self, mode: RfMode, step: usize) -> DriverResult<()> {
        self.frontend.lock().unwrap().set_if_gain(mode, step)
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run_sink_loop(
    convert_iq: bool,
    real_ring: Arc<BlockRing<RawSample>>,
    iq_ring: Arc<BlockRing<ComplexSample>>,
    mixer: Arc<FineTuneMixer>,
    real_sink: Arc<Mutex<Option<Box<RealSinkFn>>>>,
    iq_sink: Arc<Mutex<Option<Box<IqSinkFn>>>>,
) {
    if convert_iq {
        while let Some(slot) = iq_ring.read_slot() {
            let mut buf: Vec<Complex<f32>> = slot.to_vec();
            drop(slot);
            mixer.apply(&mut buf);
            if let Some(cb) = iq_sink.lock().unwrap().as_ref() {
                cb(&buf);
            }
        }
    } else {
        while let Some(slot) = real_ring.read_slot() {
            if let Some(cb) = real_sink.lock().unwrap().as_ref() {
                cb(&slot);
            }
        }
    }
}
