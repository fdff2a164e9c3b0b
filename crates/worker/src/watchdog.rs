//! CPU watchdog.
//!
//! Samples process-host CPU usage every few seconds and, the first time
//! usage crosses the threshold, fires the restart trigger exactly once.
//! The trigger is an injected callback so the binary decides what a
//! restart means (graceful shutdown with a restart exit code).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use policy_core::limits;
use sysinfo::System;
use telemetry::metrics;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct WatchdogConfig {
    pub threshold_percent: f32,
    pub sample_interval: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            threshold_percent: limits::CPU_THRESHOLD_PERCENT,
            sample_interval: Duration::from_secs(limits::CPU_SAMPLE_INTERVAL_SECS),
        }
    }
}

pub struct CpuWatchdog {
    config: WatchdogConfig,
    system: Mutex<System>,
    restart_requested: AtomicBool,
    on_breach: Box<dyn Fn() + Send + Sync>,
}

impl CpuWatchdog {
    pub fn new(config: WatchdogConfig, on_breach: impl Fn() + Send + Sync + 'static) -> Self {
        let mut system = System::new();
        // Prime the counters so the first real sample has a baseline.
        system.refresh_cpu_usage();
        Self {
            config,
            system: Mutex::new(system),
            restart_requested: AtomicBool::new(false),
            on_breach: Box::new(on_breach),
        }
    }

    /// Reads current global CPU usage as a percentage.
    pub fn sample(&self) -> f32 {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();
        system.global_cpu_usage()
    }

    /// Applies the threshold to one sample. Returns true if this call
    /// fired the restart trigger; subsequent breaches are ignored.
    pub fn evaluate(&self, usage: f32) -> bool {
        metrics().cpu_usage_percent.set(usage as u64);
        if usage < self.config.threshold_percent {
            return false;
        }
        if self.restart_requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        warn!(
            usage_percent = usage,
            threshold_percent = self.config.threshold_percent,
            "CPU threshold breached, requesting restart"
        );
        (self.on_breach)();
        true
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested.load(Ordering::SeqCst)
    }

    /// Sampling loop. Keeps running after a breach so the usage gauge
    /// stays current while shutdown is in progress.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.config.sample_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let usage = self.sample();
            debug!(usage_percent = usage, "cpu sample");
            self.evaluate(usage);
        }
    }
}
