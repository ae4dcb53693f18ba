use std::time::Duration;

use log::*;
use sysinfo::System;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::{self, MissedTickBehavior};

use crate::event::{AppEvent, Event};
use crate::telemetry::cache::TimedCache;
use crate::telemetry::cpu::CpuEstimator;
use crate::telemetry::history::History;
use crate::telemetry::probes::{Probes, ShellProbes};
use crate::telemetry::snapshot::{
    CpuReport, GpuReport, HardwareDetail, HardwareSnapshot, HistoryReport, HostReport,
    MemoryReport, NetworkReport, StorageReport, bytes_to_gb, format_uptime,
};

/// Everything about a sampler that can change on a config reload.
#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub poll_interval: Duration,
    pub cache_ttl: Duration,
    pub history_points: usize,
    pub volume: String,
}

/// Commands the app sends to the running sampler task.
#[derive(Debug)]
pub enum SamplerCommand {
    /// Stop scheduling new polls. A poll already in flight still completes.
    SetPaused(bool),
    /// Poll immediately, paused or not.
    RefreshNow,
    Reconfigure(SamplerSettings),
}

/// Assembles one [`HardwareSnapshot`] per poll.
///
/// Owns all the mutable pipeline state: the estimator baseline, both caches
/// and both history buffers. Exactly one sampler task drives it, so none of
/// that state is locked.
pub struct Sampler<P> {
    probes: P,
    sys: System,
    estimator: CpuEstimator,
    gpu_cache: TimedCache<GpuReport>,
    net_cache: TimedCache<NetworkReport>,
    cpu_history: History,
    mem_history: History,
    settings: SamplerSettings,
}

impl<P: Probes> Sampler<P> {
    pub fn new(probes: P, settings: SamplerSettings) -> Self {
        Self {
            probes,
            sys: System::new_all(),
            estimator: CpuEstimator::new(),
            gpu_cache: TimedCache::new(),
            net_cache: TimedCache::new(),
            cpu_history: History::new(settings.history_points),
            mem_history: History::new(settings.history_points),
            settings,
        }
    }

    pub fn apply(&mut self, settings: SamplerSettings) {
        self.cpu_history.set_capacity(settings.history_points);
        self.mem_history.set_capacity(settings.history_points);
        self.settings = settings;
    }

    /// One full poll. Sub-fetches fail independently: each one degrades to
    /// its fallback report, so the returned snapshot is always complete.
    ///
    /// GPU and network go through their own timed caches; memory, disk and
    /// hardware detail are read fresh every time, so only the two slowest
    /// probe families are ever served stale.
    pub async fn poll(&mut self) -> HardwareSnapshot {
        let ttl = self.settings.cache_ttl;

        let ticks = match self.probes.core_ticks() {
            Ok(ticks) => ticks,
            Err(e) => {
                warn!(target: "Sampler", "Core tick read failed: {e}");
                Vec::new()
            }
        };
        let cpu_usage = self.estimator.update(&ticks);

        self.sys.refresh_memory();
        self.sys.refresh_cpu_all();
        let memory = memory_report(&self.sys);

        let gpu = self
            .gpu_cache
            .get_or_refresh(ttl, fetch_gpu(&mut self.probes))
            .await;
        let network = self
            .net_cache
            .get_or_refresh(ttl, fetch_network(&mut self.probes))
            .await;

        let storage = match self.probes.disk_usage(&self.settings.volume).await {
            Ok(usage) => storage_report(&self.settings.volume, usage.total_bytes, usage.free_bytes),
            Err(e) => {
                warn!(target: "Sampler", "Disk probe failed: {e}");
                StorageReport::fallback(&self.settings.volume)
            }
        };

        let detail = match self.probes.hardware_detail().await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(target: "Sampler", "Hardware detail probe failed: {e}");
                HardwareDetail::fallback()
            }
        };

        self.cpu_history.push(cpu_usage);
        self.mem_history.push(memory.usage_percent);

        HardwareSnapshot {
            cpu: cpu_report(&self.sys, cpu_usage),
            gpu,
            memory,
            storage,
            network,
            history: HistoryReport {
                cpu: self.cpu_history.snapshot(),
                memory: self.mem_history.snapshot(),
            },
            detail,
            host: host_report(),
        }
    }
}

async fn fetch_gpu<P: Probes>(probes: &mut P) -> GpuReport {
    match probes.gpu_info().await {
        Ok(report) => report,
        Err(e) => {
            warn!(target: "Sampler", "GPU probe failed: {e}");
            GpuReport::fallback()
        }
    }
}

async fn fetch_network<P: Probes>(probes: &mut P) -> NetworkReport {
    match probes.network_info().await {
        Ok(report) => report,
        Err(e) => {
            warn!(target: "Sampler", "Network probe failed: {e}");
            NetworkReport::disconnected()
        }
    }
}

fn memory_report(sys: &System) -> MemoryReport {
    let total = sys.total_memory();
    let used = sys.used_memory();
    let usage_percent = if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    };
    MemoryReport {
        usage_percent,
        total_gb: bytes_to_gb(total),
        used_gb: bytes_to_gb(used),
        free_gb: bytes_to_gb(sys.available_memory()),
    }
}

fn storage_report(volume: &str, total_bytes: u64, free_bytes: u64) -> StorageReport {
    let used_bytes = total_bytes.saturating_sub(free_bytes);
    let usage_percent = if total_bytes == 0 {
        0.0
    } else {
        (used_bytes as f64 / total_bytes as f64 * 100.0) as f32
    };
    StorageReport {
        volume: volume.to_string(),
        usage_percent,
        total_gb: bytes_to_gb(total_bytes),
        used_gb: bytes_to_gb(used_bytes),
        free_gb: bytes_to_gb(free_bytes),
        probed: true,
    }
}

fn cpu_report(sys: &System, usage_percent: f32) -> CpuReport {
    let (model, speed_mhz) = sys
        .cpus()
        .first()
        .map(|c| (c.brand().trim().to_string(), c.frequency()))
        .unwrap_or_else(|| ("unknown".to_string(), 0));
    let (temperature_c, temperature_estimated) = match read_package_temperature() {
        Some(t) => (t, false),
        // No readable thermal zone: estimate from load so the gauge still
        // moves, and flag it.
        None => (32.0 + usage_percent * 0.4, true),
    };
    CpuReport {
        usage_percent,
        model,
        cores: sys.cpus().len(),
        speed_mhz,
        temperature_c,
        temperature_estimated,
    }
}

fn host_report() -> HostReport {
    let uptime_seconds = System::uptime();
    HostReport {
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        uptime_seconds,
        uptime: format_uptime(uptime_seconds),
        os_type: System::name().unwrap_or_else(|| "unknown".to_string()),
        os_release: System::os_version().unwrap_or_else(|| "unknown".to_string()),
        load_average: System::load_average().one,
    }
}

/// Prefer the x86 package sensor; otherwise the first readable zone.
fn read_package_temperature() -> Option<f32> {
    let entries = std::fs::read_dir("/sys/class/thermal").ok()?;
    let mut first = None;
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with("thermal_zone") {
            continue;
        }
        let path = entry.path();
        let Ok(raw) = std::fs::read_to_string(path.join("temp")) else {
            continue;
        };
        let Ok(millis) = raw.trim().parse::<f32>() else {
            continue;
        };
        let temp = millis / 1000.0;
        let kind = std::fs::read_to_string(path.join("type")).unwrap_or_default();
        if kind.trim() == "x86_pkg_temp" {
            return Some(temp);
        }
        first.get_or_insert(temp);
    }
    first
}

/// Drive `sampler.poll()` on its own task and publish snapshots as events.
///
/// The next tick is not armed until the previous poll completes, so polls
/// never overlap; a probe that runs long stretches the period instead.
/// Pausing stops new polls from being scheduled without interrupting one
/// already in flight. The task stops when either channel closes.
pub fn spawn_sampler(
    mut sampler: Sampler<ShellProbes>,
    sender: UnboundedSender<Event>,
) -> UnboundedSender<SamplerCommand> {
    let (tx, mut commands) = mpsc::unbounded_channel();
    let mut interval = sampler.settings.poll_interval;
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut paused = false;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if paused {
                        continue;
                    }
                }
                cmd = commands.recv() => match cmd {
                    None => break,
                    Some(SamplerCommand::SetPaused(p)) => {
                        info!(target: "Sampler", "Auto-refresh {}", if p { "paused" } else { "resumed" });
                        paused = p;
                        continue;
                    }
                    Some(SamplerCommand::RefreshNow) => {}
                    Some(SamplerCommand::Reconfigure(settings)) => {
                        if settings.poll_interval != interval {
                            interval = settings.poll_interval;
                            ticker = time::interval(interval);
                            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        }
                        sampler.apply(settings);
                        continue;
                    }
                },
            }
            let snapshot = sampler.poll().await;
            if sender
                .send(Event::App(AppEvent::Snapshot(Box::new(snapshot))))
                .is_err()
            {
                break;
            }
        }
        debug!(target: "Sampler", "Sampler task exiting");
    });
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::cpu::CoreTicks;
    use crate::telemetry::probes::DiskUsage;
    use color_eyre::eyre::eyre;

    struct FakeProbes {
        ticks: Vec<CoreTicks>,
        fail_disk: bool,
        gpu_fetches: u32,
        net_fetches: u32,
    }

    impl FakeProbes {
        fn new() -> Self {
            Self {
                ticks: vec![CoreTicks { idle: 1000, total: 10000 }],
                fail_disk: false,
                gpu_fetches: 0,
                net_fetches: 0,
            }
        }
    }

    impl Probes for FakeProbes {
        fn core_ticks(&mut self) -> color_eyre::Result<Vec<CoreTicks>> {
            Ok(self.ticks.clone())
        }

        async fn disk_usage(&mut self, _volume: &str) -> color_eyre::Result<DiskUsage> {
            if self.fail_disk {
                return Err(eyre!("df blew up"));
            }
            Ok(DiskUsage {
                total_bytes: 1_000_000_000_000,
                free_bytes: 400_000_000_000,
            })
        }

        async fn gpu_info(&mut self) -> color_eyre::Result<GpuReport> {
            self.gpu_fetches += 1;
            Ok(GpuReport {
                name: "Fake GPU".to_string(),
                memory: "8 GiB dedicated".to_string(),
                temperature_c: 40.0,
                usage_percent: 10.0,
                simulated: false,
                probed: true,
            })
        }

        async fn network_info(&mut self) -> color_eyre::Result<NetworkReport> {
            self.net_fetches += 1;
            Ok(NetworkReport {
                label: "TestNet".to_string(),
                signal_percent: 80,
                kind: "wifi".to_string(),
                connected: true,
                rx_mbps: 100.0,
                tx_mbps: 20.0,
                rates_simulated: true,
                probed: true,
            })
        }

        async fn hardware_detail(&mut self) -> color_eyre::Result<HardwareDetail> {
            Ok(HardwareDetail::fallback())
        }
    }

    fn settings() -> SamplerSettings {
        SamplerSettings {
            poll_interval: Duration::from_millis(2000),
            cache_ttl: Duration::from_millis(5000),
            history_points: 60,
            volume: "/".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn disk_failure_does_not_poison_the_snapshot() {
        let mut probes = FakeProbes::new();
        probes.fail_disk = true;
        let mut sampler = Sampler::new(probes, settings());

        let snapshot = sampler.poll().await;

        assert!(!snapshot.storage.probed);
        assert_eq!(snapshot.storage.total_gb, 0.0);
        // The rest of the snapshot is intact.
        assert!((0.0..=100.0).contains(&snapshot.cpu.usage_percent));
        assert!((0.0..=100.0).contains(&snapshot.memory.usage_percent));
        assert!(snapshot.gpu.probed);
        assert!(snapshot.network.connected);
        assert_eq!(snapshot.history.cpu.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn storage_math_from_the_probe() {
        let mut sampler = Sampler::new(FakeProbes::new(), settings());
        let snapshot = sampler.poll().await;
        assert_eq!(snapshot.storage.total_gb, 1000.0);
        assert_eq!(snapshot.storage.free_gb, 400.0);
        assert_eq!(snapshot.storage.used_gb, 600.0);
        assert!((snapshot.storage.usage_percent - 60.0).abs() < 0.01);
        assert!(snapshot.storage.probed);
    }

    #[tokio::test(start_paused = true)]
    async fn first_poll_reports_zero_cpu_then_deltas() {
        let mut sampler = Sampler::new(FakeProbes::new(), settings());

        let first = sampler.poll().await;
        assert_eq!(first.cpu.usage_percent, 0.0);

        sampler.probes.ticks = vec![CoreTicks { idle: 1050, total: 10500 }];
        tokio::time::advance(Duration::from_millis(6000)).await;
        let second = sampler.poll().await;
        assert_eq!(second.cpu.usage_percent, 90.0);
        assert_eq!(second.history.cpu, vec![0.0, 90.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn expensive_probes_are_cached_between_close_polls() {
        let mut sampler = Sampler::new(FakeProbes::new(), settings());

        sampler.poll().await;
        tokio::time::advance(Duration::from_millis(2000)).await;
        sampler.poll().await;
        assert_eq!(sampler.probes.gpu_fetches, 1);
        assert_eq!(sampler.probes.net_fetches, 1);

        tokio::time::advance(Duration::from_millis(4000)).await;
        sampler.poll().await;
        assert_eq!(sampler.probes.gpu_fetches, 2);
        assert_eq!(sampler.probes.net_fetches, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_shrinks_the_histories() {
        let mut sampler = Sampler::new(FakeProbes::new(), settings());
        for _ in 0..10 {
            sampler.poll().await;
            tokio::time::advance(Duration::from_millis(2000)).await;
        }
        let mut smaller = settings();
        smaller.history_points = 4;
        sampler.apply(smaller);
        let snapshot = sampler.poll().await;
        assert_eq!(snapshot.history.cpu.len(), 4);
        assert_eq!(snapshot.history.memory.len(), 4);
    }
}
