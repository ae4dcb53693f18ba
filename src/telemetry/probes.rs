//! Shell-backed and procfs-backed OS telemetry probes.
//!
//! Everything here is best-effort: a timeout, a non-zero exit or unparsable
//! output is a recoverable failure. Callers substitute the documented
//! fallback report and carry on; nothing in this module is fatal to a poll.

use std::time::Duration;

use color_eyre::eyre::{Result, eyre};
use log::*;
use tokio::process::Command;
use tokio::time::timeout;

use crate::telemetry::cpu::CoreTicks;
use crate::telemetry::detail;
use crate::telemetry::snapshot::{GpuReport, HardwareDetail, NetworkReport};

/// Raw disk counters for one volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// The set of fallible OS lookups the sampler consumes.
///
/// The sampler is generic over this so tests can drive it with a pure
/// in-memory fake and never touch a live shell.
pub trait Probes {
    /// Cumulative per-core tick counters. Fast, no subprocess.
    fn core_ticks(&mut self) -> Result<Vec<CoreTicks>>;
    /// `df`-backed usage for one volume. Moderate latency, never cached.
    async fn disk_usage(&mut self, volume: &str) -> Result<DiskUsage>;
    /// GPU identity plus (possibly synthetic) temperature/usage. Slow,
    /// cached by the sampler.
    async fn gpu_info(&mut self) -> Result<GpuReport>;
    /// Active connection summary. Slow, cached by the sampler.
    async fn network_info(&mut self) -> Result<NetworkReport>;
    /// CPU/memory/board detail. Moderate latency, never cached.
    async fn hardware_detail(&mut self) -> Result<HardwareDetail>;
}

/// Live probes: `/proc` and sysfs reads plus shell commands run under a
/// single configurable timeout.
#[derive(Debug, Clone)]
pub struct ShellProbes {
    timeout: Duration,
}

impl ShellProbes {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Run a command, bounded by `limit`, and return its stdout as text.
pub(crate) async fn run(limit: Duration, program: &str, args: &[&str]) -> Result<String> {
    let output = timeout(limit, Command::new(program).args(args).output())
        .await
        .map_err(|_| eyre!("{program} timed out after {limit:?}"))?
        .map_err(|e| eyre!("{program} failed to start: {e}"))?;
    if !output.status.success() {
        return Err(eyre!("{program} exited with {}", output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl Probes for ShellProbes {
    fn core_ticks(&mut self) -> Result<Vec<CoreTicks>> {
        let text = std::fs::read_to_string("/proc/stat")?;
        Ok(parse_proc_stat(&text))
    }

    async fn disk_usage(&mut self, volume: &str) -> Result<DiskUsage> {
        let text = run(self.timeout, "df", &["-kP", volume]).await?;
        parse_df(&text).ok_or_else(|| eyre!("unparsable df output for {volume}"))
    }

    async fn gpu_info(&mut self) -> Result<GpuReport> {
        // Real sensors first, adapter name only as the fallback.
        match run(
            self.timeout,
            "nvidia-smi",
            &[
                "--query-gpu=name,memory.total,temperature.gpu,utilization.gpu",
                "--format=csv,noheader,nounits",
            ],
        )
        .await
        {
            Ok(text) => {
                if let Some(report) = parse_nvidia_smi(&text) {
                    return Ok(report);
                }
                debug!(target: "Probes", "nvidia-smi output not in the expected shape");
            }
            Err(e) => debug!(target: "Probes", "nvidia-smi unavailable: {e}"),
        }

        let text = run(self.timeout, "lspci", &[]).await?;
        let name = parse_lspci_vga(&text).ok_or_else(|| eyre!("no display adapter in lspci"))?;
        // No sensor for this adapter: fabricate plausible numbers and say so.
        Ok(GpuReport {
            name,
            memory: "shared".to_string(),
            temperature_c: (38 + jitter(12)) as f32,
            usage_percent: jitter(35) as f32,
            simulated: true,
            probed: true,
        })
    }

    async fn network_info(&mut self) -> Result<NetworkReport> {
        match nmcli_network(self.timeout).await {
            Ok(report) => Ok(report),
            Err(e) => {
                debug!(target: "Probes", "nmcli unavailable ({e}); falling back to sysfs");
                sysfs_network()
            }
        }
    }

    async fn hardware_detail(&mut self) -> Result<HardwareDetail> {
        detail::collect(self.timeout).await
    }
}

/// Parse the `cpuN` lines of `/proc/stat` into per-core counters.
///
/// Idle time is `idle + iowait`; total is the sum of every column. The
/// aggregate `cpu ` line is skipped so cores are not double counted.
pub fn parse_proc_stat(text: &str) -> Vec<CoreTicks> {
    text.lines()
        .filter(|line| line.starts_with("cpu") && !line.starts_with("cpu "))
        .filter_map(parse_core_line)
        .collect()
}

fn parse_core_line(line: &str) -> Option<CoreTicks> {
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map_while(|f| f.parse().ok())
        .collect();
    if fields.len() < 5 {
        return None;
    }
    Some(CoreTicks {
        idle: fields[3] + fields[4],
        total: fields.iter().sum(),
    })
}

/// Parse `df -kP` output (POSIX format, 1024-byte blocks).
pub fn parse_df(text: &str) -> Option<DiskUsage> {
    let line = text.lines().nth(1)?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    let blocks: u64 = fields.get(1)?.parse().ok()?;
    let available: u64 = fields.get(3)?.parse().ok()?;
    Some(DiskUsage {
        total_bytes: blocks * 1024,
        free_bytes: available * 1024,
    })
}

/// Parse one `nvidia-smi --query-gpu=name,memory.total,temperature.gpu,utilization.gpu`
/// CSV line, e.g. `NVIDIA GeForce RTX 3060, 12288, 45, 3`.
pub fn parse_nvidia_smi(text: &str) -> Option<GpuReport> {
    let line = text.lines().find(|l| !l.trim().is_empty())?;
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        return None;
    }
    let memory_mib: u64 = fields[1].parse().ok()?;
    Some(GpuReport {
        name: fields[0].to_string(),
        memory: format!("{:.0} GiB dedicated", memory_mib as f64 / 1024.0),
        temperature_c: fields[2].parse().ok()?,
        usage_percent: fields[3].parse().ok()?,
        simulated: false,
        probed: true,
    })
}

/// Pick the display adapter name out of `lspci` output.
pub fn parse_lspci_vga(text: &str) -> Option<String> {
    text.lines()
        .find(|l| l.contains("VGA compatible controller") || l.contains("3D controller"))
        .and_then(|l| l.splitn(2, ": ").nth(1))
        .map(|name| name.trim().to_string())
}

async fn nmcli_network(limit: Duration) -> Result<NetworkReport> {
    let wifi = run(limit, "nmcli", &["-t", "-f", "ACTIVE,SSID,SIGNAL", "dev", "wifi"]).await?;
    if let Some((ssid, signal)) = parse_nmcli_wifi(&wifi) {
        return Ok(connected_report(ssid, signal, "wifi"));
    }
    let dev = run(limit, "nmcli", &["-t", "-f", "DEVICE,TYPE,STATE", "dev"]).await?;
    match parse_nmcli_device(&dev) {
        Some((device, kind)) => Ok(connected_report(device, 100, &kind)),
        None => Ok(NetworkReport::disconnected()),
    }
}

/// First active row of `nmcli -t -f ACTIVE,SSID,SIGNAL dev wifi`.
pub fn parse_nmcli_wifi(text: &str) -> Option<(String, u8)> {
    text.lines().find_map(|line| {
        let mut parts = line.splitn(3, ':');
        let active = parts.next()?;
        let ssid = parts.next()?;
        let signal = parts.next()?.parse().ok()?;
        (active == "yes" && !ssid.is_empty()).then(|| (ssid.to_string(), signal))
    })
}

/// First connected, non-loopback row of `nmcli -t -f DEVICE,TYPE,STATE dev`.
pub fn parse_nmcli_device(text: &str) -> Option<(String, String)> {
    text.lines().find_map(|line| {
        let mut parts = line.splitn(3, ':');
        let device = parts.next()?;
        let kind = parts.next()?;
        let state = parts.next()?;
        (state.starts_with("connected") && kind != "loopback")
            .then(|| (device.to_string(), kind.to_string()))
    })
}

/// Approximate connectivity from `/sys/class/net` when nmcli is missing:
/// any non-loopback interface with operstate `up` counts as connected.
fn sysfs_network() -> Result<NetworkReport> {
    for entry in std::fs::read_dir("/sys/class/net")? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == "lo" {
            continue;
        }
        let state = std::fs::read_to_string(entry.path().join("operstate")).unwrap_or_default();
        if state.trim() != "up" {
            continue;
        }
        let wireless = entry.path().join("wireless").exists();
        let signal = if wireless {
            std::fs::read_to_string("/proc/net/wireless")
                .ok()
                .and_then(|text| parse_proc_wireless(&text, &name))
                .unwrap_or(50)
        } else {
            100
        };
        let kind = if wireless { "wifi" } else { "ethernet" };
        return Ok(connected_report(name, signal, kind));
    }
    Ok(NetworkReport::disconnected())
}

/// Link quality for `iface` from `/proc/net/wireless`, scaled to a
/// percentage of the usual 70-point range.
pub fn parse_proc_wireless(text: &str, iface: &str) -> Option<u8> {
    let prefix = format!("{iface}:");
    let line = text.lines().find(|l| l.trim_start().starts_with(&prefix))?;
    let quality: f64 = line
        .split_whitespace()
        .nth(2)?
        .trim_end_matches('.')
        .parse()
        .ok()?;
    Some((quality / 70.0 * 100.0).clamp(0.0, 100.0) as u8)
}

fn connected_report(label: impl Into<String>, signal: u8, kind: &str) -> NetworkReport {
    // No packet counters are read here; rates are fabricated in proportion
    // to signal quality and labeled simulated.
    let quality = f64::from(signal) / 100.0;
    NetworkReport {
        label: label.into(),
        signal_percent: signal,
        kind: kind.to_string(),
        connected: true,
        rx_mbps: (quality * (250.0 + f64::from(jitter(500)) / 10.0) * 10.0).round() / 10.0,
        tx_mbps: (quality * (40.0 + f64::from(jitter(120)) / 10.0) * 10.0).round() / 10.0,
        rates_simulated: true,
        probed: true,
    }
}

/// Cheap time-derived wobble for the values we fabricate.
fn jitter(modulus: u32) -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_millis())
        .unwrap_or(0)
        % modulus.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "\
cpu  1200 20 300 8000 100 0 30 0 0 0
cpu0 600 10 150 4000 50 0 15 0 0 0
cpu1 600 10 150 4000 50 0 15 0 0 0
intr 12345
ctxt 6789
";

    #[test]
    fn proc_stat_skips_the_aggregate_line() {
        let cores = parse_proc_stat(PROC_STAT);
        assert_eq!(cores.len(), 2);
        assert_eq!(cores[0].idle, 4050);
        assert_eq!(cores[0].total, 4825);
    }

    #[test]
    fn proc_stat_tolerates_garbage() {
        assert!(parse_proc_stat("not a stat file\ncpufreq nonsense\n").is_empty());
        assert!(parse_proc_stat("").is_empty());
    }

    #[test]
    fn df_posix_output() {
        let text = "\
Filesystem     1024-blocks      Used Available Capacity Mounted on
/dev/nvme0n1p2   959786032 490114256 420824192      54% /
";
        let usage = parse_df(text).unwrap();
        assert_eq!(usage.total_bytes, 959786032 * 1024);
        assert_eq!(usage.free_bytes, 420824192 * 1024);
    }

    #[test]
    fn df_with_no_data_line_is_none() {
        assert!(parse_df("Filesystem 1024-blocks Used Available Capacity Mounted on\n").is_none());
        assert!(parse_df("").is_none());
    }

    #[test]
    fn nvidia_smi_line() {
        let report = parse_nvidia_smi("NVIDIA GeForce RTX 3060, 12288, 45, 3\n").unwrap();
        assert_eq!(report.name, "NVIDIA GeForce RTX 3060");
        assert_eq!(report.memory, "12 GiB dedicated");
        assert_eq!(report.temperature_c, 45.0);
        assert_eq!(report.usage_percent, 3.0);
        assert!(!report.simulated);
        assert!(report.probed);
    }

    #[test]
    fn nvidia_smi_garbage_is_none() {
        assert!(parse_nvidia_smi("No devices were found\n").is_none());
        assert!(parse_nvidia_smi("").is_none());
    }

    #[test]
    fn lspci_finds_the_vga_controller() {
        let text = "\
00:1f.3 Audio device: Intel Corporation Cannon Lake PCH cAVS (rev 10)
01:00.0 VGA compatible controller: NVIDIA Corporation GA106 [GeForce RTX 3060] (rev a1)
02:00.0 Ethernet controller: Realtek Semiconductor Co., Ltd. RTL8111
";
        assert_eq!(
            parse_lspci_vga(text).unwrap(),
            "NVIDIA Corporation GA106 [GeForce RTX 3060] (rev a1)"
        );
        assert!(parse_lspci_vga("00:00.0 Host bridge: Intel\n").is_none());
    }

    #[test]
    fn nmcli_wifi_picks_the_active_row() {
        let text = "no:Neighbour:54\nyes:HomeWifi:72\nno::0\n";
        assert_eq!(parse_nmcli_wifi(text), Some(("HomeWifi".to_string(), 72)));
        assert_eq!(parse_nmcli_wifi("no:Other:54\n"), None);
    }

    #[test]
    fn nmcli_device_skips_loopback() {
        let text = "lo:loopback:connected (externally)\nenp3s0:ethernet:connected\nwlan0:wifi:disconnected\n";
        assert_eq!(
            parse_nmcli_device(text),
            Some(("enp3s0".to_string(), "ethernet".to_string()))
        );
    }

    #[test]
    fn proc_wireless_quality() {
        let text = "\
Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
 wlan0: 0000   54.  -56.  -256        0      0      0      0      0        0
";
        assert_eq!(parse_proc_wireless(text, "wlan0"), Some(77));
        assert_eq!(parse_proc_wireless(text, "wlan1"), None);
    }
}
