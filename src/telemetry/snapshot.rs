use serde::Serialize;

/// One complete, flat description of host state at a single poll instant.
///
/// Every field is always populated: a failed probe substitutes its report's
/// documented fallback and clears that report's `probed` flag so the
/// dashboard can mark the category instead of crashing the refresh loop.
#[derive(Debug, Clone, Serialize)]
pub struct HardwareSnapshot {
    pub cpu: CpuReport,
    pub gpu: GpuReport,
    pub memory: MemoryReport,
    pub storage: StorageReport,
    pub network: NetworkReport,
    pub history: HistoryReport,
    pub detail: HardwareDetail,
    pub host: HostReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuReport {
    /// Overall usage in `[0, 100]`, differential over the poll interval.
    pub usage_percent: f32,
    pub model: String,
    pub cores: usize,
    pub speed_mhz: u64,
    /// Package temperature in °C. Read from the thermal zone when one is
    /// exposed; otherwise estimated from load and flagged below.
    pub temperature_c: f32,
    pub temperature_estimated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GpuReport {
    pub name: String,
    pub memory: String,
    /// °C. Synthetic unless an `nvidia-smi` sensor was readable.
    pub temperature_c: f32,
    /// Utilisation in `[0, 100]`. Synthetic unless `nvidia-smi` reported it.
    pub usage_percent: f32,
    /// True when temperature/usage are fabricated rather than measured.
    pub simulated: bool,
    pub probed: bool,
}

impl GpuReport {
    /// Fallback used when every GPU probe fails.
    pub fn fallback() -> Self {
        Self {
            name: "Unknown adapter".to_string(),
            memory: "unknown".to_string(),
            temperature_c: 0.0,
            usage_percent: 0.0,
            simulated: true,
            probed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub usage_percent: f32,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageReport {
    pub volume: String,
    pub usage_percent: f32,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub probed: bool,
}

impl StorageReport {
    /// Fallback used when the `df` probe fails or times out.
    pub fn fallback(volume: &str) -> Self {
        Self {
            volume: volume.to_string(),
            usage_percent: 0.0,
            total_gb: 0.0,
            used_gb: 0.0,
            free_gb: 0.0,
            probed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    /// SSID for wifi, otherwise a connection label like `"eth0"`.
    pub label: String,
    pub signal_percent: u8,
    pub kind: String,
    pub connected: bool,
    /// Link rates in Mb/s. There is no real throughput sensor here; these
    /// are synthetic and flagged as such.
    pub rx_mbps: f64,
    pub tx_mbps: f64,
    pub rates_simulated: bool,
    pub probed: bool,
}

impl NetworkReport {
    pub fn disconnected() -> Self {
        Self {
            label: "Disconnected".to_string(),
            signal_percent: 0,
            kind: "none".to_string(),
            connected: false,
            rx_mbps: 0.0,
            tx_mbps: 0.0,
            rates_simulated: true,
            probed: false,
        }
    }
}

/// Copies of the rolling metric buffers, oldest sample first.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub cpu: Vec<f32>,
    pub memory: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemorySlot {
    pub size: String,
    pub speed: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HardwareDetail {
    pub architecture: String,
    pub cpu_cache: String,
    pub max_clock_mhz: f64,
    pub memory_slots: Vec<MemorySlot>,
    pub board_vendor: String,
    pub board_name: String,
    pub probed: bool,
}

impl HardwareDetail {
    pub fn fallback() -> Self {
        Self {
            architecture: "unknown".to_string(),
            cpu_cache: "unknown".to_string(),
            max_clock_mhz: 0.0,
            memory_slots: Vec::new(),
            board_vendor: "unknown".to_string(),
            board_name: "unknown".to_string(),
            probed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub hostname: String,
    pub platform: String,
    pub arch: String,
    pub uptime_seconds: u64,
    pub uptime: String,
    pub os_type: String,
    pub os_release: String,
    pub load_average: f64,
}

/// Bytes to decimal gigabytes, the unit the dashboard reports sizes in.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / 1_000_000_000.0
}

/// `86461` -> `"1d 00:01:01"`.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gb_conversion_is_decimal() {
        assert_eq!(bytes_to_gb(500_000_000_000), 500.0);
        assert_eq!(bytes_to_gb(0), 0.0);
    }

    #[test]
    fn uptime_under_a_day() {
        assert_eq!(format_uptime(0), "00:00:00");
        assert_eq!(format_uptime(3_661), "01:01:01");
    }

    #[test]
    fn uptime_with_days() {
        assert_eq!(format_uptime(86_461), "1d 00:01:01");
        assert_eq!(format_uptime(2 * 86_400 + 3 * 3_600), "2d 03:00:00");
    }
}
