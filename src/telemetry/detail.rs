//! Detailed hardware identity: CPU architecture/cache/clock, memory slots,
//! motherboard vendor and product.
//!
//! `lscpu` and DMI sysfs are readable by anyone; `dmidecode` usually wants
//! root, so the per-slot memory listing degrades to a single pseudo-slot
//! summarised from `/proc/meminfo`.

use std::time::Duration;

use color_eyre::eyre::Result;
use log::*;

use crate::telemetry::probes::run;
use crate::telemetry::snapshot::{HardwareDetail, MemorySlot};

const DMI_PATH: &str = "/sys/class/dmi/id";

pub(crate) async fn collect(limit: Duration) -> Result<HardwareDetail> {
    let lscpu = run(limit, "lscpu", &[]).await?;
    let (architecture, cpu_cache, max_clock_mhz) = parse_lscpu(&lscpu);

    let memory_slots = match run(limit, "dmidecode", &["-t", "memory"]).await {
        Ok(text) => {
            let slots = parse_dmidecode_memory(&text);
            if slots.is_empty() { meminfo_slot() } else { slots }
        }
        Err(e) => {
            debug!(target: "Probes", "dmidecode unavailable ({e}); summarising /proc/meminfo");
            meminfo_slot()
        }
    };

    Ok(HardwareDetail {
        architecture,
        cpu_cache,
        max_clock_mhz,
        memory_slots,
        board_vendor: dmi_field("board_vendor"),
        board_name: dmi_field("board_name"),
        probed: true,
    })
}

fn dmi_field(name: &str) -> String {
    std::fs::read_to_string(format!("{DMI_PATH}/{name}"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Pull architecture, last-level cache and max clock out of `lscpu` output.
/// Missing keys degrade to `"unknown"` / `0.0` individually.
pub fn parse_lscpu(text: &str) -> (String, String, f64) {
    let value_of = |key: &str| {
        text.lines()
            .find(|l| l.trim_start().starts_with(key))
            .and_then(|l| l.splitn(2, ':').nth(1))
            .map(|v| v.trim().to_string())
    };
    let architecture = value_of("Architecture").unwrap_or_else(|| "unknown".to_string());
    let cpu_cache = value_of("L3 cache")
        .or_else(|| value_of("L2 cache"))
        .unwrap_or_else(|| "unknown".to_string());
    let max_clock_mhz = value_of("CPU max MHz")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0);
    (architecture, cpu_cache, max_clock_mhz)
}

/// Parse the `Memory Device` blocks of `dmidecode -t memory`, skipping
/// empty slots.
pub fn parse_dmidecode_memory(text: &str) -> Vec<MemorySlot> {
    let mut slots = Vec::new();
    let mut current: Option<MemorySlot> = None;

    for line in text.lines() {
        if line.starts_with("Memory Device") {
            if let Some(slot) = current.take() {
                slots.push(slot);
            }
            current = Some(MemorySlot {
                size: "unknown".to_string(),
                speed: "unknown".to_string(),
                kind: "unknown".to_string(),
            });
            continue;
        }
        let Some((key, value)) = line.trim().split_once(": ") else {
            continue;
        };
        if key == "Size" && value == "No Module Installed" {
            current = None;
            continue;
        }
        let Some(slot) = current.as_mut() else {
            continue;
        };
        match key {
            "Size" => slot.size = value.to_string(),
            "Speed" => slot.speed = value.to_string(),
            "Type" => slot.kind = value.to_string(),
            _ => {}
        }
    }
    if let Some(slot) = current {
        slots.push(slot);
    }
    slots
}

/// Single pseudo-slot built from `MemTotal` when real slot data needs root.
fn meminfo_slot() -> Vec<MemorySlot> {
    let Some(kb) = std::fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|text| parse_meminfo_total_kb(&text))
    else {
        return Vec::new();
    };
    vec![MemorySlot {
        size: format!("{:.1} GiB (total)", kb as f64 / 1024.0 / 1024.0),
        speed: "unknown".to_string(),
        kind: "unknown".to_string(),
    }]
}

pub fn parse_meminfo_total_kb(text: &str) -> Option<u64> {
    text.lines()
        .find(|l| l.starts_with("MemTotal:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lscpu_happy_path() {
        let text = "\
Architecture:                         x86_64
CPU op-mode(s):                       32-bit, 64-bit
CPU max MHz:                          4600.0000
CPU min MHz:                          800.0000
L1d cache:                            192 KiB (6 instances)
L2 cache:                             1.5 MiB (6 instances)
L3 cache:                             12 MiB (1 instance)
";
        let (arch, cache, clock) = parse_lscpu(text);
        assert_eq!(arch, "x86_64");
        assert_eq!(cache, "12 MiB (1 instance)");
        assert_eq!(clock, 4600.0);
    }

    #[test]
    fn lscpu_without_l3_uses_l2() {
        let text = "Architecture: aarch64\nL2 cache: 2 MiB\n";
        let (arch, cache, clock) = parse_lscpu(text);
        assert_eq!(arch, "aarch64");
        assert_eq!(cache, "2 MiB");
        assert_eq!(clock, 0.0);
    }

    #[test]
    fn dmidecode_skips_empty_slots() {
        let text = "\
# dmidecode 3.5
Handle 0x0040, DMI type 17, 92 bytes
Memory Device
\tSize: 16 GB
\tType: DDR4
\tSpeed: 3200 MT/s

Handle 0x0041, DMI type 17, 92 bytes
Memory Device
\tSize: No Module Installed

Handle 0x0042, DMI type 17, 92 bytes
Memory Device
\tSize: 16 GB
\tType: DDR4
\tSpeed: 3200 MT/s
";
        let slots = parse_dmidecode_memory(text);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].size, "16 GB");
        assert_eq!(slots[0].speed, "3200 MT/s");
        assert_eq!(slots[0].kind, "DDR4");
    }

    #[test]
    fn meminfo_total() {
        let text = "MemTotal:       32612344 kB\nMemFree:        20112332 kB\n";
        assert_eq!(parse_meminfo_total_kb(text), Some(32612344));
        assert_eq!(parse_meminfo_total_kb("nothing here"), None);
    }
}
