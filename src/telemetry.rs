//! The telemetry pipeline: differential CPU accounting, timed caches for
//! the expensive probes, rolling metric histories and the snapshot
//! assembler that ties them together once per poll.

pub mod cache;
pub mod cpu;
pub mod detail;
pub mod history;
pub mod probes;
pub mod sampler;
pub mod snapshot;

pub use cache::TimedCache;
pub use cpu::{CoreTicks, CpuEstimator};
pub use history::History;
pub use probes::{Probes, ShellProbes};
pub use sampler::{Sampler, SamplerCommand, SamplerSettings, spawn_sampler};
pub use snapshot::HardwareSnapshot;
