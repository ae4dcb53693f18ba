use log::*;

/// Cumulative tick counters for one core, as reported by the kernel.
///
/// Both counters only ever grow on a live system; a decrease means the
/// counter source was reset underneath us.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreTicks {
    pub idle: u64,
    pub total: u64,
}

/// Tick counters summed across every core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TickSample {
    idle: u64,
    total: u64,
}

impl TickSample {
    fn sum(cores: &[CoreTicks]) -> Self {
        cores.iter().fold(Self::default(), |acc, c| Self {
            idle: acc.idle + c.idle,
            total: acc.total + c.total,
        })
    }
}

/// Differential CPU usage estimator.
///
/// Each call to [`CpuEstimator::update`] is a delta against the immediately
/// preceding call, not against process start. Calls less than ~1s apart give
/// noisy results; the poll driver runs on a 2s interval so that is fine.
///
/// Owned by the sampler task only. Not safe for concurrent callers.
#[derive(Debug, Default)]
pub struct CpuEstimator {
    previous: Option<TickSample>,
}

impl CpuEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fresh set of per-core counters into the estimator and return
    /// overall usage as a percentage in `[0, 100]`.
    ///
    /// The first call seeds the baseline and returns `0.0` (usage is
    /// undefined without a previous sample). A zero total delta or a counter
    /// rollback also returns `0.0` rather than dividing by zero.
    pub fn update(&mut self, cores: &[CoreTicks]) -> f32 {
        let current = TickSample::sum(cores);
        let usage = match self.previous {
            None => 0.0,
            Some(prev) if current.total < prev.total || current.idle < prev.idle => {
                // Counter reset: drop the stale baseline and start over.
                debug!(target: "Cpu", "Tick counters went backwards; reseeding");
                0.0
            }
            Some(prev) => {
                let total_delta = current.total - prev.total;
                if total_delta == 0 {
                    0.0
                } else {
                    let idle_delta = current.idle - prev.idle;
                    let pct = 100.0 - 100.0 * idle_delta as f64 / total_delta as f64;
                    pct.clamp(0.0, 100.0) as f32
                }
            }
        };
        self.previous = Some(current);
        usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(idle: u64, total: u64) -> CoreTicks {
        CoreTicks { idle, total }
    }

    #[test]
    fn first_call_returns_zero() {
        let mut est = CpuEstimator::new();
        assert_eq!(est.update(&[core(500, 5000)]), 0.0);
    }

    #[test]
    fn second_call_measures_the_delta() {
        let mut est = CpuEstimator::new();
        est.update(&[core(1000, 10000)]);
        // idle +50, total +500 => 100 - 100*50/500 = 90
        assert_eq!(est.update(&[core(1050, 10500)]), 90.0);
    }

    #[test]
    fn sums_across_cores() {
        let mut est = CpuEstimator::new();
        est.update(&[core(500, 5000), core(500, 5000)]);
        // aggregate idle +50, total +500, same 90% as the single-core case
        assert_eq!(est.update(&[core(530, 5300), core(520, 5200)]), 90.0);
    }

    #[test]
    fn zero_total_delta_is_zero_not_nan() {
        let mut est = CpuEstimator::new();
        est.update(&[core(1000, 10000)]);
        let usage = est.update(&[core(1000, 10000)]);
        assert_eq!(usage, 0.0);
        assert!(usage.is_finite());
    }

    #[test]
    fn counter_rollback_reseeds() {
        let mut est = CpuEstimator::new();
        est.update(&[core(1000, 10000)]);
        assert_eq!(est.update(&[core(10, 100)]), 0.0);
        // The rollback sample became the new baseline.
        assert_eq!(est.update(&[core(10, 200)]), 100.0);
    }

    #[test]
    fn empty_core_list_is_harmless() {
        let mut est = CpuEstimator::new();
        assert_eq!(est.update(&[]), 0.0);
        assert_eq!(est.update(&[]), 0.0);
    }

    #[test]
    fn always_within_bounds() {
        let mut est = CpuEstimator::new();
        let sequences = [
            core(0, 0),
            core(100, 100),
            core(100, 200),
            core(100, 1000),
            core(1100, 2000),
            core(1100, 2000),
            core(0, 0),
            core(5, 10),
        ];
        for s in sequences {
            let usage = est.update(&[s]);
            assert!((0.0..=100.0).contains(&usage), "out of range: {usage}");
        }
    }
}
