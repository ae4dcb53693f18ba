/// Fit an evenly spaced sample series into a fixed number of display bins.
/// Uses a dumb 'max' strategy that simply takes the maximum value in each bin.
///
/// History buffers hold one sample per poll, oldest first, so binning is by
/// index. When there are fewer samples than bins the series is right-aligned
/// and the leading bins are `None`, which keeps the newest sample pinned to
/// the right edge of a sparkline as history fills up.
pub fn resample(samples: &[f32], num_bins: usize) -> Vec<Option<f32>> {
    if samples.is_empty() || num_bins == 0 {
        return Vec::new();
    }

    if samples.len() < num_bins {
        let mut result = vec![None; num_bins - samples.len()];
        result.extend(samples.iter().map(|&v| Some(v)));
        return result;
    }

    (0..num_bins)
        .map(|bin| {
            let start = bin * samples.len() / num_bins;
            let end = ((bin + 1) * samples.len() / num_bins).max(start + 1);
            samples[start..end.min(samples.len())]
                .iter()
                .copied()
                .reduce(f32::max)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! resample_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (samples, num_bins, expected) = $value;
                    let result = resample(&samples, num_bins);
                    assert_eq!(result, expected, "{}", stringify!($name));
                }
            )*
        }
    }

    resample_tests! {
        empty_series: (
            vec![],
            4,
            Vec::<Option<f32>>::new(),
        ),
        zero_bins: (
            vec![1.0, 2.0],
            0,
            Vec::<Option<f32>>::new(),
        ),
        exact_fit: (
            vec![1.0, 2.0, 3.0, 4.0],
            4,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
        ),
        downsample_takes_the_max: (
            vec![1.0, 9.0, 2.0, 3.0, 8.0, 4.0],
            3,
            vec![Some(9.0), Some(3.0), Some(8.0)],
        ),
        short_series_right_aligns: (
            vec![5.0, 6.0],
            5,
            vec![None, None, None, Some(5.0), Some(6.0)],
        ),
        single_sample_lands_on_the_right_edge: (
            vec![42.0],
            4,
            vec![None, None, None, Some(42.0)],
        ),
        uneven_downsample_covers_every_sample: (
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            2,
            vec![Some(2.0), Some(5.0)],
        ),
    }

    #[test]
    fn downsample_never_yields_absent_bins() {
        let samples: Vec<f32> = (0..60).map(|i| i as f32).collect();
        for bins in 1..=60 {
            let result = resample(&samples, bins);
            assert_eq!(result.len(), bins);
            assert!(result.iter().all(Option::is_some), "absent bin at width {bins}");
        }
    }
}
