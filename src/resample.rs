/// Resample a series of samples taken at irregular times into a fixed number of bins.
/// Use a dumb 'max' strategy that simply takes the maximum value in each bin.
///
/// Times are wall-clock seconds. A bin covers `(bin_start, bin_end]`.
pub fn resample(
    values: &[f64],
    times: &[f64],
    start: f64,
    end: f64,
    num_bins: usize,
) -> Vec<Option<f64>> {
    if values.is_empty() || times.is_empty() || num_bins == 0 || end <= start {
        return Vec::new();
    }

    let mut result = vec![None; num_bins];
    let bin_width = (end - start) / num_bins as f64;

    for (&time, &value) in times.iter().zip(values) {
        if time <= start || time > end {
            continue;
        }
        let index = (((time - start) / bin_width).ceil() as usize)
            .saturating_sub(1)
            .min(num_bins - 1);
        result[index] = Some(match result[index] {
            Some(current) => f64::max(current, value),
            None => value,
        });
    }
    result
}
