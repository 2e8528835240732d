// Welford's online algorithm, vectorised over all features of one class.

#[derive(Debug, Clone, PartialEq)]
pub struct RunningMoments {
    count: usize,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl RunningMoments {
    pub fn new(n_features: usize) -> Self {
        RunningMoments {
            count: 0,
            mean: vec![0.0; n_features],
            m2: vec![0.0; n_features],
        }
    }

    /// Caller guarantees `x.len()` equals the feature count.
    pub fn push(&mut self, x: &[f64]) {
        debug_assert_eq!(x.len(), self.mean.len());

        self.count += 1;
        let n = self.count as f64;
        for ((&value, mean), m2) in x.iter().zip(self.mean.iter_mut()).zip(self.m2.iter_mut()) {
            let delta = value - *mean;
            *mean += delta / n;
            *m2 += delta * (value - *mean);
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Population variance (divides by `n`). All zeros until the first push.
    pub fn variance(&self) -> Vec<f64> {
        if self.count == 0 {
            return vec![0.0; self.m2.len()];
        }
        let n = self.count as f64;
        // m2 can drift a hair below zero from rounding. NaN passes through.
        self.m2
            .iter()
            .map(|&m2| if m2 < 0.0 { 0.0 } else { m2 / n })
            .collect()
    }
}

/// Two-pass mean and population variance of a set of rows.
pub fn batch_moments<R: AsRef<[f64]>>(rows: &[R], n_features: usize) -> (Vec<f64>, Vec<f64>) {
    let mut mean = vec![0.0; n_features];
    let mut var = vec![0.0; n_features];
    if rows.is_empty() {
        return (mean, var);
    }

    let n = rows.len() as f64;
    for row in rows {
        for (m, &value) in mean.iter_mut().zip(row.as_ref()) {
            *m += value;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    for row in rows {
        for ((v, &m), &value) in var.iter_mut().zip(&mean).zip(row.as_ref()) {
            *v += (value - m) * (value - m);
        }
    }
    var.iter_mut().for_each(|v| *v /= n);

    (mean, var)
}
