/// Exponential moving average, updated one observation at a time.
///
/// Same recursion as pandas `ewm(span=span, adjust=False).mean()`:
///
///   bar 0  -> value = x (first observation)
///   bar 1+ -> value = α·x + (1−α)·prev   where α = 2/(span+1)
///
/// `is_warm()` turns true once `span` observations have been fed.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: f64,
    span: usize,
    count: usize,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            value: 0.0,
            span,
            count: 0,
        }
    }

    /// Feed one observation, return the current average.
    pub fn update(&mut self, x: f64) -> f64 {
        if self.count == 0 {
            self.value = x;
        } else {
            self.value = self.alpha * x + (1.0 - self.alpha) * self.value;
        }
        self.count += 1;
        self.value
    }

    /// Current value, `None` before the first update.
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.value)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_warm(&self) -> bool {
        self.count >= self.span
    }
}

/// EMA of a whole series in a single pass.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut ema = Ema::new(span);
    values.iter().map(|&x| ema.update(x)).collect()
}
