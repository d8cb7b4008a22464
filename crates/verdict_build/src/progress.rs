//! Progress reporting.

/// Receives progress of a build pass as a fraction in `[0.0, 1.0]`.
pub trait ProgressSink {
    /// Called with a value no smaller than the previous one.
    fn report(&mut self, fraction: f64);
}

/// Clamps and orders the values forwarded to a [`ProgressSink`].
pub struct ProgressMonitor<'a> {
    sink: Option<&'a mut dyn ProgressSink>,
    last: f64,
}

impl<'a> ProgressMonitor<'a> {
    /// Wraps an optional sink.
    pub fn new(sink: Option<&'a mut dyn ProgressSink>) -> Self {
        Self { sink, last: 0.0 }
    }

    /// A monitor that reports nowhere.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Forwards `fraction`, clamped to `[0.0, 1.0]` and to at least the last
    /// reported value. NaN is ignored.
    pub fn update(&mut self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let value = fraction.clamp(0.0, 1.0).max(self.last);
        self.last = value;
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.report(value);
        }
    }

    /// Reports completion.
    pub fn finish(&mut self) {
        self.update(1.0);
    }

    /// The last reported value.
    pub fn last(&self) -> f64 {
        self.last
    }
}
