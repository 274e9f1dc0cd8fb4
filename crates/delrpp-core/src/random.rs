//! Random source used by probabilistic conditions

/// Source of randomness threaded through condition evaluation.
///
/// Implemented for [`fastrand::Rng`]; seed it with `fastrand::Rng::with_seed`
/// for reproducible renders.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform index in `[0, len)`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;
}

impl RandomSource for fastrand::Rng {
    fn unit(&mut self) -> f64 {
        self.f64()
    }

    fn index(&mut self, len: usize) -> usize {
        self.usize(0..len)
    }
}

/// Replays fixed values, cycling when exhausted. Test helper.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct Scripted {
    units: Vec<f64>,
    indices: Vec<usize>,
    unit_pos: usize,
    index_pos: usize,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn units(units: &[f64]) -> Self {
        Self {
            units: units.to_vec(),
            indices: vec![0],
            unit_pos: 0,
            index_pos: 0,
        }
    }

    pub(crate) fn indices(indices: &[usize]) -> Self {
        Self {
            units: vec![0.0],
            indices: indices.to_vec(),
            unit_pos: 0,
            index_pos: 0,
        }
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn unit(&mut self) -> f64 {
        let v = self.units[self.unit_pos % self.units.len()];
        self.unit_pos += 1;
        v
    }

    fn index(&mut self, len: usize) -> usize {
        let v = self.indices[self.index_pos % self.indices.len()];
        self.index_pos += 1;
        v % len
    }
}
