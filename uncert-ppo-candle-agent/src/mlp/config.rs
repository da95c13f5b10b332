use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Mlp`](super::Mlp).
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
    pub(super) activation_out: bool,
}

impl MlpConfig {
    /// Creates configuration of MLP.
    ///
    /// * `units` - Widths of the hidden layers, may be empty
    /// * `activation_out` - If `true`, activation function is added in the final layer.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize, activation_out: bool) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            activation_out,
        }
    }

    /// Output dimension.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Pairs of input and output dimensions of the linear layers.
    pub(super) fn in_out_pairs(&self) -> Vec<(usize, usize)> {
        let dims = std::iter::once(self.in_dim)
            .chain(self.units.iter().copied())
            .chain(std::iter::once(self.out_dim))
            .collect::<Vec<_>>();
        dims.windows(2).map(|w| (w[0], w[1])).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_in_out_pairs() {
        let config = MlpConfig::new(6, vec![64, 32], 2, false);
        assert_eq!(config.in_out_pairs(), vec![(6, 64), (64, 32), (32, 2)]);

        let config = MlpConfig::new(6, vec![], 1024, true);
        assert_eq!(config.in_out_pairs(), vec![(6, 1024)]);
    }
}
