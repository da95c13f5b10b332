//! Multilayer perceptron.
mod base;
mod config;
use anyhow::Result;
pub use base::Mlp;
use candle_core::{Module, Tensor};
use candle_nn::Linear;
pub use config::MlpConfig;

/// Applies the layers with ReLU activation between them.
///
/// The output of the last layer is activated only if `activation_out` is `true`.
fn mlp_forward(xs: Tensor, layers: &[Linear], activation_out: bool) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for (i, layer) in layers.iter().enumerate() {
        xs = layer.forward(&xs)?;
        if i + 1 < n_layers || activation_out {
            xs = xs.relu()?;
        }
    }

    Ok(xs)
}
