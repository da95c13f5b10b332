//! Utilities.
//!
//! Besides the value losses, this module provides the special functions
//! needed for the log density and the entropy of the Beta distribution.
//! They are composed of differentiable tensor operations, so gradients flow
//! through the distribution parameters.
use anyhow::Result;
use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

/// Lower and upper margins of the support of the Beta distribution.
const BETA_EPS: f64 = 1e-6;

/// Number of recurrence steps before the asymptotic series.
const SHIFT: usize = 6;

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl Default for CriticLoss {
    fn default() -> Self {
        Self::Mse
    }
}

impl CriticLoss {
    /// Computes the loss averaged over elements.
    pub fn loss(&self, x: &Tensor, y: &Tensor) -> Result<Tensor> {
        match self {
            Self::Mse => Ok(candle_nn::loss::mse(x, y)?),
            Self::SmoothL1 => smooth_l1_loss(x, y),
        }
    }
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = (1.0 - &m1)?;
    let quad = ((0.5 * m1)? * d.sqr()?)?;
    let lin = (m2 * d.affine(1.0, -0.5)?)?;
    Ok((quad + lin)?.mean_all()?)
}

/// `ln(1 + exp(x))`, computed without overflow for large `x`.
pub fn softplus(x: &Tensor) -> Result<Tensor> {
    let tail = x.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    Ok((x.relu()? + tail)?)
}

/// Sum of `f(x + k)` for `k` in `0..SHIFT`.
fn shifted_sum(x: &Tensor, f: impl Fn(&Tensor) -> candle_core::Result<Tensor>) -> Result<Tensor> {
    let mut acc = x.zeros_like()?;
    for k in 0..SHIFT {
        acc = (acc + f(&x.affine(1.0, k as f64)?)?)?;
    }
    Ok(acc)
}

/// Logarithm of the gamma function for positive arguments.
pub fn lgamma(x: &Tensor) -> Result<Tensor> {
    // ln Γ(x) = ln Γ(x + 6) - Σ ln(x + k)
    let shift = shifted_sum(x, |t| t.log())?;
    let z = x.affine(1.0, SHIFT as f64)?;
    let zr = z.recip()?;
    let zr2 = zr.sqr()?;

    // Stirling series up to z^-5
    let series = {
        let t = zr2.affine(-1.0 / 1260.0, 1.0 / 360.0)?;
        let t = (&zr2 * t)?.affine(-1.0, 1.0 / 12.0)?;
        (&zr * t)?
    };
    let half_ln_2pi = 0.5 * (2.0 * std::f64::consts::PI).ln();
    let stirling = ((z.affine(1.0, -0.5)? * z.log()?)? - &z)?.affine(1.0, half_ln_2pi)?;

    Ok(((stirling + series)? - shift)?)
}

/// Digamma function for positive arguments.
pub fn digamma(x: &Tensor) -> Result<Tensor> {
    // ψ(x) = ψ(x + 6) - Σ 1 / (x + k)
    let shift = shifted_sum(x, |t| t.recip())?;
    let z = x.affine(1.0, SHIFT as f64)?;
    let zr = z.recip()?;
    let zr2 = zr.sqr()?;

    let tail = {
        let t = zr2.affine(-1.0 / 252.0, 1.0 / 120.0)?;
        let t = (&zr2 * t)?.affine(-1.0, 1.0 / 12.0)?;
        (&zr2 * t)?
    };
    let psi = ((z.log()? - (0.5 * zr)?)? - tail)?;

    Ok((psi - shift)?)
}

/// `ln B(a, b) = ln Γ(a) + ln Γ(b) - ln Γ(a + b)`.
pub fn lbeta(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let ab = (a + b)?;
    Ok(((lgamma(a)? + lgamma(b)?)? - lgamma(&ab)?)?)
}

/// Element-wise log density of `x` under `Beta(a, b)`.
///
/// `x` is clamped into the open interval `(0, 1)`.
pub fn beta_log_prob(x: &Tensor, a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let x = x.clamp(BETA_EPS, 1.0 - BETA_EPS)?;
    let t1 = (a.affine(1.0, -1.0)? * x.log()?)?;
    let t2 = (b.affine(1.0, -1.0)? * (1.0 - &x)?.log()?)?;
    Ok(((t1 + t2)? - lbeta(a, b)?)?)
}

/// Element-wise entropy of `Beta(a, b)`.
pub fn beta_entropy(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let ab = (a + b)?;
    let t_a = (a.affine(1.0, -1.0)? * digamma(a)?)?;
    let t_b = (b.affine(1.0, -1.0)? * digamma(b)?)?;
    let t_ab = (ab.affine(1.0, -2.0)? * digamma(&ab)?)?;
    Ok((((lbeta(a, b)? - t_a)? - t_b)? + t_ab)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;

    fn eval(f: impl Fn(&Tensor) -> Result<Tensor>, xs: &[f32]) -> Result<Vec<f32>> {
        let t = Tensor::from_slice(xs, (xs.len(),), &Device::Cpu)?;
        Ok(f(&t)?.to_vec1::<f32>()?)
    }

    fn assert_close(actual: &[f32], expected: &[f32], tol: f32) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < tol, "{} != {}", a, e);
        }
    }

    #[test]
    fn test_lgamma() -> Result<()> {
        let ys = eval(lgamma, &[1.0, 2.0, 0.5, 10.0, 1.5])?;
        assert_close(&ys, &[0.0, 0.0, 0.572_364_9, 12.801_827, -0.120_782_2], 1e-4);
        Ok(())
    }

    #[test]
    fn test_digamma() -> Result<()> {
        let ys = eval(digamma, &[1.0, 2.0, 0.5, 10.0])?;
        assert_close(&ys, &[-0.577_215_7, 0.422_784_3, -1.963_510_0, 2.251_752_6], 1e-4);
        Ok(())
    }

    #[test]
    fn test_softplus() -> Result<()> {
        let ys = eval(softplus, &[0.0, 100.0, -100.0])?;
        assert_close(&ys, &[std::f32::consts::LN_2, 100.0, 0.0], 1e-5);
        Ok(())
    }

    #[test]
    fn test_beta_log_prob() -> Result<()> {
        let dev = Device::Cpu;
        let x = Tensor::from_slice(&[0.5f32, 0.25, 0.9], (3,), &dev)?;
        let a = Tensor::from_slice(&[2f32, 1.0, 3.0], (3,), &dev)?;
        let b = Tensor::from_slice(&[2f32, 1.0, 1.5], (3,), &dev)?;
        let lp = beta_log_prob(&x, &a, &b)?.to_vec1::<f32>()?;

        // Beta(2, 2): 6 x (1 - x); Beta(1, 1): uniform
        // Beta(3, 1.5): x^2 (1 - x)^0.5 / B(3, 1.5), B(3, 1.5) = 16 / 105
        let p3 = 0.9f32.powi(2) * 0.1f32.sqrt() * 105.0 / 16.0;
        assert_close(&lp, &[1.5f32.ln(), 0.0, p3.ln()], 1e-4);
        Ok(())
    }

    #[test]
    fn test_beta_entropy() -> Result<()> {
        let dev = Device::Cpu;
        let a = Tensor::from_slice(&[1f32, 2.0], (2,), &dev)?;
        let b = Tensor::from_slice(&[1f32, 2.0], (2,), &dev)?;
        let h = beta_entropy(&a, &b)?.to_vec1::<f32>()?;
        assert_close(&h, &[0.0, -0.125_092_8], 1e-4);
        Ok(())
    }

    #[test]
    fn test_critic_losses() -> Result<()> {
        let dev = Device::Cpu;
        let x = Tensor::from_slice(&[0.0f32, 0.0], (2,), &dev)?;
        let y = Tensor::from_slice(&[0.5f32, 3.0], (2,), &dev)?;

        // (0.125 + 2.5) / 2
        let l = CriticLoss::SmoothL1.loss(&x, &y)?.to_scalar::<f32>()?;
        assert!((l - 1.3125).abs() < 1e-6);

        // (0.25 + 9) / 2
        let l = CriticLoss::Mse.loss(&x, &y)?.to_scalar::<f32>()?;
        assert!((l - 4.625).abs() < 1e-6);
        Ok(())
    }
}
