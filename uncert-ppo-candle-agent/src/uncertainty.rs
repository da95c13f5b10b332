//! Decomposition of the uncertainty of ensemble predictions.
use crate::actor_critic::PolicyOutput;
use anyhow::Result;
use candle_core::Tensor;
use uncert_ppo_core::UncertaintyPair;

/// Unbiased standard deviation of all the elements.
///
/// Returns `0` for less than two elements.
fn std_unbiased(xs: &[f32]) -> f32 {
    let n = xs.len();
    if n < 2 {
        return 0.0;
    }
    // f64 keeps the mean of identical values exact
    let mean = xs.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let ss = xs.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>();
    (ss / (n - 1) as f64).sqrt() as f32
}

/// Splits the uncertainty of the outputs of ensemble members.
///
/// The epistemic part is the standard deviation of the value predictions of
/// all members, taken over every element of the stacked predictions. The
/// members do not model the noise of returns, so the aleatoric part is `0`.
/// A single member yields zero uncertainty.
pub fn decompose(outputs: &[PolicyOutput]) -> Result<UncertaintyPair> {
    if outputs.len() < 2 {
        return Ok(UncertaintyPair::default());
    }
    let values = outputs.iter().map(|o| &o.value).collect::<Vec<_>>();
    let values = Tensor::stack(&values, 0)?
        .flatten_all()?
        .to_vec1::<f32>()?;

    Ok(UncertaintyPair::new(std_unbiased(&values), 0.0))
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;

    fn output(value: f32) -> Result<PolicyOutput> {
        let dev = Device::Cpu;
        Ok(PolicyOutput {
            alpha: Tensor::full(2f32, (1, 1), &dev)?,
            beta: Tensor::full(2f32, (1, 1), &dev)?,
            value: Tensor::full(value, (1, 1), &dev)?,
        })
    }

    #[test]
    fn test_identical_predictions() -> Result<()> {
        let outputs = vec![output(1.5)?, output(1.5)?, output(1.5)?];
        assert_eq!(decompose(&outputs)?, UncertaintyPair::new(0.0, 0.0));
        Ok(())
    }

    #[test]
    fn test_unbiased_std() -> Result<()> {
        // mean 2, squared deviations 1 + 0 + 1, divided by 2
        let outputs = vec![output(1.0)?, output(2.0)?, output(3.0)?];
        let u = decompose(&outputs)?;
        assert!((u.epistemic - 1.0).abs() < 1e-6);
        assert_eq!(u.aleatoric, 0.0);
        Ok(())
    }

    #[test]
    fn test_single_member() -> Result<()> {
        assert_eq!(decompose(&[output(3.0)?])?, UncertaintyPair::default());
        Ok(())
    }
}
