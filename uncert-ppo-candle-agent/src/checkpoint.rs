//! Checkpoint of an ensemble in a single safetensors file.
//!
//! The file holds the following tensors:
//!
//! * `epoch` - the epoch given when saving,
//! * `nb_nets` - the number of members,
//! * `member<i>.model.<name>` - parameters of the `i`-th member,
//! * `member<i>.opt.<key>` - optimizer state of the `i`-th member.
use crate::{actor_critic::PolicyOutput, ensemble::Ensemble, model::SubModel1};
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use log::info;
use std::{collections::HashMap, fs, path::Path};
use uncert_ppo_core::error::UppoError;

fn member_prefix(i: usize) -> String {
    format!("member{}.", i)
}

fn scalar_i64(tensors: &HashMap<String, Tensor>, key: &str) -> Result<i64> {
    let t = tensors
        .get(key)
        .ok_or_else(|| anyhow!("{} is missing in the checkpoint", key))?;
    t.to_vec1::<i64>()?
        .first()
        .copied()
        .ok_or_else(|| anyhow!("{} is empty in the checkpoint", key))
}

/// Saves the parameters and the optimizer states of all the members.
pub fn save<P>(ensemble: &Ensemble<P>, epoch: usize, path: &Path) -> Result<()>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tensors = HashMap::new();
    tensors.insert("epoch".to_string(), Tensor::new(&[epoch as i64], &Device::Cpu)?);
    tensors.insert(
        "nb_nets".to_string(),
        Tensor::new(&[ensemble.len() as i64], &Device::Cpu)?,
    );
    for (i, member) in ensemble.members().iter().enumerate() {
        member.state_dict(&member_prefix(i), &mut tensors)?;
    }
    let tensors = tensors
        .into_iter()
        .map(|(k, v)| -> Result<(String, Tensor)> { Ok((k, v.to_device(&Device::Cpu)?)) })
        .collect::<Result<HashMap<_, _>>>()?;

    candle_core::safetensors::save(&tensors, path)?;
    info!("Saved {} ensemble members to {:?}", ensemble.len(), path);
    Ok(())
}

/// Loads a checkpoint written by [`save`] and returns the stored epoch.
///
/// Fails with [`UppoError::CheckpointMismatch`] if the number of members in
/// the file differs from the size of `ensemble`.
pub fn load<P>(ensemble: &mut Ensemble<P>, path: &Path) -> Result<usize>
where
    P: SubModel1<Input = Tensor, Output = PolicyOutput>,
{
    let tensors = candle_core::safetensors::load(path, &Device::Cpu)?;
    let found = scalar_i64(&tensors, "nb_nets")? as usize;
    if found != ensemble.len() {
        return Err(UppoError::CheckpointMismatch {
            expected: ensemble.len(),
            found,
        }
        .into());
    }

    for (i, member) in ensemble.members_mut().iter_mut().enumerate() {
        member.load_state_dict(&member_prefix(i), &tensors)?;
    }
    let epoch = scalar_i64(&tensors, "epoch")? as usize;
    info!("Loaded {} ensemble members from {:?}", found, path);

    Ok(epoch)
}
