//! Loading of compiled contract artifacts and typing of constructor
//! arguments against their ABI.

use {
    crate::{Error, deployment::DeploymentRequest},
    alloy::{
        dyn_abi::{DynSolType, DynSolValue, Specifier},
        hex,
        json_abi::{JsonAbi, Param},
        primitives::Bytes,
    },
    anyhow::{Context, Result, ensure},
    serde::Deserialize,
    std::path::Path,
};

/// Interface description and creation bytecode of a compiled contract.
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

/// The layouts emitted by solc (`evm.bytecode.object`), Foundry
/// (`bytecode.object`) and Hardhat (`bytecode`).
#[derive(Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    evm: Option<Evm>,
    bytecode: Option<RawBytecode>,
}

#[derive(Deserialize)]
struct Evm {
    bytecode: BytecodeObject,
}

#[derive(Deserialize)]
struct BytecodeObject {
    object: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Object(BytecodeObject),
    Hex(String),
}

impl CompiledArtifact {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
            .map_err(Error::InvalidArtifact)?;
        Self::from_json(&json)
            .with_context(|| path.display().to_string())
            .map_err(Error::InvalidArtifact)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json).context("malformed artifact")?;
        let object = match (raw.evm, raw.bytecode) {
            (Some(evm), _) => evm.bytecode.object,
            (None, Some(RawBytecode::Object(bytecode))) => bytecode.object,
            (None, Some(RawBytecode::Hex(object))) => object,
            (None, None) => anyhow::bail!("artifact contains no bytecode object"),
        };
        let bytecode = hex::decode(object.trim())
            .context("bytecode object is not valid hex, it may contain unlinked libraries")?;
        Ok(Self {
            abi: raw.abi,
            bytecode: bytecode.into(),
        })
    }

    /// Types the raw constructor arguments against the constructor inputs of
    /// the ABI and pairs them with the bytecode.
    pub fn deployment_request(&self, arguments: &[String]) -> Result<DeploymentRequest, Error> {
        let inputs = self
            .abi
            .constructor
            .as_ref()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default();
        let constructor_arguments = coerce_arguments(inputs, arguments)
            .map_err(Error::InvalidConstructorArguments)?;
        Ok(DeploymentRequest {
            bytecode: self.bytecode.clone(),
            constructor: self.abi.constructor.clone(),
            constructor_arguments,
        })
    }
}

fn coerce_arguments(inputs: &[Param], arguments: &[String]) -> Result<Vec<DynSolValue>> {
    ensure!(
        inputs.len() == arguments.len(),
        "constructor expects {} arguments but {} were given",
        inputs.len(),
        arguments.len()
    );
    inputs
        .iter()
        .zip(arguments)
        .map(|(param, argument)| {
            coerce(param, argument)
                .with_context(|| format!("argument {:?} of type {}", param.name, param.ty))
        })
        .collect()
}

/// Numbers may carry a unit, e.g. `0.1 ether`, which `coerce_str` resolves
/// itself. It rounds amounts finer than 1 wei though, so those are rejected
/// up front.
fn coerce(param: &Param, argument: &str) -> Result<DynSolValue> {
    let ty: DynSolType = param.resolve()?;
    if matches!(ty, DynSolType::Uint(_) | DynSolType::Int(_)) {
        number::units::ensure_wei_precision(argument)?;
    }
    Ok(ty.coerce_str(argument)?)
}
