//! One-shot deployment of a compiled contract to a remote network.

pub mod arguments;
pub mod artifact;
pub mod credential;
pub mod deployment;
pub mod error;
pub mod network;
pub mod shutdown;

pub use error::Error;
use {
    arguments::{Arguments, Config},
    artifact::CompiledArtifact,
    credential::Credential,
    deployment::{DeploymentResult, Deployer},
    network::{AlloyNetwork, Network},
    std::future::Future,
};

/// Deploys the configured artifact to the configured node.
pub async fn run(
    args: Arguments,
    cancelled: impl Future<Output = ()>,
) -> Result<DeploymentResult, Error> {
    let config = Config::try_from(args)?;
    deploy_with(
        &config,
        |config, credential| {
            AlloyNetwork::new(config.endpoint.clone(), credential, config.confirmations)
        },
        cancelled,
    )
    .await
}

/// Like [`run`] but with the network client built by `connect`, which is
/// only called once the credential and artifact are known to be valid.
pub async fn deploy_with<N: Network>(
    config: &Config,
    connect: impl FnOnce(&Config, &Credential) -> N,
    cancelled: impl Future<Output = ()>,
) -> Result<DeploymentResult, Error> {
    let credential: Credential = config.signing_key.parse()?;
    let account = credential.address();
    tracing::debug!(%account, "derived deploying account");

    let artifact = CompiledArtifact::load(&config.artifact)?;
    let request = artifact.deployment_request(&config.constructor_args)?;
    tracing::debug!(
        bytecode_len = request.bytecode.len(),
        arguments = ?request.constructor_arguments,
        "loaded artifact"
    );

    let network = connect(config, &credential);
    Deployer::new(network, config.gas_price, config.confirmation_timeout)
        .deploy(account, &request, cancelled)
        .await
}
