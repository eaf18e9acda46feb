//! The remote node the deployment is simulated on and submitted to.

use {
    crate::{credential::Credential, deployment::DeploymentReceipt},
    alloy::{
        network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
        primitives::{Address, Bytes, TxHash},
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::{client::ClientBuilder, types::TransactionRequest},
    },
    anyhow::{Context, Result},
    url::Url,
};

/// Abstracts the node so the workflow can be exercised without one.
///
/// The deploying account is passed explicitly on every call instead of being
/// configured as a default on the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Simulates the contract creation and returns the gas it would use.
    async fn estimate_gas(&self, from: Address, code: &Bytes) -> Result<u64>;

    /// Signs and broadcasts the contract creation, then waits until the node
    /// reports it as confirmed.
    ///
    /// Returns the receipt even if the execution reverted.
    async fn submit_deployment(
        &self,
        from: Address,
        code: &Bytes,
        gas: u64,
        gas_price: u128,
    ) -> Result<DeploymentReceipt>;
}

/// [`Network`] backed by a JSON-RPC node.
pub struct AlloyNetwork {
    provider: DynProvider,
    confirmations: u64,
}

impl AlloyNetwork {
    /// Builds a client for `url` that signs with `credential`. No request is
    /// sent until one of the [`Network`] methods is called.
    pub fn new(url: Url, credential: &Credential, confirmations: u64) -> Self {
        let rpc = ClientBuilder::default().http(url);
        let wallet = EthereumWallet::from(credential.signer().clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_client(rpc)
            .erased();
        Self::with_provider(provider, confirmations)
    }

    fn with_provider(provider: DynProvider, confirmations: u64) -> Self {
        Self {
            provider,
            confirmations,
        }
    }

    async fn receipt(&self, tx: TxHash) -> Result<DeploymentReceipt> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx)
            .await
            .context("failed to get deployment receipt")?
            .with_context(|| format!("node has no receipt for confirmed transaction {tx}"))?;
        Ok(DeploymentReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            status: receipt.status(),
            contract_address: receipt.contract_address,
        })
    }
}

fn creation(from: Address, code: &Bytes) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(from)
        .with_deploy_code(code.clone())
}

/// Legacy contract creation with a fixed gas limit and price.
fn deployment(from: Address, code: &Bytes, gas: u64, gas_price: u128) -> TransactionRequest {
    creation(from, code)
        .with_gas_limit(gas)
        .with_gas_price(gas_price)
}

#[async_trait::async_trait]
impl Network for AlloyNetwork {
    async fn estimate_gas(&self, from: Address, code: &Bytes) -> Result<u64> {
        self.provider
            .estimate_gas(creation(from, code))
            .await
            .context("node rejected the simulated deployment")
    }

    async fn submit_deployment(
        &self,
        from: Address,
        code: &Bytes,
        gas: u64,
        gas_price: u128,
    ) -> Result<DeploymentReceipt> {
        let pending = self
            .provider
            .send_transaction(deployment(from, code, gas, gas_price))
            .await
            .context("failed to send deployment transaction")?;
        tracing::info!(tx = ?pending.tx_hash(), "deployment transaction sent");

        let tx = pending
            .with_required_confirmations(self.confirmations)
            .watch()
            .await
            .context("failed to confirm deployment transaction")?;
        self.receipt(tx).await
    }
}
