//! The deployment workflow: estimate gas, submit the contract creation and
//! extract the address of the created contract from the receipt.
//!
//! The steps run strictly in order and none of them is retried. A failure in
//! any step aborts the run.

use {
    crate::{Error, network::Network},
    alloy::{
        dyn_abi::{DynSolValue, JsonAbiExt},
        json_abi::Constructor,
        primitives::{Address, Bytes, TxHash},
    },
    anyhow::{Context, anyhow, ensure},
    std::{fmt, future::Future, time::Duration},
};

/// Progress of a single deployment run.
///
/// A run moves through these in order. Failing in any of them ends the run,
/// see [`Error::stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    AccountReady,
    GasEstimated,
    Deployed,
}

/// Bytecode and typed constructor arguments of the contract to create.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub bytecode: Bytes,
    pub constructor: Option<Constructor>,
    pub constructor_arguments: Vec<DynSolValue>,
}

impl DeploymentRequest {
    /// The input of the contract creation transaction: the bytecode followed
    /// by the ABI encoded constructor arguments.
    pub fn deploy_code(&self) -> anyhow::Result<Bytes> {
        ensure!(!self.bytecode.is_empty(), "artifact contains no bytecode");
        let arguments = match &self.constructor {
            Some(constructor) => constructor
                .abi_encode_input(&self.constructor_arguments)
                .context("failed to encode constructor arguments")?,
            None => {
                ensure!(
                    self.constructor_arguments.is_empty(),
                    "contract has no constructor but {} arguments were given",
                    self.constructor_arguments.len()
                );
                Vec::new()
            }
        };
        Ok([&self.bytecode[..], arguments.as_slice()].concat().into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Whether the execution succeeded.
    pub status: bool,
    pub contract_address: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentResult {
    pub deployed_address: Address,
    pub transaction_hash: TxHash,
}

impl fmt::Display for DeploymentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contract deployed at address: {}", self.deployed_address)
    }
}

/// Returns the address of the created contract from the receipt of a
/// successful contract creation.
pub fn extract_address(receipt: &DeploymentReceipt) -> Result<Address, Error> {
    if !receipt.status {
        return Err(Error::SubmissionFailure(anyhow!(
            "deployment transaction {} reverted",
            receipt.transaction_hash
        )));
    }
    receipt.contract_address.ok_or_else(|| {
        Error::SubmissionFailure(anyhow!(
            "receipt of {} contains no contract address",
            receipt.transaction_hash
        ))
    })
}

pub struct Deployer<N> {
    network: N,
    gas_price: u128,
    confirmation_timeout: Duration,
}

impl<N: Network> Deployer<N> {
    /// `confirmation_timeout` bounds the time between submitting the
    /// transaction and receiving its receipt.
    pub fn new(network: N, gas_price: u128, confirmation_timeout: Duration) -> Self {
        Self {
            network,
            gas_price,
            confirmation_timeout,
        }
    }

    /// Deploys the contract from `from`, an account the network is able to
    /// sign for.
    ///
    /// Resolving `cancelled` aborts the run at whatever step it is in. A
    /// transaction that was already broadcast stays in the node's pool.
    pub async fn deploy(
        &self,
        from: Address,
        request: &DeploymentRequest,
        cancelled: impl Future<Output = ()>,
    ) -> Result<DeploymentResult, Error> {
        tokio::pin!(cancelled);
        tracing::info!(stage = ?Stage::AccountReady, account = %from, "deploying contract");

        let code = request.deploy_code().map_err(Error::EstimationFailure)?;
        let gas = tokio::select! {
            biased;
            _ = &mut cancelled => return Err(Error::Cancelled { stage: Stage::AccountReady }),
            gas = async { self.network.estimate_gas(from, &code).await } => {
                gas.map_err(Error::EstimationFailure)?
            }
        };
        tracing::info!(stage = ?Stage::GasEstimated, gas, gas_price = self.gas_price, "estimated gas");

        let submission = tokio::time::timeout(self.confirmation_timeout, async {
            self.network
                .submit_deployment(from, &code, gas, self.gas_price)
                .await
        });
        let receipt = tokio::select! {
            biased;
            _ = &mut cancelled => return Err(Error::Cancelled { stage: Stage::GasEstimated }),
            receipt = submission => receipt
                .map_err(|_| Error::SubmissionFailure(anyhow!(
                    "deployment not confirmed within {:?}",
                    self.confirmation_timeout
                )))?
                .map_err(Error::SubmissionFailure)?,
        };

        let deployed_address = extract_address(&receipt)?;
        tracing::info!(
            stage = ?Stage::Deployed,
            %deployed_address,
            tx = ?receipt.transaction_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "contract deployed"
        );
        Ok(DeploymentResult {
            deployed_address,
            transaction_hash: receipt.transaction_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::network::MockNetwork,
        alloy::{
            json_abi::{Param, StateMutability},
            primitives::{B256, U256, address},
        },
        mockall::Sequence,
        number::units::EthUnit,
        std::future::pending,
    };

    const FROM: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const CREATED: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const GAS: u64 = 412_345;
    const TIMEOUT: Duration = Duration::from_secs(60);

    fn gas_price() -> u128 {
        10u64.gwei().to()
    }

    fn request() -> DeploymentRequest {
        DeploymentRequest {
            bytecode: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
            constructor: Some(Constructor {
                inputs: vec![Param {
                    ty: "uint256".to_string(),
                    name: "ticketPrice".to_string(),
                    components: vec![],
                    internal_type: None,
                }],
                state_mutability: StateMutability::NonPayable,
            }),
            constructor_arguments: vec![DynSolValue::Uint(U256::from(10).pow(U256::from(17)), 256)],
        }
    }

    fn receipt(status: bool, contract_address: Option<Address>) -> DeploymentReceipt {
        DeploymentReceipt {
            transaction_hash: B256::repeat_byte(0xaa),
            block_number: Some(7),
            gas_used: GAS - 1000,
            status,
            contract_address,
        }
    }

    #[test]
    fn deploy_code_appends_encoded_arguments() {
        let code = request().deploy_code().unwrap();
        assert_eq!(code.len(), 4 + 32);
        assert_eq!(&code[..4], &[0x60, 0x80, 0x60, 0x40]);
        assert_eq!(
            U256::from_be_slice(&code[4..]),
            U256::from(100_000_000_000_000_000u64)
        );
    }

    #[test]
    fn deploy_code_checks_arguments() {
        let mut wrong_type = request();
        wrong_type.constructor_arguments = vec![DynSolValue::Bool(true)];
        assert!(wrong_type.deploy_code().is_err());

        let mut missing = request();
        missing.constructor_arguments.clear();
        assert!(missing.deploy_code().is_err());

        let mut no_constructor = request();
        no_constructor.constructor = None;
        assert!(no_constructor.deploy_code().is_err());
        no_constructor.constructor_arguments.clear();
        assert_eq!(no_constructor.deploy_code().unwrap(), no_constructor.bytecode);
    }

    #[test]
    fn extracts_address_unmodified() {
        let receipt = receipt(true, Some(CREATED));
        assert_eq!(extract_address(&receipt).unwrap(), CREATED);
        assert_eq!(extract_address(&receipt).unwrap(), CREATED);
    }

    #[test]
    fn extraction_needs_successful_creation() {
        assert!(matches!(
            extract_address(&receipt(false, Some(CREATED))),
            Err(Error::SubmissionFailure(_))
        ));
        assert!(matches!(
            extract_address(&receipt(true, None)),
            Err(Error::SubmissionFailure(_))
        ));
    }

    #[tokio::test]
    async fn estimates_once_then_submits_once() {
        let expected_code = request().deploy_code().unwrap();
        let mut network = MockNetwork::new();
        let mut seq = Sequence::new();
        let code = expected_code.clone();
        network
            .expect_estimate_gas()
            .times(1)
            .withf(move |from, c| *from == FROM && c.to_vec() == code.to_vec())
            .returning(|_, _| Ok(GAS))
            .in_sequence(&mut seq);
        let code = expected_code.clone();
        network
            .expect_submit_deployment()
            .times(1)
            .withf(move |from, c, gas, price| {
                *from == FROM && c.to_vec() == code.to_vec() && *gas == GAS && *price == gas_price()
            })
            .returning(|_, _, _, _| Ok(receipt(true, Some(CREATED))))
            .in_sequence(&mut seq);

        let deployer = Deployer::new(network, gas_price(), TIMEOUT);
        let result = deployer.deploy(FROM, &request(), pending()).await.unwrap();
        assert_eq!(result.deployed_address, CREATED);
        assert_eq!(result.transaction_hash, B256::repeat_byte(0xaa));
        assert_eq!(
            result.to_string(),
            format!("Contract deployed at address: {CREATED}")
        );
    }

    #[tokio::test]
    async fn failed_estimation_skips_submission() {
        let mut network = MockNetwork::new();
        network
            .expect_estimate_gas()
            .times(1)
            .returning(|_, _| Err(anyhow!("execution reverted")));
        network.expect_submit_deployment().never();

        let deployer = Deployer::new(network, gas_price(), TIMEOUT);
        let err = deployer
            .deploy(FROM, &request(), pending())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EstimationFailure(_)));
        assert_eq!(err.stage(), Stage::AccountReady);
    }

    #[tokio::test]
    async fn empty_bytecode_fails_estimation_without_network() {
        let mut network = MockNetwork::new();
        network.expect_estimate_gas().never();
        network.expect_submit_deployment().never();

        let mut request = request();
        request.bytecode = Bytes::new();
        let deployer = Deployer::new(network, gas_price(), TIMEOUT);
        let err = deployer.deploy(FROM, &request, pending()).await.unwrap_err();
        assert!(matches!(err, Error::EstimationFailure(_)));
    }

    #[tokio::test]
    async fn reverted_deployment_reports_no_address() {
        let mut network = MockNetwork::new();
        network.expect_estimate_gas().returning(|_, _| Ok(GAS));
        network
            .expect_submit_deployment()
            .times(1)
            .returning(|_, _, _, _| Ok(receipt(false, None)));

        let deployer = Deployer::new(network, gas_price(), TIMEOUT);
        let err = deployer
            .deploy(FROM, &request(), pending())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SubmissionFailure(_)));
        assert_eq!(err.stage(), Stage::GasEstimated);
    }

    #[tokio::test]
    async fn rejected_submission_is_not_retried() {
        let mut network = MockNetwork::new();
        network.expect_estimate_gas().times(1).returning(|_, _| Ok(GAS));
        network
            .expect_submit_deployment()
            .times(1)
            .returning(|_, _, _, _| Err(anyhow!("insufficient funds for gas * price + value")));

        let deployer = Deployer::new(network, gas_price(), TIMEOUT);
        let err = deployer
            .deploy(FROM, &request(), pending())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient funds"));
        assert!(matches!(err, Error::SubmissionFailure(_)));
    }

    /// Accepts the estimation but never confirms the submission.
    struct Unresponsive;

    #[async_trait::async_trait]
    impl Network for Unresponsive {
        async fn estimate_gas(&self, _: Address, _: &Bytes) -> anyhow::Result<u64> {
            Ok(GAS)
        }

        async fn submit_deployment(
            &self,
            _: Address,
            _: &Bytes,
            _: u64,
            _: u128,
        ) -> anyhow::Result<DeploymentReceipt> {
            pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_submission_times_out() {
        let deployer = Deployer::new(Unresponsive, gas_price(), TIMEOUT);
        let err = deployer
            .deploy(FROM, &request(), pending())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SubmissionFailure(_)));
        assert!(err.to_string().contains("not confirmed within"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_submission() {
        let deployer = Deployer::new(Unresponsive, gas_price(), Duration::MAX);
        let cancelled = tokio::time::sleep(Duration::from_secs(5));
        let err = deployer
            .deploy(FROM, &request(), cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled {
                stage: Stage::GasEstimated
            }
        ));
    }

    #[tokio::test]
    async fn cancellation_before_estimation_avoids_the_network() {
        let mut network = MockNetwork::new();
        network.expect_estimate_gas().never();
        network.expect_submit_deployment().never();

        let deployer = Deployer::new(network, gas_price(), TIMEOUT);
        let err = deployer
            .deploy(FROM, &request(), async {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled {
                stage: Stage::AccountReady
            }
        ));
    }
}
