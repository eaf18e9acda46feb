use {
    crate::Error,
    anyhow::Context,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

#[derive(clap::Parser)]
pub struct Arguments {
    /// Project id of the gateway that provides the node endpoint. Not needed
    /// when `--node-url` is set.
    #[clap(long, env)]
    pub access_project_id: Option<String>,

    /// Hex encoded private key of the deploying account.
    #[clap(long, env)]
    pub signing_key: Option<String>,

    /// Network the gateway endpoint is selected for.
    #[clap(long, env, default_value = "sepolia")]
    pub network: String,

    /// Node to connect to instead of the gateway endpoint.
    #[clap(long, env)]
    pub node_url: Option<Url>,

    /// JSON file with the ABI and bytecode of the compiled contract.
    #[clap(long, env, default_value = "TicketSale.json")]
    pub artifact: PathBuf,

    /// Constructor arguments separated by `;`. Numbers may carry a unit,
    /// e.g. `0.1 ether`. A single empty value stands for constructors without
    /// arguments.
    #[clap(long, env, default_value = "0.1 ether", value_delimiter = ';')]
    pub constructor_args: Vec<String>,

    /// Fixed gas price of the deployment transaction.
    #[clap(
        long,
        env,
        default_value = "10 gwei",
        value_parser = number::units::parse_amount_u128,
    )]
    pub gas_price: u128,

    /// Seconds to wait for the deployment to be confirmed after submitting
    /// it.
    #[clap(
        long,
        env,
        default_value = "600",
        value_parser = duration_from_seconds,
    )]
    pub confirmation_timeout: Duration,

    /// Number of blocks the deployment needs before it counts as confirmed.
    #[clap(
        long,
        env,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub confirmations: u64,

    #[clap(long, env, default_value = "warn,deployer=info")]
    pub log_filter: String,

    /// Emit logs as JSON.
    #[clap(long, env)]
    pub log_json: bool,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            access_project_id,
            signing_key,
            network,
            node_url,
            artifact,
            constructor_args,
            gas_price,
            confirmation_timeout,
            confirmations,
            log_filter,
            log_json,
        } = self;

        display_secret_option(f, "access_project_id", access_project_id)?;
        display_secret_option(f, "signing_key", signing_key)?;
        writeln!(f, "network: {network}")?;
        display_secret_option(f, "node_url", node_url)?;
        writeln!(f, "artifact: {}", artifact.display())?;
        writeln!(f, "constructor_args: {constructor_args:?}")?;
        writeln!(f, "gas_price: {gas_price} wei")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        writeln!(f, "confirmations: {confirmations}")?;
        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_json: {log_json}")?;
        Ok(())
    }
}

/// Arguments with all required values present and the node endpoint
/// resolved.
pub struct Config {
    pub endpoint: Url,
    pub signing_key: String,
    pub artifact: PathBuf,
    pub constructor_args: Vec<String>,
    pub gas_price: u128,
    pub confirmation_timeout: Duration,
    pub confirmations: u64,
}

impl TryFrom<Arguments> for Config {
    type Error = Error;

    fn try_from(args: Arguments) -> Result<Self, Self::Error> {
        let signing_key = args
            .signing_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::ConfigurationMissing("SIGNING_KEY"))?;
        let endpoint = match args.node_url {
            Some(url) => url,
            None => {
                let project_id = args
                    .access_project_id
                    .filter(|id| !id.trim().is_empty())
                    .ok_or(Error::ConfigurationMissing("ACCESS_PROJECT_ID"))?;
                gateway_endpoint(&args.network, project_id.trim())
                    .map_err(Error::InvalidConfiguration)?
            }
        };
        Ok(Self {
            endpoint,
            signing_key,
            artifact: args.artifact,
            constructor_args: constructor_arguments(&args.constructor_args),
            gas_price: args.gas_price,
            confirmation_timeout: args.confirmation_timeout,
            confirmations: args.confirmations,
        })
    }
}

fn constructor_arguments(values: &[String]) -> Vec<String> {
    match values {
        [single] if single.trim().is_empty() => Vec::new(),
        values => values.iter().map(|value| value.trim().to_string()).collect(),
    }
}

fn gateway_endpoint(network: &str, project_id: &str) -> anyhow::Result<Url> {
    let url = format!("https://{network}.infura.io/v3/{project_id}");
    Url::parse(&url).with_context(|| format!("invalid gateway endpoint for network {network:?}"))
}

pub fn duration_from_seconds(s: &str) -> anyhow::Result<Duration> {
    let seconds: f64 = s.parse()?;
    Ok(Duration::try_from_secs_f64(seconds)?)
}

pub fn display_secret_option<T>(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<T>,
) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(_) => writeln!(f, "SECRET"),
        None => writeln!(f, "None"),
    }
}
