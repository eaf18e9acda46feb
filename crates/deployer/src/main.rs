use clap::Parser;

#[tokio::main]
async fn main() {
    let args = deployer::arguments::Arguments::parse();
    observe::tracing::initialize(&observe::Config::new(&args.log_filter, args.log_json));
    tracing::info!("running deployer with arguments:\n{}", args);

    match deployer::run(args, deployer::shutdown::signal_handler()).await {
        Ok(result) => println!("{result}"),
        Err(err) => {
            tracing::error!(?err, stage = ?err.stage(), "deployment failed");
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
