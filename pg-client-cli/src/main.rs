mod decrypt;
mod encrypt;
mod error;
mod opts;
mod util;

use crate::opts::{Opts, Subcommand};
use clap::Parser;
use pg_client::pkg::PkgClient;

async fn params(pkg: &str) -> Result<(), error::CliError> {
    let parameters = PkgClient::new(pkg)?.parameters().await?;
    println!("{}", serde_json::to_string_pretty(&parameters)?);

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let opts = Opts::parse();

    let res = match opts.subcmd {
        Subcommand::Params(o) => params(&o.pkg).await,
        Subcommand::Enc(o) => crate::encrypt::exec(o).await,
        Subcommand::Dec(o) => crate::decrypt::exec(o).await,
    };

    if let Err(e) = res {
        log::error!("{e}");
        std::process::exit(1);
    }
}
