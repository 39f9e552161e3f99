use clap::{Parser, ValueHint};
use pg_client::consts::DEFAULT_PKG_URL;

/// Command line interface for PostGuard, encryption to IRMA attributes.
#[derive(Parser, Debug)]
#[clap(
    name = "pg-client-cli",
    version,
    author = "Wouter Geraedts <w.geraedts@sarif.nl>, Leon Botros <l.botros@cs.ru.nl>"
)]
pub struct Opts {
    #[clap(subcommand)]
    pub subcmd: Subcommand,
}

#[derive(Parser, Debug)]
pub enum Subcommand {
    Params(ParamsOpts),
    Enc(EncOpts),
    Dec(DecOpts),
}

/// Print the public parameters of a PKG.
#[derive(Parser, Debug)]
#[clap(name = "Parameters")]
pub struct ParamsOpts {
    /// Private key generator (PKG) server URL.
    #[clap(short, long, default_value = DEFAULT_PKG_URL, value_hint = ValueHint::Url)]
    pub pkg: String,
}

/// Encrypt a JSON document.
#[derive(Parser, Debug)]
#[clap(name = "Encrypt")]
pub struct EncOpts {
    /// Input file, containing JSON.
    #[clap(index = 1, value_hint = ValueHint::FilePath)]
    pub input: String,

    /// Type of the attribute to encrypt for, e.g., pbdf.sidn-pbdf.email.email.
    #[clap(short = 't', long = "type")]
    pub atype: String,

    /// Value of the attribute to encrypt for.
    #[clap(short, long)]
    pub value: Option<String>,

    /// Private key generator (PKG) server URL.
    #[clap(short, long, default_value = DEFAULT_PKG_URL, value_hint = ValueHint::Url)]
    pub pkg: String,
}

/// Decrypt a file created by `enc`.
#[derive(Parser, Debug)]
#[clap(name = "Decrypt")]
pub struct DecOpts {
    /// Input file, ending in .enc.
    #[clap(index = 1, value_hint = ValueHint::FilePath)]
    pub input: String,

    /// Private key generator (PKG) server URL.
    #[clap(short, long, default_value = DEFAULT_PKG_URL, value_hint = ValueHint::Url)]
    pub pkg: String,

    /// File in which session tokens are cached.
    #[clap(short, long, default_value = "./pg-tokens.json", value_hint = ValueHint::FilePath)]
    pub cache: String,

    /// Always prove the attribute, do not use or store cached tokens.
    #[clap(long)]
    pub no_cache: bool,
}
