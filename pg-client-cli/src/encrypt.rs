use crate::error::CliError;
use crate::opts::EncOpts;
use crate::util::print_qr;

use pg_client::client::Client;
use pg_client::identity::Attribute;
use pg_client::pkg::PkgClient;
use pg_client::session::IrmaVerifier;

pub async fn exec(enc_opts: EncOpts) -> Result<(), CliError> {
    let EncOpts {
        input,
        atype,
        value,
        pkg,
    } = enc_opts;

    let document: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&input).await?)?;
    let attribute = Attribute::new(&atype, value.as_deref());

    let verifier = IrmaVerifier::new(PkgClient::new(&pkg)?, print_qr as fn(&irma::Qr));
    let mut client = Client::new(&pkg, verifier)?;
    client.init().await?;

    log::info!(
        "encrypting {input} for {}",
        serde_json::to_string(&attribute)?
    );

    let ct = client.encrypt(&attribute, &document)?;

    let output = format!("{input}.enc");
    tokio::fs::write(&output, &ct).await?;

    log::info!("wrote {} bytes to {output}", ct.len());

    Ok(())
}
