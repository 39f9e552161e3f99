use crate::error::CliError;
use crate::opts::DecOpts;
use crate::util::{decrypted_name, print_qr};

use pg_client::cache::FileStore;
use pg_client::client::Client;
use pg_client::pkg::PkgClient;
use pg_client::session::IrmaVerifier;

pub async fn exec(dec_opts: DecOpts) -> Result<(), CliError> {
    let DecOpts {
        input,
        pkg,
        cache,
        no_cache,
    } = dec_opts;

    let output = decrypted_name(&input)
        .ok_or_else(|| CliError::Usage(format!("{input} does not end with .enc")))?;

    let verifier = IrmaVerifier::new(PkgClient::new(&pkg)?, print_qr as fn(&irma::Qr));
    let client = Client::new(&pkg, verifier)?;
    let mut client = if no_cache {
        client
    } else {
        client.with_store(FileStore::new(cache))
    };
    client.init().await?;

    let ct = tokio::fs::read(&input).await?;
    let identity = client.extract_identity(&ct)?;

    log::info!(
        "{input} was encrypted for {}",
        serde_json::to_string_pretty(&identity)?
    );

    let token = client.get_token(&identity.attribute).await?;
    let usk = client.request_key(&token, identity.timestamp).await?;

    let document: serde_json::Value = client.decrypt(&usk, &ct)?;
    tokio::fs::write(output, serde_json::to_vec_pretty(&document)?).await?;

    log::info!("decrypted {input} into {output}");

    Ok(())
}
