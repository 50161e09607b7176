// Application layer: wires the Tableau adapter to the report.

use crate::adapters::tableau::{Credentials, Password, TableauServer};
use crate::config::Settings;
use crate::core::report::write_report;
use crate::utils::error::Result;
use std::io::Write;

/// Signs in, writes the report to `out` and signs out again, whether or not
/// the report succeeded. Returns the number of rows written.
pub async fn run<W: Write>(settings: &Settings, password: Password, out: &mut W) -> Result<usize> {
    eprintln!("Fetching Degradations...");

    let server = TableauServer::connect(&settings.server, settings.api_version.as_deref()).await?;
    let credentials = Credentials {
        username: settings.username.clone(),
        password,
        site: settings.site.clone(),
    };
    let session = server.sign_in(&credentials).await?;

    let outcome = write_report(
        &session,
        &settings.selector,
        &settings.product_version,
        out,
    )
    .await;

    let signed_out = session.sign_out().await;
    let rows = match outcome {
        Ok(rows) => {
            signed_out?;
            rows
        }
        Err(e) => {
            if let Err(sign_out_error) = signed_out {
                tracing::warn!("Sign out failed after report error: {}", sign_out_error);
            }
            return Err(e);
        }
    };

    tracing::info!("Wrote {} degradation rows", rows);
    eprintln!("Finished fetching degradations.");
    Ok(rows)
}
