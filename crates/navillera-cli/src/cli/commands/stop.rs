//! `navillera stop` – cancel the active run, if any.

use anyhow::Result;

#[cfg(unix)]
pub async fn run_stop() -> Result<()> {
    use crate::cli::control_socket;

    let path = navillera_core::control::default_control_socket_path()?;
    if control_socket::send_cancel(&path).await? {
        println!("Cancel sent to the running batch run.");
    } else {
        println!("No active run.");
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn run_stop() -> Result<()> {
    anyhow::bail!("`navillera stop` needs a Unix control socket; press Ctrl-C in the running window instead")
}
