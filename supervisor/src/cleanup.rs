//! `--stop` and `--cleanup`.
//!
//! Grounded on `digsinet.py`'s `main`: both actions shell out to `clab
//! destroy` rather than going through the broker or controllers, since the
//! process that would own those resources may not even be running.

use digsinet_config::Settings;
use tokio::process::Command;

/// Forcefully destroy every container-lab topology on the host, regardless
/// of which process created it. Requires `--yes-i-really-mean-it`, checked
/// by the caller before this is invoked.
///
/// Maps to `os.system("clab destroy -a -c")`.
pub async fn cleanup() {
    tracing::warn!("forcefully destroying all container-lab topologies");
    run_clab_destroy(["-a", "-c"]).await;
}

/// Tear down the real-net topology and every autostarted sibling's
/// topology.
///
/// Maps to `main`'s `--stop` branch: `clab destroy -t <real-net file>`, then
/// one `clab destroy -t <sibling file>` per autostarted sibling.
pub async fn stop(settings: &Settings) {
    tracing::info!(path = %settings.topology.file, "stopping real-net topology");
    run_clab_destroy(["-t", &settings.topology.file]).await;

    for (sibling_name, sibling) in &settings.siblings {
        if !sibling.autostart {
            continue;
        }
        let path = digsinet_builder::topology_file_path(&settings.topology_name, sibling_name);
        let path = path.display().to_string();
        tracing::info!(sibling = sibling_name, %path, "stopping sibling topology");
        run_clab_destroy(["-t", &path]).await;
    }
}

async fn run_clab_destroy<const N: usize>(args: [&str; N]) {
    match Command::new("clab").arg("destroy").args(args).output().await {
        Ok(output) if output.status.success() => {}
        Ok(output) => {
            tracing::error!(
                args = ?args,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "clab destroy exited non-zero"
            );
        }
        Err(error) => tracing::error!(%error, args = ?args, "failed to invoke clab"),
    }
}
