//! Failover Script Execution
//!
//! Launches the operator-supplied master/slave scripts as detached child
//! processes. Scripts are fire-and-forget: we never wait on them or inspect
//! their exit status. A script that needs to signal failure back to the
//! cluster has to do so out of band (e.g. by calling `/heartbeat` itself
//! down), not through this module.

use tokio::process::Command;

pub struct ScriptExecutor {
    master_script_path: String,
    slave_script_path: String,
}

impl ScriptExecutor {
    pub fn new(master_script_path: impl Into<String>, slave_script_path: impl Into<String>) -> Self {
        Self {
            master_script_path: master_script_path.into(),
            slave_script_path: slave_script_path.into(),
        }
    }

    /// Launch the master script in the background.
    pub fn run_master(&self) {
        self.spawn(&self.master_script_path, "master");
    }

    /// Launch the slave script in the background.
    pub fn run_slave(&self) {
        self.spawn(&self.slave_script_path, "slave");
    }

    fn spawn(&self, path: &str, role: &str) {
        // A bare filename with no directory component resolves against
        // $PATH, not the working directory, so it has to be prefixed with
        // ./ to launch the script that actually sits next to the binary.
        let resolved = if path.contains('/') {
            path.to_string()
        } else {
            format!("./{path}")
        };
        tracing::info!("executing {} script: {}", role, resolved);
        if let Err(e) = Command::new(&resolved).spawn() {
            tracing::error!("failed to execute {} script {}: {}", role, resolved, e);
        }
    }
}
