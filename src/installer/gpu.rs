// file: src/installer/gpu.rs
// version: 1.0.0
// guid: 13f44be5-ea8f-4125-9702-0407c23a3339

//! GPU availability probe

use crate::executor::CommandExecutor;
use tracing::debug;

/// True when `nvidia-smi` runs successfully
pub async fn gpu_available(executor: &dyn CommandExecutor) -> bool {
    match executor.run_unchecked("nvidia-smi", &[]).await {
        Ok(code) => code == 0,
        Err(e) => {
            debug!("nvidia-smi not usable: {}", e);
            false
        }
    }
}
