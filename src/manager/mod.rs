// Copyright (c) 2024 Huawei Technologies Co.,Ltd. All rights reserved.
//
// lxcmgr is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

// Operation flows, one provider handle per operation:
//
//      create_container    open -> is_defined -> create -> start
//      remove_container    open -> is_defined -> stop -> destroy
//      run_command         tokenize -> open -> [is_running -> start] -> attach_run_wait
//      start_console       open -> [is_running -> start] -> console_attach
//      set_limit           open -> [is_running -> start] -> set_cgroup_item
//      get_limit           open -> [is_running -> start] -> init_pid -> get_cgroup_item
//      list_active         list_active -> per container: state, init_pid, get_ip
//
// The handle is dropped, and so released, on every return path.

mod exec;
mod inventory;
mod lifecycle;
mod limits;

pub use inventory::{ContainerRecord, Inventory};

use log::{debug, error, info, warn};

use crate::{
    container::{diagnostic, ContainerState, ManagerError, Provider, RuntimeHandle},
    utils::{ActivityRecorder, Severity},
};

/// Policy layer over a container runtime.
///
/// Operations run one at a time and to completion. Callers embedding this in
/// a concurrent host must serialize operations on the same container name.
pub struct ContainerManager<P: Provider, R: ActivityRecorder> {
    provider: P,
    recorder: R,
}

impl<P: Provider, R: ActivityRecorder> ContainerManager<P, R> {
    pub fn new(provider: P, recorder: R) -> Self {
        Self { provider, recorder }
    }

    #[cfg(test)]
    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    fn open(&self, name: &str) -> Result<P::Handle, ManagerError> {
        if name.is_empty() {
            return Err(ManagerError::HandleUnavailable {
                name: name.to_string(),
            });
        }
        self.provider.open(name).ok_or_else(|| {
            error!("Failed to set up handle for container {}", name);
            ManagerError::HandleUnavailable {
                name: name.to_string(),
            }
        })
    }

    /// Append to the activity log. A failing recorder never fails the
    /// operation.
    pub fn record(&mut self, severity: Severity, message: &str) {
        if let Err(e) = self.recorder.append(severity, message) {
            warn!("Failed to record activity \"{}\": {:?}", message, e);
        }
    }

    /// Start the container unless the runtime reports it running right now.
    fn ensure_running(&mut self, handle: &mut P::Handle) -> Result<(), ManagerError> {
        if handle.is_running() {
            debug!("Container {} is already running", handle.name());
            return Ok(());
        }

        info!("Starting container {}", handle.name());
        if !handle.start() {
            let reason = diagnostic(handle);
            error!("Failed to start container {}: {}", handle.name(), reason);
            return Err(ManagerError::StartFailed {
                name: handle.name().to_string(),
                reason,
                left: ContainerState::query(handle),
            });
        }
        Ok(())
    }
}
