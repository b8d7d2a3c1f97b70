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

use libc::pid_t;
use log::{error, info};

use super::ContainerManager;
use crate::{
    container::{diagnostic, ContainerState, ManagerError, Provider, RuntimeHandle, Template},
    utils::{ActivityRecorder, Severity},
};

/// Outcome of a successful create: what the runtime reports right after
/// the container was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub state: ContainerState,
    pub pid: Option<pid_t>,
}

impl<P: Provider, R: ActivityRecorder> ContainerManager<P, R> {
    /// Build the root filesystem of `name` from `template`, then start it.
    pub fn create_container(
        &mut self,
        name: &str,
        template: &Template,
    ) -> Result<Created, ManagerError> {
        let mut handle = self.open(name)?;
        if handle.is_defined() {
            error!("Container {} already exists", name);
            return Err(ManagerError::AlreadyExists {
                name: name.to_string(),
            });
        }

        info!(
            "Creating container {} from template {} {:?}",
            name, template.name, template.args
        );
        if !handle.create(template) {
            let reason = diagnostic(&handle);
            error!("Failed to create container {} rootfs: {}", name, reason);
            return Err(ManagerError::CreateFailed {
                name: name.to_string(),
                reason,
            });
        }
        self.record(Severity::Info, &format!("Container {} created", name));

        if !handle.start() {
            let reason = diagnostic(&handle);
            error!("Failed to start container {}: {}", name, reason);
            return Err(ManagerError::StartFailed {
                name: name.to_string(),
                reason,
                left: ContainerState::query(&handle),
            });
        }
        self.record(Severity::Info, &format!("Container {} started", name));

        let created = Created {
            state: ContainerState::query(&handle),
            pid: handle.init_pid(),
        };
        info!(
            "Container {} state: {}, pid: {:?}",
            name, created.state, created.pid
        );
        Ok(created)
    }

    /// Stop `name` and destroy it together with its root filesystem.
    pub fn remove_container(&mut self, name: &str) -> Result<(), ManagerError> {
        let mut handle = self.open(name)?;
        if !handle.is_defined() {
            error!("Container {} does not exist", name);
            return Err(ManagerError::NotFound {
                name: name.to_string(),
            });
        }

        if !handle.stop() {
            let reason = diagnostic(&handle);
            error!("Failed to stop container {}: {}", name, reason);
            return Err(ManagerError::StopFailed {
                name: name.to_string(),
                reason,
            });
        }
        self.record(Severity::Warning, &format!("Container {} stopped", name));

        if !handle.destroy() {
            let reason = diagnostic(&handle);
            error!("Failed to destroy container {}: {}", name, reason);
            return Err(ManagerError::DestroyFailed {
                name: name.to_string(),
                reason,
            });
        }
        self.record(Severity::Warning, &format!("Container {} destroyed", name));
        info!("Container {} removed", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        container::{tests::FakeProvider, Step},
        manager::tests::{manager, BrokenRecorder},
    };

    #[test]
    fn test_create_container() {
        let provider = FakeProvider::new();
        let mut manager = manager(&provider);

        let created = manager
            .create_container("c1", &Template::default())
            .unwrap();
        assert_eq!(created.state, ContainerState::Running);
        assert!(created.pid.is_some());

        let handle = provider.open("c1").unwrap();
        assert!(handle.is_defined());
        assert!(handle.is_running());
        drop(handle);

        assert_eq!(
            manager.recorder().messages(Severity::Info),
            vec!["Container c1 created", "Container c1 started"]
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_create_existing_container() {
        let provider = FakeProvider::new();
        let mut manager = manager(&provider);
        let first = manager
            .create_container("c1", &Template::default())
            .unwrap();

        let err = manager
            .create_container("c1", &Template::default())
            .unwrap_err();
        assert_eq!(
            err,
            ManagerError::AlreadyExists {
                name: String::from("c1")
            }
        );
        assert_eq!(provider.calls("create"), 1);
        assert_eq!(provider.calls("start"), 1);
        assert_eq!(provider.state("c1"), ContainerState::Running);
        assert_eq!(
            provider.world.borrow().containers.get("c1").unwrap().pid,
            first.pid
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_create_failure_leaves_undefined() {
        let provider = FakeProvider::new();
        provider.fail("create", Some("template download failed"));
        let mut manager = manager(&provider);

        let err = manager
            .create_container("c1", &Template::default())
            .unwrap_err();
        assert_eq!(err.step(), Step::Create);
        assert_eq!(err.state_left(), Some(ContainerState::Undefined));
        assert_eq!(
            err.to_string(),
            "Failed to create container c1 rootfs: template download failed"
        );
        assert_eq!(provider.state("c1"), ContainerState::Undefined);
        assert_eq!(provider.calls("start"), 0);
        assert!(manager.recorder().entries.is_empty());
        assert!(provider.balanced());
    }

    #[test]
    fn test_start_failure_leaves_stopped() {
        let provider = FakeProvider::new();
        provider.fail("start", None);
        let mut manager = manager(&provider);

        let err = manager
            .create_container("c1", &Template::default())
            .unwrap_err();
        assert_eq!(
            err,
            ManagerError::StartFailed {
                name: String::from("c1"),
                reason: String::from("unknown error"),
                left: ContainerState::Stopped,
            }
        );
        assert_eq!(err.state_left(), Some(ContainerState::Stopped));
        assert_eq!(provider.state("c1"), ContainerState::Stopped);
        assert_eq!(
            manager.recorder().messages(Severity::Info),
            vec!["Container c1 created"]
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_remove_container() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        let mut manager = manager(&provider);

        manager.remove_container("c1").unwrap();
        assert_eq!(provider.state("c1"), ContainerState::Undefined);
        assert_eq!(
            manager.recorder().messages(Severity::Warning),
            vec!["Container c1 stopped", "Container c1 destroyed"]
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_remove_stopped_container() {
        let provider = FakeProvider::new();
        provider.add("c1", false, None);
        let mut manager = manager(&provider);

        manager.remove_container("c1").unwrap();
        assert_eq!(provider.calls("stop"), 1);
        assert_eq!(provider.state("c1"), ContainerState::Undefined);
    }

    #[test]
    fn test_remove_missing_container() {
        let provider = FakeProvider::new();
        let mut manager = manager(&provider);

        assert_eq!(
            manager.remove_container("ghost"),
            Err(ManagerError::NotFound {
                name: String::from("ghost")
            })
        );
        assert_eq!(provider.calls("stop"), 0);
        assert_eq!(provider.calls("destroy"), 0);
        assert!(provider.balanced());
    }

    #[test]
    fn test_remove_failures_name_the_step() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        provider.fail("stop", Some("timed out"));
        let mut manager = manager(&provider);

        let err = manager.remove_container("c1").unwrap_err();
        assert_eq!(err.step(), Step::Stop);
        assert_eq!(provider.calls("destroy"), 0);
        assert_eq!(provider.state("c1"), ContainerState::Running);

        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        provider.fail("destroy", Some("busy"));
        let mut manager = super::super::tests::manager(&provider);

        let err = manager.remove_container("c1").unwrap_err();
        assert_eq!(
            err,
            ManagerError::DestroyFailed {
                name: String::from("c1"),
                reason: String::from("busy")
            }
        );
        assert_eq!(provider.state("c1"), ContainerState::Stopped);
        assert_eq!(
            manager.recorder().messages(Severity::Warning),
            vec!["Container c1 stopped"]
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_broken_recorder_does_not_fail_create() {
        let provider = FakeProvider::new();
        let mut manager = ContainerManager::new(provider.clone(), BrokenRecorder);

        assert!(manager
            .create_container("c1", &Template::default())
            .is_ok());
        assert!(manager.remove_container("c1").is_ok());
        assert_eq!(provider.state("c1"), ContainerState::Undefined);
    }
}
