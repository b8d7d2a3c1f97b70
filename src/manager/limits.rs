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
    container::{
        decode_value, diagnostic, encode_value, ManagerError, Provider, ResourceCategory,
        RuntimeHandle, RESOURCE_VALUE_CAPACITY,
    },
    utils::{ActivityRecorder, Severity},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitReading {
    pub pid: pid_t,
    pub category: ResourceCategory,
    pub value: String,
}

impl<P: Provider, R: ActivityRecorder> ContainerManager<P, R> {
    pub fn set_limit(
        &mut self,
        name: &str,
        category: ResourceCategory,
        value: &str,
    ) -> Result<(), ManagerError> {
        let mut handle = self.open(name)?;
        self.ensure_running(&mut handle)?;

        let key = category.subsystem_key();
        let value = encode_value(value);
        info!("Setting {} of container {} to {}", key, name, value);
        if !handle.set_cgroup_item(key, value) {
            let reason = diagnostic(&handle);
            error!("Failed to set {} of container {}: {}", key, name, reason);
            return Err(ManagerError::SetLimitFailed {
                name: name.to_string(),
                category,
                value: value.to_string(),
                reason,
            });
        }
        self.record(
            Severity::Info,
            &format!("Set {} of container {} to {}", category, name, value),
        );
        Ok(())
    }

    pub fn get_limit(
        &mut self,
        name: &str,
        category: ResourceCategory,
    ) -> Result<LimitReading, ManagerError> {
        let mut handle = self.open(name)?;
        self.ensure_running(&mut handle)?;

        let pid = handle.init_pid().ok_or_else(|| {
            error!("Running container {} has no init pid", name);
            ManagerError::PidUnavailable {
                name: name.to_string(),
            }
        })?;

        let key = category.subsystem_key();
        let mut buf = [0u8; RESOURCE_VALUE_CAPACITY];
        let len = handle.get_cgroup_item(key, &mut buf);
        if len < 0 {
            let reason = diagnostic(&handle);
            error!("Failed to get {} of container {}: {}", key, name, reason);
            return Err(ManagerError::GetLimitFailed {
                name: name.to_string(),
                category,
                reason,
            });
        }
        let len = len as usize;
        if len > buf.len() {
            error!(
                "Value of {} in container {} needs {} bytes, buffer holds {}",
                key,
                name,
                len,
                buf.len()
            );
            return Err(ManagerError::GetLimitFailed {
                name: name.to_string(),
                category,
                reason: format!("value needs {} bytes, buffer holds {}", len, buf.len()),
            });
        }

        let value = decode_value(&buf[..len]);
        info!("Container {} (pid {}) {} = {}", name, pid, key, value);
        Ok(LimitReading {
            pid,
            category,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{container::tests::FakeProvider, manager::tests::manager};

    #[test]
    fn test_set_limit() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        let mut manager = manager(&provider);

        manager
            .set_limit("c1", ResourceCategory::CpuShares, "512")
            .unwrap();
        assert_eq!(
            provider.world.borrow().last_set,
            Some((String::from("cpu.cfs_quota_us"), String::from("512")))
        );
        assert_eq!(
            manager.recorder().messages(Severity::Info),
            vec!["Set CPU shares (cpu.cfs_quota_us) of container c1 to 512"]
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_set_limit_trims_value_and_starts_container() {
        let provider = FakeProvider::new();
        provider.add("c1", false, None);
        let mut manager = manager(&provider);

        manager
            .set_limit("c1", ResourceCategory::MemoryLimit, " 256M\n")
            .unwrap();
        assert_eq!(provider.calls("start"), 1);
        assert_eq!(
            provider.world.borrow().last_set,
            Some((String::from("memory.limit_in_bytes"), String::from("256M")))
        );
    }

    #[test]
    fn test_set_limit_failure() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        provider.fail("set_cgroup_item", Some("Invalid argument"));
        let mut manager = manager(&provider);

        assert_eq!(
            manager.set_limit("c1", ResourceCategory::BlkioWeight, "5000"),
            Err(ManagerError::SetLimitFailed {
                name: String::from("c1"),
                category: ResourceCategory::BlkioWeight,
                value: String::from("5000"),
                reason: String::from("Invalid argument"),
            })
        );
        assert!(manager.recorder().entries.is_empty());
        assert!(provider.balanced());
    }

    #[test]
    fn test_get_limit() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        provider
            .world
            .borrow_mut()
            .containers
            .get_mut("c1")
            .unwrap()
            .cgroup
            .insert(String::from("cpu.cfs_quota_us"), String::from("512"));
        let mut manager = manager(&provider);

        let reading = manager
            .get_limit("c1", ResourceCategory::CpuShares)
            .unwrap();
        assert_eq!(reading.value, "512");
        assert_eq!(reading.category, ResourceCategory::CpuShares);
        assert_eq!(
            Some(reading.pid),
            provider.world.borrow().containers.get("c1").unwrap().pid
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_set_then_get_limit() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        let mut manager = manager(&provider);

        manager
            .set_limit("c1", ResourceCategory::NetClassId, "0x100001")
            .unwrap();
        let reading = manager
            .get_limit("c1", ResourceCategory::NetClassId)
            .unwrap();
        assert_eq!(reading.value, "0x100001");
    }

    #[test]
    fn test_get_limit_unknown_subsystem() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        let mut manager = manager(&provider);

        let err = manager
            .get_limit("c1", ResourceCategory::BlkioWeight)
            .unwrap_err();
        assert!(matches!(err, ManagerError::GetLimitFailed { .. }));
        assert!(provider.balanced());
    }

    #[test]
    fn test_get_limit_value_too_large() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        provider
            .world
            .borrow_mut()
            .containers
            .get_mut("c1")
            .unwrap()
            .cgroup
            .insert(
                String::from("memory.limit_in_bytes"),
                "9".repeat(RESOURCE_VALUE_CAPACITY),
            );
        let mut manager = manager(&provider);

        // The trailing newline pushes the value one byte past the buffer.
        let err = manager
            .get_limit("c1", ResourceCategory::MemoryLimit)
            .unwrap_err();
        assert_eq!(
            err,
            ManagerError::GetLimitFailed {
                name: String::from("c1"),
                category: ResourceCategory::MemoryLimit,
                reason: format!(
                    "value needs {} bytes, buffer holds {}",
                    RESOURCE_VALUE_CAPACITY + 1,
                    RESOURCE_VALUE_CAPACITY
                ),
            }
        );
    }

    #[test]
    fn test_get_limit_without_pid() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        provider.fail("init_pid", None);
        let mut manager = manager(&provider);

        assert_eq!(
            manager.get_limit("c1", ResourceCategory::CpuShares),
            Err(ManagerError::PidUnavailable {
                name: String::from("c1")
            })
        );
        assert_eq!(provider.calls("get_cgroup_item"), 0);
        assert!(provider.balanced());
    }
}
