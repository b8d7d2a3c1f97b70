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
use log::{debug, error, info};
use serde::Serialize;

use super::ContainerManager;
use crate::{
    container::{AddressFamily, ContainerState, ManagerError, Provider, RuntimeHandle},
    utils::{ActivityRecorder, Severity},
};

const ADDRESS_IFACE: &str = "eth0";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub name: String,
    pub state: ContainerState,
    pub pid: Option<pid_t>,
    pub address: Option<String>,
}

impl ContainerRecord {
    fn from_handle<H: RuntimeHandle>(handle: &H) -> Self {
        let state = ContainerState::query(handle);
        let pid = if state == ContainerState::Running {
            handle.init_pid()
        } else {
            None
        };
        let address = handle.get_ip(ADDRESS_IFACE, AddressFamily::Inet, 0);
        if address.is_none() {
            debug!("No IPv4 address on {} of {}", ADDRESS_IFACE, handle.name());
        }

        Self {
            name: handle.name().to_string(),
            state,
            pid,
            address,
        }
    }
}

/// Result of an enumeration. No running containers is reported as its own
/// case rather than an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inventory {
    NoneActive,
    Active(Vec<ContainerRecord>),
}

impl Inventory {
    pub fn records(&self) -> &[ContainerRecord] {
        match self {
            Inventory::NoneActive => &[],
            Inventory::Active(records) => records,
        }
    }
}

impl<P: Provider, R: ActivityRecorder> ContainerManager<P, R> {
    pub fn list_active(&mut self) -> Result<Inventory, ManagerError> {
        let (count, handles) = self.provider.list_active();
        if count < 0 {
            error!("Failed to list active containers, count {}", count);
            return Err(ManagerError::EnumerationFailed { count });
        }

        let records: Vec<ContainerRecord> =
            handles.iter().map(ContainerRecord::from_handle).collect();
        drop(handles);

        info!("{} active containers", records.len());
        self.record(
            Severity::Info,
            &format!("Listed {} active containers", records.len()),
        );
        if records.is_empty() {
            return Ok(Inventory::NoneActive);
        }
        Ok(Inventory::Active(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{container::tests::FakeProvider, manager::tests::manager};

    #[test]
    fn test_list_none_active() {
        let provider = FakeProvider::new();
        provider.add("stopped", false, None);
        let mut manager = manager(&provider);

        let inventory = manager.list_active().unwrap();
        assert_eq!(inventory, Inventory::NoneActive);
        assert!(inventory.records().is_empty());
        assert_eq!(
            manager.recorder().messages(Severity::Info),
            vec!["Listed 0 active containers"]
        );
    }

    #[test]
    fn test_list_enumeration_failure() {
        let provider = FakeProvider::new();
        provider.world.borrow_mut().active_count = Some(-1);
        let mut manager = manager(&provider);

        assert_eq!(
            manager.list_active(),
            Err(ManagerError::EnumerationFailed { count: -1 })
        );
        assert!(manager.recorder().entries.is_empty());
    }

    #[test]
    fn test_list_active_records() {
        let provider = FakeProvider::new();
        provider.add("web", true, Some("10.0.3.15"));
        provider.add("db", true, None);
        provider.add("idle", false, Some("10.0.3.99"));
        let mut manager = manager(&provider);

        let inventory = manager.list_active().unwrap();
        let records = inventory.records();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "db");
        assert_eq!(records[0].state, ContainerState::Running);
        assert!(records[0].pid.is_some());
        assert_eq!(records[0].address, None);

        assert_eq!(records[1].name, "web");
        assert_eq!(records[1].state, ContainerState::Running);
        assert!(records[1].pid.is_some());
        assert_eq!(records[1].address.as_deref(), Some("10.0.3.15"));

        assert_eq!(
            manager.recorder().messages(Severity::Info),
            vec!["Listed 2 active containers"]
        );
        assert!(provider.balanced());
    }

    #[test]
    fn test_list_survives_address_lookup_failure() {
        let provider = FakeProvider::new();
        provider.add("web", true, Some("10.0.3.15"));
        provider.fail("get_ip", None);
        let mut manager = manager(&provider);

        let inventory = manager.list_active().unwrap();
        assert_eq!(
            inventory.records(),
            [ContainerRecord {
                name: String::from("web"),
                state: ContainerState::Running,
                pid: provider.world.borrow().containers.get("web").unwrap().pid,
                address: None,
            }]
        );
    }

    #[test]
    fn test_record_json() {
        let record = ContainerRecord {
            name: String::from("web"),
            state: ContainerState::Running,
            pid: Some(4242),
            address: None,
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"name":"web","state":"running","pid":4242,"address":null}"#
        );
    }
}
