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

use std::{fmt, str::FromStr};

use serde::Serialize;

use super::ManagerError;

/// Capacity of the buffer a cgroup value is read into.
pub const RESOURCE_VALUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    CpuShares,
    MemoryLimit,
    BlkioWeight,
    NetClassId,
}

impl ResourceCategory {
    /// All categories, in the order they are offered to the operator.
    pub const ALL: [ResourceCategory; 4] = [
        ResourceCategory::CpuShares,
        ResourceCategory::MemoryLimit,
        ResourceCategory::BlkioWeight,
        ResourceCategory::NetClassId,
    ];

    pub fn from_index(index: usize) -> Result<Self, ManagerError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| ManagerError::InvalidCategory(index.to_string()))
    }

    /// cgroup v1 control file the category is written to.
    pub fn subsystem_key(&self) -> &'static str {
        match self {
            ResourceCategory::CpuShares => "cpu.cfs_quota_us",
            ResourceCategory::MemoryLimit => "memory.limit_in_bytes",
            ResourceCategory::BlkioWeight => "blkio.weight",
            ResourceCategory::NetClassId => "net_cls.classid",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResourceCategory::CpuShares => "cpu",
            ResourceCategory::MemoryLimit => "memory",
            ResourceCategory::BlkioWeight => "blkio",
            ResourceCategory::NetClassId => "net_cls",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ResourceCategory::CpuShares => "CPU shares",
            ResourceCategory::MemoryLimit => "memory limit",
            ResourceCategory::BlkioWeight => "block I/O weight",
            ResourceCategory::NetClassId => "network class id",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.subsystem_key())
    }
}

impl FromStr for ResourceCategory {
    type Err = ManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|c| c.name() == lower || c.subsystem_key() == lower)
            .copied()
            .ok_or_else(|| ManagerError::InvalidCategory(s.to_string()))
    }
}

pub fn encode_value(value: &str) -> &str {
    value.trim()
}

/// Decode a value read from a cgroup control file: bytes up to the first NUL,
/// without the trailing newline.
pub fn decode_value(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).trim_end().to_string()
}
