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

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    container::Provider,
    manager::{ContainerManager, ContainerRecord, Inventory},
    utils::ActivityRecorder,
};

/// List running containers
#[derive(Parser, Debug, Default)]
pub struct List {
    /// Print the containers as JSON
    #[arg(long)]
    pub json: bool,
}

fn row(record: &ContainerRecord) -> String {
    let pid = record.pid.map_or(String::from("-"), |p| p.to_string());
    format!(
        "{:<20} {:<10} {:<8} {}",
        record.name,
        record.state.to_string(),
        pid,
        record.address.as_deref().unwrap_or("-")
    )
}

impl List {
    pub fn run<P: Provider, R: ActivityRecorder, W: Write>(
        &self,
        manager: &mut ContainerManager<P, R>,
        out: &mut W,
    ) -> Result<()> {
        let inventory = manager.list_active()?;

        if self.json {
            let json_data = serde_json::to_string_pretty(inventory.records())
                .with_context(|| "Failed to get json data of active containers")?;
            writeln!(out, "{}", json_data)?;
            return Ok(());
        }

        let records = match &inventory {
            Inventory::NoneActive => {
                writeln!(out, "No active containers")?;
                return Ok(());
            }
            Inventory::Active(records) => records,
        };
        writeln!(out, "{:<20} {:<10} {:<8} {}", "NAME", "STATE", "PID", "IPV4")?;
        for record in records {
            writeln!(out, "{}", row(record))?;
        }
        Ok(())
    }
}
