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

mod console;
mod copy;
mod create;
mod exec;
mod limit;
mod list;
mod menu;
mod remove;

pub use console::Console;
pub use copy::CopyFile;
pub use create::Create;
pub use exec::Exec;
pub use limit::{GetLimit, SetLimit};
pub use list::List;
pub use menu::Menu;
pub use remove::Remove;

use std::io::Write;

use anyhow::{Error, Result};
use log::error;

use crate::container::{ManagerError, Step};

/// Print a failed operation for the operator. Failures of the container
/// managers also name the step that failed and the state left behind.
pub fn report_failure<W: Write>(out: &mut W, err: &Error) -> Result<()> {
    writeln!(out, "Error: {:#}", err)?;
    if let Some(e) = err.downcast_ref::<ManagerError>() {
        if e.step() != Step::Parse {
            error!(
                "Step {} failed for container {}",
                e.step(),
                e.container().unwrap_or("-")
            );
        }
        if let Some(state) = e.state_left() {
            writeln!(out, "Container is left {}", state)?;
        }
    }
    Ok(())
}
