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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LxcmgrErr {
    #[error("Failed to open {0}")]
    OpenFile(String),
    #[error("Failed to create directory {0}")]
    CreateDir(String),
    #[error("Failed to write {0}")]
    WriteFile(String),
    #[error("Failed to run {0}")]
    RunTool(String),
    #[error("Dup {0} error")]
    Dup(String),
    #[error("Failed to read from standard input")]
    ReadInput,
}
