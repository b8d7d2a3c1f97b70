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

use super::ManagerError;

/// Maximum number of tokens accepted in one command.
pub const MAX_ARGS: usize = 128;

/// Split `raw` on runs of the space character. Empty tokens are dropped.
pub fn tokenize(raw: &str) -> Result<Vec<String>, ManagerError> {
    let argv: Vec<String> = raw
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect();

    if argv.len() > MAX_ARGS {
        return Err(ManagerError::TooManyArguments {
            count: argv.len(),
            max: MAX_ARGS,
        });
    }
    Ok(argv)
}

/// A command line to run inside a container, kept together with its
/// argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    raw: String,
    argv: Vec<String>,
}

impl CommandSpec {
    pub fn parse(raw: &str) -> Result<Self, ManagerError> {
        let argv = tokenize(raw)?;
        if argv.is_empty() {
            return Err(ManagerError::EmptyCommand);
        }
        Ok(Self {
            raw: raw.to_string(),
            argv,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Executable path, which is also `argv[0]`.
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}
