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

use std::{
    os::fd::{FromRawFd, OwnedFd, RawFd},
    process::Stdio,
};

use anyhow::{Context, Result};
use nix::unistd::dup;

use crate::{container::ConsoleStdio, utils::LxcmgrErr};

pub struct ChildStdio {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

fn dup_stdio(fd: RawFd, name: &str) -> Result<Stdio> {
    let new_fd = dup(fd).with_context(|| LxcmgrErr::Dup(name.to_string()))?;
    // SAFETY: new_fd was just returned by dup() and has no other owner.
    let owned = unsafe { OwnedFd::from_raw_fd(new_fd) };
    Ok(Stdio::from(owned))
}

/// Duplicate the console descriptors so the child gets its own copies and the
/// caller's descriptors stay open after the session.
pub fn connect_stdio(stdio: &ConsoleStdio) -> Result<ChildStdio> {
    Ok(ChildStdio {
        stdin: dup_stdio(stdio.stdin, "stdin")?,
        stdout: dup_stdio(stdio.stdout, "stdout")?,
        stderr: dup_stdio(stdio.stderr, "stderr")?,
    })
}

/// Render an escape byte in the `^x` notation lxc-console expects, so 1
/// becomes "^a".
pub fn escape_notation(escape: u8) -> Option<String> {
    match escape {
        1..=26 => Some(format!("^{}", (b'a' + escape - 1) as char)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::File,
        io::{Read, Write},
        os::fd::AsRawFd,
        process::Command,
    };

    use super::*;

    #[test]
    fn test_escape_notation() {
        assert_eq!(escape_notation(1).unwrap(), "^a");
        assert_eq!(escape_notation(17).unwrap(), "^q");
        assert_eq!(escape_notation(26).unwrap(), "^z");
        assert!(escape_notation(0).is_none());
        assert!(escape_notation(b'a').is_none());
    }

    #[test]
    fn test_connect_stdio_keeps_caller_fds() {
        let path = "/tmp/lxcmgr_connect_stdio";
        let mut file = File::create(path).unwrap();
        let fd = file.as_raw_fd();
        let stdio = ConsoleStdio {
            stdin: fd,
            stdout: fd,
            stderr: fd,
        };

        let child = connect_stdio(&stdio).unwrap();
        let status = Command::new("echo")
            .arg("from child")
            .stdin(child.stdin)
            .stdout(child.stdout)
            .stderr(child.stderr)
            .status()
            .unwrap();
        assert!(status.success());

        // The original descriptor is still usable.
        file.write_all(b"from parent\n").unwrap();
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "from child\nfrom parent\n");
        std::fs::remove_file(path).unwrap();
    }
}
