use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::thread;
use anyhow::Result;
use crate::error::LauncherError;
use crate::model::MenuItem;

/// Runs the action behind a menu item.
pub trait Executor {
    fn execute(&mut self, item: &MenuItem) -> Result<()>;
}

/// Starts items as detached child processes.
pub struct ProcessExecutor {
    terminal: Option<String>,
}

impl ProcessExecutor {
    pub fn new(terminal: Option<String>) -> Self {
        Self { terminal }
    }
}

impl Executor for ProcessExecutor {
    fn execute(&mut self, item: &MenuItem) -> Result<()> {
        let argv = item.command_line(self.terminal.as_deref());
        let Some((program, args)) = argv.split_first() else {
            return Err(LauncherError::EmptyCommand(item.display_name().to_string()).into());
        };

        let mut command = Command::new(program);
        command.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        let mut child = command.spawn().map_err(|source| LauncherError::Spawn {
            command: argv.join(" "),
            source,
        })?;
        log::info!("Launched '{}' (pid {})", item.display_name(), child.id());

        // The launcher may outlive the child; reap it so it does not linger.
        thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(())
    }
}
