//! Shell subprocess runner with live, line-buffered output

use crate::core::logger::{Level, Logger};
use crate::process::{CommandError, CommandRunner};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs commands through the platform shell
///
/// stdout and stderr are read concurrently and each complete line is sent
/// to the logger as soon as it arrives. Both streams go to the info
/// channel: many tools (git among them) report progress on stderr.
#[derive(Clone)]
pub struct ShellRunner {
    logger: Arc<dyn Logger>,
}

impl ShellRunner {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    fn command(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            // Passed verbatim: cmd.exe does not undo Rust's argument quoting
            cmd.arg("/C").raw_arg(command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

/// Forward `reader` to the logger one line at a time
///
/// A final line without a trailing newline is still emitted at EOF.
async fn forward_lines<R>(reader: R, logger: &dyn Logger, level: Level) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        logger.write(level, line, true);
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn execute(&self, command: &str, dir: &Path) -> Result<(), CommandError> {
        debug!("Spawning `{}` in {}", command, dir.display());

        let mut child = Self::command(command)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let logger = self.logger.as_ref();

        let (out, err) = tokio::join!(
            async {
                match stdout {
                    Some(stdout) => forward_lines(stdout, logger, Level::Info).await,
                    None => Ok(()),
                }
            },
            async {
                match stderr {
                    Some(stderr) => forward_lines(stderr, logger, Level::Info).await,
                    None => Ok(()),
                }
            }
        );
        for result in [out, err] {
            if let Err(e) = result {
                warn!("Lost output of `{}`: {}", command, e);
            }
        }

        let status = child.wait().await.map_err(|source| CommandError::Spawn {
            command: command.to_string(),
            source,
        })?;

        if status.success() {
            debug!("`{}` finished", command);
            Ok(())
        } else {
            debug!("`{}` exited with {:?}", command, status.code());
            Err(CommandError::Failed {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }
}
