// src/exec/pty.rs

//! Production process backend.
//!
//! Each body is written to a temporary script and run as
//! `interpreter <script> <positional args>`. Combined stdout/stderr go
//! through a pseudo-terminal so children keep their terminal behaviour
//! (colors, line buffering); `ONLCR` is turned off so bytes are not
//! rewritten on the way. Without a pseudo-terminal, two plain pipes are
//! merged instead.

use std::future::Future;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::Context;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::backend::{ProcessBackend, RunOutput, SpawnRequest};
use crate::exec::output::{LinePrinter, OutputSink};

const READ_CHUNK: usize = 4096;

enum ReadEvent {
    Data(Vec<u8>),
    Closed,
}

/// Runs task bodies as real child processes and streams their output to a
/// sink.
#[derive(Debug, Clone)]
pub struct PtyBackend {
    sink: Arc<dyn OutputSink>,
}

impl PtyBackend {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }

    async fn run(&self, request: SpawnRequest) -> Result<RunOutput> {
        let script = write_script(&request)?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (mut child, mut open_streams) = spawn_child(&request, script.path(), tx)?;

        let pid = child.id();
        if let (Some(handle), Some(pid)) = (&request.running_child, pid) {
            handle.set(pid);
        }
        debug!(task = %request.task.name, ?pid, "spawned task process");

        let mut printer = match request.run_index {
            Some(index) => LinePrinter::prefixed(&request.task.name, index, request.padding),
            None => LinePrinter::passthrough(),
        };
        let mut captured = Vec::new();

        while open_streams > 0 {
            match rx.recv().await {
                Some(ReadEvent::Data(bytes)) => {
                    if !request.hide_output {
                        let framed = printer.feed(&bytes);
                        if !framed.is_empty() {
                            self.sink.stdout(&framed);
                        }
                    }
                    captured.extend_from_slice(&bytes);
                }
                Some(ReadEvent::Closed) => open_streams -= 1,
                None => break,
            }
        }
        if !request.hide_output {
            let rest = printer.finish();
            if !rest.is_empty() {
                self.sink.stdout(&rest);
            }
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of command '{}'", request.task.name))?;
        if let Some(handle) = &request.running_child {
            handle.clear();
        }

        while let Ok(event) = rx.try_recv() {
            if let ReadEvent::Data(bytes) = event {
                warn!(
                    task = %request.task.name,
                    "unexpected output after the output stream closed: {}",
                    String::from_utf8_lossy(&bytes)
                );
            }
        }

        let exit_code = exit_code(status);
        debug!(task = %request.task.name, exit_code, "task process exited");
        drop(script);
        Ok(RunOutput::new(exit_code, String::from_utf8_lossy(&captured)))
    }
}

impl ProcessBackend for PtyBackend {
    fn spawn(
        &self,
        request: SpawnRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutput>> + Send + '_>> {
        Box::pin(self.run(request))
    }
}

fn write_script(request: &SpawnRequest) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("rfile-")
        .tempfile()
        .context("creating temporary script file")?;
    file.write_all(request.prelude.text.as_bytes())?;
    file.write_all(request.task.body.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn base_command(request: &SpawnRequest, script: &Path) -> Command {
    let mut cmd = Command::new(&request.task.interpreter);
    cmd.arg(script)
        .args(request.positional_args())
        .envs(request.env())
        .current_dir(&request.cwd)
        .stdin(Stdio::inherit())
        .kill_on_drop(true);
    cmd
}

/// Spawn the child and start forwarding its output into `tx`. Returns the
/// child and how many streams will report [`ReadEvent::Closed`].
fn spawn_child(
    request: &SpawnRequest,
    script: &Path,
    tx: mpsc::UnboundedSender<ReadEvent>,
) -> anyhow::Result<(Child, usize)> {
    #[cfg(unix)]
    match unix::open_raw_pty() {
        Ok(pty) => return unix::spawn_on_pty(request, script, pty, tx),
        Err(err) => {
            info!(error = %err, "pseudo-terminal unavailable, falling back to pipes");
        }
    }
    spawn_on_pipes(request, script, tx)
}

fn spawn_on_pipes(
    request: &SpawnRequest,
    script: &Path,
    tx: mpsc::UnboundedSender<ReadEvent>,
) -> anyhow::Result<(Child, usize)> {
    let mut cmd = base_command(request, script);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for command '{}'", request.task.name))?;

    let mut streams = 0;
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(read_async(stdout, tx.clone()));
        streams += 1;
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(read_async(stderr, tx.clone()));
        streams += 1;
    }
    Ok((child, streams))
}

async fn read_async(mut reader: impl AsyncRead + Unpin, tx: mpsc::UnboundedSender<ReadEvent>) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(ReadEvent::Data(buf[..n].to_vec())).is_err() {
                    return;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!(error = %err, "output pipe closed");
                break;
            }
        }
    }
    let _ = tx.send(ReadEvent::Closed);
}

fn read_blocking(mut reader: impl Read, tx: mpsc::UnboundedSender<ReadEvent>) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(ReadEvent::Data(buf[..n].to_vec())).is_err() {
                    return;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            // EIO once every slave descriptor is closed.
            Err(err) => {
                debug!(error = %err, "terminal output closed");
                break;
            }
        }
    }
    let _ = tx.send(ReadEvent::Closed);
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(unix)]
mod unix {
    use std::path::Path;
    use std::process::Stdio;

    use anyhow::Context;
    use nix::pty::{OpenptyResult, Winsize, openpty};
    use nix::sys::termios::{OutputFlags, SetArg, Termios, tcgetattr, tcsetattr};
    use tokio::process::Child;
    use tokio::sync::mpsc;

    use super::{ReadEvent, base_command, read_blocking};
    use crate::exec::backend::SpawnRequest;

    pub(super) fn open_raw_pty() -> anyhow::Result<OpenptyResult> {
        let pty = openpty(None::<&Winsize>, None::<&Termios>).context("allocating a pseudo-terminal")?;
        let mut termios = tcgetattr(&pty.slave).context("reading terminal attributes")?;
        termios.output_flags.remove(OutputFlags::ONLCR);
        tcsetattr(&pty.slave, SetArg::TCSANOW, &termios).context("setting terminal attributes")?;
        Ok(pty)
    }

    pub(super) fn spawn_on_pty(
        request: &SpawnRequest,
        script: &Path,
        pty: OpenptyResult,
        tx: mpsc::UnboundedSender<ReadEvent>,
    ) -> anyhow::Result<(Child, usize)> {
        let OpenptyResult { master, slave } = pty;
        // The command owns the slave descriptors; they close when it drops,
        // so the master sees EOF once the child (and its children) exit.
        let child = {
            let mut cmd = base_command(request, script);
            let stdout = slave.try_clone().context("duplicating terminal descriptor")?;
            cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(slave));
            cmd.spawn()
                .with_context(|| format!("spawning process for command '{}'", request.task.name))?
        };

        let master = std::fs::File::from(master);
        tokio::task::spawn_blocking(move || read_blocking(master, tx));
        Ok((child, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn signals_map_above_128() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }
}
