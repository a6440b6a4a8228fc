//! Manual command queue.
//!
//! Implements [`CommandPort`] over an mpsc channel.  Producers (the stdin
//! reader thread, the RF receiver pipe reader) push parsed
//! [`ManualCommand`]s tagged with their origin; the control thread drains
//! them once per tick.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use log::{debug, info, warn};

use crate::app::commands::{CommandOrigin, ManualCommand};
use crate::app::ports::CommandPort;

pub struct CommandQueue {
    rx: Receiver<ManualCommand>,
}

impl CommandQueue {
    pub fn channel() -> (Sender<ManualCommand>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    /// A queue nobody can push to.
    pub fn empty() -> Self {
        Self::channel().1
    }
}

impl CommandPort for CommandQueue {
    fn poll_manual(&mut self) -> Vec<ManualCommand> {
        self.rx.try_iter().collect()
    }
}

/// Parse one command per line of `reader` until EOF or until the queue is
/// gone.  Blank lines and `#` comments are skipped; bad lines are logged.
fn forward_lines<R: BufRead>(reader: R, origin: CommandOrigin, tx: &Sender<ManualCommand>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Command input failed: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<ManualCommand>() {
            Ok(cmd) => {
                info!("Manual command queued ({:?}): {}", origin, cmd);
                if tx.send(cmd.with_origin(origin)).is_err() {
                    break;
                }
            }
            Err(e) => warn!("Bad command \"{}\": {}", line, e),
        }
    }
}

/// Read commands from `reader` on a background thread.
pub fn spawn_line_reader<R>(
    reader: R,
    origin: CommandOrigin,
    tx: Sender<ManualCommand>,
) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("commands".into())
        .spawn(move || {
            forward_lines(reader, origin, &tx);
            debug!("Command reader finished");
        })
}

/// Operator commands from the process's stdin.
pub fn spawn_stdin_reader(tx: Sender<ManualCommand>) -> io::Result<JoinHandle<()>> {
    spawn_line_reader(io::BufReader::new(io::stdin()), CommandOrigin::Operator, tx)
}

/// Commands decoded by an RF receiver daemon, one per line of `path`
/// (usually a FIFO).  The file is opened on the reader thread since opening
/// a FIFO blocks until the writer shows up.
pub fn spawn_radio_reader(path: &Path, tx: Sender<ManualCommand>) -> io::Result<JoinHandle<()>> {
    let path = path.to_path_buf();
    std::thread::Builder::new()
        .name("radio-commands".into())
        .spawn(move || {
            match File::open(&path) {
                Ok(file) => forward_lines(io::BufReader::new(file), CommandOrigin::Radio, &tx),
                Err(e) => warn!("Cannot open radio command source {}: {}", path.display(), e),
            }
            debug!("Radio command reader finished");
        })
}
