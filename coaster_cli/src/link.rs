//! Line transport over stdin/stdout standing in for the wireless link.
//!
//! Inbound bytes are read on their own thread and fed to a core `Connection`.
//! Outbound responses travel over a channel to a writer thread so the control
//! loop never blocks on stdout.

use coaster_core::CommandIngress;
use coaster_traits::Notifier;
use crossbeam_channel::{Receiver, Sender};
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outbound half handed to the controller.
pub struct ChannelNotifier {
    tx: Sender<String>,
    peer: Arc<AtomicBool>,
}

impl Notifier for ChannelNotifier {
    fn is_connected(&self) -> bool {
        self.peer.load(Ordering::Relaxed)
    }

    fn notify(&mut self, payload: &str) -> Result<(), BoxError> {
        self.tx.send(payload.to_string())?;
        Ok(())
    }
}

/// Start the writer thread; it exits when every sender is dropped.
pub fn spawn_writer<W>(out: W) -> std::io::Result<(ChannelNotifier, JoinHandle<()>)>
where
    W: Write + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded::<String>();
    let peer = Arc::new(AtomicBool::new(true));
    let peer_w = Arc::clone(&peer);
    let handle = std::thread::Builder::new()
        .name("link-writer".into())
        .spawn(move || write_loop(&rx, out, &peer_w))?;
    Ok((ChannelNotifier { tx, peer }, handle))
}

fn write_loop<W: Write>(rx: &Receiver<String>, mut out: W, peer: &AtomicBool) {
    for msg in rx {
        let res = writeln!(out, "{msg}").and_then(|()| out.flush());
        if let Err(e) = res {
            tracing::warn!(error = %e, "link output closed; peer detached");
            peer.store(false, Ordering::Relaxed);
            return;
        }
    }
}

/// Start the reader thread. When `stop_on_eof` is set, end of input raises
/// `shutdown`.
pub fn spawn_reader<R>(
    mut input: R,
    ingress: CommandIngress,
    shutdown: Arc<AtomicBool>,
    stop_on_eof: bool,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("link-reader".into())
        .spawn(move || {
            let mut conn = ingress.connect();
            let mut buf = [0u8; 256];
            loop {
                match input.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        conn.on_bytes(&buf[..n]);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "link input failed");
                        break;
                    }
                }
            }
            tracing::debug!("link input closed");
            if stop_on_eof {
                shutdown.store(true, Ordering::Relaxed);
            }
        })
}
