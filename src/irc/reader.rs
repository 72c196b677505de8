//! The per-server receive thread.
//!
//! Each connected server gets one named thread that blocks on its socket,
//! reassembles lines, parses them without the lock and dispatches each one
//! with the lock held. The thread owns a clone of the socket; disconnect
//! raises the stop flag, shuts the socket down to unblock the read, and
//! joins the thread.

use crate::app::event::{EventSender, ServerId};
use crate::app::state::{ClientState, ConnectionState};
use crate::error::ClientError;
use crate::irc::dispatch::{dispatch, DispatchOptions};
use crate::irc::framing::{LineBuffer, READ_CHUNK};
use crate::irc::message::parse;
use parking_lot::Mutex;
use std::io::{self, Read};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug)]
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ReaderHandle {
    /// Ask the thread to exit after its current read returns.
    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Block until the thread has exited. Must not be called with the client
    /// lock held: the thread takes that lock to dispatch and to clear
    /// `reader_active` on exit.
    pub fn join(self) {
        self.signal_stop();
        if self.thread.join().is_err() {
            tracing::error!("IRC reader thread panicked");
        }
    }
}

pub fn spawn_reader(
    state: Arc<Mutex<ClientState>>,
    server_id: ServerId,
    stream: TcpStream,
    events: EventSender,
) -> io::Result<ReaderHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let thread = thread::Builder::new()
        .name(format!("irc-reader-{}", server_id))
        .spawn(move || run_reader(state, server_id, stream, flag, events))?;
    Ok(ReaderHandle { stop, thread })
}

fn run_reader(
    state: Arc<Mutex<ClientState>>,
    server_id: ServerId,
    mut stream: TcpStream,
    stop: Arc<AtomicBool>,
    events: EventSender,
) {
    tracing::debug!(server_id, "IRC reader started");
    let mut lines = LineBuffer::new();
    let mut buf = [0u8; READ_CHUNK];

    let outcome = 'read: loop {
        if stop.load(Ordering::SeqCst) || !still_connected(&state, server_id) {
            break Ok(());
        }

        let n = match stream.read(&mut buf) {
            Ok(0) => break Err(ClientError::PeerClosed),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break Err(ClientError::Read(e)),
        };

        for line in lines.feed(&buf[..n]) {
            tracing::debug!(server_id, "Received: {}", line);
            let msg = match parse(&line).map_err(ClientError::from) {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(server_id, "Dropping line: {}", e);
                    continue;
                }
            };

            let mut guard = state.lock();
            let opts = DispatchOptions {
                autojoin_on_welcome: guard.behavior.autojoin_on_welcome,
            };
            let Some(server) = guard.get_server_mut(server_id) else {
                continue;
            };
            if let Err(e) = dispatch(server, &msg, &events, opts) {
                if e.is_connection_error() {
                    break 'read Err(e);
                }
            }
        }
    };

    let mut guard = state.lock();
    let Some(server) = guard.get_server_mut(server_id) else {
        return;
    };
    server.reader_active = false;

    let Err(err) = outcome else {
        tracing::debug!(server = %server.name, "IRC reader stopped");
        return;
    };
    if stop.load(Ordering::SeqCst) {
        tracing::debug!(server = %server.name, "IRC reader stopped after disconnect: {}", err);
        return;
    }

    let status = match &err {
        ClientError::PeerClosed => {
            tracing::info!(server = %server.name, "Server closed connection");
            "Connection closed by server".to_string()
        }
        ClientError::Read(e) => {
            tracing::error!(server = %server.name, "recv() error: {}", e);
            format!("Read error: {}", e)
        }
        ClientError::Send(e) => {
            tracing::error!(server = %server.name, "send() error: {}", e);
            format!("Send failed: {}", e)
        }
        other => other.to_string(),
    };
    if server.state == ConnectionState::Connected {
        server.state = ConnectionState::Error;
    }
    events.status(server_id, None, status);
}

fn still_connected(state: &Mutex<ClientState>, server_id: ServerId) -> bool {
    state
        .lock()
        .get_server(server_id)
        .is_some_and(|s| s.state == ConnectionState::Connected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event::{Event, EventKind};
    use crate::config::model::{BehaviorConfig, LimitsConfig, ServerConfig};
    use std::io::Write;
    use std::net::{Shutdown, TcpListener};
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;

    struct Harness {
        state: Arc<Mutex<ClientState>>,
        rx: mpsc::UnboundedReceiver<Event>,
        peer: TcpStream,
        handle: ReaderHandle,
        client: TcpStream,
    }

    fn start() -> Harness {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (peer, _) = listener.accept().unwrap();

        let mut state = ClientState::new(LimitsConfig::default(), BehaviorConfig::default());
        let id = state
            .add_server(&ServerConfig::new("local", "127.0.0.1", "me"))
            .unwrap();
        {
            let srv = state.get_server_mut(id).unwrap();
            srv.stream = Some(client.try_clone().unwrap());
            srv.state = ConnectionState::Connected;
            srv.reader_active = true;
        }
        let state = Arc::new(Mutex::new(state));

        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventSender::new(tx, "[%H:%M:%S]");
        let handle = spawn_reader(Arc::clone(&state), id, client.try_clone().unwrap(), events).unwrap();
        Harness {
            state,
            rx,
            peer,
            handle,
            client,
        }
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(event) = rx.try_recv() {
                return event;
            }
            assert!(Instant::now() < deadline, "timed out waiting for event");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn reassembles_split_lines_in_order() {
        let mut h = start();
        h.peer.write_all(b":me!u@h JOIN :#ru").unwrap();
        thread::sleep(Duration::from_millis(20));
        h.peer
            .write_all(b"st\r\n:bob!b@h PRIVMSG #rust :one\r\n:bob!b@h PRIV")
            .unwrap();
        thread::sleep(Duration::from_millis(20));
        h.peer.write_all(b"MSG #rust :two\r\n").unwrap();

        assert_eq!(next_event(&mut h.rx).text, "Now talking in #rust");
        assert!(next_event(&mut h.rx).text.ends_with("<bob> one"));
        assert!(next_event(&mut h.rx).text.ends_with("<bob> two"));

        h.state.lock().servers[0].state = ConnectionState::Disconnected;
        h.handle.signal_stop();
        h.client.shutdown(Shutdown::Both).unwrap();
        h.handle.join();
        assert!(!h.state.lock().servers[0].reader_active());
    }

    #[test]
    fn peer_close_moves_server_to_error() {
        let mut h = start();
        h.peer.shutdown(Shutdown::Both).unwrap();
        drop(h.peer);

        let event = next_event(&mut h.rx);
        assert_eq!(event.kind, EventKind::StatusLine);
        assert_eq!(event.text, "Connection closed by server");

        h.handle.join();
        let guard = h.state.lock();
        assert_eq!(guard.servers[0].state, ConnectionState::Error);
        assert!(!guard.servers[0].reader_active());
    }

    #[test]
    fn failed_reply_ends_reader_with_status() {
        let mut h = start();
        h.client.shutdown(Shutdown::Write).unwrap();
        h.peer.write_all(b"PING :token123\r\n").unwrap();

        let event = next_event(&mut h.rx);
        assert_eq!(event.kind, EventKind::StatusLine);
        assert!(event.text.starts_with("Send failed: "));

        h.handle.join();
        let guard = h.state.lock();
        assert_eq!(guard.servers[0].state, ConnectionState::Error);
        assert!(!guard.servers[0].reader_active());
    }

    #[test]
    fn stop_signal_exits_quietly() {
        let mut h = start();
        h.handle.signal_stop();
        h.client.shutdown(Shutdown::Both).unwrap();
        h.handle.join();

        let guard = h.state.lock();
        assert_eq!(guard.servers[0].state, ConnectionState::Connected);
        assert!(!guard.servers[0].reader_active());
        assert!(h.rx.try_recv().is_err());
    }
}
