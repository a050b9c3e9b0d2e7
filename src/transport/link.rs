//! Trait abstraction for the control link to enable testing

use async_trait::async_trait;
use std::io;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// One established connection to the backend.
#[async_trait]
pub trait CommandLink: Send {
    /// Writes one complete frame and flushes it.
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Cleanly shuts the connection down.
    async fn shutdown(&mut self) -> io::Result<()>;
}

/// Factory producing fresh links, one per (re)connection attempt.
#[async_trait]
pub trait LinkConnector: Send {
    type Link: CommandLink;

    /// Opens a new connection to the fixed endpoint.
    async fn connect(&mut self) -> io::Result<Self::Link>;
}

/// TCP implementation of [`CommandLink`].
pub struct TcpCommandLink {
    stream: TcpStream,
}

#[async_trait]
impl CommandLink for TcpCommandLink {
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        debug!("Sent frame ({} bytes)", frame.len());
        Ok(())
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}

/// Connects [`TcpCommandLink`]s to a fixed endpoint with a bounded wait.
pub struct TcpConnector {
    endpoint: String,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout,
        }
    }

    /// The configured endpoint address.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LinkConnector for TcpConnector {
    type Link = TcpCommandLink;

    async fn connect(&mut self) -> io::Result<TcpCommandLink> {
        let connect = TcpStream::connect(&self.endpoint);
        let stream = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", self.endpoint),
                )
            })??;

        stream.set_nodelay(true)?;
        Ok(TcpCommandLink { stream })
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock link recording every frame it is asked to send.
    pub struct MockLink {
        pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
        pub fail_writes: Arc<Mutex<bool>>,
        pub shutdowns: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl CommandLink for MockLink {
        async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "mock link dropped",
                ));
            }
            self.sent.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        async fn shutdown(&mut self) -> io::Result<()> {
            *self.shutdowns.lock().unwrap() += 1;
            Ok(())
        }
    }

    /// Scriptable connector: each attempt pops the next scripted result.
    ///
    /// An empty script means "succeed". All links produced share the same
    /// sent-frame log and failure switch so tests can observe and disrupt
    /// the active connection.
    #[derive(Clone)]
    pub struct MockConnector {
        pub script: Arc<Mutex<VecDeque<io::Result<()>>>>,
        pub attempts: Arc<Mutex<u32>>,
        pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
        pub fail_writes: Arc<Mutex<bool>>,
        pub shutdowns: Arc<Mutex<u32>>,
    }

    impl MockConnector {
        pub fn new() -> Self {
            Self {
                script: Arc::new(Mutex::new(VecDeque::new())),
                attempts: Arc::new(Mutex::new(0)),
                sent: Arc::new(Mutex::new(Vec::new())),
                fail_writes: Arc::new(Mutex::new(false)),
                shutdowns: Arc::new(Mutex::new(0)),
            }
        }

        /// Queues `n` failed connection attempts before the next success.
        pub fn fail_attempts(&self, n: usize) {
            let mut script = self.script.lock().unwrap();
            for _ in 0..n {
                script.push_back(Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "mock connect refused",
                )));
            }
        }

        /// Makes the active link fail every write (simulated drop).
        pub fn drop_link(&self) {
            *self.fail_writes.lock().unwrap() = true;
        }

        /// Heals the link for frames sent after the next reconnect.
        pub fn heal_link(&self) {
            *self.fail_writes.lock().unwrap() = false;
        }

        pub fn attempts(&self) -> u32 {
            *self.attempts.lock().unwrap()
        }

        pub fn sent_frames(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_lines(&self) -> Vec<String> {
            self.sent_frames()
                .iter()
                .map(|frame| String::from_utf8_lossy(frame).trim_end().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl LinkConnector for MockConnector {
        type Link = MockLink;

        async fn connect(&mut self) -> io::Result<MockLink> {
            *self.attempts.lock().unwrap() += 1;
            if let Some(result) = self.script.lock().unwrap().pop_front() {
                result?;
            }
            Ok(MockLink {
                sent: Arc::clone(&self.sent),
                fail_writes: Arc::clone(&self.fail_writes),
                shutdowns: Arc::clone(&self.shutdowns),
            })
        }
    }
}
