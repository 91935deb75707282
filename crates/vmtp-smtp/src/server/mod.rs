//! SMTP server with the VMTP extension.
//!
//! Each accepted connection gets its own task and its own [`Dispatcher`];
//! sessions share only the read-only configuration and the handler.

mod config;
mod dispatcher;
mod handler;

pub use config::{DEFAULT_MAX_MESSAGE_SIZE, DispatcherConfig, DispatcherConfigBuilder};
pub use dispatcher::{Action, Dispatcher, Phase};
pub use handler::{MailHandler, ReceivedMail};

use crate::connection::SmtpStream;
use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, info, warn};

/// TCP listener serving SMTP sessions.
pub struct Server {
    listener: TcpListener,
    config: Arc<DispatcherConfig>,
    handler: Arc<dyn MailHandler>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("listener", &self.listener)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Binds the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        config: DispatcherConfig,
        handler: impl MailHandler,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            config: Arc::new(config),
            handler: Arc::new(handler),
        })
    }

    /// Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves connections until the process ends.
    ///
    /// # Errors
    ///
    /// Never returns an error in practice; accept failures are logged.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves connections until `shutdown` completes.
    ///
    /// Sessions already running are left to finish on their own tasks.
    ///
    /// # Errors
    ///
    /// Never returns an error in practice; accept failures are logged.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(
            addr = ?self.listener.local_addr().ok(),
            hostname = %self.config.hostname,
            vmtp = self.config.enable_vmtp,
            "VMTP server listening"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((tcp, peer)) => {
                        let dispatcher = Dispatcher::new(Arc::clone(&self.config), Some(peer));
                        let handler = Arc::clone(&self.handler);
                        tokio::spawn(async move {
                            let stream = SmtpStream::new(tcp);
                            match serve_connection(stream, dispatcher, handler.as_ref()).await {
                                Ok(()) => debug!(%peer, "Session closed"),
                                Err(Error::ConnectionClosed) => debug!(%peer, "Client disconnected"),
                                Err(e) => warn!(%peer, error = %e, "Session failed"),
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Accept failed"),
                },
                () = &mut shutdown => {
                    info!("VMTP server shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// Runs one SMTP session on an established stream.
///
/// # Errors
///
/// Returns an error if the stream fails or the client disconnects without
/// `QUIT` ([`Error::ConnectionClosed`]).
pub async fn serve_connection<S>(
    mut stream: SmtpStream<S>,
    mut dispatcher: Dispatcher,
    handler: &dyn MailHandler,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_reply(&dispatcher.greeting()).await?;

    loop {
        if dispatcher.phase() == Phase::DataTransfer {
            let read = stream.read_raw_line().await;
            let line = refuse_long_line(&mut stream, read).await?;
            let Some(result) = dispatcher.data_line(&line) else {
                continue;
            };

            let reply = match result {
                Ok(mail) => {
                    info!(
                        sender = %mail.sender,
                        recipients = mail.recipients.len(),
                        metadata = mail.metadata.len(),
                        bytes = mail.data.len(),
                        "Message received"
                    );
                    handler.accept(&mail).map_or_else(|reply| reply, |()| Reply::ok())
                }
                Err(reply) => reply,
            };
            stream.write_reply(&reply).await?;
            continue;
        }

        let read = stream.read_line().await;
        let line = refuse_long_line(&mut stream, read).await?;
        debug!(%line, "Command received");
        match dispatcher.handle_line(&line) {
            Action::Reply(reply) => stream.write_reply(&reply).await?,
            Action::Close(reply) => {
                stream.write_reply(&reply).await?;
                return Ok(());
            }
        }
    }
}

/// Answers an overlong line with `500` before the session ends.
async fn refuse_long_line<S, T>(stream: &mut SmtpStream<S>, read: Result<T>) -> Result<T>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Err(Error::LineTooLong { .. }) = &read {
        stream
            .write_reply(&Reply::single(ReplyCode::SYNTAX_ERROR, "Line too long"))
            .await?;
    }
    read
}
