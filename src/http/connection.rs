use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::http::parser::{parse_http_request_with_limit, ParseError};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::proxy::Router;

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    max_body_bytes: usize,
    buffer: BytesMut,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

/// Outcome of waiting for the next request.
enum ReadOutcome {
    Request(Request),
    /// The client sent something unusable; answer and close.
    Rejected(Response),
    Eof,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        router: Arc<Router>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            stream,
            peer,
            router,
            max_body_bytes,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Request(req) => ConnectionState::Processing(req),
                        ReadOutcome::Rejected(response) => {
                            ConnectionState::Writing(ResponseWriter::new(&response), false)
                        }
                        ReadOutcome::Eof => ConnectionState::Closed,
                    };
                }

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();
                    let mut response = self.router.dispatch(req, self.peer).await;
                    if !keep_alive {
                        response.headers.push(("Connection".to_string(), "close".to_string()));
                    }

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        // Send FIN after the response so the client sees it before any reset
                        let _ = self.stream.shutdown().await;
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request_with_limit(&self.buffer, self.max_body_bytes) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    tracing::warn!(peer = %self.peer, error = ?e, "Rejecting malformed request");
                    return Ok(ReadOutcome::Rejected(rejection(e)));
                }
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if !self.buffer.is_empty() {
                    tracing::debug!(peer = %self.peer, "Client closed mid-request");
                }
                return Ok(ReadOutcome::Eof);
            }
        }
    }
}

fn rejection(error: ParseError) -> Response {
    let status = match error {
        ParseError::UnsupportedTransferEncoding => StatusCode::NotImplemented,
        ParseError::HeadersTooLarge => StatusCode::Other(431),
        ParseError::BodyTooLarge => StatusCode::Other(413),
        _ => StatusCode::BadRequest,
    };

    let mut response = Response::plain(status);
    response.headers.push(("Connection".to_string(), "close".to_string()));
    response
}
