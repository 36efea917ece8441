// ABOUTME: Async TCP adapter for the parcel wire format
// ABOUTME: Reads whole parcels off a socket and writes framed requests back

use crate::parcel::{MAX_PARCEL_SIZE, Parcel};
use crate::transport::Reassembler;
use bytes::BytesMut;
use std::collections::VecDeque;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// A parcel-framed TCP connection.
///
/// Handles the byte-level half of the protocol: socket reads go through the
/// [`Reassembler`] and come out as whole [`Parcel`]s, and outbound parcels
/// are framed and written through a buffered stream. Token correlation and
/// dispatch stay in [`RilTransport`]; this type only moves parcels.
///
/// [`RilTransport`]: crate::transport::RilTransport
#[derive(Debug)]
pub struct Connection {
    // The `TcpStream`, decorated with a `BufWriter` for write buffering.
    stream: BufWriter<TcpStream>,

    // Scratch buffer for socket reads.
    buffer: BytesMut,

    reassembler: Reassembler,

    // One socket read can complete several parcels; the extras wait here
    // for subsequent `read_parcel` calls.
    pending: VecDeque<Parcel>,
}

impl Connection {
    /// Create a new `Connection`, backed by `socket`.
    pub fn new(socket: TcpStream) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            // Default to a 4KB read buffer; SMS-sized parcels fit in one
            // read, larger payloads just take a few more.
            buffer: BytesMut::with_capacity(4 * 1024),
            reassembler: Reassembler::new(MAX_PARCEL_SIZE),
            pending: VecDeque::new(),
        }
    }

    /// Read a single `Parcel` from the underlying stream.
    ///
    /// The function waits until enough data has arrived to complete a
    /// parcel. Partial data stays buffered for the next call.
    ///
    /// # Returns
    ///
    /// On success, the received parcel is returned. If the `TcpStream` is
    /// closed in a way that doesn't break a parcel in half, it returns
    /// `None`. Otherwise, an error is returned.
    pub async fn read_parcel(&mut self) -> crate::Result<Option<Parcel>> {
        loop {
            if let Some(parcel) = self.pending.pop_front() {
                return Ok(Some(parcel));
            }

            // Not enough buffered data for a parcel; read more from the
            // socket. `0` indicates "end of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // The remote closed the connection. For this to be a clean
                // shutdown, no partial parcel may be in flight.
                return self
                    .reassembler
                    .is_idle()
                    .then_some(None)
                    .ok_or_else(|| "connection reset by peer".into());
            }

            // Clear the scratch buffer before any error can propagate, so a
            // caller retrying after a fatal error cannot double-feed these
            // bytes into the reassembler.
            let bodies = self.reassembler.feed(&self.buffer);
            self.buffer.clear();
            for body in bodies? {
                self.pending.push_back(Parcel::from_body(body)?);
            }
        }
    }

    /// Write a single `Parcel` to the underlying stream.
    ///
    /// The frame goes through the buffered writer and is flushed so the
    /// modem sees it immediately.
    pub async fn write_parcel(&mut self, parcel: &Parcel) -> io::Result<()> {
        self.stream.write_all(&parcel.encode_frame()).await?;
        self.stream.flush().await
    }
}
