// ABOUTME: Parcel transport: stream reassembly, token correlation, dispatch
// ABOUTME: Owns the outstanding-request table and the per-type callback lists

use crate::codec::PduError;
use crate::parcel::{MAX_PARCEL_SIZE, Parcel, ParcelKind, Payload, TransportError};
use crate::pdu;
use bytes::{Buf, Bytes, BytesMut};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

/// Sink for framed outbound bytes. The transport hands each complete frame
/// over exactly once; delivery is the collaborator's problem.
pub trait ByteSink {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;
}

impl ByteSink for Vec<u8> {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.extend_from_slice(frame);
        Ok(())
    }
}

/// A cloneable queue of whole outbound frames.
///
/// Useful when the writer lives elsewhere (an async task, a test): the
/// transport pushes frames in, the owner of the socket pops them out.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    frames: Arc<Mutex<VecDeque<Bytes>>>,
}

impl FrameQueue {
    pub fn new() -> FrameQueue {
        FrameQueue::default()
    }

    pub fn pop(&self) -> Option<Bytes> {
        self.frames.lock().ok()?.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().map(|frames| frames.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSink for FrameQueue {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut frames = self
            .frames
            .lock()
            .map_err(|_| io::Error::other("frame queue lock poisoned"))?;
        frames.push_back(Bytes::copy_from_slice(frame));
        Ok(())
    }
}

/// Reassembly state: either waiting for a 4-byte length prefix or for the
/// `n` body bytes it declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    AwaitingLength,
    AwaitingBody(usize),
}

/// Turns an arbitrarily chunked byte stream back into discrete parcel
/// bodies.
///
/// `feed` makes as much progress as the buffered bytes allow: a single call
/// may complete zero, one, or many bodies, and a body may take any number of
/// calls to accumulate. The machine is resumable at any byte boundary.
#[derive(Debug)]
pub struct Reassembler {
    state: ReadState,
    buffer: BytesMut,
    max_parcel_size: usize,
}

impl Reassembler {
    pub fn new(max_parcel_size: usize) -> Reassembler {
        Reassembler {
            state: ReadState::AwaitingLength,
            // Default to a 4KB buffer; it grows if a peer sends larger
            // parcels.
            buffer: BytesMut::with_capacity(4 * 1024),
            max_parcel_size,
        }
    }

    /// True when no partial parcel is pending.
    pub fn is_idle(&self) -> bool {
        self.state == ReadState::AwaitingLength && self.buffer.is_empty()
    }

    /// Buffer `data` and drain every body it completes.
    ///
    /// A declared length above the configured maximum is fatal: the error is
    /// returned before any byte of that body is consumed and the connection
    /// must be torn down.
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Bytes>, TransportError> {
        self.buffer.extend_from_slice(data);
        let mut bodies = Vec::new();
        loop {
            match self.state {
                ReadState::AwaitingLength => {
                    if self.buffer.len() < 4 {
                        break;
                    }
                    let mut prefix = [0u8; 4];
                    prefix.copy_from_slice(&self.buffer[..4]);
                    let declared = u32::from_be_bytes(prefix) as usize;
                    if declared > self.max_parcel_size {
                        return Err(TransportError::OversizedParcel {
                            declared,
                            max: self.max_parcel_size,
                        });
                    }
                    self.buffer.advance(4);
                    self.state = ReadState::AwaitingBody(declared);
                }
                ReadState::AwaitingBody(length) => {
                    if self.buffer.len() < length {
                        break;
                    }
                    bodies.push(self.buffer.split_to(length).freeze());
                    self.state = ReadState::AwaitingLength;
                }
            }
        }
        Ok(bodies)
    }
}

/// Callback identity handed back by [`RilTransport::add_callback`] so the
/// same closure can later be unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackId(u64);

/// Handler invoked for every dispatched parcel of its type, in registration
/// order. A returned error is logged and does not stop dispatch.
pub type Callback = Box<dyn FnMut(&Payload) -> crate::Result<()>>;

/// Payload decoder for one request type.
pub type DecoderFn = Box<dyn Fn(&Bytes) -> Result<Payload, PduError>>;

/// The parcel transport for one modem connection.
///
/// Single-threaded and event-driven: the byte source calls [`feed`]
/// whenever data arrives, and callbacks run synchronously from inside that
/// call. Callbacks must not re-enter the transport.
///
/// [`feed`]: RilTransport::feed
pub struct RilTransport {
    sink: Box<dyn ByteSink>,
    reassembler: Reassembler,
    /// Next token to assign; starts at 1 and never reuses a value.
    next_token: u32,
    outstanding: HashMap<u32, Parcel>,
    callbacks: HashMap<u32, Vec<(CallbackId, Callback)>>,
    decoders: HashMap<u32, DecoderFn>,
    next_callback_id: u64,
}

impl RilTransport {
    pub fn new(sink: Box<dyn ByteSink>) -> RilTransport {
        RilTransport::with_max_parcel_size(sink, MAX_PARCEL_SIZE)
    }

    pub fn with_max_parcel_size(sink: Box<dyn ByteSink>, max_parcel_size: usize) -> RilTransport {
        RilTransport {
            sink,
            reassembler: Reassembler::new(max_parcel_size),
            next_token: 1,
            outstanding: HashMap::new(),
            callbacks: HashMap::new(),
            decoders: HashMap::new(),
            next_callback_id: 0,
        }
    }

    /// Frame and send one request, returning its token.
    ///
    /// The sent parcel is recorded in the outstanding table until its
    /// response arrives; tokens are unique for the life of the transport.
    pub fn send(&mut self, type_code: u32, payload: &[u8]) -> Result<u32, TransportError> {
        let token = self.next_token;
        self.next_token += 1;
        let parcel = Parcel::request(type_code, token, Bytes::copy_from_slice(payload));
        let frame = parcel.encode_frame();
        tracing::debug!(type_code, token, len = frame.len(), "sending parcel");
        self.sink.write_frame(&frame)?;
        self.outstanding.insert(token, parcel);
        Ok(token)
    }

    /// Feed newly received bytes and dispatch every parcel they complete.
    ///
    /// Chunk boundaries need not align with parcel boundaries in any way.
    /// An error here is connection-fatal; drop the transport via [`close`]
    /// afterwards.
    ///
    /// [`close`]: RilTransport::close
    pub fn feed(&mut self, data: &[u8]) -> Result<(), TransportError> {
        for body in self.reassembler.feed(data)? {
            let parcel = Parcel::from_body(body)?;
            self.dispatch(parcel)?;
        }
        Ok(())
    }

    /// Dispatch one reassembled parcel.
    ///
    /// A response is matched to its outstanding request by token (a miss is
    /// a fatal protocol desync) and re-tagged with the request's type code
    /// so decoding uses the right schema. The decoded payload then goes to
    /// every callback registered for the type, in registration order;
    /// callback failures are isolated and logged.
    pub fn dispatch(&mut self, mut parcel: Parcel) -> Result<(), TransportError> {
        if parcel.kind == ParcelKind::Response {
            let request = self
                .outstanding
                .remove(&parcel.token)
                .ok_or(TransportError::UnknownToken(parcel.token))?;
            parcel.type_code = request.type_code;
        }

        let payload = match self.decoders.get(&parcel.type_code) {
            Some(decode) => match decode(&parcel.payload) {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::warn!(
                        type_code = parcel.type_code,
                        %error,
                        "payload decode failed, forwarding raw bytes"
                    );
                    Payload::Raw(parcel.payload.clone())
                }
            },
            None => {
                tracing::debug!(type_code = parcel.type_code, "no decoder registered");
                Payload::Raw(parcel.payload.clone())
            }
        };

        match self.callbacks.get_mut(&parcel.type_code) {
            Some(handlers) => {
                for (id, handler) in handlers.iter_mut() {
                    if let Err(error) = handler(&payload) {
                        tracing::warn!(
                            type_code = parcel.type_code,
                            callback = id.0,
                            %error,
                            "callback failed"
                        );
                    }
                }
            }
            None => {
                tracing::debug!(type_code = parcel.type_code, "no callbacks registered");
            }
        }
        Ok(())
    }

    /// Register a handler for a type code. Handlers for the same type run
    /// in the order they were added.
    pub fn add_callback(&mut self, type_code: u32, callback: Callback) -> CallbackId {
        let id = CallbackId(self.next_callback_id);
        self.next_callback_id += 1;
        self.callbacks
            .entry(type_code)
            .or_default()
            .push((id, callback));
        id
    }

    /// Unregister a previously added handler. Returns false when the id was
    /// not registered for that type.
    pub fn remove_callback(&mut self, type_code: u32, id: CallbackId) -> bool {
        match self.callbacks.get_mut(&type_code) {
            Some(handlers) => {
                let before = handlers.len();
                handlers.retain(|(handler_id, _)| *handler_id != id);
                handlers.len() != before
            }
            None => false,
        }
    }

    /// Install the payload decoder for a type code, replacing any previous
    /// one.
    pub fn set_decoder(&mut self, type_code: u32, decoder: DecoderFn) {
        self.decoders.insert(type_code, decoder);
    }

    /// Install a decoder that treats the payload as the hex text of an SMS
    /// PDU, e.g. for the new-SMS indication.
    pub fn set_sms_decoder(&mut self, type_code: u32) {
        self.set_decoder(
            type_code,
            Box::new(|payload: &Bytes| {
                let hex = std::str::from_utf8(payload).map_err(|_| PduError::NotHexText)?;
                Ok(Payload::Sms(pdu::parse_message(hex)?))
            }),
        );
    }

    /// Number of requests still awaiting their response.
    pub fn outstanding_requests(&self) -> usize {
        self.outstanding.len()
    }

    /// Tear the transport down, returning every request that never got its
    /// response so the owner can fail them explicitly rather than leave
    /// them silently orphaned.
    pub fn close(self) -> Vec<Parcel> {
        let mut orphaned: Vec<Parcel> = self.outstanding.into_values().collect();
        orphaned.sort_by_key(|parcel| parcel.token);
        if !orphaned.is_empty() {
            tracing::warn!(count = orphaned.len(), "closing with outstanding requests");
        }
        orphaned
    }
}

impl std::fmt::Debug for RilTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RilTransport")
            .field("next_token", &self.next_token)
            .field("outstanding", &self.outstanding.len())
            .field("reassembler", &self.reassembler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(body);
        out
    }

    fn response_body(token: u32, payload: &[u8]) -> Vec<u8> {
        let mut body = 0u32.to_be_bytes().to_vec();
        body.extend_from_slice(&token.to_be_bytes());
        body.extend_from_slice(payload);
        body
    }

    fn unsolicited_body(type_code: u32, payload: &[u8]) -> Vec<u8> {
        let mut body = 1u32.to_be_bytes().to_vec();
        body.extend_from_slice(&type_code.to_be_bytes());
        body.extend_from_slice(payload);
        body
    }

    #[test]
    fn reassembles_one_parcel_from_one_chunk() {
        let mut reassembler = Reassembler::new(MAX_PARCEL_SIZE);
        let bodies = reassembler.feed(&frame(b"12345678")).unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].as_ref(), b"12345678");
        assert!(reassembler.is_idle());
    }

    #[test]
    fn fragmentation_boundaries_do_not_matter() {
        let wire = frame(&unsolicited_body(1001, b"abcdef"));

        let mut whole = Reassembler::new(MAX_PARCEL_SIZE);
        let expected = whole.feed(&wire).unwrap();
        assert_eq!(expected.len(), 1);

        // Byte-at-a-time delivery produces the identical parcel.
        let mut dribble = Reassembler::new(MAX_PARCEL_SIZE);
        let mut collected = Vec::new();
        for byte in &wire {
            collected.extend(dribble.feed(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(collected, expected);

        // As does an uneven split.
        for split in 1..wire.len() {
            let mut split_feed = Reassembler::new(MAX_PARCEL_SIZE);
            let mut collected = split_feed.feed(&wire[..split]).unwrap();
            collected.extend(split_feed.feed(&wire[split..]).unwrap());
            assert_eq!(collected, expected, "split at {split}");
        }
    }

    #[test]
    fn one_chunk_can_complete_many_parcels() {
        let mut wire = frame(b"firstbod");
        wire.extend(frame(b"secondbd"));
        wire.extend(frame(b"thirdbdy"));

        let mut reassembler = Reassembler::new(MAX_PARCEL_SIZE);
        let bodies = reassembler.feed(&wire).unwrap();
        assert_eq!(bodies.len(), 3);
        assert_eq!(bodies[2].as_ref(), b"thirdbdy");
    }

    #[test]
    fn oversized_length_is_fatal_and_emits_nothing() {
        let mut reassembler = Reassembler::new(16);
        let mut wire = 17u32.to_be_bytes().to_vec();
        wire.extend_from_slice(&[0u8; 17]);
        let result = reassembler.feed(&wire);
        assert!(matches!(
            result,
            Err(TransportError::OversizedParcel {
                declared: 17,
                max: 16
            })
        ));
    }

    #[test]
    fn send_frames_and_records_the_request() {
        let queue = FrameQueue::new();
        let mut transport = RilTransport::new(Box::new(queue.clone()));

        let token = transport.send(23, &[0x01]).unwrap();
        assert_eq!(token, 1);
        assert_eq!(transport.send(25, &[]).unwrap(), 2);
        assert_eq!(transport.outstanding_requests(), 2);

        let first = queue.pop().unwrap();
        assert_eq!(
            first.as_ref(),
            [0, 0, 0, 9, 0, 0, 0, 23, 0, 0, 0, 1, 0x01]
        );
    }

    #[test]
    fn responses_resolve_out_of_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut transport = RilTransport::new(Box::new(Vec::new()));

        for type_code in [23u32, 25u32] {
            let seen = Rc::clone(&seen);
            transport.add_callback(
                type_code,
                Box::new(move |payload| {
                    seen.borrow_mut().push((type_code, payload.clone()));
                    Ok(())
                }),
            );
        }

        transport.send(23, b"radio").unwrap();
        transport.send(25, b"sms").unwrap();

        // Deliver the responses in reverse order.
        transport.feed(&frame(&response_body(2, b"ok-sms"))).unwrap();
        transport
            .feed(&frame(&response_body(1, b"ok-radio")))
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0].0, 25);
        assert_eq!(seen[1].0, 23);
        assert_eq!(seen[0].1, Payload::Raw(Bytes::from_static(b"ok-sms")));
        assert_eq!(transport.outstanding_requests(), 0);
    }

    #[test]
    fn unknown_response_token_is_a_desync() {
        let mut transport = RilTransport::new(Box::new(Vec::new()));
        let result = transport.feed(&frame(&response_body(9, b"")));
        assert!(matches!(result, Err(TransportError::UnknownToken(9))));
    }

    #[test]
    fn callbacks_run_in_registration_order_and_failures_are_isolated() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut transport = RilTransport::new(Box::new(Vec::new()));

        let first = Rc::clone(&order);
        transport.add_callback(
            1001,
            Box::new(move |_| {
                first.borrow_mut().push("first");
                Err("handler exploded".into())
            }),
        );
        let second = Rc::clone(&order);
        transport.add_callback(
            1001,
            Box::new(move |_| {
                second.borrow_mut().push("second");
                Ok(())
            }),
        );

        transport
            .feed(&frame(&unsolicited_body(1001, b"")))
            .unwrap();
        assert_eq!(*order.borrow(), ["first", "second"]);
    }

    #[test]
    fn removed_callbacks_stop_firing() {
        let count = Rc::new(RefCell::new(0));
        let mut transport = RilTransport::new(Box::new(Vec::new()));

        let counter = Rc::clone(&count);
        let id = transport.add_callback(
            1001,
            Box::new(move |_| {
                *counter.borrow_mut() += 1;
                Ok(())
            }),
        );

        transport
            .feed(&frame(&unsolicited_body(1001, b"")))
            .unwrap();
        assert!(transport.remove_callback(1001, id));
        assert!(!transport.remove_callback(1001, id));
        transport
            .feed(&frame(&unsolicited_body(1001, b"")))
            .unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn close_returns_orphaned_requests_in_token_order() {
        let mut transport = RilTransport::new(Box::new(Vec::new()));
        transport.send(23, b"").unwrap();
        transport.send(25, b"").unwrap();
        transport.send(22, b"").unwrap();

        // One request resolves; the other two are orphaned at close.
        transport.feed(&frame(&response_body(2, b""))).unwrap();

        let orphaned = transport.close();
        assert_eq!(orphaned.len(), 2);
        assert_eq!(orphaned[0].token, 1);
        assert_eq!(orphaned[0].type_code, 23);
        assert_eq!(orphaned[1].token, 3);
        assert_eq!(orphaned[1].type_code, 22);
    }

    #[test]
    fn tokens_are_never_reused() {
        let mut transport = RilTransport::new(Box::new(Vec::new()));
        let first = transport.send(23, b"").unwrap();
        transport.feed(&frame(&response_body(first, b""))).unwrap();
        let second = transport.send(23, b"").unwrap();
        assert_eq!((first, second), (1, 2));
    }
}
