//! Protocol Dispatcher (spec §4.3): routes an inbound framed message to the first registered
//! handler that recognizes it.

/// What a handler tells the dispatch loop to do after handling one message.
pub enum DispatchOutcome<E> {
    /// Keep dispatching further inbound messages on this session.
    Continue,
    /// Stop the dispatch loop (e.g. the handshake installed a secure channel and the session
    /// should now be driven by the application instead of the dispatcher).
    Stop,
    /// A fatal error for this session.
    Error(E),
}

/// A single protocol's handler (spec §4.3: `can_handle`, `handle`, `shutdown`).
pub trait ProtocolHandler<S> {
    type Error;

    /// Inspects the payload's leading identifier substring to decide whether this handler
    /// recognizes the message (e.g. the secio handler matches `/ipfs/secio`).
    fn can_handle(&self, payload: &[u8]) -> bool;

    /// Handles a message this handler claimed via `can_handle`.
    fn handle(&mut self, payload: &[u8], session: &mut S) -> DispatchOutcome<Self::Error>;

    fn shutdown(&mut self) {}
}

/// Holds an ordered sequence of handlers and dispatches each inbound message to the first one
/// that claims it. The `'d` lifetime lets a handler borrow something (e.g. a secio handler
/// borrowing a `&PeerStore`) without forcing it to be `'static`.
pub struct Dispatcher<'d, S, E> {
    handlers: Vec<Box<dyn ProtocolHandler<S, Error = E> + 'd>>,
}

impl<'d, S, E> Dispatcher<'d, S, E> {
    pub fn new() -> Self {
        Dispatcher { handlers: Vec::new() }
    }

    pub fn register(&mut self, handler: Box<dyn ProtocolHandler<S, Error = E> + 'd>) {
        self.handlers.push(handler);
    }

    /// Dispatches one message, returning the first matching handler's outcome. If no handler
    /// claims the message, returns `None`.
    pub fn dispatch(&mut self, payload: &[u8], session: &mut S) -> Option<DispatchOutcome<E>> {
        for handler in &mut self.handlers {
            if handler.can_handle(payload) {
                return Some(handler.handle(payload, session));
            }
        }
        None
    }
}

impl<'d, S, E> Default for Dispatcher<'d, S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d, S, E> Drop for Dispatcher<'d, S, E> {
    fn drop(&mut self) {
        for handler in &mut self.handlers {
            handler.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    impl ProtocolHandler<Vec<u8>> for EchoHandler {
        type Error = ();

        fn can_handle(&self, payload: &[u8]) -> bool {
            payload.starts_with(b"/echo/")
        }

        fn handle(&mut self, payload: &[u8], session: &mut Vec<u8>) -> DispatchOutcome<()> {
            session.extend_from_slice(payload);
            DispatchOutcome::Stop
        }
    }

    #[test]
    fn first_matching_handler_wins() {
        let mut dispatcher: Dispatcher<'_, Vec<u8>, ()> = Dispatcher::new();
        dispatcher.register(Box::new(EchoHandler));
        let mut session = Vec::new();
        let outcome = dispatcher.dispatch(b"/echo/1.0.0", &mut session);
        assert!(matches!(outcome, Some(DispatchOutcome::Stop)));
        assert_eq!(session, b"/echo/1.0.0".to_vec());
    }

    #[test]
    fn unmatched_payload_returns_none() {
        let mut dispatcher: Dispatcher<'_, Vec<u8>, ()> = Dispatcher::new();
        dispatcher.register(Box::new(EchoHandler));
        let mut session = Vec::new();
        assert!(dispatcher.dispatch(b"/other/1.0.0", &mut session).is_none());
    }
}
