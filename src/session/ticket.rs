/// Identifier handed out for each asynchronous request.
pub type RequestId = u64;

/// "Latest request wins": issues increasing ids and accepts a response only
/// if no newer request has been issued since.
#[derive(Debug, Default)]
pub struct RequestTracker {
    last_issued: RequestId,
    in_flight: bool,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestId {
        self.last_issued += 1;
        self.in_flight = true;
        self.last_issued
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.in_flight && id == self.last_issued
    }

    /// Mark `id` as answered. Returns false for a superseded or already-settled id.
    pub fn settle(&mut self, id: RequestId) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Drop interest in whatever is in flight.
    pub fn invalidate(&mut self) {
        self.in_flight = false;
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight
    }
}
