//! RPC Transport
//!
//! Exchanges one request/response pair at a time with a plugin over a framed
//! session channel. This is the only layer that turns I/O failures and
//! plugin faults into [`Error`] values (see [`fault`]).
//!
//! Requests are never retried here. A failed call may have been partially
//! applied by the plugin, so retry policy belongs to the caller.

pub mod channel;
mod fault;
pub mod frame;

pub use channel::UdsChannelFactory;
pub use frame::FrameCodec;

use crate::domain::Channel;
use crate::error::{Error, Result};
use crate::metrics::RpcMetrics;
use crate::value::Value;
use bytes::Bytes;
use fault::Failure;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// Request/response exchange over a single session channel
pub struct Transport {
    framed: Framed<Box<dyn Channel>, FrameCodec>,
    next_id: u64,
    /// Set while a request is outstanding; still set on entry means the
    /// previous call was abandoned and the channel position is unknown
    in_flight: bool,
    metrics: Option<Arc<RpcMetrics>>,
}

impl Transport {
    /// Wrap an open channel
    pub fn new(channel: Box<dyn Channel>, max_frame_bytes: usize) -> Self {
        Self {
            framed: Framed::new(channel, FrameCodec::new(max_frame_bytes)),
            next_id: 1,
            in_flight: false,
            metrics: None,
        }
    }

    /// Attach call metrics
    pub fn with_metrics(mut self, metrics: Option<Arc<RpcMetrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Send `method` with `params` and wait up to `timeout` for the response.
    ///
    /// `params` must be an `Object` value.
    pub async fn call(&mut self, method: &str, params: Value, timeout: Duration) -> Result<Value> {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.exchange(method, params)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Failure::TimedOut {
                method: method.to_string(),
                timeout_ms: u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX),
            }),
        };

        if let Some(metrics) = &self.metrics {
            metrics.observe(method, started.elapsed(), outcome.as_ref().err().map(Failure::kind));
        }

        outcome.map_err(|failure| {
            if !matches!(failure, Failure::Fault { .. }) {
                warn!("RPC {} failed: {:?}", method, failure);
            }
            Error::from(failure)
        })
    }

    async fn exchange(
        &mut self,
        method: &str,
        params: Value,
    ) -> std::result::Result<Value, Failure> {
        if self.in_flight {
            return Err(Failure::Closed(
                "previous request was abandoned before its response arrived".into(),
            ));
        }
        if !matches!(params, Value::Object(_)) {
            return Err(Failure::Unexpected(format!(
                "parameters for {} must be an object, found {}",
                method,
                params.kind()
            )));
        }

        let id = self.next_id;
        self.next_id += 1;

        let request = Value::object([
            ("method", Value::from(method)),
            ("params", params),
            ("id", Value::from(id)),
        ]);
        let payload = request
            .to_wire()
            .map_err(|e| Failure::Unexpected(e.to_string()))?;

        debug!("RPC {} id={} sending {} bytes", method, id, payload.len());
        self.in_flight = true;
        self.framed.send(Bytes::from(payload)).await?;

        let frame = match self.framed.next().await {
            Some(frame) => frame?,
            None => return Err(Failure::Closed("end of stream".into())),
        };
        self.in_flight = false;

        debug!("RPC {} id={} received {} bytes", method, id, frame.len());
        parse_response(&frame, id)
    }
}

/// Unpack a response envelope into its result or fault
fn parse_response(payload: &[u8], expected_id: u64) -> std::result::Result<Value, Failure> {
    let envelope = Value::from_wire(payload).map_err(|e| Failure::Malformed(e.to_string()))?;
    let mut map = envelope
        .into_object()
        .map_err(|e| Failure::Malformed(format!("response envelope: {e}")))?;

    match map.get("id") {
        None | Some(Value::Null) => {}
        Some(id) => {
            if id.as_u64().ok() != Some(expected_id) {
                return Err(Failure::Malformed(format!(
                    "response id {id} does not match request id {expected_id}"
                )));
            }
        }
    }

    match map.shift_remove("error") {
        Some(Value::Null) | None => {}
        Some(fault) => return Err(Failure::from_fault_object(&fault)),
    }

    map.shift_remove("result")
        .ok_or_else(|| Failure::Malformed("response has neither result nor error".into()))
}
