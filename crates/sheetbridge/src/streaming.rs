//! Streaming custom functions over a persistent channel.
//!
//! Each streaming call is emitted to the server as a
//! [`FUNCTION_CALL_EVENT`] and then shows [`WAITING`] until the server
//! publishes a result under the call's task key. Results keep flowing to the
//! same cell until the caller drops its receiver.
//!
//! The registry is transport-agnostic: outbound calls go into an mpsc
//! channel, and connection changes and results come back as [`StreamEvent`]s.
//! On disconnect every live call shows [`DISCONNECTED`]; on reconnect every
//! remembered call is emitted again so the server can resume it.

use std::collections::HashMap;

use sheetbridge_protocol::{FunctionCall, Value};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Event name for an outbound streaming call
pub const FUNCTION_CALL_EVENT: &str = "xlwings:function-call";

/// Shown by a call until its first result arrives
pub const WAITING: &str = "Waiting for stream...";

/// Shown by live calls while the channel is down
pub const DISCONNECTED: &str = "Stream disconnected";

/// Event name results for `task_key` are published under
pub fn result_event(task_key: &str) -> String {
    format!("xlwings:set-result-{}", task_key)
}

/// Inbound traffic from the streaming server.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connected,
    Disconnected,
    Result {
        task_key: String,
        result: Vec<Vec<Value>>,
    },
}

/// Receiver for the successive values of one streaming call
pub type ResultReceiver = watch::Receiver<Vec<Vec<Value>>>;

struct Pending {
    body: FunctionCall,
    result: watch::Sender<Vec<Vec<Value>>>,
}

/// Tracks live streaming calls by task key.
pub struct StreamRegistry {
    outbound: mpsc::UnboundedSender<FunctionCall>,
    pending: HashMap<String, Pending>,
    connected: bool,
}

fn placeholder(text: &str) -> Vec<Vec<Value>> {
    vec![vec![Value::from(text)]]
}

impl StreamRegistry {
    pub fn new(outbound: mpsc::UnboundedSender<FunctionCall>) -> Self {
        Self {
            outbound,
            pending: HashMap::new(),
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of calls that would be emitted again on reconnect
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Start a streaming call.
    ///
    /// The body gets its task key filled in and is emitted right away. A call
    /// with the same task key as a live one takes its place; the older
    /// receiver stops receiving results.
    pub fn call(&mut self, mut body: FunctionCall) -> Result<ResultReceiver> {
        let task_key = body.task_key();
        body.task_key = Some(task_key.clone());

        self.outbound
            .send(body.clone())
            .map_err(|_| Error::StreamClosed)?;

        let (tx, rx) = watch::channel(placeholder(WAITING));
        if self
            .pending
            .insert(task_key.clone(), Pending { body, result: tx })
            .is_some()
        {
            debug!(task_key = %task_key, "replaced streaming call");
        }
        Ok(rx)
    }

    /// Handle one inbound event
    pub fn handle(&mut self, event: StreamEvent) -> Result<()> {
        match event {
            StreamEvent::Connected => {
                self.connected = true;
                self.prune();
                info!(calls = self.pending.len(), "stream connected");
                for pending in self.pending.values() {
                    self.outbound
                        .send(pending.body.clone())
                        .map_err(|_| Error::StreamClosed)?;
                }
            }
            StreamEvent::Disconnected => {
                self.connected = false;
                warn!(calls = self.pending.len(), "stream disconnected");
                for pending in self.pending.values() {
                    pending.result.send_replace(placeholder(DISCONNECTED));
                }
            }
            StreamEvent::Result { task_key, result } => match self.pending.get(&task_key) {
                Some(pending) => {
                    if pending.result.send(result).is_err() {
                        debug!(task_key = %task_key, "caller gone, dropping call");
                        self.pending.remove(&task_key);
                    }
                }
                None => debug!(task_key = %task_key, "result for unknown call"),
            },
        }
        Ok(())
    }

    /// Process events until the inbound channel closes
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<StreamEvent>) -> Result<()> {
        while let Some(event) = events.recv().await {
            self.handle(event)?;
        }
        Ok(())
    }

    /// Forget calls nobody is listening to
    fn prune(&mut self) {
        self.pending.retain(|_, pending| !pending.result.is_closed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call(func: &str, args: Vec<serde_json::Value>) -> FunctionCall {
        FunctionCall {
            func_name: func.into(),
            args,
            caller_address: "sheetbridge[Book1]Sheet1!A1".into(),
            content_language: "en-US".into(),
            version: "0.1.0".into(),
            runtime: "1.4".into(),
            task_key: None,
        }
    }

    fn text(rx: &ResultReceiver) -> String {
        rx.borrow()[0][0].to_string()
    }

    #[test]
    fn test_call_emits_with_task_key_and_waits() {
        let (tx, mut outbound) = mpsc::unbounded_channel();
        let mut registry = StreamRegistry::new(tx);

        let rx = registry.call(call("ticker", vec![json!("MSFT")])).unwrap();
        assert_eq!(text(&rx), WAITING);

        let sent = outbound.try_recv().unwrap();
        assert_eq!(sent.task_key.as_deref(), Some("ticker_MSFT"));
    }

    #[test]
    fn test_results_route_by_task_key() {
        let (tx, _outbound) = mpsc::unbounded_channel();
        let mut registry = StreamRegistry::new(tx);
        let rx = registry.call(call("ticker", vec![json!("MSFT")])).unwrap();

        registry
            .handle(StreamEvent::Result {
                task_key: "ticker_MSFT".into(),
                result: vec![vec![Value::Number(410.5)]],
            })
            .unwrap();
        assert_eq!(text(&rx), "410.5");

        registry
            .handle(StreamEvent::Result {
                task_key: "other_1".into(),
                result: vec![vec![Value::Number(0.0)]],
            })
            .unwrap();
        assert_eq!(text(&rx), "410.5");
    }

    #[test]
    fn test_disconnect_then_reconnect_reemits() {
        let (tx, mut outbound) = mpsc::unbounded_channel();
        let mut registry = StreamRegistry::new(tx);
        let a = registry.call(call("a", vec![])).unwrap();
        let _b = registry.call(call("b", vec![json!(1)])).unwrap();
        while outbound.try_recv().is_ok() {}

        registry.handle(StreamEvent::Disconnected).unwrap();
        assert_eq!(text(&a), DISCONNECTED);
        assert!(!registry.is_connected());

        registry.handle(StreamEvent::Connected).unwrap();
        let mut keys = Vec::new();
        while let Ok(body) = outbound.try_recv() {
            keys.push(body.task_key.unwrap());
        }
        keys.sort();
        assert_eq!(keys, vec!["a_".to_string(), "b_1".to_string()]);
    }

    #[test]
    fn test_dropped_receivers_are_forgotten() {
        let (tx, mut outbound) = mpsc::unbounded_channel();
        let mut registry = StreamRegistry::new(tx);
        drop(registry.call(call("gone", vec![])).unwrap());
        let _kept = registry.call(call("kept", vec![])).unwrap();
        while outbound.try_recv().is_ok() {}

        registry.handle(StreamEvent::Connected).unwrap();
        assert_eq!(registry.pending_count(), 1);
        assert_eq!(outbound.try_recv().unwrap().func_name, "kept");
    }

    #[tokio::test]
    async fn test_run_delivers_results() {
        let (tx, _outbound) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut registry = StreamRegistry::new(tx);
        let mut rx = registry.call(call("clock", vec![])).unwrap();

        let task = tokio::spawn(registry.run(events_rx));
        events_tx.send(StreamEvent::Connected).unwrap();
        events_tx
            .send(StreamEvent::Result {
                task_key: "clock_".into(),
                result: vec![vec![Value::from("12:00")]],
            })
            .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(text(&rx), "12:00");

        drop(events_tx);
        task.await.unwrap().unwrap();
    }
}
