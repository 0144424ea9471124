//! The proxy endpoint: the state machine and message dispatcher for one
//! engine connection.
//!
//! `ProxyEndpoint` owns the frame stack and the identity fields set once by
//! `VERSION`. [`ProxyEndpoint::run`] is meant to be driven by the transport's
//! own inbound-delivery thread; `invoke`/`get_api`/`send_result`/`release`
//! may be called concurrently from other host threads. The proxy's own lock
//! is held only around state mutation, never around a host callback — see
//! the `top_ctx`/`top_frame` helpers, which copy what they need and drop the
//! guard before calling back out.

use crate::codec::{MessageCodec, RmpCodec};
use crate::error::DispatchError;
use crate::frame::{Frame, FrameStack};
use crate::host::HostContext;
use crate::message::{
    Address, CallPayload, EventPayload, GetApiRequest, GetApiResponse, GetBalanceRequest,
    GetBalanceResponse, GetValueRequest, GetValueResponse, HexBigInt, InvokePayload, MessageTag,
    ResultPayload, SetValuePayload, VersionPayload,
};
use crate::pool::{EngineKind, PoolManager};
use crate::transport::{FrameReceiver, FrameSender};
use serde::Serialize;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

struct ProxyState {
    version: Option<u16>,
    uid: Option<String>,
    kind: Option<EngineKind>,
    reserved: bool,
    frames: FrameStack,
}

/// One proxy connection: state machine plus dispatcher.
///
/// Always held behind an `Arc`: the pool manager keeps a handle to hand back
/// to the host, and the dispatch thread needs to clone `self` to publish
/// readiness from inside a callback-free scope.
pub struct ProxyEndpoint {
    state: Mutex<ProxyState>,
    sender: Arc<dyn FrameSender>,
    manager: Arc<dyn PoolManager>,
    codec: RmpCodec,
}

impl ProxyEndpoint {
    pub fn new(sender: Arc<dyn FrameSender>, manager: Arc<dyn PoolManager>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ProxyState {
                version: None,
                uid: None,
                kind: None,
                reserved: false,
                frames: FrameStack::new(),
            }),
            sender,
            manager,
            codec: RmpCodec,
        })
    }

    pub fn uid(&self) -> Option<String> {
        self.state.lock().unwrap().uid.clone()
    }

    pub fn kind(&self) -> Option<EngineKind> {
        self.state.lock().unwrap().kind
    }

    pub fn is_reserved(&self) -> bool {
        self.state.lock().unwrap().reserved
    }

    /// Atomic test-and-set; returns `false` if already reserved.
    pub fn reserve(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.reserved {
            false
        } else {
            state.reserved = true;
            true
        }
    }

    /// Drops the reservation. Notifies the pool manager only if the frame
    /// stack is already empty at the moment of the call; a release with a
    /// pending call is silently deferred to that call's terminal pop.
    pub fn release(self: &Arc<Self>) -> Result<(), DispatchError> {
        let should_notify = {
            let mut state = self.state.lock().unwrap();
            state.reserved = false;
            state.frames.is_empty()
        };
        if should_notify {
            self.notify_ready()?;
        }
        Ok(())
    }

    /// Pushes an invocation frame and sends `INVOKE`. Must be called only
    /// while reserved. The result arrives later via `ctx.on_result`.
    #[allow(clippy::too_many_arguments)]
    pub fn invoke(
        &self,
        ctx: Arc<dyn HostContext>,
        code: String,
        is_query: bool,
        from: Address,
        to: Address,
        value: HexBigInt,
        limit: HexBigInt,
        method: String,
        params: serde_json::Value,
    ) -> Result<(), DispatchError> {
        let mut state = self.state.lock().unwrap();
        if !state.reserved {
            return Err(DispatchError::ProtocolViolation(
                "invoke called while the proxy is not reserved".into(),
            ));
        }
        state.frames.push(Frame::new(Some(to.clone()), ctx));
        let payload = InvokePayload { code, is_query, from, to, value, limit, method, params };
        let result = self.send_message(MessageTag::Invoke, &payload);
        if result.is_err() {
            state.frames.pop();
        }
        result
    }

    /// Pushes an addressless frame and sends `GETAPI`. The response arrives
    /// later via `ctx.on_api`.
    pub fn get_api(&self, ctx: Arc<dyn HostContext>, code: String) -> Result<(), DispatchError> {
        let mut state = self.state.lock().unwrap();
        state.frames.push(Frame::new(None, ctx));
        let result = self.send_message(MessageTag::GetApi, &GetApiRequest { code });
        if result.is_err() {
            state.frames.pop();
        }
        result
    }

    /// Sends a `RESULT` back to the engine in answer to an engine-initiated
    /// `CALL`. `ctx` is only a sanity witness here: routing for an
    /// engine-initiated sub-call is determined by the engine's own call
    /// stack, not this proxy's frame stack.
    pub fn send_result(
        &self,
        _ctx: &Arc<dyn HostContext>,
        status: u16,
        step_used: HexBigInt,
        result: Option<serde_json::Value>,
    ) -> Result<(), DispatchError> {
        self.send_message(MessageTag::Result, &ResultPayload { status, step_used, result })
    }

    /// Closes the transport and asks the pool manager to terminate the
    /// engine by `uid`. The proxy lock is released before delegating to the
    /// manager, so a manager that calls back into this proxy from `kill`
    /// cannot deadlock against it.
    pub fn kill(&self) -> Result<(), DispatchError> {
        let uid = self.state.lock().unwrap().uid.clone();
        self.sender.close();
        match uid {
            Some(uid) => self
                .manager
                .kill(&uid)
                .map_err(|e| DispatchError::TransportError(e.to_string())),
            None => Ok(()),
        }
    }

    /// Dispatches one inbound framed message. Driven by the transport's
    /// inbound-delivery thread via [`Self::run`].
    pub fn dispatch(self: &Arc<Self>, tag: u8, payload: Vec<u8>) -> Result<(), DispatchError> {
        let Some(tag) = MessageTag::from_u8(tag) else {
            return Err(DispatchError::UnknownMessage(tag));
        };
        match tag {
            MessageTag::Version => self.handle_version(payload),
            MessageTag::Invoke => Err(DispatchError::ProtocolViolation(
                "INVOKE is host-to-engine only; received it inbound".into(),
            )),
            MessageTag::Result => self.handle_result(payload),
            MessageTag::GetValue => self.handle_get_value(payload),
            MessageTag::SetValue => self.handle_set_value(payload),
            MessageTag::Call => self.handle_call(payload),
            MessageTag::Event => self.handle_event(payload),
            MessageTag::GetInfo => self.handle_get_info(payload),
            MessageTag::GetBalance => self.handle_get_balance(payload),
            MessageTag::GetApi => self.handle_get_api_response(payload),
        }
    }

    /// Runs the inbound dispatch loop until the transport errors or a
    /// dispatch error occurs; either closes the connection.
    pub fn run(self: Arc<Self>, mut receiver: impl FrameReceiver) {
        loop {
            match receiver.recv_frame() {
                Ok((tag, payload)) => {
                    if let Err(e) = self.dispatch(tag, payload) {
                        tracing::error!(error = %e, "dispatch failed, closing connection");
                        self.sender.close();
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transport read failed, closing connection");
                    self.sender.close();
                    break;
                }
            }
        }
    }

    fn handle_version(self: &Arc<Self>, payload: Vec<u8>) -> Result<(), DispatchError> {
        let version: VersionPayload = self.codec.decode(MessageTag::Version as u8, &payload)?;
        let kind = EngineKind::from_str(&version.engine_type)
            .map_err(|_| DispatchError::UnknownEngineKind(version.engine_type.clone()))?;
        {
            let mut state = self.state.lock().unwrap();
            if state.version.is_some() {
                return Err(DispatchError::ProtocolViolation(
                    "duplicate VERSION on an already-negotiated connection".into(),
                ));
            }
            state.version = Some(version.version);
            state.uid = Some(version.uid.clone());
            state.kind = Some(kind);
        }
        tracing::info!(uid = %version.uid, %kind, version = version.version, "engine negotiated");
        self.notify_ready()
    }

    fn handle_result(self: &Arc<Self>, payload: Vec<u8>) -> Result<(), DispatchError> {
        let resp: ResultPayload = self.codec.decode(MessageTag::Result as u8, &payload)?;
        let frame = self.pop_frame("RESULT")?;
        frame.ctx.on_result(resp.status, resp.step_used, resp.result);
        self.maybe_notify_ready()
    }

    fn handle_get_api_response(self: &Arc<Self>, payload: Vec<u8>) -> Result<(), DispatchError> {
        let resp: GetApiResponse = self.codec.decode(MessageTag::GetApi as u8, &payload)?;
        let frame = self.pop_frame("GETAPI response")?;
        frame.ctx.on_api(resp.status, resp.info);
        self.maybe_notify_ready()
    }

    fn handle_get_value(&self, payload: Vec<u8>) -> Result<(), DispatchError> {
        let req: GetValueRequest = self.codec.decode(MessageTag::GetValue as u8, &payload)?;
        let ctx = self.top_ctx()?;
        let value = ctx
            .get_value(&req.key)
            .map_err(|e| DispatchError::HostContextError(e.to_string()))?;
        let resp = GetValueResponse { success: value.is_some(), value: value.unwrap_or_default() };
        self.send_message(MessageTag::GetValue, &resp)
    }

    fn handle_set_value(&self, payload: Vec<u8>) -> Result<(), DispatchError> {
        let req: SetValuePayload = self.codec.decode(MessageTag::SetValue as u8, &payload)?;
        let ctx = self.top_ctx()?;
        let result = if req.is_delete {
            ctx.delete_value(&req.key)
        } else {
            ctx.set_value(&req.key, &req.value)
        };
        result.map_err(|e| DispatchError::HostContextError(e.to_string()))
    }

    fn handle_call(&self, payload: Vec<u8>) -> Result<(), DispatchError> {
        let req: CallPayload = self.codec.decode(MessageTag::Call as u8, &payload)?;
        let (from, ctx) = self.top_frame()?;
        ctx.on_call(from, req.to, req.value, req.limit, req.method, req.params);
        Ok(())
    }

    fn handle_event(&self, payload: Vec<u8>) -> Result<(), DispatchError> {
        let req: EventPayload = self.codec.decode(MessageTag::Event as u8, &payload)?;
        let (addr, ctx) = self.top_frame()?;
        ctx.on_event(addr, req.indexed, req.data);
        Ok(())
    }

    fn handle_get_info(&self, _payload: Vec<u8>) -> Result<(), DispatchError> {
        let ctx = self.top_ctx()?;
        let info = ctx.get_info().map_err(|e| DispatchError::HostContextError(e.to_string()))?;
        self.send_message(MessageTag::GetInfo, &info)
    }

    fn handle_get_balance(&self, payload: Vec<u8>) -> Result<(), DispatchError> {
        let req: GetBalanceRequest = self.codec.decode(MessageTag::GetBalance as u8, &payload)?;
        let ctx = self.top_ctx()?;
        let balance = ctx
            .get_balance(&req.address)
            .map_err(|e| DispatchError::HostContextError(e.to_string()))?;
        self.send_message(MessageTag::GetBalance, &GetBalanceResponse { balance })
    }

    /// Pops the top frame, reporting `name` in the error if the stack was
    /// empty (invariant 1: no terminal/intermediate message without a
    /// matching frame).
    fn pop_frame(&self, name: &str) -> Result<Frame, DispatchError> {
        let mut state = self.state.lock().unwrap();
        state.frames.pop().ok_or_else(|| {
            DispatchError::ProtocolViolation(format!("{name} with an empty frame stack"))
        })
    }

    /// Copies the top frame's address and context handle, then drops the
    /// lock — callers must not hold the proxy lock while invoking `ctx`.
    fn top_frame(&self) -> Result<(Option<Address>, Arc<dyn HostContext>), DispatchError> {
        let state = self.state.lock().unwrap();
        let frame = state.frames.peek().ok_or_else(|| {
            DispatchError::ProtocolViolation("intermediate message with an empty frame stack".into())
        })?;
        Ok((frame.addr.clone(), Arc::clone(&frame.ctx)))
    }

    fn top_ctx(&self) -> Result<Arc<dyn HostContext>, DispatchError> {
        self.top_frame().map(|(_, ctx)| ctx)
    }

    /// Applies the readiness rule shared by `RESULT` and the `GETAPI`
    /// response: a terminal pop that drains the stack while unreserved
    /// announces readiness exactly once.
    fn maybe_notify_ready(self: &Arc<Self>) -> Result<(), DispatchError> {
        let ready = {
            let state = self.state.lock().unwrap();
            !state.reserved && state.frames.is_empty()
        };
        if ready {
            self.notify_ready()
        } else {
            Ok(())
        }
    }

    fn notify_ready(self: &Arc<Self>) -> Result<(), DispatchError> {
        let kind = self.state.lock().unwrap().kind;
        let Some(kind) = kind else {
            return Ok(());
        };
        if let Err(e) = self.manager.on_ready(kind, Arc::clone(self)) {
            tracing::warn!(error = %e, "pool manager rejected on_ready; closing connection");
            self.sender.close();
            return Err(DispatchError::TransportError(e.to_string()));
        }
        Ok(())
    }

    fn send_message<T: Serialize>(&self, tag: MessageTag, payload: &T) -> Result<(), DispatchError> {
        let bytes = self.codec.encode(payload)?;
        self.sender.send_frame(tag as u8, bytes)?;
        Ok(())
    }
}
