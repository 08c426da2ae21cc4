//! Fakes shared by the integration tests: a gated core runtime and a host
//! that records what it was asked to open.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use shuttle_bridge::{
    CoreInstance, EditorEvent, EditorRuntime, EventEmitter, HostError, HostShell, RuntimeError,
};
use tokio::sync::oneshot;

/// What the fake core saw and did.
#[derive(Default)]
pub struct CoreProbe {
    pub loads: Cell<u32>,
    pub instances: Cell<u32>,
    pub frees: Cell<u32>,
    pub messages: RefCell<Vec<String>>,
    /// Runs after each inbound message is recorded.
    pub on_message: RefCell<Option<Box<dyn Fn(&str)>>>,
    emitter: RefCell<Option<EventEmitter>>,
}

impl CoreProbe {
    /// Emit as the core would. False if there is no instance or it is gone.
    pub fn emit(&self, event: EditorEvent) -> bool {
        self.emitter
            .borrow()
            .as_ref()
            .is_some_and(|emitter| emitter.emit(event))
    }

    pub fn emit_raw(&self, kind: &str, payload: &str) -> bool {
        self.emitter
            .borrow()
            .as_ref()
            .is_some_and(|emitter| emitter.emit_raw(kind, payload))
    }

    pub fn visit_link(&self, url: &str) -> bool {
        self.emit(EditorEvent::visit_link(url))
    }

    pub fn open_embedded_file(&self, path: &str) -> bool {
        self.emit(EditorEvent::open_embedded_file(path))
    }
}

pub struct FakeRuntime {
    probe: Rc<CoreProbe>,
    gate: RefCell<Option<oneshot::Receiver<Result<(), RuntimeError>>>>,
}

impl FakeRuntime {
    /// A runtime that loads immediately.
    pub fn ready() -> (Self, Rc<CoreProbe>) {
        let probe = Rc::new(CoreProbe::default());
        let runtime = Self {
            probe: probe.clone(),
            gate: RefCell::new(None),
        };
        (runtime, probe)
    }

    /// A runtime whose load resolves with whatever is sent on the gate.
    pub fn gated() -> (
        Self,
        Rc<CoreProbe>,
        oneshot::Sender<Result<(), RuntimeError>>,
    ) {
        let (tx, rx) = oneshot::channel();
        let (runtime, probe) = Self::ready();
        *runtime.gate.borrow_mut() = Some(rx);
        (runtime, probe, tx)
    }
}

pub struct FakeInstance {
    probe: Rc<CoreProbe>,
}

impl CoreInstance for FakeInstance {
    fn push_message(&self, message: &str) {
        self.probe.messages.borrow_mut().push(message.to_owned());
        if let Some(hook) = self.probe.on_message.borrow().as_ref() {
            hook(message);
        }
    }

    fn free(&mut self) -> Result<(), RuntimeError> {
        self.probe.frees.set(self.probe.frees.get() + 1);
        Ok(())
    }
}

impl EditorRuntime for FakeRuntime {
    type Instance = FakeInstance;

    async fn load(&self) -> Result<(), RuntimeError> {
        self.probe.loads.set(self.probe.loads.get() + 1);
        let gate = self.gate.borrow_mut().take();
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(RuntimeError::new("load gate dropped"))),
            None => Ok(()),
        }
    }

    fn instantiate(&self, emitter: EventEmitter) -> Result<FakeInstance, RuntimeError> {
        self.probe.instances.set(self.probe.instances.get() + 1);
        *self.probe.emitter.borrow_mut() = Some(emitter);
        Ok(FakeInstance {
            probe: self.probe.clone(),
        })
    }
}

/// Host that records every open request.
#[derive(Default)]
pub struct RecordingHost {
    opened: RefCell<Vec<String>>,
    attempts: RefCell<Vec<String>>,
    block_next: Cell<usize>,
}

impl RecordingHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Refuse the next `count` requests, like a popup blocker.
    pub fn block_next(&self, count: usize) {
        self.block_next.set(count);
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.borrow().clone()
    }
}

impl HostShell for RecordingHost {
    fn open_new_context(&self, target: &str) -> Result<(), HostError> {
        self.attempts.borrow_mut().push(target.to_owned());
        let blocked = self.block_next.get();
        if blocked > 0 {
            self.block_next.set(blocked - 1);
            return Err(HostError::Blocked);
        }
        self.opened.borrow_mut().push(target.to_owned());
        Ok(())
    }
}
