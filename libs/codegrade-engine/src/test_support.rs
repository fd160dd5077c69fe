// In-memory engine for executor and grader tests
use crate::engine::{ExecutionEngine, Invocation, InvocationFailure};
use crate::value::Value;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

type Script = Box<dyn Fn(Option<&Value>) -> Result<Value, InvocationFailure> + Send + Sync>;
type HangPredicate = Box<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

pub(crate) struct ScriptedEngine {
    script: Script,
    hang_when: Option<HangPredicate>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub(crate) fn new<F>(script: F) -> Self
    where
        F: Fn(Option<&Value>) -> Result<Value, InvocationFailure> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            hang_when: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn never_returns() -> Self {
        Self::new(|_| Ok(Value::Undefined)).hang_when(|_| true)
    }

    /// Invocations whose argument matches never settle.
    pub(crate) fn hang_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.hang_when = Some(Box::new(predicate));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionEngine for ScriptedEngine {
    async fn invoke(&self, invocation: Invocation<'_>) -> Result<Value, InvocationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(hang) = &self.hang_when {
            if hang(invocation.argument) {
                return std::future::pending().await;
            }
        }

        (self.script)(invocation.argument)
    }
}
