use tessera_core::{Address, Value};
use tessera_state::Storage;

use crate::block::ChainView;
use crate::error::ChainError;

/// Result stack left behind by script execution
#[derive(Debug, Clone, Default)]
pub struct ValueStack {
    items: Vec<Value>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.items.pop()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The script-builder / virtual-machine collaborator.
///
/// The engine never interprets scripts; it asks the engine's binding to
/// build a call script and to run it against a store view, then converts
/// the top of the result stack back to a host value.
pub trait ScriptEngine: Send + Sync {
    /// Build a script that calls `method` on the contract at `target`
    fn build_call(
        &self,
        target: &Address,
        method: &str,
        args: &[Value],
    ) -> Result<Vec<u8>, ChainError>;

    /// Run a script against the given chain view and store
    fn execute(
        &self,
        script: &[u8],
        view: &ChainView<'_>,
        store: &mut dyn Storage,
    ) -> Result<ValueStack, ChainError>;
}
