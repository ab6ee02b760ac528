use tessera_core::Address;

use crate::block::Block;

/// The external multi-chain registry, injected into every chain.
///
/// The engine depends only on this query/notify surface: parent-chain
/// lookups for root walks and the plugin hook fired after each accepted
/// block. No process-wide state is involved.
pub trait Nexus: Send + Sync {
    /// Whether a chain of this name is registered
    fn contains_chain(&self, name: &str) -> bool;

    /// Parent chain of the given chain, if it has one
    fn parent_of(&self, chain: &Address) -> Option<Address>;

    /// Fired after a chain accepts a block
    fn plugin_trigger_block(&self, chain: &Address, block: &Block);
}

/// Nexus for a chain that lives alone: no siblings, no plugins
#[derive(Debug, Default)]
pub struct SoloNexus;

impl Nexus for SoloNexus {
    fn contains_chain(&self, _name: &str) -> bool {
        false
    }

    fn parent_of(&self, _chain: &Address) -> Option<Address> {
        None
    }

    fn plugin_trigger_block(&self, _chain: &Address, _block: &Block) {}
}
