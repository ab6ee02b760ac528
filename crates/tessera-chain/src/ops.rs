//! Token accounting operations for executing transactions.
//!
//! Helpers that transaction executors call from inside `execute`; every
//! ledger mutation goes through the context's staged store, so whatever a
//! rejected block touched simply never lands, and whatever a committed
//! block touched can be undone during reorg.

use tessera_core::{Address, Event, Hash, Token};
use tessera_state::{BalanceSheet, OwnershipSheet, StateError, SupplySheet};
use tracing::debug;

use crate::block::TxContext;
use crate::error::ChainError;

/// Mint fungible units into an address.
///
/// Capped tokens are bounded by their supply sheet: on the root chain the
/// resident supply is raised along with circulation (bounded by the cap);
/// on a child chain circulation is bounded by the amount borrowed from
/// the parent.
pub fn mint_token(
    ctx: &mut TxContext<'_>,
    token: &dyn Token,
    to: &Address,
    amount: u64,
) -> Result<(), ChainError> {
    if token.is_capped() {
        let sheet = SupplySheet::new(token.id());
        let mut supply = sheet.load(&ctx.store)?.ok_or(StateError::SupplyMissing)?;
        if ctx.chain.is_root {
            supply.raise_local(amount)?;
        }
        supply.mint(amount)?;
        sheet.save(&mut ctx.store, &supply)?;
    }

    BalanceSheet::new(token.id()).add(&mut ctx.store, to, amount)?;

    debug!(token = %token.id(), %to, amount, "minted");
    ctx.emit(Event::TokenMinted {
        token: token.id(),
        to: *to,
        amount,
    });
    Ok(())
}

/// Burn fungible units held by an address
pub fn burn_token(
    ctx: &mut TxContext<'_>,
    token: &dyn Token,
    from: &Address,
    amount: u64,
) -> Result<(), ChainError> {
    BalanceSheet::new(token.id()).subtract(&mut ctx.store, from, amount)?;

    if token.is_capped() {
        let sheet = SupplySheet::new(token.id());
        let mut supply = sheet.load(&ctx.store)?.ok_or(StateError::SupplyMissing)?;
        supply.burn(amount)?;
        if ctx.chain.is_root {
            supply.lower_local(amount)?;
        }
        sheet.save(&mut ctx.store, &supply)?;
    }

    debug!(token = %token.id(), %from, amount, "burned");
    ctx.emit(Event::TokenBurned {
        token: token.id(),
        from: *from,
        amount,
    });
    Ok(())
}

/// Move fungible units between addresses
pub fn transfer_token(
    ctx: &mut TxContext<'_>,
    token: &Hash,
    from: &Address,
    to: &Address,
    amount: u64,
) -> Result<(), ChainError> {
    BalanceSheet::new(*token).transfer(&mut ctx.store, from, to, amount)?;

    ctx.emit(Event::TokenTransferred {
        token: *token,
        from: *from,
        to: *to,
        amount,
    });
    Ok(())
}

/// Create an NFT payload and assign the fresh instance to an owner
pub fn mint_nft(
    ctx: &mut TxContext<'_>,
    token: &dyn Token,
    owner: &Address,
    data: Vec<u8>,
) -> Result<u64, ChainError> {
    let id = ctx.chain.nfts.create(token, data);
    OwnershipSheet::new(token.id()).give(&mut ctx.store, owner, id)?;

    ctx.emit(Event::NftCreated {
        token: token.id(),
        id,
    });
    Ok(id)
}

/// Release an NFT instance from its owner and drop its payload
pub fn burn_nft(
    ctx: &mut TxContext<'_>,
    token: &Hash,
    owner: &Address,
    id: u64,
) -> Result<(), ChainError> {
    OwnershipSheet::new(*token).take(&mut ctx.store, owner, id)?;
    ctx.chain.nfts.destroy(token, id);

    ctx.emit(Event::NftDestroyed { token: *token, id });
    Ok(())
}
