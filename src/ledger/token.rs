//! ERC-20 style token implementation
//!
//! Provides a fungible token with standard interface. Vaults hold tokens the
//! same way any other account does: as a balance entry under their address.

use crate::core::{Address, Amount, Asset, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Number of transfers kept in a token's history
pub const TRANSFER_HISTORY_LIMIT: usize = 100;

/// Ledger-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Token not found: {0}")]
    TokenNotFound(Address),
    #[error("Token already exists: {0}")]
    TokenAlreadyExists(Address),
    #[error("Invalid address: cannot transfer to self")]
    SelfTransfer,
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Invalid supply: must be greater than 0")]
    InvalidSupply,
    #[error("Only the token creator can mint")]
    NotCreator,
    #[error("Arithmetic overflow")]
    Overflow,
}

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "My Token")
    pub name: String,
    /// Token symbol (e.g., "MTK")
    pub symbol: String,
    /// Decimal places (usually 18)
    pub decimals: u8,
    /// Supply minted at creation
    pub initial_supply: Amount,
    /// Creator address
    pub creator: Address,
    /// Host time when created
    pub created_at: Timestamp,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(
        name: String,
        symbol: String,
        decimals: u8,
        initial_supply: Amount,
        creator: Address,
        created_at: Timestamp,
    ) -> Result<Self, LedgerError> {
        if name.is_empty() || name.len() > 50 {
            return Err(LedgerError::InvalidName);
        }

        if symbol.is_empty() || symbol.len() > 10 {
            return Err(LedgerError::InvalidSymbol);
        }

        if decimals > 18 {
            return Err(LedgerError::InvalidDecimals);
        }

        if initial_supply == 0 {
            return Err(LedgerError::InvalidSupply);
        }

        Ok(Self {
            name,
            symbol,
            decimals,
            initial_supply,
            creator,
            created_at,
        })
    }
}

/// A completed movement of funds between two accounts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferEvent {
    pub asset: Asset,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    /// Opaque call data carried along with the transfer
    #[serde(default)]
    pub memo: Vec<u8>,
    pub timestamp: Timestamp,
}

/// An ERC-20 style fungible token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Unique token address
    pub address: Address,
    /// Token metadata
    pub metadata: TokenMetadata,
    /// Circulating supply (grows with mint)
    total_supply: Amount,
    /// Balances: address -> amount
    balances: HashMap<Address, Amount>,
    /// Transfer history (last TRANSFER_HISTORY_LIMIT)
    pub transfer_history: Vec<TransferEvent>,
}

impl Token {
    /// Create a new token with the initial supply allocated to its creator
    pub fn new(address: Address, metadata: TokenMetadata) -> Self {
        let mut balances = HashMap::new();
        balances.insert(metadata.creator.clone(), metadata.initial_supply);

        Self {
            address,
            total_supply: metadata.initial_supply,
            metadata,
            balances,
            transfer_history: Vec::new(),
        }
    }

    // =========================================================================
    // View Functions
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Get balance of an address
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Get holder count
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    // =========================================================================
    // Mutating Functions
    // =========================================================================

    /// Transfer tokens from one address to another
    ///
    /// Validation happens before any balance is touched, so a rejected
    /// transfer leaves the token unchanged.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
        memo: &[u8],
        timestamp: Timestamp,
    ) -> Result<TransferEvent, LedgerError> {
        self.move_balance(from, to, amount)?;
        Ok(self.record(from, to, amount, memo, timestamp))
    }

    /// Mint new tokens (creator only)
    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        if caller != &self.metadata.creator {
            return Err(LedgerError::NotCreator);
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.total_supply = supply;
        self.balances.insert(to.clone(), balance);
        Ok(balance)
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        if from == to {
            return Err(LedgerError::SelfTransfer);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(from.clone(), from_balance - amount);
        self.balances.insert(to.clone(), to_balance);
        Ok(())
    }

    fn record(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
        memo: &[u8],
        timestamp: Timestamp,
    ) -> TransferEvent {
        let event = TransferEvent {
            asset: Asset::Token(self.address.clone()),
            from: from.clone(),
            to: to.clone(),
            amount,
            memo: memo.to_vec(),
            timestamp,
        };

        self.transfer_history.push(event.clone());
        if self.transfer_history.len() > TRANSFER_HISTORY_LIMIT {
            self.transfer_history.remove(0);
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn create_test_token() -> Token {
        let metadata = TokenMetadata::new(
            "Test Token".to_string(),
            "TST".to_string(),
            18,
            1_000_000,
            addr("creator"),
            1,
        )
        .unwrap();

        Token::new(addr("0xTEST"), metadata)
    }

    #[test]
    fn test_token_creation() {
        let token = create_test_token();

        assert_eq!(token.name(), "Test Token");
        assert_eq!(token.symbol(), "TST");
        assert_eq!(token.decimals(), 18);
        assert_eq!(token.total_supply(), 1_000_000);
        assert_eq!(token.balance_of(&addr("creator")), 1_000_000);
        assert_eq!(token.holder_count(), 1);
    }

    #[test]
    fn test_metadata_validation() {
        let make = |name: &str, symbol: &str, decimals: u8, supply: Amount| {
            TokenMetadata::new(
                name.to_string(),
                symbol.to_string(),
                decimals,
                supply,
                addr("c"),
                1,
            )
        };

        assert_eq!(make("", "TST", 18, 1000), Err(LedgerError::InvalidName));
        assert_eq!(
            make("Test", "TOOLONGSYMBOL", 18, 1000),
            Err(LedgerError::InvalidSymbol)
        );
        assert_eq!(make("Test", "TST", 19, 1000), Err(LedgerError::InvalidDecimals));
        assert_eq!(make("Test", "TST", 18, 0), Err(LedgerError::InvalidSupply));
    }

    #[test]
    fn test_transfer() {
        let mut token = create_test_token();

        let event = token
            .transfer(&addr("creator"), &addr("recipient"), 1000, b"memo", 7)
            .unwrap();

        assert_eq!(event.from, addr("creator"));
        assert_eq!(event.to, addr("recipient"));
        assert_eq!(event.amount, 1000);
        assert_eq!(event.memo, b"memo".to_vec());
        assert_eq!(token.balance_of(&addr("creator")), 999_000);
        assert_eq!(token.balance_of(&addr("recipient")), 1000);
        assert_eq!(token.holder_count(), 2);
        assert_eq!(token.transfer_history.len(), 1);
    }

    #[test]
    fn test_rejected_transfer_leaves_balances() {
        let mut token = create_test_token();

        let result = token.transfer(&addr("creator"), &addr("recipient"), 2_000_000, &[], 0);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(
            token.transfer(&addr("creator"), &addr("recipient"), 0, &[], 0),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            token.transfer(&addr("creator"), &addr("creator"), 100, &[], 0),
            Err(LedgerError::SelfTransfer)
        );

        assert_eq!(token.balance_of(&addr("creator")), 1_000_000);
        assert_eq!(token.balance_of(&addr("recipient")), 0);
        assert!(token.transfer_history.is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut token = create_test_token();

        for i in 0..(TRANSFER_HISTORY_LIMIT + 5) {
            token
                .transfer(&addr("creator"), &addr("recipient"), 1, &[], i as u64)
                .unwrap();
        }

        assert_eq!(token.transfer_history.len(), TRANSFER_HISTORY_LIMIT);
        assert_eq!(token.transfer_history[0].timestamp, 5);
    }

    #[test]
    fn test_mint_is_creator_only() {
        let mut token = create_test_token();

        assert_eq!(
            token.mint(&addr("stranger"), &addr("stranger"), 10),
            Err(LedgerError::NotCreator)
        );

        token.mint(&addr("creator"), &addr("vault"), 500).unwrap();
        assert_eq!(token.balance_of(&addr("vault")), 500);
        assert_eq!(token.total_supply(), 1_000_500);

        assert_eq!(
            token.mint(&addr("creator"), &addr("vault"), 0),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            token.mint(&addr("creator"), &addr("vault"), Amount::MAX),
            Err(LedgerError::Overflow)
        );
        assert_eq!(token.total_supply(), 1_000_500);
    }
}
