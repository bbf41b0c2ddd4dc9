//! In-memory host ledger
//!
//! Holds native-currency balances and the registry of deployed tokens.

use crate::core::{Address, Amount, Asset, Timestamp};
use crate::crypto::derive_address;
use crate::ledger::token::{LedgerError, Token, TokenMetadata, TransferEvent};
use crate::ledger::{AssetLedger, Transfer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Native balances plus every token known to the host
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Native currency balances
    native: HashMap<Address, Amount>,
    /// All tokens by address
    tokens: HashMap<Address, Token>,
    /// Deployment counter for token address generation
    nonce: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint native currency into an account (genesis allocation / faucet)
    pub fn credit_native(&mut self, to: &Address, amount: Amount) -> Result<Amount, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let balance = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.native.insert(to.clone(), balance);

        log::debug!("Credited {} native to {}", amount, to);
        Ok(balance)
    }

    pub fn native_balance(&self, holder: &Address) -> Amount {
        self.native.get(holder).copied().unwrap_or(0)
    }

    /// Create a new token; the full initial supply goes to the creator
    pub fn create_token(
        &mut self,
        name: String,
        symbol: String,
        decimals: u8,
        initial_supply: Amount,
        creator: &Address,
        timestamp: Timestamp,
    ) -> Result<Address, LedgerError> {
        let metadata = TokenMetadata::new(
            name,
            symbol,
            decimals,
            initial_supply,
            creator.clone(),
            timestamp,
        )?;

        let address = derive_address(
            &format!("token:{}", metadata.symbol),
            creator.as_str(),
            self.nonce,
        );

        if self.tokens.contains_key(&address) {
            return Err(LedgerError::TokenAlreadyExists(address));
        }
        self.nonce += 1;

        let token = Token::new(address.clone(), metadata);
        log::info!(
            "Token created: {} ({}) at {}",
            token.name(),
            token.symbol(),
            address
        );
        self.tokens.insert(address.clone(), token);

        Ok(address)
    }

    /// Get a token by address
    pub fn token(&self, address: &Address) -> Option<&Token> {
        self.tokens.get(address)
    }

    /// List all tokens
    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens: Vec<&Token> = self.tokens.values().collect();
        tokens.sort_by(|a, b| a.address.cmp(&b.address));
        tokens
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn mint(
        &mut self,
        token: &Address,
        caller: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        self.token_mut(token)?.mint(caller, to, amount)
    }

    fn token_mut(&mut self, address: &Address) -> Result<&mut Token, LedgerError> {
        self.tokens
            .get_mut(address)
            .ok_or_else(|| LedgerError::TokenNotFound(address.clone()))
    }

    fn transfer_native(&mut self, transfer: &Transfer) -> Result<(), LedgerError> {
        if transfer.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        if transfer.from == transfer.to {
            return Err(LedgerError::SelfTransfer);
        }

        let from_balance = self.native_balance(&transfer.from);
        if from_balance < transfer.amount {
            return Err(LedgerError::InsufficientBalance {
                have: from_balance,
                need: transfer.amount,
            });
        }

        let to_balance = self
            .native_balance(&transfer.to)
            .checked_add(transfer.amount)
            .ok_or(LedgerError::Overflow)?;

        self.native
            .insert(transfer.from.clone(), from_balance - transfer.amount);
        self.native.insert(transfer.to.clone(), to_balance);
        Ok(())
    }
}

impl AssetLedger for Ledger {
    fn balance_of(&self, asset: &Asset, holder: &Address) -> Amount {
        match asset {
            Asset::Native => self.native_balance(holder),
            Asset::Token(token) => self
                .tokens
                .get(token)
                .map(|t| t.balance_of(holder))
                .unwrap_or(0),
        }
    }

    fn transfer(
        &mut self,
        transfer: &Transfer,
        timestamp: Timestamp,
    ) -> Result<TransferEvent, LedgerError> {
        match &transfer.asset {
            Asset::Native => {
                self.transfer_native(transfer)?;
                Ok(TransferEvent {
                    asset: Asset::Native,
                    from: transfer.from.clone(),
                    to: transfer.to.clone(),
                    amount: transfer.amount,
                    memo: transfer.memo.clone(),
                    timestamp,
                })
            }
            Asset::Token(token) => self.token_mut(token)?.transfer(
                &transfer.from,
                &transfer.to,
                transfer.amount,
                &transfer.memo,
                timestamp,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::from(s)
    }

    fn create_token(ledger: &mut Ledger, symbol: &str, creator: &str) -> Address {
        ledger
            .create_token(
                format!("{} Token", symbol),
                symbol.to_string(),
                18,
                1_000_000,
                &addr(creator),
                1,
            )
            .unwrap()
    }

    #[test]
    fn test_ledger_creation() {
        let ledger = Ledger::new();
        assert_eq!(ledger.token_count(), 0);
        assert_eq!(ledger.native_balance(&addr("alice")), 0);
    }

    #[test]
    fn test_native_transfer() {
        let mut ledger = Ledger::new();
        ledger.credit_native(&addr("alice"), 100).unwrap();

        let transfer = Transfer::native(addr("alice"), addr("bob"), 40);
        let event = ledger.transfer(&transfer, 9).unwrap();

        assert_eq!(event.asset, Asset::Native);
        assert_eq!(event.timestamp, 9);
        assert_eq!(ledger.balance_of(&Asset::Native, &addr("alice")), 60);
        assert_eq!(ledger.balance_of(&Asset::Native, &addr("bob")), 40);
    }

    #[test]
    fn test_native_transfer_rejections() {
        let mut ledger = Ledger::new();
        ledger.credit_native(&addr("alice"), 100).unwrap();

        assert!(matches!(
            ledger.transfer(&Transfer::native(addr("alice"), addr("bob"), 101), 0),
            Err(LedgerError::InsufficientBalance { have: 100, need: 101 })
        ));
        assert_eq!(
            ledger.transfer(&Transfer::native(addr("alice"), addr("alice"), 1), 0),
            Err(LedgerError::SelfTransfer)
        );
        assert_eq!(
            ledger.transfer(&Transfer::native(addr("alice"), addr("bob"), 0), 0),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(ledger.native_balance(&addr("alice")), 100);
    }

    #[test]
    fn test_token_creation() {
        let mut ledger = Ledger::new();
        let token = create_token(&mut ledger, "TST", "creator");

        assert!(token.is_derived());
        assert_eq!(ledger.token_count(), 1);
        assert_eq!(
            ledger.balance_of(&Asset::Token(token.clone()), &addr("creator")),
            1_000_000
        );

        // Same creator and symbol gets a fresh address
        let second = create_token(&mut ledger, "TST", "creator");
        assert_ne!(token, second);
    }

    #[test]
    fn test_token_transfer_via_ledger() {
        let mut ledger = Ledger::new();
        let token = create_token(&mut ledger, "TST", "creator");
        let asset = Asset::Token(token.clone());

        let transfer = Transfer {
            asset: asset.clone(),
            from: addr("creator"),
            to: addr("vault"),
            amount: 1000,
            memo: vec![],
        };
        ledger.transfer(&transfer, 0).unwrap();

        assert_eq!(ledger.balance_of(&asset, &addr("creator")), 999_000);
        assert_eq!(ledger.balance_of(&asset, &addr("vault")), 1000);
    }

    #[test]
    fn test_unknown_token() {
        let mut ledger = Ledger::new();
        let asset = Asset::Token(addr("0xNONEXISTENT"));

        assert_eq!(ledger.balance_of(&asset, &addr("alice")), 0);

        let transfer = Transfer {
            asset,
            from: addr("alice"),
            to: addr("bob"),
            amount: 1,
            memo: vec![],
        };
        assert!(matches!(
            ledger.transfer(&transfer, 0),
            Err(LedgerError::TokenNotFound(_))
        ));
    }

    #[test]
    fn test_mint_via_ledger() {
        let mut ledger = Ledger::new();
        let token = create_token(&mut ledger, "TST", "creator");

        ledger
            .mint(&token, &addr("creator"), &addr("vault"), 50)
            .unwrap();
        assert_eq!(ledger.token(&token).unwrap().balance_of(&addr("vault")), 50);

        assert_eq!(
            ledger.mint(&token, &addr("vault"), &addr("vault"), 50),
            Err(LedgerError::NotCreator)
        );
        assert!(matches!(
            ledger.mint(&addr("0xNONEXISTENT"), &addr("creator"), &addr("vault"), 1),
            Err(LedgerError::TokenNotFound(_))
        ));
    }

    #[test]
    fn test_ledger_serde() {
        let mut ledger = Ledger::new();
        ledger.credit_native(&addr("alice"), 10).unwrap();
        let token = create_token(&mut ledger, "TST", "creator");

        let json = serde_json::to_string(&ledger).unwrap();
        let restored: Ledger = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.native_balance(&addr("alice")), 10);
        assert_eq!(
            restored.balance_of(&Asset::Token(token), &addr("creator")),
            1_000_000
        );
    }
}
