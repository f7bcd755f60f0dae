//! Marketplace actions

use std::sync::Arc;

use alloy_primitives::utils::parse_ether;
use async_trait::async_trait;
use futures_util::future::join_all;
use nomekop_chain::{
    Address, Bytes, ChainReader, LogEntry, LogFilter, MarketContract, Network, NftContract,
    TxHash, WalletProvider, U256,
};
use nomekop_session::SessionController;

use crate::error::MarketError;
use crate::listing::{latest_per_token, Listing};
use crate::Result;

/// Hashes of the two transactions submitted when listing a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListReceipt {
    pub approve_tx: TxHash,
    pub list_tx: TxHash,
}

/// Read access through the injected wallet.
struct WalletReader(Arc<dyn WalletProvider>);

#[async_trait]
impl ChainReader for WalletReader {
    async fn accounts(&self) -> nomekop_chain::Result<Vec<Address>> {
        self.0.accounts().await
    }

    async fn network(&self) -> nomekop_chain::Result<Network> {
        self.0.network().await
    }

    async fn balance(&self, address: Address) -> nomekop_chain::Result<U256> {
        self.0.balance(address).await
    }

    async fn call(&self, to: Address, data: Bytes) -> nomekop_chain::Result<Bytes> {
        self.0.call(to, data).await
    }

    async fn logs(&self, filter: &LogFilter) -> nomekop_chain::Result<Vec<LogEntry>> {
        self.0.logs(filter).await
    }
}

pub struct Marketplace {
    controller: Arc<SessionController>,
    /// Public endpoint used when no wallet is injected
    fallback: Option<Arc<dyn ChainReader>>,
    nft: NftContract,
    market: MarketContract,
    /// First block searched for listing events
    from_block: u64,
}

impl Marketplace {
    pub fn new(
        controller: Arc<SessionController>,
        fallback: Option<Arc<dyn ChainReader>>,
        nft: Address,
        market: Address,
        from_block: u64,
    ) -> Self {
        Self {
            controller,
            fallback,
            nft: NftContract::new(nft),
            market: MarketContract::new(market),
            from_block,
        }
    }

    pub fn nft_address(&self) -> Address {
        self.nft.address()
    }

    pub fn market_address(&self) -> Address {
        self.market.address()
    }

    fn reader(&self) -> Result<Arc<dyn ChainReader>> {
        if let Some(provider) = self.controller.provider() {
            return Ok(Arc::new(WalletReader(provider)));
        }
        self.fallback.clone().ok_or(MarketError::NoReader)
    }

    /// Open listings, newest token id first.
    ///
    /// Every `ItemListed` event for the collection is replayed and the latest
    /// one per token is checked against `listings()`; sold or cancelled tokens
    /// read back with a zero price and are skipped.
    pub async fn active_listings(&self) -> Result<Vec<Listing>> {
        let reader = self.reader()?;
        let nft = self.nft.address();

        let events = self
            .market
            .item_listed_events(reader.as_ref(), nft, self.from_block)
            .await?;
        let latest = latest_per_token(events);

        let checks = latest.keys().rev().map(|&token_id| {
            let reader = Arc::clone(&reader);
            async move {
                let listing = self.market.listing(reader.as_ref(), nft, token_id).await;
                (token_id, listing)
            }
        });

        let mut listings = Vec::new();
        for (token_id, result) in join_all(checks).await {
            match result {
                Ok(current) if current.is_active() => {
                    listings.push(Listing::new(token_id, current.seller, current.price_wei));
                }
                Ok(_) => {
                    tracing::debug!(token_id = %token_id, "Listing no longer active");
                }
                Err(e) => {
                    tracing::warn!(token_id = %token_id, error = %e, "Failed to confirm listing");
                }
            }
        }

        tracing::info!(count = listings.len(), "Loaded marketplace listings");

        Ok(listings)
    }

    /// Buy a listed token at its current on-chain price.
    pub async fn buy(&self, token_id: U256) -> Result<TxHash> {
        let signer = self.controller.signer().await?;
        let reader = self.reader()?;

        let listing = self
            .market
            .listing(reader.as_ref(), self.nft.address(), token_id)
            .await?;
        if !listing.is_active() {
            return Err(MarketError::NotListed(token_id));
        }

        let tx = self
            .market
            .buy_item(signer.as_ref(), self.nft.address(), token_id, listing.price_wei)
            .await?;

        tracing::info!(
            token_id = %token_id,
            price_wei = %listing.price_wei,
            tx = %tx,
            "Submitted purchase"
        );

        Ok(tx)
    }

    /// Approve the marketplace for `token_id` and list it at `price_eth`.
    pub async fn list(&self, token_id: U256, price_eth: &str) -> Result<ListReceipt> {
        let price_wei = parse_ether(price_eth.trim())
            .map_err(|e| MarketError::InvalidPrice(format!("{price_eth}: {e}")))?;
        if price_wei.is_zero() {
            return Err(MarketError::InvalidPrice(format!(
                "{price_eth}: must be greater than zero"
            )));
        }

        let signer = self.controller.signer().await?;

        let approve_tx = self
            .nft
            .approve(signer.as_ref(), self.market.address(), token_id)
            .await?;
        let list_tx = self
            .market
            .list_item(signer.as_ref(), self.nft.address(), token_id, price_wei)
            .await?;

        tracing::info!(token_id = %token_id, price_wei = %price_wei, "Submitted listing");

        Ok(ListReceipt {
            approve_tx,
            list_tx,
        })
    }

    pub async fn cancel(&self, token_id: U256) -> Result<TxHash> {
        let signer = self.controller.signer().await?;
        let tx = self
            .market
            .cancel_listing(signer.as_ref(), self.nft.address(), token_id)
            .await?;

        tracing::info!(token_id = %token_id, "Submitted listing cancellation");

        Ok(tx)
    }

    /// Mint a new token to the connected account.
    pub async fn mint(&self, token_uri: String) -> Result<TxHash> {
        let signer = self.controller.signer().await?;
        let owner = signer.address();
        let tx = self.nft.mint(signer.as_ref(), owner, token_uri).await?;

        tracing::info!(owner = %owner, "Submitted mint");

        Ok(tx)
    }

    pub async fn owner_of(&self, token_id: U256) -> Result<Address> {
        let reader = self.reader()?;
        Ok(self.nft.owner_of(reader.as_ref(), token_id).await?)
    }

    pub async fn token_uri(&self, token_id: U256) -> Result<String> {
        let reader = self.reader()?;
        Ok(self.nft.token_uri(reader.as_ref(), token_id).await?)
    }
}
