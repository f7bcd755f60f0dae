//! Typed wrappers around the fixed contracts
//!
//! Reads go through any [`ChainReader`]; writes are encoded here and handed to
//! a [`Signer`]. Return data is decoded with the `sol!` bindings in
//! [`crate::abi`].

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};

use crate::abi::{IERC20Metadata, INomekopMarket, INomekopNft};
use crate::error::ProviderError;
use crate::provider::{ChainReader, Signer};
use crate::types::{ItemListed, LogEntry, LogFilter, TransactionRequest, TxHash};
use crate::Result;

async fn read<C, R>(reader: &R, to: Address, call: C) -> Result<C::Return>
where
    C: SolCall + Send,
    R: ChainReader + ?Sized,
{
    let raw = reader.call(to, Bytes::from(call.abi_encode())).await?;
    Ok(C::abi_decode_returns(&raw)?)
}

async fn write<C>(signer: &dyn Signer, to: Address, value: U256, call: C) -> Result<TxHash>
where
    C: SolCall + Send,
{
    let tx = TransactionRequest {
        from: signer.address(),
        to,
        value,
        data: Bytes::from(call.abi_encode()),
    };
    signer.send_transaction(tx).await
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub decimals: u8,
    pub symbol: String,
}

/// Fungible token (ERC-20 with metadata extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Erc20 {
    address: Address,
}

impl Erc20 {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn balance_of<R>(&self, reader: &R, owner: Address) -> Result<U256>
    where
        R: ChainReader + ?Sized,
    {
        read(reader, self.address, IERC20Metadata::balanceOfCall { owner }).await
    }

    pub async fn decimals<R>(&self, reader: &R) -> Result<u8>
    where
        R: ChainReader + ?Sized,
    {
        read(reader, self.address, IERC20Metadata::decimalsCall {}).await
    }

    pub async fn symbol<R>(&self, reader: &R) -> Result<String>
    where
        R: ChainReader + ?Sized,
    {
        read(reader, self.address, IERC20Metadata::symbolCall {}).await
    }

    pub async fn metadata<R>(&self, reader: &R) -> Result<TokenMetadata>
    where
        R: ChainReader + ?Sized,
    {
        let decimals = self.decimals(reader).await?;
        let symbol = self.symbol(reader).await?;
        Ok(TokenMetadata { decimals, symbol })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NftContract {
    address: Address,
}

impl NftContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn owner_of<R>(&self, reader: &R, token_id: U256) -> Result<Address>
    where
        R: ChainReader + ?Sized,
    {
        read(reader, self.address, INomekopNft::ownerOfCall { tokenId: token_id }).await
    }

    pub async fn token_uri<R>(&self, reader: &R, token_id: U256) -> Result<String>
    where
        R: ChainReader + ?Sized,
    {
        read(reader, self.address, INomekopNft::tokenURICall { tokenId: token_id }).await
    }

    pub async fn mint(&self, signer: &dyn Signer, to: Address, token_uri: String) -> Result<TxHash> {
        let call = INomekopNft::mintCall {
            to,
            tokenURI: token_uri,
        };
        write(signer, self.address, U256::ZERO, call).await
    }

    pub async fn approve(&self, signer: &dyn Signer, to: Address, token_id: U256) -> Result<TxHash> {
        let call = INomekopNft::approveCall {
            to,
            tokenId: token_id,
        };
        write(signer, self.address, U256::ZERO, call).await
    }
}

/// Current on-chain listing state for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketListing {
    pub seller: Address,
    pub price_wei: U256,
}

impl MarketListing {
    /// Sold or cancelled listings read back as a zero price.
    pub fn is_active(&self) -> bool {
        !self.price_wei.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketContract {
    address: Address,
}

impl MarketContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn listing<R>(&self, reader: &R, nft: Address, token_id: U256) -> Result<MarketListing>
    where
        R: ChainReader + ?Sized,
    {
        let ret = read(
            reader,
            self.address,
            INomekopMarket::listingsCall {
                nftAddress: nft,
                tokenId: token_id,
            },
        )
        .await?;

        Ok(MarketListing {
            seller: ret.seller,
            price_wei: ret.priceWei,
        })
    }

    pub async fn list_item(
        &self,
        signer: &dyn Signer,
        nft: Address,
        token_id: U256,
        price_wei: U256,
    ) -> Result<TxHash> {
        let call = INomekopMarket::listItemCall {
            nftAddress: nft,
            tokenId: token_id,
            priceWei: price_wei,
        };
        write(signer, self.address, U256::ZERO, call).await
    }

    pub async fn cancel_listing(&self, signer: &dyn Signer, nft: Address, token_id: U256) -> Result<TxHash> {
        let call = INomekopMarket::cancelListingCall {
            nftAddress: nft,
            tokenId: token_id,
        };
        write(signer, self.address, U256::ZERO, call).await
    }

    /// `buyItem` is payable; `value` must equal the listing price.
    pub async fn buy_item(
        &self,
        signer: &dyn Signer,
        nft: Address,
        token_id: U256,
        value: U256,
    ) -> Result<TxHash> {
        let call = INomekopMarket::buyItemCall {
            nftAddress: nft,
            tokenId: token_id,
        };
        write(signer, self.address, value, call).await
    }

    /// Filter selecting `ItemListed` events for one NFT collection.
    pub fn item_listed_filter(&self, nft: Address, from_block: u64) -> LogFilter {
        LogFilter {
            address: Some(self.address),
            topics: [
                Some(INomekopMarket::ItemListed::SIGNATURE_HASH),
                Some(nft.into_word()),
                None,
                None,
            ],
            from_block,
            to_block: None,
        }
    }

    pub async fn item_listed_events<R>(&self, reader: &R, nft: Address, from_block: u64) -> Result<Vec<ItemListed>>
    where
        R: ChainReader + ?Sized,
    {
        let logs = reader.logs(&self.item_listed_filter(nft, from_block)).await?;
        logs.iter().map(decode_item_listed).collect()
    }
}

pub(crate) fn decode_item_listed(log: &LogEntry) -> Result<ItemListed> {
    if log.topics.first() != Some(&INomekopMarket::ItemListed::SIGNATURE_HASH) {
        return Err(ProviderError::Decode("not an ItemListed log".to_string()));
    }

    let event = INomekopMarket::ItemListed::decode_raw_log(log.topics.iter().copied(), &log.data)?;
    Ok(ItemListed {
        nft_address: event.nftAddress,
        token_id: event.tokenId,
        seller: event.seller,
        price_wei: event.priceWei,
        block_number: log.block_number,
    })
}

/// Build the raw log a marketplace would emit for a listing.
pub fn encode_item_listed(
    market: Address,
    nft: Address,
    token_id: U256,
    seller: Address,
    price_wei: U256,
    block_number: Option<u64>,
) -> LogEntry {
    LogEntry {
        address: market,
        topics: vec![
            INomekopMarket::ItemListed::SIGNATURE_HASH,
            nft.into_word(),
            B256::from(token_id.to_be_bytes::<32>()),
            seller.into_word(),
        ],
        data: Bytes::from(price_wei.to_be_bytes::<32>().to_vec()),
        block_number,
    }
}
