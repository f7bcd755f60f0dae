//! Solidity bindings for the fixed contracts

use alloy_sol_types::sol;

sol! {
    interface IERC20Metadata {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }

    interface INomekopNft {
        function mint(address to, string tokenURI) external returns (uint256);
        function approve(address to, uint256 tokenId) external;
        function ownerOf(uint256 tokenId) external view returns (address);
        function tokenURI(uint256 tokenId) external view returns (string);
    }

    interface INomekopMarket {
        event ItemListed(
            address indexed nftAddress,
            uint256 indexed tokenId,
            address indexed seller,
            uint256 priceWei
        );

        function listItem(address nftAddress, uint256 tokenId, uint256 priceWei) external;
        function cancelListing(address nftAddress, uint256 tokenId) external;
        function buyItem(address nftAddress, uint256 tokenId) external payable;
        function listings(address nftAddress, uint256 tokenId)
            external
            view
            returns (address seller, uint256 priceWei);
    }
}
