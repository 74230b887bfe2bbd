use alloy::sol;

// Contract interfaces shared by the generic reducers.
sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string memory);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IStakingRewards {
        function earned(address account) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRewardPool {
        struct EarnedData {
            address token;
            uint256 amount;
        }

        function earned(address account) external returns (EarnedData[] memory claimable);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC4626 {
        function convertToAssets(uint256 shares) external view returns (uint256 assets);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IPoolRegistry {
        function get_balances(address pool) external view returns (uint256[8]);
        function get_underlying_balances(address pool) external view returns (uint256[8]);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IMultiRewarder {
        function rewardTokens(uint256 index) external view returns (address);
        function earned(address account, address rewardToken) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ISlotLocker {
        function rewarder() external view returns (address);
        function getUserSlotLength(address user) external view returns (uint256);
        function getUserNthSlot(address user, uint256 n) external view returns (
            uint256 startTime,
            uint256 endTime,
            uint256 amount,
            uint256 unlockingStrategy,
            uint256 alreadyUnstaked,
            uint256 alreadyWithdrawn
        );
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IRedeemLocker {
        function getUserRedeemsLength(address user) external view returns (uint256);
        function getUserRedeem(address user, uint256 redeemIndex) external view returns (
            uint256 underlyingAmount,
            uint256 lockedAmount,
            uint256 endTime,
            address dividendsContract,
            uint256 dividendsAllocation
        );
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IComet {
        struct AssetInfo {
            uint8 offset;
            address asset;
            address priceFeed;
            uint64 scale;
            uint64 borrowCollateralFactor;
            uint64 liquidateCollateralFactor;
            uint64 liquidationFactor;
            uint128 supplyCap;
        }

        function numAssets() external view returns (uint8);
        function getAssetInfo(uint8 i) external view returns (AssetInfo memory);
        function userCollateral(address account, address asset) external view returns (uint128 balance, uint128 _reserved);
        function borrowBalanceOf(address account) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IIncentivesController {
        function getRewardsBalance(address[] calldata assets, address user) external view returns (uint256);
    }
}
