//! Solidity interfaces of the two deployed contracts.

use alloy_sol_types::sol;

sol! {
    struct Puppy {
        uint256 puppyId;
        string name;
        string birthday;
        string imageUrl;
        string description;
    }

    struct DonateTransaction {
        address donor;
        address receiver;
        uint256 amount;
        uint256 time;
        uint256 puppyId;
        string message;
        string keyword;
    }

    interface IPuppySponsor {
        function getAllPuppies() external view returns (Puppy[] memory);
        function getAllDonateTransactions() external view returns (DonateTransaction[] memory);
        function owner() external view returns (address);
        function donateForFood(string memory message, string memory keyword) external payable;
        function donateForPuppy(uint256 puppyId, string memory message, string memory keyword) external payable;
        function createNewPuppy(string memory name, string memory birthday, string memory imageUrl, string memory description) external;
    }

    interface IPuppyToken {
        function balanceOf(address account) external view returns (uint256);
        function symbol() external view returns (string memory);
        function owner() external view returns (address);
        function transfer(address to, uint256 amount) external returns (bool);
        function mint(uint256 amount) external;
        function burn(address account, uint256 amount) external;
        function transferOwnership(address newOwner) external;
    }
}
