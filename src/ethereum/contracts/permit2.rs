//! Permit2 allowance registry bindings.

use alloy::sol;

// Permit2 AllowanceTransfer interface (signature-less subset)
sol! {
    #[sol(rpc)]
    interface IPermit2 {
        function allowance(address user, address token, address spender)
            external
            view
            returns (uint160 amount, uint48 expiration, uint48 nonce);

        function approve(address token, address spender, uint160 amount, uint48 expiration) external;
    }
}
