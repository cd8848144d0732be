//! Read-only contract calls against an ABI fragment.
//!
//! There are no generated bindings here: a call is described by a parsed
//! [`JsonAbi`], a contract address, a function name and dynamic arguments.
//! Encoding and decoding go through alloy's dynamic ABI coder.
//!
//! ```no_run
//! use yyapr::{abi::ContractCall, rpc::BlockTag};
//! use alloy::{json_abi::JsonAbi, primitives::address};
//!
//! # async fn example(rpc: yyapr::rpc::RpcClient<yyapr::rpc::HttpTransport>) -> Result<(), yyapr::Error> {
//! let abi = JsonAbi::parse(["function poolLength() view returns (uint256 pools)"]).unwrap();
//! let call = ContractCall::new(
//!     &abi,
//!     address!("0x4483f0b6e2f5486d06958c20f8c39a7abe87bf8f"),
//!     "poolLength",
//!     vec![],
//!     BlockTag::Latest,
//! );
//! if let Some(pools) = rpc.call_function(&call).await?.and_then(|decoded| decoded.uint()) {
//!     println!("{pools} pools");
//! }
//! # Ok(())
//! # }
//! ```

use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    json_abi::{Function, JsonAbi},
    primitives::{Address, U256},
};

use crate::{
    Error,
    rpc::{BlockTag, RpcClient, Transport},
};

/// Parses a human readable ABI fragment.
pub fn parse_abi(signatures: &[&str]) -> Result<JsonAbi, Error> {
    JsonAbi::parse(signatures.iter().copied()).map_err(|err| Error::InvalidAbi(err.to_string()))
}

/// A read-only function invocation.
#[derive(Debug, Clone)]
pub struct ContractCall<'a> {
    pub abi: &'a JsonAbi,
    pub address: Address,
    pub function: &'a str,
    pub args: Vec<DynSolValue>,
    pub block: BlockTag,
}

impl<'a> ContractCall<'a> {
    pub fn new(
        abi: &'a JsonAbi,
        address: Address,
        function: &'a str,
        args: Vec<DynSolValue>,
        block: BlockTag,
    ) -> Self {
        Self {
            abi,
            address,
            function,
            args,
            block,
        }
    }

    fn resolve(&self) -> Result<&'a Function, Error> {
        self.abi
            .function(self.function)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| Error::UnknownFunction(self.function.to_owned()))
    }

    /// Selector and arguments, ready to be sent as calldata.
    pub fn calldata(&self) -> Result<Vec<u8>, Error> {
        Ok(self.resolve()?.abi_encode_input(&self.args)?)
    }
}

/// A decoded return value.
///
/// Functions with a single output decode to [`Decoded::Value`], all others to
/// a [`Decoded::Record`] keyed by the declared output names, in declaration
/// order. Unnamed outputs of a record are keyed by their position.
#[derive(Debug, Clone, PartialEq, derive_more::IsVariant)]
pub enum Decoded {
    Value(DynSolValue),
    Record(Vec<(String, DynSolValue)>),
}

impl Decoded {
    fn from_outputs(function: &Function, mut values: Vec<DynSolValue>) -> Self {
        if function.outputs.len() == 1 && values.len() == 1 {
            return Self::Value(values.remove(0));
        }

        let fields = function
            .outputs
            .iter()
            .enumerate()
            .zip(values)
            .map(|((index, param), value)| {
                let name = if param.name.is_empty() {
                    index.to_string()
                } else {
                    param.name.clone()
                };
                (name, value)
            })
            .collect();
        Self::Record(fields)
    }

    /// Returns the named field of a record.
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        match self {
            Self::Value(_) => None,
            Self::Record(fields) => fields
                .iter()
                .find_map(|(field, value)| (field == name).then_some(value)),
        }
    }

    /// Returns the single value as an unsigned integer.
    pub fn uint(&self) -> Option<U256> {
        match self {
            Self::Value(value) => value.as_uint().map(|(value, _)| value),
            Self::Record(_) => None,
        }
    }

    /// Returns the named field as an unsigned integer.
    pub fn uint_field(&self, name: &str) -> Option<U256> {
        self.field(name)?.as_uint().map(|(value, _)| value)
    }

    /// Returns the named field as an address.
    pub fn address_field(&self, name: &str) -> Option<Address> {
        self.field(name)?.as_address()
    }
}

impl<T> RpcClient<T>
where
    T: Transport,
{
    /// Encodes `call`, executes it with `eth_call` and decodes the result.
    ///
    /// Returns `Ok(None)` when the value is not available: the node returned
    /// `null`, the request failed after encoding, or the return data did not
    /// decode. Those cases are logged. A function missing from the ABI or
    /// arguments that do not encode are programming errors and returned as
    /// `Err`.
    pub async fn call_function(&self, call: &ContractCall<'_>) -> Result<Option<Decoded>, Error> {
        let function = call.resolve()?;
        let data = function.abi_encode_input(&call.args)?;

        let bytes = match self.call(call.address, &data, call.block).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(err) => {
                log::error!(
                    "{err} - Error calling function {} for contract {}",
                    call.function,
                    call.address
                );
                return Ok(None);
            }
        };

        match function.abi_decode_output(&bytes) {
            Ok(values) => Ok(Some(Decoded::from_outputs(function, values))),
            Err(err) => {
                log::error!(
                    "{err} - Error decoding function {} for contract {}",
                    call.function,
                    call.address
                );
                Ok(None)
            }
        }
    }
}

/// `uint256` argument.
pub fn uint<T>(value: T) -> DynSolValue
where
    U256: alloy::primitives::ruint::UintTryFrom<T>,
{
    DynSolValue::Uint(U256::from(value), 256)
}

/// `address` argument.
pub fn address(value: Address) -> DynSolValue {
    DynSolValue::Address(value)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use futures::future::join;

    use super::*;
    use crate::{rpc::RetryPolicy, testing::MockTransport};

    const CHEF: Address = address!("0x4483f0b6e2f5486d06958c20f8c39a7abe87bf8f");
    const USER: Address = address!("0xe7462905b79370389e8180e300f58f63d35b725f");

    fn abi() -> JsonAbi {
        parse_abi(&[
            "function poolLength() view returns (uint256 pools)",
            "function userInfo(uint256, address) view returns (uint256 amount, uint256 rewardDebt, uint256 factor)",
            "function getReserves() view returns (uint112 _reserve0, uint112 _reserve1, uint32 _blockTimestampLast)",
        ])
        .unwrap()
    }

    fn rpc(transport: MockTransport) -> RpcClient<MockTransport> {
        RpcClient::new(transport, RetryPolicy::default())
    }

    #[test]
    fn test_unknown_function() {
        let abi = abi();
        let call = ContractCall::new(&abi, CHEF, "joePerSec", vec![], BlockTag::Latest);
        assert!(matches!(call.calldata(), Err(Error::UnknownFunction(name)) if name == "joePerSec"));
    }

    #[test]
    fn test_bad_arguments() {
        let abi = abi();
        let call = ContractCall::new(&abi, CHEF, "userInfo", vec![uint(1u64)], BlockTag::Latest);
        assert!(matches!(call.calldata(), Err(Error::Abi(_))));
    }

    #[test]
    fn test_invalid_abi() {
        assert!(matches!(
            parse_abi(&["function broken(uint256 returns"]),
            Err(Error::InvalidAbi(_))
        ));
    }

    #[tokio::test]
    async fn test_single_output_is_unwrapped() {
        let abi = abi();
        let transport = MockTransport::new(1);
        transport.on_call(CHEF, &abi, "poolLength", &[], vec![uint(42u64)]);

        let call = ContractCall::new(&abi, CHEF, "poolLength", vec![], BlockTag::Number(1));
        let decoded = rpc(transport).call_function(&call).await.unwrap().unwrap();

        assert!(decoded.is_value());
        assert_eq!(decoded.uint(), Some(U256::from(42)));
    }

    #[tokio::test]
    async fn test_named_outputs() {
        let abi = abi();
        let transport = MockTransport::new(1);
        let args = [uint(3u64), address(USER)];
        transport.on_call(
            CHEF,
            &abi,
            "userInfo",
            &args,
            vec![uint(100u64), uint(7u64), uint(50u64)],
        );

        let call = ContractCall::new(&abi, CHEF, "userInfo", args.to_vec(), BlockTag::Number(1));
        let decoded = rpc(transport).call_function(&call).await.unwrap().unwrap();

        let Decoded::Record(fields) = &decoded else {
            panic!("expected a record, got {decoded:?}");
        };
        let names: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["amount", "rewardDebt", "factor"]);
        assert_eq!(decoded.uint_field("amount"), Some(U256::from(100)));
        assert_eq!(decoded.uint_field("factor"), Some(U256::from(50)));
        assert_eq!(decoded.uint_field("missing"), None);
        assert_eq!(decoded.uint(), None);
    }

    #[tokio::test]
    async fn test_null_is_unavailable() {
        let abi = abi();
        let transport = MockTransport::new(1);
        let call = ContractCall::new(&abi, CHEF, "poolLength", vec![], BlockTag::Number(1));
        assert_eq!(rpc(transport).call_function(&call).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_is_unavailable() {
        let abi = abi();
        let transport = MockTransport::new(1);
        // a single word cannot hold three reserves
        transport.on_call(CHEF, &abi, "getReserves", &[], vec![uint(1u64)]);
        let call = ContractCall::new(&abi, CHEF, "getReserves", vec![], BlockTag::Number(1));
        assert_eq!(rpc(transport).call_function(&call).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_other_calls() {
        let abi = abi();
        let transport = MockTransport::new(1);
        let failing = [uint(0u64), address(USER)];
        transport.on_call_fail(CHEF, &abi, "userInfo", &failing, || Error::Rpc {
            code: -32000,
            message: "execution reverted".into(),
        });
        transport.on_call(CHEF, &abi, "poolLength", &[], vec![uint(2u64)]);
        let rpc = rpc(transport.clone());

        let reverted = ContractCall::new(&abi, CHEF, "userInfo", failing.to_vec(), BlockTag::Number(1));
        let length = ContractCall::new(&abi, CHEF, "poolLength", vec![], BlockTag::Number(1));
        let (reverted, length) = join(rpc.call_function(&reverted), rpc.call_function(&length)).await;

        assert_eq!(reverted.unwrap(), None);
        assert_eq!(length.unwrap().and_then(|decoded| decoded.uint()), Some(U256::from(2)));
        // one attempt each, the failure was not retried
        assert_eq!(transport.requests(), 2);
    }
}
