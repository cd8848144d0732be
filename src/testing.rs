//! Scripted transport for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::{Address, U256},
};
use serde_json::{Value, json};

use crate::{
    Error,
    rpc::{Request, Transport},
};

enum Reply {
    Return(Vec<u8>),
    Fail(fn() -> Error),
    FailThenReturn {
        failures: u32,
        make: fn() -> Error,
        data: Vec<u8>,
    },
}

#[derive(Default)]
struct State {
    block: u64,
    failures: VecDeque<Error>,
    calls: HashMap<(Address, Vec<u8>), Reply>,
    requests: usize,
}

/// Answers `eth_blockNumber` with a fixed block and `eth_call` from a table
/// keyed by contract address and calldata. Unknown calls return `null`.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new(block: u64) -> Self {
        let transport = Self::default();
        transport.state.lock().unwrap().block = block;
        transport
    }

    /// Fails the next request, whatever it is, with `err`.
    pub fn fail_next(&self, err: Error) {
        self.state.lock().unwrap().failures.push_back(err);
    }

    /// Scripts `function(args)` on `address` to return `outputs`.
    pub fn on_call(
        &self,
        address: Address,
        abi: &JsonAbi,
        function: &str,
        args: &[DynSolValue],
        outputs: Vec<DynSolValue>,
    ) {
        let data = DynSolValue::Tuple(outputs).abi_encode_params();
        self.script(address, abi, function, args, Reply::Return(data));
    }

    /// Scripts `function(args)` on `address` to fail with `make()` every time.
    pub fn on_call_fail(
        &self,
        address: Address,
        abi: &JsonAbi,
        function: &str,
        args: &[DynSolValue],
        make: fn() -> Error,
    ) {
        self.script(address, abi, function, args, Reply::Fail(make));
    }

    /// Scripts `function(args)` on `address` to fail with `make()` the first
    /// `failures` times, then return `outputs`.
    #[allow(clippy::too_many_arguments)]
    pub fn on_call_flaky(
        &self,
        address: Address,
        abi: &JsonAbi,
        function: &str,
        args: &[DynSolValue],
        failures: u32,
        make: fn() -> Error,
        outputs: Vec<DynSolValue>,
    ) {
        let data = DynSolValue::Tuple(outputs).abi_encode_params();
        self.script(address, abi, function, args, Reply::FailThenReturn { failures, make, data });
    }

    fn script(&self, address: Address, abi: &JsonAbi, function: &str, args: &[DynSolValue], reply: Reply) {
        let calldata = abi.function(function).unwrap()[0].abi_encode_input(args).unwrap();
        self.state
            .lock()
            .unwrap()
            .calls
            .insert((address, calldata), reply);
    }

    /// Number of requests received so far.
    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    fn answer(&self, request: &Request) -> Result<Option<Value>, Error> {
        let mut state = self.state.lock().unwrap();
        state.requests += 1;
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }

        match request.method {
            "eth_blockNumber" => Ok(Some(json!(format!("{:#x}", state.block)))),
            "eth_call" => {
                let call = &request.params[0];
                let to: Address = serde_json::from_value(call["to"].clone()).unwrap();
                let data = const_hex::decode(call["data"].as_str().unwrap()).unwrap();
                match state.calls.get_mut(&(to, data)) {
                    Some(Reply::Return(bytes)) => Ok(Some(json!(const_hex::encode_prefixed(bytes)))),
                    Some(Reply::Fail(make)) => Err((*make)()),
                    Some(Reply::FailThenReturn { failures, make, .. }) if *failures > 0 => {
                        *failures -= 1;
                        Err((*make)())
                    }
                    Some(Reply::FailThenReturn { data, .. }) => Ok(Some(json!(const_hex::encode_prefixed(data)))),
                    None => Ok(None),
                }
            }
            method => Err(Error::Rpc {
                code: -32601,
                message: format!("method {method} not found"),
            }),
        }
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: &Request) -> Result<Option<Value>, Error> {
        self.answer(request)
    }
}

/// `uint` output holding `value` with `decimals` fractional digits.
pub(crate) fn scaled(value: u64, decimals: u32) -> DynSolValue {
    let raw = U256::from(value) * U256::from(10).pow(U256::from(decimals));
    DynSolValue::Uint(raw, 256)
}
