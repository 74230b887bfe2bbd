pub mod rpc_transport;

pub use rpc_transport::{RpcTransport, MULTICALL3_ADDRESS};
