//! Typed batch execution of contract reads.

pub mod call;
pub mod dispatcher;
pub mod outcome;
pub mod transport;

pub use call::{CallSpec, RawCall};
pub use dispatcher::BatchDispatcher;
pub use outcome::{filter_successful, filter_successful_optional, map_success_filter, Outcome};
pub use transport::CallTransport;
