//! [`Handler`] abstractions.

use std::future::Future;

/// Asynchronous handler of an `Args` operation.
///
/// Commands, queries and external authority calls are all expressed as
/// [`Handler`] implementations, so callers stay generic over the concrete
/// infrastructure behind them.
pub trait Handler<Args = ()> {
    /// Type of a successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
