//! Assertion macros shared by integration tests.

/// Await a channel receive with a one second timeout, panicking with
/// contextual diagnostics if nothing arrives.
#[macro_export]
macro_rules! recv_expect {
    ($fut:expr) => {{
        ::tokio::time::timeout(::std::time::Duration::from_secs(1), $fut)
            .await
            .expect(concat!("recv timed out at ", file!(), ":", line!()))
            .expect(concat!("channel closed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        ::tokio::time::timeout(::std::time::Duration::from_secs(1), $fut)
            .await
            .expect(&m)
            .expect(&m)
    }};
}

pub use crate::recv_expect;
