//! Request plumbing: ordered arguments, the pluggable transport, streamed bodies and error diagnostics.

mod args;
mod body;
mod context;
mod messages;
mod response;
mod transport;

pub use self::args::{ArgumentSet, ToArguments};
pub use self::body::{Body, BodyReader};
pub use self::context::Context;
pub use self::messages::{Message, RequestError, Severity};
pub use self::response::Response;
pub use self::transport::{Method, Request, ReqwestTransport, Transport};
