//! Share links: snapshots carried in a URL fragment, either inline or via
//! an anonymous paste host.

pub mod encoding;
mod fragment;
mod paste;
mod transport;

pub use fragment::{ShareFragment, strip_fragment};
pub use paste::{HttpPasteHost, PasteHost};
pub use transport::{ConsumedLink, ShareTransport};
