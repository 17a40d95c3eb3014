//! WebDAV client side: transport, multistatus parsing, directory listing.

pub mod listing;
pub mod multistatus;
pub mod transport;

pub use listing::{
    DavLister, DirectoryLister, Listing, ListingEntry, ListingError, MULTI_STATUS, RemoteFile,
};
pub use multistatus::{MultistatusError, PropfindEntry, parse_multistatus};
pub use transport::{BoxError, DavResponse, DavTransport, TransportError, UreqTransport};
