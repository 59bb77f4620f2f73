//! # packforge-soap
//!
//! SOAP transport for the Salesforce calls packforge needs: Partner API
//! `login`, Metadata API `describeMetadata` and `listMetadata`.
//!
//! The Metadata API caps `listMetadata` at [`MAX_LIST_QUERIES`] queries per
//! call; [`MetadataClient::list_metadata`] rejects larger requests before
//! anything goes on the wire.
//!
//! Session invalidity is the one fault callers are expected to recover
//! from: [`Error::is_invalid_session`] recognizes the
//! `sf:INVALID_SESSION_ID` fault code so the session layer can re-login
//! and retry.

mod error;
mod metadata;
mod partner;
mod types;
pub mod xml;

pub use error::{Error, ErrorKind, Result, INVALID_SESSION_CODE};
pub use metadata::{MetadataClient, MAX_LIST_QUERIES};
pub use partner::{LoginResult, PartnerClient, CLIENT_NAME};
pub use types::{DescribeResult, ListQuery, MetadataItem, MetadataType, SoapFault};
