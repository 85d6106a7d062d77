//! Remote resource adapters
//!
//! One generic [`HttpResourceAdapter`] serves every entity family; the
//! family only changes the endpoint paths.

pub mod adapter;
pub mod endpoints;
pub mod form;

pub use adapter::HttpResourceAdapter;
pub use endpoints::ResourceEndpoints;
pub use form::form_fields;
