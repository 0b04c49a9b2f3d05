//! Upload provider adapter and Cloudinary client for imgvault.
//!
//! The admin surface never talks to Cloudinary directly. It goes through
//! [`UploadFeature`], which validates files, builds object keys and keeps
//! `imageKeys` in step, and the feature delegates the remote work to an
//! [`UploadProvider`]. [`CloudinaryProvider`] is the production provider; it
//! also keeps `imageUrls` in step after the remote call succeeds.

pub mod adapter;
pub mod cloudinary;
pub mod feature;
pub mod provider;
pub mod seed;

pub use adapter::CloudinaryProvider;
pub use cloudinary::CloudinaryClient;
pub use feature::UploadFeature;
pub use provider::{ActionContext, ProviderResult, RecordSync, StagedFile, UploadProvider};
