//! Application services for the administrative surface.

pub mod founders;
pub mod gallery;
pub mod posts;
pub mod tags;

pub use founders::AdminFounderService;
pub use gallery::AdminGalleryService;
pub use posts::AdminPostService;
pub use tags::AdminTagService;
