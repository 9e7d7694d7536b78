//! Metric names emitted by the publishing workflow.

pub const METRIC_POSTS_CREATED: &str = "bravespace_posts_created_total";
pub const METRIC_POSTS_TOGGLED: &str = "bravespace_posts_toggled_total";
pub const METRIC_UPLOADS_STORED: &str = "bravespace_uploads_stored_total";
pub const METRIC_COMPENSATIONS: &str = "bravespace_compensations_total";
pub const METRIC_ADMIN_LOGINS: &str = "bravespace_admin_logins_total";
