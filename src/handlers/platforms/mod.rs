pub mod collection;
pub mod groups;
pub mod parts;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::delete as platforms_delete;
pub use collection::get as platforms_get;
pub use collection::post as platforms_post;

pub use record::delete as platform_delete;
pub use record::get as platform_get;
pub use record::put as platform_put;

pub use parts::delete as part_delete;
pub use parts::post as part_post;
pub use parts::put as part_put;

pub use groups::post as group_post;
pub use groups::put as group_put;
