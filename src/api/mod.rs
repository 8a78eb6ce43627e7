pub mod extract;
pub mod response;

pub use extract::{json_body, parse_id};
pub use response::{ApiResponse, ApiResult};
