// handlers/mod.rs - HTTP handlers grouped by resource
//
// Handlers only parse the request and shape the response; the services in
// crate::services own all behavior.
pub mod categories;
pub mod platforms;
pub mod system;
