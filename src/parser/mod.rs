pub mod decode;
pub mod dom;
pub mod extract;

pub use dom::Document;

pub const BASE_URL: &str = "https://www.moddb.com";
