//! Configuration module

mod site;

pub use site::ApiConfig;
pub use site::NavigationConfig;
pub use site::SiteConfig;
pub use site::SiteLocale;
pub use site::{ACCESS_TOKEN_ENV, ENDPOINT_ENV};
