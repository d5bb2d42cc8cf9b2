//! Configuration module

mod site;

pub use site::BudgetConfig;
pub use site::MarkdownConfig;
pub use site::Palette;
pub use site::PresentationConfig;
pub use site::RobotsConfig;
pub use site::SiteConfig;
