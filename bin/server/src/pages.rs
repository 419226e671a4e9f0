//! Page components for the application.
//!
//! Each page is a Leptos component that renders a specific route,
//! along with any server functions specific to that page.

pub mod admin;
pub mod components;
pub mod dashboard;
pub mod login;

pub use admin::AdminPage;
pub use dashboard::DashboardPage;
pub use login::LoginPage;
