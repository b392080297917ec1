//! Port adapters.

mod history_navigator;
mod reqwest_client;

pub use history_navigator::HistoryNavigator;
pub use reqwest_client::ReqwestHttpClient;
