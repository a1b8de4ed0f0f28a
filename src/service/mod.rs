pub mod site;
pub mod state;
pub mod telegram;
