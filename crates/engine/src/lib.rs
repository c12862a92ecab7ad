pub mod activity;
pub mod address;
pub mod content;
pub mod dispatcher;
pub mod election;
pub mod eligibility;
pub mod providers;
pub mod redis_state;
pub mod store;
pub mod window;
