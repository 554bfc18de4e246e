pub mod adjustment;
pub mod broker;
pub mod delivery;
pub mod directory;
pub mod dispatch;
pub mod publisher;
pub mod record;
pub mod transport;
