/// Wire types shared by the GroupIn relay and its clients.
pub mod events;
pub mod models;
