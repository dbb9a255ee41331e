pub mod mutate;
pub mod total;
pub mod list;
pub mod history;
pub mod inspect;
pub mod timeline;
pub mod verify;
pub mod checkpoint;
