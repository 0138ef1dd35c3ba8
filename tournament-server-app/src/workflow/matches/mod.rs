pub mod list_live;
