pub mod error;
pub mod pagination;
pub mod path_id;
pub mod redirect;
