pub mod pagination;
pub mod rbac;
pub mod status;
