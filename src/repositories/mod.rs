pub(crate) mod exams;
pub(crate) mod questions;
pub(crate) mod solutions;
pub(crate) mod specialties;
pub(crate) mod store;
pub(crate) mod students;
pub(crate) mod themes;
