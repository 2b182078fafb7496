pub(crate) mod boundaries;
pub(crate) mod catalog;
pub(crate) mod composer;
pub(crate) mod exam_access;
pub(crate) mod exam_creation;
pub(crate) mod question_pool;
pub(crate) mod sampler;
