pub(crate) mod access_codes;
pub(crate) mod device_policy;
pub(crate) mod grading;
pub(crate) mod grants;
