pub(crate) mod ordering;
pub(crate) mod session_windows;
pub(crate) mod sessions;
