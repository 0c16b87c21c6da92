pub(crate) mod archive;
pub(crate) mod dns;
pub(crate) mod domain;
pub(crate) mod extract;
pub(crate) mod syntax;
