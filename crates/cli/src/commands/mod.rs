pub(crate) mod check;
pub(crate) mod pix;
pub(crate) mod stgcmt;
