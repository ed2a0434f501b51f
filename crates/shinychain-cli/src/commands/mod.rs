pub(crate) mod export;
pub(crate) mod helpers;
pub(crate) mod ks;
pub(crate) mod rmse;
