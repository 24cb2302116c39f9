pub mod design;
pub mod emmeans;
pub mod linalg;
pub mod lmm;
pub mod optim;
