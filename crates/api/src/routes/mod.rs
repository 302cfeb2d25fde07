pub mod hospital;
pub mod signals;
