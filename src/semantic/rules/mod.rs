//! Default rule sets, one module per profile

pub mod odl;
pub mod opds2;
pub mod rwpm;
